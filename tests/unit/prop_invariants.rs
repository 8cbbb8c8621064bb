//! Property-based tests: the book is cross-checked against a naive model
//! over random add/cancel sequences.

use crate::support::*;
use fastlob::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;

const SYM: &str = "600000.SH";
const MIN_PRICE: u32 = 100_000;
const MAX_PRICE: u32 = 100_200;

fn cancel_order(order_no: i64, qty: i64) -> OrderEvent {
    OrderEvent {
        kind: 4,
        ..limit_order(SYM, order_no, order_no, 93_100_000, 1, 0, qty)
    }
}

/// Shadow model: order number -> (is_buy, price, remaining).
type Model = HashMap<i64, (bool, u32, i64)>;

fn model_volume_at(model: &Model, price: u32) -> u64 {
    model
        .values()
        .filter(|(_, p, _)| *p == price)
        .map(|(_, _, qty)| *qty as u64)
        .sum()
}

fn model_best_bid(model: &Model) -> Option<u32> {
    model
        .values()
        .filter(|(is_buy, _, _)| *is_buy)
        .map(|(_, p, _)| *p)
        .max()
}

fn model_best_ask(model: &Model) -> Option<u32> {
    model
        .values()
        .filter(|(is_buy, _, _)| !*is_buy)
        .map(|(_, p, _)| *p)
        .min()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Random adds and partial/full cancels: aggregates, cursors, index
    /// size, and pool accounting all match the model after every run.
    /// Buys and sells use disjoint price ranges so levels never mix sides.
    #[test]
    fn book_matches_model(
        ops in prop::collection::vec(
            (any::<bool>(), 0u32..=99, 1i64..=500, 0u8..=2),
            1..80,
        )
    ) {
        let mut book = FastOrderBook::new(SYM, MIN_PRICE, MAX_PRICE);
        let mut model: Model = HashMap::new();
        let mut next_no = 1i64;

        for (is_buy, offset, qty, action) in ops {
            if action == 2 && !model.is_empty() {
                // Cancel a pseudo-randomly chosen live order, sometimes
                // partially.
                let mut keys: Vec<i64> = model.keys().copied().collect();
                keys.sort_unstable();
                let target = keys[offset as usize % keys.len()];
                let remaining = model[&target].2;
                let cancel_qty = 1 + (qty - 1) % remaining;

                prop_assert!(book.on_order(&cancel_order(target, cancel_qty)).unwrap());
                if cancel_qty == remaining {
                    model.remove(&target);
                } else {
                    model.get_mut(&target).unwrap().2 -= cancel_qty;
                }
            } else {
                // Buys at the low half of the band, sells at the high half.
                let price = if is_buy {
                    MIN_PRICE + offset
                } else {
                    MIN_PRICE + 101 + offset
                };
                let side = if is_buy { 1 } else { 2 };
                prop_assert!(book
                    .on_order(&limit_order(SYM, next_no, next_no, 93_100_000, side, price as i64, qty))
                    .unwrap());
                model.insert(next_no, (is_buy, price, qty));
                next_no += 1;
            }

            // Cursor invariants hold after every operation.
            prop_assert_eq!(book.get_best_bid(), model_best_bid(&model));
            prop_assert_eq!(book.get_best_ask(), model_best_ask(&model));
        }

        // Level aggregates equal the model sums across the whole band.
        for price in MIN_PRICE..=MAX_PRICE {
            prop_assert_eq!(
                book.get_volume_at_price(price),
                model_volume_at(&model, price),
                "volume mismatch at {}",
                price
            );
        }

        // The index maps exactly the live orders, and the pool agrees.
        prop_assert_eq!(book.order_count(), model.len());
        prop_assert_eq!(book.pool().in_use(), model.len());
    }

    /// Adding orders and fully cancelling them all leaves the book
    /// indistinguishable from its pre-add state.
    #[test]
    fn full_cancellation_round_trip(
        adds in prop::collection::vec(
            (any::<bool>(), 0u32..=99, 1i64..=500),
            1..40,
        )
    ) {
        let mut book = FastOrderBook::new(SYM, MIN_PRICE, MAX_PRICE);

        for (i, (is_buy, offset, qty)) in adds.iter().enumerate() {
            let price = if *is_buy {
                MIN_PRICE + offset
            } else {
                MIN_PRICE + 101 + offset
            };
            let side = if *is_buy { 1 } else { 2 };
            let order_no = i as i64 + 1;
            book.on_order(&limit_order(SYM, order_no, order_no, 93_100_000, side, price as i64, *qty))
                .unwrap();
        }

        for i in 0..adds.len() {
            let order_no = i as i64 + 1;
            prop_assert!(book.on_order(&cancel_order(order_no, adds[i].2)).unwrap());
        }

        prop_assert_eq!(book.get_best_bid(), None);
        prop_assert_eq!(book.get_best_ask(), None);
        prop_assert_eq!(book.order_count(), 0);
        prop_assert_eq!(book.pool().in_use(), 0);
        for price in MIN_PRICE..=MAX_PRICE {
            prop_assert_eq!(book.get_volume_at_price(price), 0u64);
        }
    }
}
