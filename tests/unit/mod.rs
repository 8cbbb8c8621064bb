mod end_to_end_tests;
mod engine_tests;
mod prop_invariants;
mod replay_pipeline_tests;

mod support;
