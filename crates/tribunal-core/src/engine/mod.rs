//! Evaluation engines, innermost first: one criterion, one game, the batch.

pub mod batch;
pub mod criterion;
pub mod game;

pub use batch::{BatchEngine, BatchOptions, BatchOutcome};
pub use criterion::CriterionEvaluator;
pub use game::GameEvaluator;
