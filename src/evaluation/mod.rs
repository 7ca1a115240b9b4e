//! Schedule cost evaluation.

mod evaluator;

pub use evaluator::{total_cost, CostEvaluator};
