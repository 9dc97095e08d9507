//! Opposed-check model
//!
//! Difficulties, graded outcomes, opposed comparisons and the evaluator seam.

pub mod difficulty;
pub mod evaluator;
pub mod outcome;

pub use difficulty::Difficulty;
pub use evaluator::{CheckEvaluator, CheckResult, FixedCheck, ScriptedCheck, StandardCheck};
pub use outcome::{OpposedDirection, OpposedOutcome, OpposedOutcomeDegree, Outcome};
