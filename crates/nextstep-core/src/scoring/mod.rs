//! Task scoring.
//!
//! A pure mapping from a task plus resolved session/day flags to a positive
//! weight used by the selector.

mod additive;
mod strategy;
mod weights;

pub use additive::{nudge_applies, score, ScoreBreakdown, MIN_SCORE};
pub use strategy::{AdditiveWeighted, ScoringStrategy, StrategyInfo, StrategyRegistry};
pub use weights::ScoringWeights;
