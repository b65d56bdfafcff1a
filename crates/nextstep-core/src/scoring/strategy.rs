//! Scoring strategy seam.
//!
//! The additive weighted formula is the only shipped strategy, but the
//! selector and ranking go through this trait so alternative formulas can be
//! registered and picked by name from config.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::additive::{self, ScoreBreakdown};
use super::weights::ScoringWeights;
use crate::error::SuggestionError;
use crate::task::Task;

/// A scoring formula.
pub trait ScoringStrategy: Send + Sync {
    /// Registry key.
    fn name(&self) -> &'static str;

    /// One-line description for listings.
    fn description(&self) -> &'static str;

    /// Score one task. Must return a breakdown with `score > 0`.
    fn score(
        &self,
        task: &Task,
        weights: &ScoringWeights,
        is_dampened: bool,
        is_prioritized: bool,
    ) -> ScoreBreakdown;
}

/// Default strategy: see [`additive::score`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveWeighted;

impl AdditiveWeighted {
    pub const NAME: &'static str = "additive_weighted";
}

impl ScoringStrategy for AdditiveWeighted {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Additive weighted scoring with strategic nudge"
    }

    fn score(
        &self,
        task: &Task,
        weights: &ScoringWeights,
        is_dampened: bool,
        is_prioritized: bool,
    ) -> ScoreBreakdown {
        additive::score(task, weights, is_dampened, is_prioritized)
    }
}

/// Strategy metadata for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
}

/// Named collection of scoring strategies.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, Arc<dyn ScoringStrategy>>,
    default_name: &'static str,
}

impl StrategyRegistry {
    /// Registry containing the built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
            default_name: AdditiveWeighted::NAME,
        };
        registry.register(AdditiveWeighted);
        registry
    }

    /// Add or replace a strategy under its own name.
    pub fn register(&mut self, strategy: impl ScoringStrategy + 'static) {
        self.strategies.insert(strategy.name(), Arc::new(strategy));
    }

    /// Look up a strategy by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ScoringStrategy>, SuggestionError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| SuggestionError::UnknownStrategy(name.to_string()))
    }

    pub fn default_strategy(&self) -> Arc<dyn ScoringStrategy> {
        self.strategies
            .get(self.default_name)
            .cloned()
            .unwrap_or_else(|| Arc::new(AdditiveWeighted))
    }

    pub fn list(&self) -> Vec<StrategyInfo> {
        self.strategies
            .values()
            .map(|s| StrategyInfo {
                name: s.name().to_string(),
                description: s.description().to_string(),
            })
            .collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Impact, Urgency};

    struct Flat;

    impl ScoringStrategy for Flat {
        fn name(&self) -> &'static str {
            "flat"
        }
        fn description(&self) -> &'static str {
            "Every task scores 1"
        }
        fn score(&self, task: &Task, _w: &ScoringWeights, d: bool, p: bool) -> ScoreBreakdown {
            ScoreBreakdown {
                impact: task.impact,
                urgency: task.urgency,
                base: 1.0,
                nudge_applied: false,
                dampened: d,
                prioritized: p,
                score: 1.0,
            }
        }
    }

    #[test]
    fn registry_has_default_strategy() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.default_strategy().name(), "additive_weighted");
        assert!(registry.get("additive_weighted").is_ok());
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let registry = StrategyRegistry::new();
        let err = registry.get("nope").err().unwrap();
        assert_eq!(err, SuggestionError::UnknownStrategy("nope".into()));
    }

    #[test]
    fn register_and_list() {
        let mut registry = StrategyRegistry::new();
        registry.register(Flat);
        let names: Vec<_> = registry.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["additive_weighted".to_string(), "flat".to_string()]);

        let task = Task::with_id("t", "x").impact(Impact::A).urgency(Urgency::Immediate);
        let flat = registry.get("flat").unwrap();
        assert_eq!(flat.score(&task, &ScoringWeights::default(), false, false).score, 1.0);
    }
}
