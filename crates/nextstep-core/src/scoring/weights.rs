//! Scoring weights.
//!
//! Process-wide, loaded once at startup and immutable during a run.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The five tunable weights of the additive scoring model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub impact_weight: f64,
    pub urgency_weight: f64,
    /// Multiplier for A-impact tasks with urgency 3 or 4
    pub strategic_nudge_boost: f64,
    /// Dampened scores are divided by `1 + dampening_factor`
    pub dampening_factor: f64,
    /// Multiplier for today's morning-planning picks
    pub priority_multiplier: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            impact_weight: 2.0,
            urgency_weight: 1.5,
            strategic_nudge_boost: 1.5,
            dampening_factor: 0.5,
            priority_multiplier: 2.0,
        }
    }
}

impl ScoringWeights {
    /// Named view over the weights, in declaration order.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("impact_weight", self.impact_weight),
            ("urgency_weight", self.urgency_weight),
            ("strategic_nudge_boost", self.strategic_nudge_boost),
            ("dampening_factor", self.dampening_factor),
            ("priority_multiplier", self.priority_multiplier),
        ]
    }

    /// Reject any weight that is not a finite number > 0.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending weight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("scoring.{name}"),
                    message: format!("must be a finite number > 0, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Build weights from explicit values, validating them.
    pub fn try_new(
        impact_weight: f64,
        urgency_weight: f64,
        strategic_nudge_boost: f64,
        dampening_factor: f64,
        priority_multiplier: f64,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            impact_weight,
            urgency_weight,
            strategic_nudge_boost,
            dampening_factor,
            priority_multiplier,
        };
        weights.validate()?;
        Ok(weights)
    }
}
