//! Additive weighted scoring.
//!
//! ```text
//! base  = impact_weight * impact_value + urgency_weight * urgency_value
//! base *= strategic_nudge_boost            if impact == A and urgency in {3, 4}
//! base /= 1 + dampening_factor             if rejected this session
//! base *= priority_multiplier              if picked in today's morning planning
//! ```
//!
//! The function is pure: tracker lookups are resolved by the caller and
//! passed in as booleans.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::weights::ScoringWeights;
use crate::task::{Impact, Task, Urgency};

/// Fallback score when the formula yields zero, a negative or a non-finite value,
/// so no candidate drops out of the draw.
pub const MIN_SCORE: f64 = 1e-6;

/// Score for one task together with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub impact: Option<Impact>,
    pub urgency: Option<Urgency>,
    /// Impact + urgency contribution before any modifier
    pub base: f64,
    pub nudge_applied: bool,
    pub dampened: bool,
    pub prioritized: bool,
    /// Final score, always > 0
    pub score: f64,
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let impact = self.impact.map_or("-".to_string(), |i| i.to_string());
        let urgency = self.urgency.map_or("-".to_string(), |u| u.to_string());
        write!(f, "Impact:{impact} Urgency:{urgency}")?;
        if self.nudge_applied {
            f.write_str(" + strategic nudge")?;
        }
        if self.dampened {
            f.write_str(" + dampened (rejected)")?;
        }
        if self.prioritized {
            f.write_str(" + daily priority")?;
        }
        Ok(())
    }
}

/// True for "important but not urgent" tasks.
pub fn nudge_applies(impact: Option<Impact>, urgency: Option<Urgency>) -> bool {
    impact == Some(Impact::A) && urgency.is_some_and(Urgency::is_deferrable)
}

/// Score a task.
///
/// Always returns a score > 0: zero weights, unset impact/urgency or a
/// non-finite intermediate fall back to [`MIN_SCORE`].
pub fn score(
    task: &Task,
    weights: &ScoringWeights,
    is_dampened: bool,
    is_prioritized: bool,
) -> ScoreBreakdown {
    let impact_value = task.impact.map_or(0.0, Impact::value);
    let urgency_value = task.urgency.map_or(0.0, Urgency::value);

    let base = weights.impact_weight * impact_value + weights.urgency_weight * urgency_value;
    let mut value = base;

    let nudge_applied = nudge_applies(task.impact, task.urgency);
    if nudge_applied {
        value *= weights.strategic_nudge_boost;
    }
    if is_dampened {
        value /= 1.0 + weights.dampening_factor;
    }
    if is_prioritized {
        value *= weights.priority_multiplier;
    }

    if !value.is_finite() || value <= 0.0 {
        value = MIN_SCORE;
    }

    ScoreBreakdown {
        impact: task.impact,
        urgency: task.urgency,
        base,
        nudge_applied,
        dampened: is_dampened,
        prioritized: is_prioritized,
        score: value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn task(impact: Impact, urgency: Urgency) -> Task {
        Task::with_id("t", "test").impact(impact).urgency(urgency)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn basic_score() {
        let w = ScoringWeights::default();
        // 2.0*3 + 1.5*3 = 10.5
        let s = score(&task(Impact::B, Urgency::Soon), &w, false, false);
        assert!(approx(s.score, 10.5));
        assert!(!s.nudge_applied);
    }

    #[test]
    fn scenario_a_scores() {
        let w = ScoringWeights::default();
        let t1 = score(&task(Impact::A, Urgency::Immediate), &w, false, false);
        let t2 = score(&task(Impact::D, Urgency::LongTerm), &w, false, false);
        assert!(approx(t1.score, 14.0));
        assert!(approx(t2.score, 3.5));
        assert!(!t2.nudge_applied);
    }

    #[test]
    fn scenario_b_nudge_then_dampening() {
        let w = ScoringWeights::default();
        let t = task(Impact::A, Urgency::CanDefer);
        let fresh = score(&t, &w, false, false);
        assert!(fresh.nudge_applied);
        assert!(approx(fresh.base, 11.0));
        assert!(approx(fresh.score, 16.5));

        let rejected = score(&t, &w, true, false);
        assert!(approx(rejected.score, 11.0));
    }

    #[test]
    fn nudge_only_for_a_with_low_urgency() {
        assert!(nudge_applies(Some(Impact::A), Some(Urgency::CanDefer)));
        assert!(nudge_applies(Some(Impact::A), Some(Urgency::LongTerm)));
        assert!(!nudge_applies(Some(Impact::A), Some(Urgency::Immediate)));
        assert!(!nudge_applies(Some(Impact::A), Some(Urgency::Soon)));
        assert!(!nudge_applies(Some(Impact::B), Some(Urgency::CanDefer)));
        assert!(!nudge_applies(None, Some(Urgency::LongTerm)));
        assert!(!nudge_applies(Some(Impact::A), None));
    }

    #[test]
    fn priority_multiplies() {
        let w = ScoringWeights::default();
        let t = task(Impact::C, Urgency::Soon);
        let plain = score(&t, &w, false, false);
        let boosted = score(&t, &w, false, true);
        assert!(approx(boosted.score, plain.score * 2.0));
    }

    #[test]
    fn combined_modifiers() {
        let w = ScoringWeights::default();
        // (8 + 1.5) * 1.5 / 1.5 * 2.0 = 19.0
        let s = score(&task(Impact::A, Urgency::LongTerm), &w, true, true);
        assert!(approx(s.score, 19.0));
        assert_eq!(
            s.to_string(),
            "Impact:A Urgency:4 + strategic nudge + dampened (rejected) + daily priority"
        );
    }

    #[test]
    fn zero_weights_fall_back_to_epsilon() {
        let w = ScoringWeights {
            impact_weight: 0.0,
            urgency_weight: 0.0,
            strategic_nudge_boost: 0.0,
            dampening_factor: 0.0,
            priority_multiplier: 0.0,
        };
        let s = score(&task(Impact::A, Urgency::Immediate), &w, false, true);
        assert_eq!(s.score, MIN_SCORE);
    }

    #[test]
    fn tiny_weights_keep_relative_scores() {
        let w = ScoringWeights::try_new(1e-8, 1e-8, 1.5, 0.5, 2.0).unwrap();
        let t1 = score(&task(Impact::A, Urgency::Immediate), &w, false, false);
        let t2 = score(&task(Impact::D, Urgency::LongTerm), &w, false, false);
        assert!(t2.score < MIN_SCORE);
        assert!((t1.score / (t1.score + t2.score) - 0.8).abs() < 1e-9);

        let dampened = score(&task(Impact::D, Urgency::LongTerm), &w, true, false);
        assert!(dampened.score < t2.score);
        assert!((dampened.score * 1.5 - t2.score).abs() < 1e-20);
    }

    #[test]
    fn unset_impact_and_urgency_fall_back_to_epsilon() {
        let t = Task::with_id("bare", "no categories");
        let s = score(&t, &ScoringWeights::default(), false, false);
        assert_eq!(s.score, MIN_SCORE);
        assert_eq!(s.to_string(), "Impact:- Urgency:-");
    }

    fn impact_strategy() -> impl Strategy<Value = Impact> {
        prop::sample::select(Impact::ALL.to_vec())
    }

    fn urgency_strategy() -> impl Strategy<Value = Urgency> {
        prop::sample::select(Urgency::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn score_is_always_positive(
            impact in impact_strategy(),
            urgency in urgency_strategy(),
            dampened in any::<bool>(),
            prioritized in any::<bool>(),
        ) {
            let s = score(&task(impact, urgency), &ScoringWeights::default(), dampened, prioritized);
            prop_assert!(s.score > 0.0);
            prop_assert!(s.score.is_finite());
        }

        #[test]
        fn nudge_is_exact_factor(
            impact in impact_strategy(),
            urgency in urgency_strategy(),
            boost in 1.01f64..5.0,
        ) {
            let with_nudge = ScoringWeights { strategic_nudge_boost: boost, ..ScoringWeights::default() };
            let without = ScoringWeights { strategic_nudge_boost: 1.0, ..ScoringWeights::default() };
            let t = task(impact, urgency);
            let a = score(&t, &with_nudge, false, false).score;
            let b = score(&t, &without, false, false).score;
            if impact == Impact::A && urgency.is_deferrable() {
                prop_assert!(a > b);
                prop_assert!((a / b - boost).abs() < 1e-9);
            } else {
                prop_assert!((a - b).abs() < 1e-12);
            }
        }

        #[test]
        fn dampening_reduces_but_never_zeroes(
            impact in impact_strategy(),
            urgency in urgency_strategy(),
            factor in 0.01f64..10.0,
        ) {
            let w = ScoringWeights { dampening_factor: factor, ..ScoringWeights::default() };
            let t = task(impact, urgency);
            let plain = score(&t, &w, false, false).score;
            let damped = score(&t, &w, true, false).score;
            prop_assert!(damped > 0.0);
            prop_assert!(damped < plain);
            prop_assert!((damped - plain / (1.0 + factor)).abs() < 1e-9);
        }
    }
}
