//! Candidate selection.
//!
//! Scores every Ready candidate, normalizes the scores into a probability
//! table and draws one task with a cumulative walk over a uniform draw in
//! [0, 1). The walk runs in id order so a seeded generator reproduces the
//! same pick.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dampening::DampeningTracker;
use super::priority::PriorityTracker;
use crate::error::SuggestionError;
use crate::scoring::{AdditiveWeighted, ScoreBreakdown, ScoringStrategy, ScoringWeights};
use crate::task::{Task, TaskState};

/// Everything scoring needs for one request, with tracker state resolved per task.
#[derive(Clone, Copy)]
pub struct ScoringContext<'a> {
    pub weights: &'a ScoringWeights,
    pub dampening: &'a DampeningTracker,
    pub priorities: &'a PriorityTracker,
    strategy: &'a dyn ScoringStrategy,
}

impl<'a> ScoringContext<'a> {
    /// Context using the additive weighted strategy.
    pub fn new(
        weights: &'a ScoringWeights,
        dampening: &'a DampeningTracker,
        priorities: &'a PriorityTracker,
    ) -> Self {
        Self {
            weights,
            dampening,
            priorities,
            strategy: &AdditiveWeighted,
        }
    }

    pub fn with_strategy(mut self, strategy: &'a dyn ScoringStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn score(&self, task: &Task) -> ScoreBreakdown {
        self.strategy.score(
            task,
            self.weights,
            self.dampening.is_dampened(&task.id),
            self.priorities.is_prioritized(&task.id),
        )
    }
}

/// A scored task with its share of the draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub task: Task,
    pub breakdown: ScoreBreakdown,
    /// `score / sum(scores)` over the candidate set
    pub probability: f64,
}

impl ScoredCandidate {
    pub fn score(&self) -> f64 {
        self.breakdown.score
    }
}

/// Score and normalize the Ready subset of `candidates`, sorted by id.
///
/// # Errors
///
/// Returns `SuggestionError::NoCandidates` when no Ready task remains.
pub fn distribution(
    candidates: &[Task],
    ctx: &ScoringContext<'_>,
) -> Result<Vec<ScoredCandidate>, SuggestionError> {
    let mut pool: Vec<&Task> = candidates
        .iter()
        .filter(|t| t.state == TaskState::Ready)
        .collect();
    if pool.is_empty() {
        return Err(SuggestionError::NoCandidates);
    }
    pool.sort_by(|a, b| a.id.cmp(&b.id));

    let mut scored: Vec<ScoredCandidate> = pool
        .into_iter()
        .map(|task| ScoredCandidate {
            task: task.clone(),
            breakdown: ctx.score(task),
            probability: 0.0,
        })
        .collect();

    let total: f64 = scored.iter().map(ScoredCandidate::score).sum();
    if total.is_finite() && total > 0.0 {
        for c in &mut scored {
            c.probability = c.score() / total;
        }
    } else {
        // A strategy produced unusable scores; fall back to a uniform draw.
        let uniform = 1.0 / scored.len() as f64;
        for c in &mut scored {
            c.probability = uniform;
        }
    }

    Ok(scored)
}

/// Index of the first entry whose cumulative probability exceeds `draw`.
///
/// Falls back to the last index when floating-point drift leaves the
/// cumulative sum short of 1.0. `probabilities` must be non-empty.
pub(crate) fn pick_index(probabilities: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return i;
        }
    }
    probabilities.len().saturating_sub(1)
}

/// Draw one candidate by weighted random selection.
///
/// # Errors
///
/// Returns `SuggestionError::NoCandidates` when no Ready task remains.
pub fn select<R: Rng + ?Sized>(
    candidates: &[Task],
    ctx: &ScoringContext<'_>,
    rng: &mut R,
) -> Result<ScoredCandidate, SuggestionError> {
    let mut dist = distribution(candidates, ctx)?;
    let probabilities: Vec<f64> = dist.iter().map(|c| c.probability).collect();
    let draw: f64 = rng.gen();
    let chosen = dist.swap_remove(pick_index(&probabilities, draw));

    debug!(
        candidates = probabilities.len(),
        chosen = %chosen.task.id,
        probability = chosen.probability,
        draw,
        "suggestion drawn"
    );
    Ok(chosen)
}

/// All Ready candidates ordered by score, highest first (ties by id).
///
/// Deterministic; used for morning planning. An empty pool yields an empty list.
pub fn rank(candidates: &[Task], ctx: &ScoringContext<'_>) -> Vec<ScoredCandidate> {
    let mut ranked = match distribution(candidates, ctx) {
        Ok(dist) => dist,
        Err(_) => return Vec::new(),
    };
    ranked.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.task.id.cmp(&b.task.id))
    });
    ranked
}
