//! "What Next?" session controller.
//!
//! ```text
//! CheckInProgress --continue--> Ended
//!        |
//!        +--suggest different / nothing in progress--> Presenting | NoSuggestions
//!
//! Presenting --start--> Ended          (dampening cleared)
//! Presenting --reject--> Presenting    (task dampened, new draw)
//! Presenting --break--> Ended          (dampening cleared)
//! ```
//!
//! A new request cycle always begins with [`SuggestionSession::begin`].
//! Dampening survives across request cycles until Start, Break or the
//! evening review clears it.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dampening::DampeningTracker;
use super::priority::PriorityTracker;
use super::selector::{self, ScoredCandidate, ScoringContext};
use crate::error::{Result, SuggestionError};
use crate::scoring::{
    AdditiveWeighted, ScoreBreakdown, ScoringStrategy, ScoringWeights, StrategyRegistry,
};
use crate::source::{TaskMutator, TaskSource};
use crate::storage::Config;
use crate::task::{Task, TaskState};

/// Where the session is in the request cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Initial; in-progress tasks are being shown.
    CheckInProgress,
    /// A suggestion is on screen.
    Presenting { task_id: String },
    /// The Ready pool was empty.
    NoSuggestions,
    /// The request cycle is over.
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::CheckInProgress => f.write_str("checking in-progress tasks"),
            SessionState::Presenting { task_id } => write!(f, "presenting {task_id}"),
            SessionState::NoSuggestions => f.write_str("out of suggestions"),
            SessionState::Ended => f.write_str("ended"),
        }
    }
}

/// A single suggestion shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub task: Task,
    pub score: f64,
    /// Share of the draw this task had
    pub probability: f64,
    /// Human-readable summary of the score inputs
    pub rationale: String,
    pub breakdown: ScoreBreakdown,
}

impl From<ScoredCandidate> for Suggestion {
    fn from(c: ScoredCandidate) -> Self {
        Self {
            score: c.breakdown.score,
            probability: c.probability,
            rationale: c.breakdown.to_string(),
            breakdown: c.breakdown,
            task: c.task,
        }
    }
}

/// What the caller should show next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Tasks already in progress; ask "continue or suggest different?".
    InProgress(Vec<Task>),
    /// A drawn suggestion; expect start, reject or break.
    Suggest(Suggestion),
    /// Nothing is Ready right now.
    NoSuggestions,
}

/// Session guarded by a single lock.
pub type SharedSession<R = Mcg128Xsl64> = Arc<Mutex<SuggestionSession<R>>>;

/// One user's suggestion session.
///
/// Owns the dampening and priority trackers and the random source used for
/// every draw. The generator is created once and never reseeded.
pub struct SuggestionSession<R = Mcg128Xsl64> {
    weights: ScoringWeights,
    strategy: Arc<dyn ScoringStrategy>,
    dampening: DampeningTracker,
    priorities: PriorityTracker,
    rng: R,
    state: SessionState,
}

impl SuggestionSession<Mcg128Xsl64> {
    /// Session with an OS-seeded generator.
    pub fn from_entropy(weights: ScoringWeights) -> Self {
        Self::new(weights, Mcg128Xsl64::from_entropy())
    }

    /// Session with reproducible draws.
    pub fn seeded(weights: ScoringWeights, seed: u64) -> Self {
        Self::new(weights, Mcg128Xsl64::seed_from_u64(seed))
    }

    /// Build from loaded configuration.
    ///
    /// # Errors
    ///
    /// Fails on invalid weights or an unknown strategy name.
    pub fn from_config(config: &Config, registry: &StrategyRegistry) -> Result<Self> {
        config.scoring.weights.validate()?;
        let strategy = registry.get(&config.scoring.strategy)?;
        let session = match config.session.seed {
            Some(seed) => Self::seeded(config.scoring.weights, seed),
            None => Self::from_entropy(config.scoring.weights),
        };
        Ok(session.with_strategy(strategy))
    }
}

impl<R: Rng> SuggestionSession<R> {
    pub fn new(weights: ScoringWeights, rng: R) -> Self {
        Self {
            weights,
            strategy: Arc::new(AdditiveWeighted),
            dampening: DampeningTracker::new(),
            priorities: PriorityTracker::new(),
            rng,
            state: SessionState::CheckInProgress,
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn ScoringStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Install a priority tracker restored from storage.
    pub fn with_priorities(mut self, priorities: PriorityTracker) -> Self {
        self.priorities = priorities;
        self
    }

    pub fn shared(self) -> SharedSession<R> {
        Arc::new(Mutex::new(self))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn dampening(&self) -> &DampeningTracker {
        &self.dampening
    }

    pub fn priorities(&self) -> &PriorityTracker {
        &self.priorities
    }

    pub fn is_dampened(&self, task_id: &str) -> bool {
        self.dampening.is_dampened(task_id)
    }

    pub fn is_prioritized(&self, task_id: &str) -> bool {
        self.priorities.is_prioritized(task_id)
    }

    /// Save the morning-planning selection for `day`.
    pub fn set_priorities<I, S>(&mut self, task_ids: I, day: NaiveDate)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priorities.set_priorities(task_ids, day);
    }

    /// Start a new request cycle.
    ///
    /// Shows in-progress tasks when there are any, otherwise draws a
    /// suggestion straight away.
    pub fn begin<S: TaskSource + ?Sized>(&mut self, source: &S) -> Result<Step> {
        self.state = SessionState::CheckInProgress;
        let in_progress = source.list_candidates(&[TaskState::InProgress])?;
        if in_progress.is_empty() {
            return self.generate(source);
        }
        debug!(count = in_progress.len(), "in-progress tasks found");
        Ok(Step::InProgress(in_progress))
    }

    /// Keep working on the in-progress task. Ends the cycle without touching state.
    pub fn continue_current(&mut self) -> Result<()> {
        self.expect_check_in_progress("continue")?;
        self.state = SessionState::Ended;
        Ok(())
    }

    /// Skip the in-progress task and draw a suggestion.
    pub fn suggest_different<S: TaskSource + ?Sized>(&mut self, source: &S) -> Result<Step> {
        self.expect_check_in_progress("suggest different")?;
        self.generate(source)
    }

    /// Accept the presented suggestion.
    ///
    /// Moves the task to In Progress through `mutator` and clears dampening.
    /// When the store refuses the move the session returns to
    /// `CheckInProgress` so the caller can begin again with fresh data.
    pub fn start<M: TaskMutator + ?Sized>(&mut self, mutator: &M) -> Result<Task> {
        let task_id = self.presented("start")?;
        match mutator.transition(&task_id, TaskState::InProgress) {
            Ok(task) => {
                self.dampening.clear();
                self.state = SessionState::Ended;
                info!(task_id = %task.id, "suggestion started");
                Ok(task)
            }
            Err(e) => {
                warn!(%task_id, error = %e, "start failed, returning to check-in");
                self.state = SessionState::CheckInProgress;
                Err(e)
            }
        }
    }

    /// Decline the presented suggestion and draw again.
    ///
    /// The rejected task stays in the pool at a reduced weight.
    pub fn reject<S: TaskSource + ?Sized>(&mut self, source: &S) -> Result<Step> {
        let task_id = self.presented("reject")?;
        self.dampening.reject(&task_id);
        self.generate(source)
    }

    /// Take a break. Clears dampening and ends the cycle; no task changes state.
    pub fn take_break(&mut self) -> Result<()> {
        self.presented("break")?;
        self.dampening.clear();
        self.state = SessionState::Ended;
        info!("break taken, dampening cleared");
        Ok(())
    }

    /// Evening review start: clears dampening and expires today's priorities.
    ///
    /// Valid in any state.
    pub fn evening_review_started(&mut self) {
        self.dampening.clear();
        self.priorities.expire();
        self.state = SessionState::Ended;
        info!("evening review started");
    }

    /// Ready tasks ordered by score, for morning planning.
    pub fn rank<S: TaskSource + ?Sized>(&self, source: &S) -> Result<Vec<ScoredCandidate>> {
        let ready = source.list_candidates(&[TaskState::Ready])?;
        Ok(selector::rank(&ready, &self.context()))
    }

    /// Score and probability of every Ready task under the current state.
    pub fn distribution<S: TaskSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<ScoredCandidate>> {
        let ready = source.list_candidates(&[TaskState::Ready])?;
        Ok(selector::distribution(&ready, &self.context())?)
    }

    fn context(&self) -> ScoringContext<'_> {
        ScoringContext::new(&self.weights, &self.dampening, &self.priorities)
            .with_strategy(self.strategy.as_ref())
    }

    fn generate<S: TaskSource + ?Sized>(&mut self, source: &S) -> Result<Step> {
        let ready = source.list_candidates(&[TaskState::Ready])?;
        // Field-level borrows: the generator is borrowed mutably alongside the trackers.
        let ctx = ScoringContext::new(&self.weights, &self.dampening, &self.priorities)
            .with_strategy(self.strategy.as_ref());

        match selector::select(&ready, &ctx, &mut self.rng) {
            Ok(chosen) => {
                self.state = SessionState::Presenting {
                    task_id: chosen.task.id.clone(),
                };
                Ok(Step::Suggest(chosen.into()))
            }
            Err(SuggestionError::NoCandidates) => {
                debug!("no ready tasks to suggest");
                self.state = SessionState::NoSuggestions;
                Ok(Step::NoSuggestions)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn expect_check_in_progress(&self, action: &str) -> Result<()> {
        match self.state {
            SessionState::CheckInProgress => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn presented(&self, action: &str) -> Result<String> {
        match &self.state {
            SessionState::Presenting { task_id } => Ok(task_id.clone()),
            _ => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &str) -> crate::error::CoreError {
        SuggestionError::InvalidAction {
            state: self.state.to_string(),
            action: action.to_string(),
        }
        .into()
    }
}

impl<R> fmt::Debug for SuggestionSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionSession")
            .field("weights", &self.weights)
            .field("strategy", &self.strategy.name())
            .field("dampening", &self.dampening)
            .field("priorities", &self.priorities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
