//! The "What Next?" suggestion engine.
//!
//! Session-scoped dampening, day-scoped priorities, the weighted random
//! selector and the session controller that ties them together.

mod dampening;
mod priority;
mod selector;
mod session;

pub use dampening::DampeningTracker;
pub use priority::PriorityTracker;
pub use selector::{distribution, rank, select, ScoredCandidate, ScoringContext};
pub use session::{SessionState, SharedSession, Step, Suggestion, SuggestionSession};
