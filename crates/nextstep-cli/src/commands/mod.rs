pub mod config;
pub mod next;
pub mod plan;
pub mod review;
pub mod task;

use chrono::{Local, NaiveDate};
use nextstep_core::{Config, StrategyRegistry, SuggestionSession, TaskDb};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Local calendar day; priorities are keyed by it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Session built from validated config, with today's saved priorities.
pub fn open_session(db: &TaskDb) -> CliResult<SuggestionSession> {
    let config = Config::load_validated()?;
    let session = SuggestionSession::from_config(&config, &StrategyRegistry::new())?
        .with_priorities(db.load_priorities(today())?);
    Ok(session)
}

/// One-line summary used by list views.
pub fn task_line(task: &nextstep_core::Task) -> String {
    let impact = task.impact.map_or("-".to_string(), |i| i.to_string());
    let urgency = task.urgency.map_or("-".to_string(), |u| u.to_string());
    format!(
        "{:<44} {:<12} {}{}  {}",
        task.id,
        task.state.as_str(),
        impact,
        urgency,
        task.title
    )
}
