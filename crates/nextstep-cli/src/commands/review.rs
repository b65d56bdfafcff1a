use clap::Subcommand;
use nextstep_core::TaskDb;
use tracing::info;

use super::{today, CliResult};

#[derive(Subcommand)]
pub enum ReviewAction {
    /// Start the evening review: today's priority boost ends
    Start,
}

pub fn run(action: ReviewAction) -> CliResult {
    let db = TaskDb::open()?;

    match action {
        ReviewAction::Start => {
            let day = today();
            let expired = db.expire_priorities(day)?;
            info!(%day, expired, "evening review started");
            println!("Evening review started; {expired} priorities expired for {day}.");
        }
    }
    Ok(())
}
