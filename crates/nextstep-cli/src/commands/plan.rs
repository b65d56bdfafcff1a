//! Morning planning: ranked list and the day's priority picks.

use clap::Subcommand;
use nextstep_core::{TaskDb, ValidationError};

use super::{open_session, today, CliResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Ready tasks ranked by score
    Rank {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save today's priority tasks (replaces any earlier selection)
    Set {
        /// Task IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show today's priority tasks
    Show,
}

pub fn run(action: PlanAction) -> CliResult {
    let db = TaskDb::open()?;

    match action {
        PlanAction::Rank { json } => {
            let session = open_session(&db)?;
            let ranked = session.rank(&db)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else if ranked.is_empty() {
                println!("No Ready tasks.");
            } else {
                for (i, c) in ranked.iter().enumerate() {
                    let marker = if c.breakdown.prioritized { "*" } else { " " };
                    println!(
                        "{:>2}.{marker} {:>7.2}  {:<44} {}",
                        i + 1,
                        c.score(),
                        c.task.id,
                        c.task.title
                    );
                }
            }
        }
        PlanAction::Set { ids } => {
            for id in &ids {
                let task = db
                    .get_task(id)?
                    .ok_or_else(|| format!("task not found: {id}"))?;
                if task.state.is_terminal() {
                    return Err(ValidationError::InvalidValue {
                        field: "ids".into(),
                        message: format!("task {id} is {}", task.state),
                    }
                    .into());
                }
            }
            let saved = db.save_priorities(today(), &ids)?;
            println!("{saved} priorities saved for {}", today());
        }
        PlanAction::Show => {
            let priorities = db.load_priorities(today())?;
            let ids = priorities.active_ids();
            if priorities.is_expired() {
                println!("Today's priorities have expired (evening review started).");
            } else if ids.is_empty() {
                println!("No priorities for {}.", today());
            }
            for id in ids {
                match db.get_task(id)? {
                    Some(task) => println!("{id}  {}", task.title),
                    None => println!("{id}  (deleted)"),
                }
            }
        }
    }
    Ok(())
}
