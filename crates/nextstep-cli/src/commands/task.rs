//! Task management commands for CLI.

use clap::Subcommand;
use nextstep_core::{Impact, Task, TaskDb, TaskMutator, TaskState, Urgency};

use super::{task_line, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new Ready task
    Add {
        /// Task title
        title: String,
        /// Impact category: A (highest) to D
        #[arg(long)]
        impact: Option<Impact>,
        /// Urgency category: 1 (most urgent) to 4
        #[arg(long)]
        urgency: Option<Urgency>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by state (ready, in_progress, blocked, parked, completed, cancelled)
        #[arg(long)]
        state: Option<TaskState>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show task details as JSON
    Show {
        /// Task ID
        id: String,
    },
    /// Move a task to another state
    Move {
        /// Task ID
        id: String,
        /// Target state
        state: TaskState,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let db = TaskDb::open()?;

    match action {
        TaskAction::Add {
            title,
            impact,
            urgency,
            description,
        } => {
            if title.trim().is_empty() {
                return Err("task title must not be empty".into());
            }
            let mut task = Task::new(title);
            task.impact = impact;
            task.urgency = urgency;
            task.description = description;
            db.create_task(&task)?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List { state, json } => {
            let tasks = match state {
                Some(s) => db.list_by_states(&[s])?,
                None => db.list_tasks()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in &tasks {
                    println!("{}", task_line(task));
                }
            }
        }
        TaskAction::Show { id } => match db.get_task(&id)? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => return Err(format!("task not found: {id}").into()),
        },
        TaskAction::Move { id, state } => {
            let task = db.transition(&id, state)?;
            println!("{} -> {}", task.id, task.state);
        }
        TaskAction::Delete { id } => {
            if !db.delete_task(&id)? {
                return Err(format!("task not found: {id}").into());
            }
            println!("Task deleted: {id}");
        }
    }
    Ok(())
}
