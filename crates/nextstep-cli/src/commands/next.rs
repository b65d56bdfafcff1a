//! The interactive "What Next?" loop.

use std::io::{self, BufRead, Write};

use clap::Args;
use nextstep_core::{Step, Suggestion, SuggestionSession, TaskDb};
use serde_json::json;

use super::{open_session, CliResult};

#[derive(Args)]
pub struct NextArgs {
    /// Draw one suggestion, print it as JSON and exit
    #[arg(long)]
    json: bool,
}

pub fn run(args: NextArgs) -> CliResult {
    let db = TaskDb::open()?;
    let mut session = open_session(&db)?;

    if args.json {
        let out = match session.begin(&db)? {
            Step::InProgress(tasks) => json!({ "in_progress": tasks }),
            Step::Suggest(s) => json!({
                "task": s.task,
                "rationale": s.rationale,
                "score": s.score,
                "probability": s.probability,
            }),
            Step::NoSuggestions => json!({ "task": null }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    interact(&mut session, &db, &mut stdin.lock(), &mut stdout.lock())
}

/// Read one trimmed, lowercased answer. `None` on end of input.
fn ask<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_ascii_lowercase()))
}

fn show<W: Write>(out: &mut W, s: &Suggestion) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Next: {}", s.task.title)?;
    writeln!(out, "  id:     {}", s.task.id)?;
    writeln!(out, "  why:    {}", s.rationale)?;
    writeln!(
        out,
        "  score:  {:.2} ({:.0}% chance)",
        s.score,
        s.probability * 100.0
    )?;
    Ok(())
}

fn interact<R: BufRead, W: Write>(
    session: &mut SuggestionSession,
    db: &TaskDb,
    input: &mut R,
    out: &mut W,
) -> CliResult {
    let mut step = session.begin(db)?;

    loop {
        step = match step {
            Step::InProgress(tasks) => {
                writeln!(out, "Already in progress:")?;
                for t in &tasks {
                    writeln!(out, "  - {} ({})", t.title, t.id)?;
                }
                match ask(input, out, "[c]ontinue or suggest [d]ifferent? ")?.as_deref() {
                    None => return Ok(()),
                    Some("c") | Some("continue") => {
                        session.continue_current()?;
                        writeln!(out, "Keep going.")?;
                        return Ok(());
                    }
                    Some("d") | Some("different") => session.suggest_different(db)?,
                    Some(_) => Step::InProgress(tasks),
                }
            }
            Step::NoSuggestions => {
                writeln!(out, "Nothing to suggest right now.")?;
                return Ok(());
            }
            Step::Suggest(s) => {
                show(out, &s)?;
                match ask(input, out, "[s]tart, [r]eject or take a [b]reak? ")?.as_deref() {
                    None => return Ok(()),
                    Some("s") | Some("start") => match session.start(db) {
                        Ok(task) => {
                            writeln!(out, "Started: {}", task.title)?;
                            return Ok(());
                        }
                        Err(e) if e.is_recoverable() => {
                            writeln!(out, "Could not start ({e}); refreshing.")?;
                            session.begin(db)?
                        }
                        Err(e) => return Err(e.into()),
                    },
                    Some("r") | Some("reject") => session.reject(db)?,
                    Some("b") | Some("break") => {
                        session.take_break()?;
                        writeln!(out, "Enjoy the break.")?;
                        return Ok(());
                    }
                    Some(_) => Step::Suggest(s),
                }
            }
        };
    }
}
