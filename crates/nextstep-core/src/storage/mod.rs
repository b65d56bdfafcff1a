mod config;
pub mod migrations;
pub mod task_db;

pub use config::{Config, ScoringConfig, SessionConfig, ENV_OVERRIDES};
pub use task_db::TaskDb;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `NEXTSTEP_HOME` overrides the location entirely. Otherwise this is
/// `~/.config/nextstep/`, or `~/.config/nextstep-dev/` when `NEXTSTEP_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("NEXTSTEP_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("NEXTSTEP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("nextstep-dev")
            } else {
                base_dir.join("nextstep")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
