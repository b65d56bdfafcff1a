//! TOML-based application configuration.
//!
//! Stores:
//! - Scoring weights and the scoring strategy name
//! - Session options (optional fixed seed for reproducible draws)
//!
//! Configuration is stored at `~/.config/nextstep/config.toml`. Weights can
//! be overridden per process with `NEXTSTEP_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::scoring::{AdditiveWeighted, ScoringWeights, StrategyRegistry};

/// Environment variable overrides, applied after the file is read.
pub const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("NEXTSTEP_IMPACT_WEIGHT", "impact_weight"),
    ("NEXTSTEP_URGENCY_WEIGHT", "urgency_weight"),
    ("NEXTSTEP_STRATEGIC_NUDGE_BOOST", "strategic_nudge_boost"),
    ("NEXTSTEP_DAMPENING_FACTOR", "dampening_factor"),
    ("NEXTSTEP_PRIORITY_MULTIPLIER", "priority_multiplier"),
];

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(flatten)]
    pub weights: ScoringWeights,
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

/// Suggestion session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed generator seed. Unset means a fresh OS seed per process.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/nextstep/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_strategy() -> String {
    AdditiveWeighted::NAME.into()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            strategy: default_strategy(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
        optional: bool,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let unset = value.is_empty() || value.eq_ignore_ascii_case("none");
                let new_value = match existing {
                    _ if optional && unset => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    // Unset optional values only hold numbers.
                    serde_json::Value::Null => parse_number(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file path under the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default path, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or an
    /// override variable holds something that is not a number.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::load_from(&Self::path()?)?;
        cfg.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Startup path: [`Config::load`] plus weight validation.
    ///
    /// # Errors
    ///
    /// Any weight that is not a finite number > 0 is fatal.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let cfg = Self::load()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit file, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `LoadFailed` if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `NEXTSTEP_*` weight overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns `ParseFailed` for a value that is not a number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, field) in ENV_OVERRIDES {
            let Some(raw) = lookup(var) else {
                continue;
            };
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::ParseFailed(format!("{var}={raw} is not a number")))?;
            let w = &mut self.scoring.weights;
            match field {
                "impact_weight" => w.impact_weight = value,
                "urgency_weight" => w.urgency_weight = value,
                "strategic_nudge_boost" => w.strategic_nudge_boost = value,
                "dampening_factor" => w.dampening_factor = value,
                _ => w.priority_multiplier = value,
            }
        }
        Ok(())
    }

    /// Check every weight is a finite number > 0 and the strategy is registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.weights.validate()?;
        StrategyRegistry::new()
            .get(&self.scoring.strategy)
            .map_err(|e| ConfigError::InvalidValue {
                key: "scoring.strategy".into(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Persist to the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        // Keys that default to null are optional; "none" or "" clears them.
        let optional = serde_json::to_value(Self::default())
            .ok()
            .as_ref()
            .and_then(|defaults| Self::get_json_value_by_path(defaults, key))
            .is_some_and(serde_json::Value::is_null);
        Self::set_json_value_by_path(&mut json, key, value, optional)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// All leaf keys with their current values, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        return Some(serde_json::Value::Number(n.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
}
