//! Application-level configuration loading, including the seeded rounds and teams.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREBOARD_BACK_CONFIG_PATH";
/// Number of rounds provisioned when the config does not name any.
const DEFAULT_ROUND_COUNT: usize = 5;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    title: String,
    rounds: Vec<String>,
    teams: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        rounds = app_config.rounds.len(),
                        teams = app_config.teams.len(),
                        "loaded event configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if config.teams.is_empty() {
            warn!("no teams configured; the board stays empty until the config names some");
        }

        config
    }

    /// Display title of the event.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Round names to provision, in board order.
    pub fn round_names(&self) -> &[String] {
        &self.rounds
    }

    /// Team names to provision.
    pub fn team_names(&self) -> &[String] {
        &self.teams
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Scoreboard".to_string(),
            rounds: default_rounds(),
            teams: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    rounds: Vec<String>,
    #[serde(default)]
    teams: Vec<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            title: value.title.unwrap_or(defaults.title),
            rounds: if value.rounds.is_empty() {
                defaults.rounds
            } else {
                value.rounds
            },
            teams: value.teams,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in round names used when the configuration does not provide any.
fn default_rounds() -> Vec<String> {
    (1..=DEFAULT_ROUND_COUNT)
        .map(|ordinal| format!("Round {ordinal}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_provide_five_rounds_and_no_teams() {
        let config = AppConfig::default();
        assert_eq!(config.round_names().len(), DEFAULT_ROUND_COUNT);
        assert_eq!(config.round_names()[0], "Round 1");
        assert!(config.team_names().is_empty());
    }

    #[test]
    fn raw_config_fills_missing_fields_from_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"teams": ["Blue", "Red"]}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.title(), "Scoreboard");
        assert_eq!(config.round_names().len(), DEFAULT_ROUND_COUNT);
        assert_eq!(config.team_names(), ["Blue", "Red"]);
    }
}
