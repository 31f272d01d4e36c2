//! Application-level configuration loading: scoring, timing and capacity knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::state::scoring::DEFAULT_BASE_POINTS;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PINQUIZ_BACK_CONFIG_PATH";
/// Default location of the question-set catalog.
const DEFAULT_QUESTION_SETS_PATH: &str = "config/question_sets.json";
/// Shortest answer window a session will open a question with.
const MIN_TIME_LIMIT: Duration = Duration::from_secs(1);
/// Shortest inactivity window before a session is disposed.
const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// Shortest period between two registry sweeps.
const MIN_REAPER_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Points for an instant correct answer.
    pub base_points: u64,
    /// Answer window for questions without their own limit.
    pub default_time_limit: Duration,
    /// Live players admitted per session.
    pub max_players: usize,
    /// Inactivity after which a session is disposed.
    pub idle_timeout: Duration,
    /// How long an ended session stays readable.
    pub closed_retention: Duration,
    /// Period of the registry sweep for finished sessions.
    pub reaper_interval: Duration,
    /// JSON catalog read by the question-set provider.
    pub question_sets_path: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        base_points = app_config.base_points,
                        max_players = app_config.max_players,
                        "loaded configuration"
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
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    base_points: u64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "default_time_limit_ms")]
    default_time_limit: Duration,
    max_players: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "idle_timeout_ms")]
    idle_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "closed_retention_ms")]
    closed_retention: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "reaper_interval_ms")]
    reaper_interval: Duration,
    question_sets_path: PathBuf,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            base_points: DEFAULT_BASE_POINTS,
            default_time_limit: Duration::from_secs(20),
            max_players: 1000,
            idle_timeout: Duration::from_secs(30 * 60),
            closed_retention: Duration::from_secs(5 * 60),
            reaper_interval: Duration::from_secs(30),
            question_sets_path: PathBuf::from(DEFAULT_QUESTION_SETS_PATH),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            base_points: value.base_points,
            default_time_limit: value.default_time_limit.max(MIN_TIME_LIMIT),
            max_players: value.max_players.max(1),
            idle_timeout: value.idle_timeout.max(MIN_IDLE_TIMEOUT),
            closed_retention: value.closed_retention,
            reaper_interval: value.reaper_interval.max(MIN_REAPER_INTERVAL),
            question_sets_path: value.question_sets_path,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        question::tests::question,
        session::{AnswerSubmission, NewSession, SessionActor, SessionSettings},
    };

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "base_points": 500, "default_time_limit_ms": 15000 }"#)
                .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.base_points, 500);
        assert_eq!(config.default_time_limit, Duration::from_secs(15));
        assert_eq!(config.max_players, 1000);
        assert_eq!(config.closed_retention, Duration::from_secs(300));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<RawConfig>(r#"{ "colour": "red" }"#).is_err());
    }

    fn zero_config() -> AppConfig {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "max_players": 0,
                "reaper_interval_ms": 0,
                "default_time_limit_ms": 0,
                "idle_timeout_ms": 0
            }"#,
        )
        .unwrap();
        AppConfig::from(raw)
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let config = zero_config();
        assert_eq!(config.max_players, 1);
        assert_eq!(config.reaper_interval, MIN_REAPER_INTERVAL);
        assert_eq!(config.default_time_limit, MIN_TIME_LIMIT);
        assert_eq!(config.idle_timeout, MIN_IDLE_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_time_limit_still_accepts_answers() {
        let config = zero_config();
        let (handle, task) = SessionActor::spawn(
            NewSession {
                pin: "654321".parse().unwrap(),
                title: "Capitals".into(),
                host_id: "host-1".into(),
                questions: vec![question(1, 0)],
            },
            SessionSettings::from(&config),
        )
        .unwrap();
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start("host-1").await.unwrap();

        let outcome = handle
            .submit_answer(AnswerSubmission {
                player: "Ana".into(),
                question_id: 1,
                option: Some(0),
                elapsed_ms: Some(0),
            })
            .await
            .unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.points, 1000);
        assert!(!task.is_finished());
    }
}
