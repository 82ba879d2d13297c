//! Environment-driven configuration

use crate::history::HistoryPolicy;
use crate::llm::{LlmConfig, RetryConfig};
use crate::sentiment::DEFAULT_ALPHA;
use crate::state_machine::CoachContext;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub session_ttl: Duration,
    pub retry: RetryConfig,
    pub history: HistoryPolicy,
    pub llm: LlmConfig,
}

impl Config {
    /// Read from the process environment, after loading `.env` if present
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; invalid numbers fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let history_defaults = HistoryPolicy::default();
        let retry_defaults = RetryConfig::default();

        let db_path = lookup("STEPCOACH_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.stepcoach/sessions.db"))
            },
            PathBuf::from,
        );

        Self {
            port: parse_or(&lookup, "STEPCOACH_PORT", DEFAULT_PORT),
            db_path,
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "STEPCOACH_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )),
            retry: RetryConfig {
                max_retries: parse_or(&lookup, "STEPCOACH_MAX_RETRIES", retry_defaults.max_retries),
                base_delay: lookup("STEPCOACH_RETRY_DELAY_MS")
                    .and_then(|v| parse_value::<u64>("STEPCOACH_RETRY_DELAY_MS", &v))
                    .map_or(retry_defaults.base_delay, Duration::from_millis),
                ..retry_defaults
            },
            history: HistoryPolicy {
                max_messages: parse_or(
                    &lookup,
                    "STEPCOACH_MAX_HISTORY",
                    history_defaults.max_messages,
                ),
                budget_bytes: parse_or(
                    &lookup,
                    "STEPCOACH_HISTORY_BUDGET_BYTES",
                    history_defaults.budget_bytes,
                ),
                ..history_defaults
            },
            llm: LlmConfig::from_lookup(&lookup),
        }
    }

    /// Inputs for the pure transition function
    pub fn coach_context(&self) -> CoachContext {
        CoachContext {
            history: self.history,
            ema_alpha: DEFAULT_ALPHA,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|v| parse_value(name, &v))
        .unwrap_or(default)
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(variable = name, value, "Invalid numeric setting, using default");
    }
    parsed
}
