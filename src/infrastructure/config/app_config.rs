use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::application::services::due_task_scanner::DEFAULT_LOOKAHEAD_MINUTES;
use crate::infrastructure::notifications::mailgun_sender::DEFAULT_API_BASE;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "Missing required environment variable {}", var),
            ConfigError::Invalid { var, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, var, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_base: String,
    pub domain: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

/// Process settings, read from the environment (and `.env`) at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub timezone: Tz,
    pub scan_interval: Duration,
    pub lookahead: chrono::Duration,
    pub mailgun: MailgunConfig,
    pub log_level: Level,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source; unset and blank values take the default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let scan_minutes: u64 = parse_or(&get, "SCAN_INTERVAL_MINUTES", 10)?;
        let lookahead_minutes: u32 = parse_or(&get, "LOOKAHEAD_MINUTES", DEFAULT_LOOKAHEAD_MINUTES)?;
        if scan_minutes == 0 {
            return Err(invalid("SCAN_INTERVAL_MINUTES", "0", "must be at least 1"));
        }
        let scan_secs = scan_minutes
            .checked_mul(60)
            .ok_or_else(|| invalid("SCAN_INTERVAL_MINUTES", &scan_minutes.to_string(), "too large"))?;

        let timezone = match get("APP_TIMEZONE") {
            Some(name) => Tz::from_str(&name).map_err(|e| invalid("APP_TIMEZONE", &name, &e.to_string()))?,
            None => chrono_tz::UTC,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(level) => Level::from_str(&level).map_err(|e| invalid("LOG_LEVEL", &level, &e.to_string()))?,
            None => Level::INFO,
        };

        let mailgun = MailgunConfig {
            api_base: get("MAILGUN_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            domain: get("EMAIL_DOMAIN").ok_or(ConfigError::Missing("EMAIL_DOMAIN"))?,
            api_key: get("MAILGUN_API_KEY").ok_or(ConfigError::Missing("MAILGUN_API_KEY"))?,
            timeout_secs: parse_or(&get, "SEND_TIMEOUT_SECONDS", 10)?,
        };

        Ok(Self {
            database_path: PathBuf::from(get("DATABASE_PATH").unwrap_or_else(|| "medbuddy.db".to_string())),
            timezone,
            scan_interval: Duration::from_secs(scan_secs),
            lookahead: chrono::Duration::minutes(i64::from(lookahead_minutes)),
            mailgun,
            log_level,
        })
    }
}

/// Level to install logging at before the config is known to be valid,
/// so a bad config can still be reported through tracing
pub fn startup_log_level(config: &Result<AppConfig, ConfigError>) -> Level {
    config.as_ref().map(|c| c.log_level).unwrap_or(Level::INFO)
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
        None => Ok(default),
    }
}
