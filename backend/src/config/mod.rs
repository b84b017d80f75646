//! Configuration module for the AutoQuote backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Largest notification window accepted, in days.
pub const MAX_NOTIFY_WINDOW_DAYS: i64 = 90;

/// Largest overdue lookback accepted, in days.
pub const MAX_OVERDUE_LOOKBACK_DAYS: i64 = 3660;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for dashboard API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Default look-ahead for due-soon notifications
    pub notify_window_days: i64,
    /// How far back unpaid expense instances still count as overdue
    pub overdue_lookback_days: i64,
}

/// A configuration value that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("AUTOQUOTE_API_PSK")
            .ok()
            .filter(|psk| !psk.trim().is_empty());

        let db_path = env::var("AUTOQUOTE_DB_PATH")
            .unwrap_or_else(|_| "./data/autoquote.sqlite".to_string())
            .into();

        let bind_addr = env::var("AUTOQUOTE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError {
                var: "AUTOQUOTE_BIND_ADDR",
                message: e.to_string(),
            })?;

        let log_level = env::var("AUTOQUOTE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let notify_window_days = days_var("AUTOQUOTE_NOTIFY_WINDOW_DAYS", 7)?;
        if notify_window_days > MAX_NOTIFY_WINDOW_DAYS {
            return Err(ConfigError {
                var: "AUTOQUOTE_NOTIFY_WINDOW_DAYS",
                message: format!("must be at most {}", MAX_NOTIFY_WINDOW_DAYS),
            });
        }

        let overdue_lookback_days = days_var("AUTOQUOTE_OVERDUE_LOOKBACK_DAYS", 90)?;
        if overdue_lookback_days > MAX_OVERDUE_LOOKBACK_DAYS {
            return Err(ConfigError {
                var: "AUTOQUOTE_OVERDUE_LOOKBACK_DAYS",
                message: format!("must be at most {}", MAX_OVERDUE_LOOKBACK_DAYS),
            });
        }

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            notify_window_days,
            overdue_lookback_days,
        })
    }
}

fn days_var(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    let Ok(raw) = env::var(var) else {
        return Ok(default);
    };

    match raw.trim().parse::<i64>() {
        Ok(days) if days >= 0 => Ok(days),
        Ok(_) => Err(ConfigError {
            var,
            message: "must not be negative".to_string(),
        }),
        Err(e) => Err(ConfigError {
            var,
            message: e.to_string(),
        }),
    }
}
