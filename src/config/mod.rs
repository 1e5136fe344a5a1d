//! Configuration module for fabtcg-bot.
//!
//! Loads configuration from environment variables (and `.env`, loaded by
//! `main` before anything else).

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::fabdb::DEFAULT_ENDPOINT;
use crate::metrics::MetricsOptions;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Errors while reading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Log verbosity for the crate's own targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown log level {other:?}, use error, warn, info or debug")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        })
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,

    /// Allowlisted user ids (comma-separated). Empty allows everyone.
    pub admin_ids: Vec<u64>,

    /// Listen address of the health and metrics server.
    pub http_addr: SocketAddr,

    pub log_level: LogLevel,

    pub metrics: MetricsOptions,

    // fabdb.net
    pub fabdb_endpoint: String,

    /// Whole-request timeout for fabdb.net calls. `None` when unset.
    pub fabdb_timeout: Option<Duration>,

    /// Deadline for a single inline card search.
    pub query_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;

        let admin_ids = match var("TELEGRAM_ADMINS") {
            Some(raw) => parse_ids(&raw)?,
            None => Vec::new(),
        };

        let raw_addr = var("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid("HTTP_ADDR", &raw_addr, e))?;

        let log_level = match var("LOG_LEVEL") {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| ConfigError::invalid("LOG_LEVEL", &raw, e))?,
            None => LogLevel::default(),
        };

        let metrics = MetricsOptions {
            enabled: bool_var(&var, "METRICS_ENABLED", true)?,
            prefix: var("METRICS_PREFIX").unwrap_or_default().trim().to_string(),
            runtime: bool_var(&var, "METRICS_RUNTIME", true)?,
            profile: bool_var(&var, "METRICS_PROFILE", false)?,
        };

        let fabdb_endpoint = var("FABDB_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Url::parse(fabdb_endpoint.trim())
            .map_err(|e| ConfigError::invalid("FABDB_ENDPOINT", &fabdb_endpoint, e))?;

        let fabdb_timeout = var("FABDB_TIMEOUT_SECS")
            .map(|raw| parse_secs("FABDB_TIMEOUT_SECS", &raw))
            .transpose()?;

        let query_timeout = match var("QUERY_TIMEOUT_SECS") {
            Some(raw) => parse_secs("QUERY_TIMEOUT_SECS", &raw)?,
            None => Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        };

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            admin_ids,
            http_addr,
            log_level,
            metrics,
            fabdb_endpoint: fabdb_endpoint.trim().to_string(),
            fabdb_timeout,
            query_timeout,
        })
    }

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> String {
        format!("fabtcg_bot={},teloxide=warn", self.log_level)
    }
}

fn parse_ids(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|e| ConfigError::invalid("TELEGRAM_ADMINS", s, e))
        })
        .collect()
}

fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        Ok(_) => Err(ConfigError::invalid(key, raw, "must be positive")),
        Err(e) => Err(ConfigError::invalid(key, raw, e)),
    }
}

fn bool_var(
    var: impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match var(key) {
        Some(raw) => {
            parse_bool(&raw).ok_or_else(|| ConfigError::invalid(key, &raw, "expected a boolean"))
        }
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
