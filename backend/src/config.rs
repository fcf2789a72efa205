//! Environment-driven application configuration.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `CWRGEN_PORT` | 3000 | HTTP listen port |
//! | `CWRGEN_DEFAULT_VERSION` | 2.1 | CWR version when a request names none |
//! | `CWRGEN_RECIPIENT` | (empty) | Default receiving society code |
//! | `CWRGEN_DEFAULT_FEE` | 25 | Admin fee percent when nothing else sets one |
//!
//! Unparseable values fall back to the default. Command-line flags and
//! request fields take precedence over everything here.

use std::env;

use crate::cwr::CwrVersion;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ADMIN_FEE: f64 = 25.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub default_version: CwrVersion,
    pub recipient_society: String,
    pub default_fee: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_version: CwrVersion::default(),
            recipient_society: String::new(),
            default_fee: DEFAULT_ADMIN_FEE,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            port: read("CWRGEN_PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
            default_version: read("CWRGEN_DEFAULT_VERSION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_version),
            recipient_society: read("CWRGEN_RECIPIENT").unwrap_or(defaults.recipient_society),
            default_fee: read("CWRGEN_DEFAULT_FEE")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|f| (0.0..=100.0).contains(f))
                .unwrap_or(defaults.default_fee),
        }
    }
}
