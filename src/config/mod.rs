//! Configuration module for stockcast.
//!
//! Settings are read from environment variables (a `.env` file is loaded by
//! the binary through `dotenvy`), organized by concern: Analysis and Alerts.
//! Parsing goes through a lookup function so tests can supply variables
//! without touching the process environment.

mod alert_config;
mod analysis_config;

pub use alert_config::{AlertEnvConfig, AlertTarget};
pub use analysis_config::{AnalysisEnvConfig, ModelKind};

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Environment-style variable lookup.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub analysis: AnalysisEnvConfig,
    pub alerts: AlertEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        let analysis =
            AnalysisEnvConfig::from_lookup(lookup).context("Failed to load analysis config")?;
        let alerts = AlertEnvConfig::from_lookup(lookup).context("Failed to load alert config")?;
        Ok(Self { analysis, alerts })
    }
}

/// Parses `key` with `FromStr`, falling back to `default` when unset.
pub(crate) fn parse_var<T>(lookup: Lookup, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key)),
        None => Ok(default),
    }
}
