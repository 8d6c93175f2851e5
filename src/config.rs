//! Runtime configuration.
//!
//! Values come from built-in defaults, optionally a JSON file, and finally
//! `TEMPLE_LEDGER_*` environment variables.

use crate::domain::ticket::VisitDatePolicy;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);

pub const ENV_LOCK_TIMEOUT_MS: &str = "TEMPLE_LEDGER_LOCK_TIMEOUT_MS";
pub const ENV_MAX_COMMIT_RETRIES: &str = "TEMPLE_LEDGER_MAX_COMMIT_RETRIES";
pub const ENV_RETRY_BACKOFF_MS: &str = "TEMPLE_LEDGER_RETRY_BACKOFF_MS";
pub const ENV_VISIT_DATE_POLICY: &str = "TEMPLE_LEDGER_VISIT_DATE_POLICY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Longest a writer waits for the commit lock.
    pub lock_timeout_ms: u64,
    /// Extra attempts the orchestrator makes after a transient commit failure.
    pub max_commit_retries: u32,
    /// Delay before the first retry; later retries wait proportionally longer.
    pub retry_backoff_ms: u64,
    pub visit_date_policy: VisitDatePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
            max_commit_retries: 2,
            retry_backoff_ms: 25,
            visit_date_policy: VisitDatePolicy::Unrestricted,
        }
    }
}

impl LedgerConfig {
    /// Loads the optional JSON file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Applies overrides looked up by variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(ENV_LOCK_TIMEOUT_MS) {
            self.lock_timeout_ms = parse(ENV_LOCK_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_COMMIT_RETRIES) {
            self.max_commit_retries = parse(ENV_MAX_COMMIT_RETRIES, &value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_BACKOFF_MS) {
            self.retry_backoff_ms = parse(ENV_RETRY_BACKOFF_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_VISIT_DATE_POLICY) {
            self.visit_date_policy = value.parse()?;
        }
        Ok(self)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LedgerError::InvalidArgument(format!("{key} has invalid value '{value}'")))
}
