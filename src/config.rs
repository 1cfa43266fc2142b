// src/config.rs

use crate::constants::*;
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub history_limit: usize,
    pub tick_interval: Duration,
    /// `None` keeps history in memory only.
    pub database_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            history_limit: HISTORY_LIMIT,
            tick_interval: TICK_INTERVAL,
            database_path: None,
        }
    }
}

impl EngineConfig {
    /// Entries kept in memory and in the database. Never below one.
    pub fn history_capacity(&self) -> usize {
        self.history_limit.max(1)
    }

    /// Defaults overlaid with `QUIZ_HISTORY_DB`, `QUIZ_HISTORY_LIMIT` and
    /// `QUIZ_NO_HISTORY_DB`. Without an explicit path the database goes under
    /// the platform data directory.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = EngineConfig::default();

        if let Some(raw) = lookup(ENV_HISTORY_LIMIT) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.history_limit = n,
                _ => warn!(
                    "[Config] Ignoring {}={:?}, using {}",
                    ENV_HISTORY_LIMIT, raw, HISTORY_LIMIT
                ),
            }
        }

        let disabled = lookup(ENV_NO_HISTORY_DB)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if !disabled {
            config.database_path = lookup(ENV_HISTORY_DB)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .or_else(default_database_path);
        }

        config
    }
}

pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(DEFAULT_DB_DIR).join(DEFAULT_DB_FILE))
}
