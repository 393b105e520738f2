use crate::{
    cli::commands::{ARG_BASE_URL, ARG_DATA_DIR, ARG_TIMEOUT, DEFAULT_BASE_URL, DEFAULT_DATA_DIR},
    config::{ClientConfig, DEFAULT_TIMEOUT_SECONDS},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Options shared by every subcommand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalArgs {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub timeout_seconds: u64,
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl GlobalArgs {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        let defaults = Self::default();
        Self {
            base_url: matches
                .get_one::<String>(ARG_BASE_URL)
                .cloned()
                .unwrap_or(defaults.base_url),
            data_dir: matches
                .get_one::<String>(ARG_DATA_DIR)
                .map_or(defaults.data_dir, PathBuf::from),
            timeout_seconds: matches
                .get_one::<u64>(ARG_TIMEOUT)
                .copied()
                .unwrap_or(defaults.timeout_seconds),
        }
    }

    /// # Errors
    /// Returns an error if the base URL is not a usable http(s) origin.
    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig::new(&self.base_url)
            .with_context(|| format!("invalid base URL: {}", self.base_url))?
            .with_timeout(Duration::from_secs(self.timeout_seconds)))
    }
}
