//! Subcommands plus the plumbing they share.

pub mod config;
pub mod languages;
pub mod plan;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use termsync_client::{ClientConfig, HttpClient};
use termsync_core::{config as core_config, LocalKey, Settings};
use termsync_sync::DiffOptions;

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Global {
    pub config: Option<PathBuf>,
}

impl Global {
    pub fn settings(&self) -> Result<Settings> {
        core_config::load(self.config.as_deref()).context("failed to load configuration")
    }
}

/// Inputs of a diff, shared by `plan` and `sync`.
#[derive(Args, Debug, Clone)]
pub struct DiffInputArgs {
    /// JSON array of local keys as produced by the key detector.
    #[arg(long, value_name = "FILE")]
    pub keys: Option<PathBuf>,

    /// Delete remote terms that no longer exist locally.
    #[arg(long)]
    pub delete_extraneous: bool,

    /// Language to check for missing translations (repeatable; overrides config).
    #[arg(long = "lang", value_name = "CODE")]
    pub langs: Vec<String>,
}

impl DiffInputArgs {
    pub fn options(&self, settings: &Settings) -> DiffOptions {
        DiffOptions {
            delete_extraneous: self.delete_extraneous,
            include_langs: if self.langs.is_empty() {
                settings.include_langs.clone()
            } else {
                self.langs.clone()
            },
        }
    }

    pub fn load_keys(&self) -> Result<Vec<LocalKey>> {
        let path = self
            .keys
            .as_deref()
            .context("provide a keys file with --keys")?;
        load_keys(path)
    }
}

pub fn load_keys(path: &Path) -> Result<Vec<LocalKey>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read keys file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse keys file {}", path.display()))
}

/// Build the HTTP client; fails before any network call when the token is missing.
pub fn client(settings: &Settings) -> Result<HttpClient> {
    let config = ClientConfig::from_settings(settings).context("incomplete remote configuration")?;
    HttpClient::new(config).context("cannot create API client")
}
