//! `termsync config`: show the resolved configuration, token masked.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use termsync_core::Settings;

use super::Global;

/// Arguments for `termsync config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ConfigJson {
    source: Option<String>,
    api_token: Option<String>,
    project_id: Option<String>,
    base_url: String,
    batch_size: usize,
    rate_limit_delay_ms: u128,
    read_delay_ms: u128,
    include_langs: Vec<String>,
    request_timeout_secs: u64,
}

impl From<&Settings> for ConfigJson {
    fn from(s: &Settings) -> Self {
        Self {
            source: s.source.as_ref().map(|p| p.display().to_string()),
            api_token: s.masked_token(),
            project_id: s.project_id.clone(),
            base_url: s.base_url.clone(),
            batch_size: s.batch_size,
            rate_limit_delay_ms: s.rate_limit_delay.as_millis(),
            read_delay_ms: s.read_delay.as_millis(),
            include_langs: s.include_langs.clone(),
            request_timeout_secs: s.request_timeout.as_secs(),
        }
    }
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "setting")]
    key: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl ConfigArgs {
    pub fn run(self, global: &Global) -> Result<()> {
        let settings = global.settings()?;
        let view = ConfigJson::from(&settings);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&view).context("failed to serialize config")?
            );
            return Ok(());
        }

        let unset = || "(unset)".to_string();
        let rows = vec![
            Row {
                key: "source",
                value: view.source.unwrap_or_else(|| "(defaults)".to_string()),
            },
            Row {
                key: "api_token",
                value: view.api_token.unwrap_or_else(unset),
            },
            Row {
                key: "project_id",
                value: view.project_id.unwrap_or_else(unset),
            },
            Row {
                key: "base_url",
                value: view.base_url,
            },
            Row {
                key: "batch_size",
                value: view.batch_size.to_string(),
            },
            Row {
                key: "rate_limit_delay_ms",
                value: view.rate_limit_delay_ms.to_string(),
            },
            Row {
                key: "read_delay_ms",
                value: view.read_delay_ms.to_string(),
            },
            Row {
                key: "include_langs",
                value: view.include_langs.join(", "),
            },
            Row {
                key: "request_timeout_secs",
                value: view.request_timeout_secs.to_string(),
            },
        ];
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
