//! `termsync languages`: list the remote project's languages.

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use termsync_client::{Language, TermsApi};
use termsync_sync::RateLimitedExecutor;

use super::{client, Global};

/// Arguments for `termsync languages`.
#[derive(Args, Debug)]
pub struct LanguagesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct LanguageRow {
    #[tabled(rename = "code")]
    code: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "translations")]
    translations: u64,
    #[tabled(rename = "progress")]
    progress: String,
}

impl LanguagesArgs {
    pub fn run(self, global: &Global) -> Result<()> {
        let settings = global.settings()?;
        let api = client(&settings)?;
        let mut executor = RateLimitedExecutor::new();
        let languages = executor
            .run(settings.read_delay, || api.list_languages())
            .context("failed to list languages")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&languages)
                    .context("failed to serialize languages")?
            );
            return Ok(());
        }
        print_table(languages);
        Ok(())
    }
}

fn print_table(languages: Vec<Language>) {
    if languages.is_empty() {
        println!("The project has no languages yet.");
        return;
    }
    let rows: Vec<LanguageRow> = languages
        .into_iter()
        .map(|l| LanguageRow {
            code: l.code,
            name: l.name,
            translations: l.translations,
            progress: format!("{:.1}%", l.percentage),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
