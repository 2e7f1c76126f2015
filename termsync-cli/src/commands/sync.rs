//! `termsync sync`: push a plan to the remote project.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use termsync_core::{plan_file, Plan, Settings, SyncResult};
use termsync_sync::{
    build_plan, execute_sync, preview, MachineTranslate, PhaseFailurePolicy, RateLimitedExecutor,
    SyncOptions,
};

use super::{client, plan::print_plan, DiffInputArgs, Global};

/// Arguments for `termsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub input: DiffInputArgs,

    /// Execute a plan written by `termsync plan --out` instead of computing one.
    #[arg(long, value_name = "FILE", conflicts_with = "keys")]
    pub plan: Option<PathBuf>,

    /// Report what would change without calling the remote service.
    #[arg(long)]
    pub dry_run: bool,

    /// Items per remote call (overrides config).
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Minimum milliseconds between remote calls (overrides config).
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Record machine-translation intent; optionally limited to these languages.
    #[arg(
        long,
        value_name = "LANGS",
        num_args = 0..=1,
        default_missing_value = "",
        value_delimiter = ','
    )]
    pub machine_translate: Option<Vec<String>>,

    /// Keep running later phases after one fails, reporting each failure
    /// under its phase name.
    #[arg(long)]
    pub isolate_phases: bool,

    /// Emit the result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, global: &Global) -> Result<()> {
        let settings = global.settings()?;
        let options = self.options(&settings)?;

        let result = match (&self.plan, self.dry_run) {
            (Some(path), true) => {
                let plan = load_plan(path)?;
                self.show_plan(&plan);
                preview(&plan, &options.machine_translate)
            }
            (Some(path), false) => {
                let plan = load_plan(path)?;
                let api = client(&settings)?;
                let mut executor = RateLimitedExecutor::new();
                execute_sync(&api, &mut executor, &plan, &options)
            }
            (None, _) => {
                let keys = self.input.load_keys()?;
                let api = client(&settings)?;
                let mut executor = RateLimitedExecutor::new();
                let plan = build_plan(
                    &api,
                    &mut executor,
                    &keys,
                    &self.input.options(&settings),
                    settings.read_delay,
                )
                .context("failed to compute plan")?;
                if options.dry_run {
                    self.show_plan(&plan);
                }
                execute_sync(&api, &mut executor, &plan, &options)
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("failed to serialize result")?
            );
        } else {
            print_result(&result);
        }

        if !result.is_success() {
            bail!(
                "sync {} finished with {} error(s)",
                result.audit_id,
                result.errors.len()
            );
        }
        Ok(())
    }

    fn options(&self, settings: &Settings) -> Result<SyncOptions> {
        let batch_size = self.batch_size.unwrap_or(settings.batch_size);
        if batch_size == 0 {
            bail!("--batch-size must be at least 1");
        }
        Ok(SyncOptions {
            batch_size,
            dry_run: self.dry_run,
            rate_limit_delay: self
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(settings.rate_limit_delay),
            machine_translate: machine_translate(self.machine_translate.as_deref()),
            failure_policy: if self.isolate_phases {
                PhaseFailurePolicy::Isolate
            } else {
                PhaseFailurePolicy::StopOnFirstFailure
            },
        })
    }

    fn show_plan(&self, plan: &Plan) {
        if !self.json {
            print_plan(plan);
        }
    }
}

fn load_plan(path: &std::path::Path) -> Result<Plan> {
    plan_file::load(path).with_context(|| format!("failed to load plan {}", path.display()))
}

fn machine_translate(flag: Option<&[String]>) -> MachineTranslate {
    match flag {
        None => MachineTranslate::Off,
        Some(langs) => {
            let langs: Vec<String> = langs
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            if langs.is_empty() {
                MachineTranslate::AllMissing
            } else {
                MachineTranslate::Languages(langs)
            }
        }
    }
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "operation")]
    operation: String,
    #[tabled(rename = "message")]
    message: String,
}

fn print_result(result: &SyncResult) {
    let prefix = if result.dry_run { "[dry-run] " } else { "" };
    let mark = if result.is_success() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!(
        "{prefix}{mark} {} created, {} updated, {} deleted ({} batches)",
        result.created, result.updated, result.deleted, result.rate_limit_waits
    );
    println!("  audit id: {}", result.audit_id);
    if !result.mt_triggered.is_empty() {
        println!(
            "  machine translation requested for: {}",
            result.mt_triggered.join(", ")
        );
    }
    if !result.errors.is_empty() {
        let rows: Vec<ErrorRow> = result
            .errors
            .iter()
            .map(|e| ErrorRow {
                operation: e.operation.clone(),
                message: e.message.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}
