//! `termsync plan`: compute and preview the changes a sync would make.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use termsync_core::{plan_file, Plan, TermChanges};
use termsync_sync::{build_plan, RateLimitedExecutor};

use super::{client, DiffInputArgs, Global};

/// Arguments for `termsync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: DiffInputArgs,

    /// Emit the plan as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also write the plan to this file, for a later `termsync sync --plan`.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

impl PlanArgs {
    pub fn run(self, global: &Global) -> Result<()> {
        let settings = global.settings()?;
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

        if let Some(out) = &self.out {
            plan_file::save(out, &plan)
                .with_context(|| format!("failed to write plan to {}", out.display()))?;
            tracing::info!(path = %out.display(), "plan written");
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("failed to serialize plan")?
            );
        } else {
            print_plan(&plan);
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "term")]
    term: String,
    #[tabled(rename = "detail")]
    detail: String,
}

#[derive(Tabled)]
struct MissingRow {
    #[tabled(rename = "language")]
    language: String,
    #[tabled(rename = "missing")]
    missing: usize,
    #[tabled(rename = "obsolete")]
    obsolete: usize,
}

pub fn print_plan(plan: &Plan) {
    let stats = plan.stats();
    println!(
        "Plan | {} to add | {} to update | {} to delete | {} missing translations",
        stats.adds.to_string().green(),
        stats.updates.to_string().yellow(),
        stats.deletes.to_string().red(),
        stats.missing,
    );
    if plan.is_empty() {
        println!("{}", "Remote terms are up to date.".green());
    }

    let mut rows: Vec<ChangeRow> = Vec::new();
    rows.extend(plan.add_terms().iter().map(|t| ChangeRow {
        action: "add".green().to_string(),
        term: t.term.clone(),
        detail: t.tags.join(", "),
    }));
    rows.extend(plan.update_terms().iter().map(|u| ChangeRow {
        action: "update".yellow().to_string(),
        term: u.term.clone(),
        detail: changed_fields(&u.changes),
    }));
    rows.extend(plan.delete_terms().iter().map(|t| ChangeRow {
        action: "delete".red().to_string(),
        term: t.clone(),
        detail: String::new(),
    }));
    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    let languages: Vec<MissingRow> = plan
        .missing_translations()
        .iter()
        .map(|(lang, terms)| MissingRow {
            language: lang.clone(),
            missing: terms.len(),
            obsolete: plan
                .obsolete_translations()
                .get(lang)
                .map_or(0, Vec::len),
        })
        .collect();
    if !languages.is_empty() {
        let mut table = Table::new(languages);
        table.with(Style::rounded());
        println!("{table}");
    }
}

fn changed_fields(changes: &TermChanges) -> String {
    let mut fields = Vec::new();
    if changes.context.is_some() {
        fields.push("context");
    }
    if changes.reference.is_some() {
        fields.push("reference");
    }
    if changes.tags.is_some() {
        fields.push("tags");
    }
    if changes.comment.is_some() {
        fields.push("comment");
    }
    fields.join(", ")
}
