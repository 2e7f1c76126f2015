//! Execution coordinator.
//!
//! [`execute_sync`] turns a [`Plan`] into remote calls: additions, then
//! updates, then deletions, each cut into batches. Remote failures never
//! escape; they land in [`SyncResult::errors`] next to whatever counts the
//! server reported before the failure.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use termsync_client::{ApiError, TermCounts, TermsApi};
use termsync_core::{OperationError, Plan, SyncResult};

use crate::batch::run_batches;
use crate::executor::{RateLimitedExecutor, Sleeper};
use crate::observer::{Phase, SyncObserver};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(20);

/// Which languages to record as machine-translation targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineTranslate {
    #[default]
    Off,
    /// Every language with at least one missing translation.
    AllMissing,
    /// Exactly these languages. An empty list behaves like `AllMissing`.
    Languages(Vec<String>),
}

impl MachineTranslate {
    /// Target languages for `plan`; empty when off or nothing is missing.
    pub fn resolve(&self, plan: &Plan) -> Vec<String> {
        if plan.stats().missing == 0 {
            return Vec::new();
        }
        match self {
            MachineTranslate::Off => Vec::new(),
            MachineTranslate::Languages(langs) if !langs.is_empty() => langs.clone(),
            MachineTranslate::AllMissing | MachineTranslate::Languages(_) => plan
                .missing_translations()
                .iter()
                .filter(|(_, terms)| !terms.is_empty())
                .map(|(lang, _)| lang.clone())
                .collect(),
        }
    }
}

/// What happens to later phases once one phase fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFailurePolicy {
    /// Record the failure as `sync` and skip everything after it.
    #[default]
    StopOnFirstFailure,
    /// Record the failure under the phase name and keep going.
    Isolate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub batch_size: usize,
    pub dry_run: bool,
    /// Minimum spacing between two mutating calls.
    pub rate_limit_delay: Duration,
    pub machine_translate: MachineTranslate,
    pub failure_policy: PhaseFailurePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            machine_translate: MachineTranslate::Off,
            failure_policy: PhaseFailurePolicy::StopOnFirstFailure,
        }
    }
}

/// Projected result of `plan` without any remote call.
pub fn preview(plan: &Plan, machine_translate: &MachineTranslate) -> SyncResult {
    let mut result = SyncResult::start(true);
    let stats = plan.stats();
    result.created = stats.adds as u64;
    result.updated = stats.updates as u64;
    result.deleted = stats.deletes as u64;
    result.mt_triggered = machine_translate.resolve(plan);
    result.finished_at = Some(Utc::now());
    tracing::info!(
        audit_id = %result.audit_id,
        adds = stats.adds,
        updates = stats.updates,
        deletes = stats.deletes,
        "dry run, no remote calls"
    );
    result
}

/// Apply `plan` to the remote project, or preview it when `dry_run` is set.
pub fn execute_sync<A, S, O>(
    api: &A,
    executor: &mut RateLimitedExecutor<S, O>,
    plan: &Plan,
    options: &SyncOptions,
) -> SyncResult
where
    A: TermsApi + ?Sized,
    S: Sleeper,
    O: SyncObserver,
{
    if options.dry_run {
        return preview(plan, &options.machine_translate);
    }

    let mut result = SyncResult::start(false);
    let span = tracing::info_span!("sync", audit_id = %result.audit_id);
    let _entered = span.enter();

    if options.batch_size == 0 {
        result.errors.push(OperationError {
            operation: "sync".to_string(),
            message: crate::SyncError::InvalidBatchSize.to_string(),
        });
        result.finished_at = Some(Utc::now());
        return result;
    }

    let deletes = plan.delete_refs();
    let completed = run_phase(
        executor,
        Phase::Add,
        plan.add_terms(),
        options,
        &mut result,
        |r, c| r.created += c.added,
        |chunk| api.add_terms(chunk),
    ) && run_phase(
        executor,
        Phase::Update,
        plan.update_terms(),
        options,
        &mut result,
        |r, c| r.updated += c.updated,
        |chunk| api.update_terms(chunk),
    ) && run_phase(
        executor,
        Phase::Delete,
        &deletes,
        options,
        &mut result,
        |r, c| r.deleted += c.deleted,
        |chunk| api.delete_terms(chunk),
    );

    if completed {
        result.mt_triggered = options.machine_translate.resolve(plan);
        if !result.mt_triggered.is_empty() {
            tracing::info!(languages = ?result.mt_triggered, "machine translation requested");
        }
    }

    result.finished_at = Some(Utc::now());
    tracing::info!(
        created = result.created,
        updated = result.updated,
        deleted = result.deleted,
        waits = result.rate_limit_waits,
        errors = result.errors.len(),
        "sync finished"
    );
    result
}

/// Run one phase, folding server counts, batch waits, and any failure into
/// `result`. An empty phase makes no call. Returns false when the failure
/// policy says to skip the remaining phases.
fn run_phase<T, S, O>(
    executor: &mut RateLimitedExecutor<S, O>,
    phase: Phase,
    items: &[T],
    options: &SyncOptions,
    result: &mut SyncResult,
    tally: fn(&mut SyncResult, &TermCounts),
    op: impl FnMut(&[T]) -> Result<TermCounts, ApiError>,
) -> bool
where
    S: Sleeper,
    O: SyncObserver,
{
    if items.is_empty() {
        return true;
    }
    executor.observer().on_phase_start(phase, items.len());
    let (counts, failure) = match run_batches(
        executor,
        phase,
        items,
        options.batch_size,
        options.rate_limit_delay,
        op,
    ) {
        Ok(counts) => (counts, None),
        Err(failure) => {
            let message = failure.message();
            (failure.completed, Some(message))
        }
    };

    for c in &counts {
        tally(result, c);
    }
    let done = u32::try_from(counts.len()).unwrap_or(u32::MAX);
    result.rate_limit_waits = result.rate_limit_waits.saturating_add(done);
    executor
        .observer()
        .on_phase_finished(phase, counts.len(), failure.is_some());

    let message = match failure {
        Some(message) => message,
        None => return true,
    };
    tracing::error!(%phase, error = %message, "phase failed");
    match options.failure_policy {
        PhaseFailurePolicy::Isolate => {
            result.errors.push(OperationError {
                operation: phase.as_str().to_string(),
                message,
            });
            true
        }
        PhaseFailurePolicy::StopOnFirstFailure => {
            result.errors.push(OperationError {
                operation: "sync".to_string(),
                message,
            });
            false
        }
    }
}
