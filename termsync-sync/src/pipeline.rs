//! Shared plan entrypoint used by `termsync plan` and `termsync sync`.

use std::time::Duration;

use termsync_client::TermsApi;
use termsync_core::{LocalKey, Plan};

use crate::diff::{diff, normalize_langs, DiffOptions};
use crate::error::SyncError;
use crate::executor::{RateLimitedExecutor, Sleeper};
use crate::observer::SyncObserver;
use crate::snapshot::fetch_snapshot;

/// Read the remote project once and diff `keys` against it.
///
/// Language codes are normalized before any remote call, and the fetch and
/// the diff see the same list.
pub fn build_plan<A, S, O>(
    api: &A,
    executor: &mut RateLimitedExecutor<S, O>,
    keys: &[LocalKey],
    options: &DiffOptions,
    read_delay: Duration,
) -> Result<Plan, SyncError>
where
    A: TermsApi + ?Sized,
    S: Sleeper,
    O: SyncObserver,
{
    let include_langs = normalize_langs(&options.include_langs)?;
    let snapshot = fetch_snapshot(api, executor, &include_langs, read_delay)?;
    let options = DiffOptions {
        include_langs,
        ..options.clone()
    };
    let plan = diff(keys, &snapshot.terms, &snapshot.translations, &options)?;
    let stats = plan.stats();
    tracing::info!(
        local = keys.len(),
        remote = snapshot.terms.len(),
        adds = stats.adds,
        updates = stats.updates,
        deletes = stats.deletes,
        missing = stats.missing,
        "plan computed"
    );
    Ok(plan)
}
