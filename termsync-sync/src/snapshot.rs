//! One read of the remote project: the term list plus per-language translations.

use std::time::Duration;

use termsync_client::TermsApi;
use termsync_core::{RemoteTerm, Translations};

use crate::error::SyncError;
use crate::executor::{RateLimitedExecutor, Sleeper};
use crate::observer::{Phase, SyncObserver};

/// Remote state as seen at plan time. Never refreshed mid-execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub terms: Vec<RemoteTerm>,
    pub translations: Translations,
}

/// Fetch the term list, then one translation list per included language.
///
/// `include_langs` is expected to be normalized already (see
/// [`crate::diff::normalize_langs`]); repeated codes are fetched once.
/// Every read goes through `executor`, so reads are spaced and retried
/// like writes.
pub fn fetch_snapshot<A, S, O>(
    api: &A,
    executor: &mut RateLimitedExecutor<S, O>,
    include_langs: &[String],
    read_delay: Duration,
) -> Result<RemoteSnapshot, SyncError>
where
    A: TermsApi + ?Sized,
    S: Sleeper,
    O: SyncObserver,
{
    let mut langs: Vec<&str> = Vec::with_capacity(include_langs.len());
    for lang in include_langs {
        if !langs.contains(&lang.as_str()) {
            langs.push(lang);
        }
    }
    let total = 1 + langs.len();
    executor.observer().on_phase_start(Phase::Fetch, total);

    let result = fetch(api, executor, &langs, read_delay, total);
    let done = match &result {
        Ok(_) => total,
        Err(_) => 0,
    };
    executor
        .observer()
        .on_phase_finished(Phase::Fetch, done, result.is_err());
    result
}

fn fetch<A, S, O>(
    api: &A,
    executor: &mut RateLimitedExecutor<S, O>,
    langs: &[&str],
    read_delay: Duration,
    total: usize,
) -> Result<RemoteSnapshot, SyncError>
where
    A: TermsApi + ?Sized,
    S: Sleeper,
    O: SyncObserver,
{
    executor.observer().on_batch(Phase::Fetch, 1, total);
    let terms = executor.run(read_delay, || api.list_terms())?;
    tracing::debug!(terms = terms.len(), "fetched remote terms");

    let mut translations = Translations::new();
    for (i, lang) in langs.iter().enumerate() {
        executor.observer().on_batch(Phase::Fetch, i + 2, total);
        let present = executor.run(read_delay, || api.list_translations(lang))?;
        tracing::debug!(language = %lang, translated = present.len(), "fetched translations");
        translations.insert(lang.to_string(), present);
    }

    Ok(RemoteSnapshot {
        terms,
        translations,
    })
}
