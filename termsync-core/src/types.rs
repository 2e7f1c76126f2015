//! Domain types shared by the diff engine, the remote client, and the CLI.
//!
//! JSON field names are camelCase; these shapes are the boundary contract
//! with the key detector (input) and with reporting tools (plan / result).

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::PlanError;

// ---------------------------------------------------------------------------
// Local inventory
// ---------------------------------------------------------------------------

/// One place in source code where a key is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSite {
    pub file: PathBuf,
    #[serde(default)]
    pub line: u32,
    /// Surrounding source text.
    #[serde(default)]
    pub snippet: String,
}

/// A translatable key discovered locally by the external detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalKey {
    pub key: String,
    /// Display phrase; empty when the detector only saw the identifier.
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub usages: Vec<UsageSite>,
    /// Source framework tag, e.g. `react` or `vue`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub examples: Vec<String>,
}

// ---------------------------------------------------------------------------
// Remote state
// ---------------------------------------------------------------------------

/// One term as held by the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTerm {
    pub term: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// A single cell of the term × language translation matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub term: String,
    pub language: String,
    pub content: String,
}

/// Sparse translation matrix: language → term → content.
pub type Translations = HashMap<String, HashMap<String, String>>;

/// Fold entries into a [`Translations`] matrix. Later entries win.
pub fn translations_from_entries(entries: impl IntoIterator<Item = TranslationEntry>) -> Translations {
    let mut out = Translations::new();
    for entry in entries {
        out.entry(entry.language)
            .or_default()
            .insert(entry.term, entry.content);
    }
    out
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A term to create remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTerm {
    pub term: String,
    pub context: String,
    pub reference: String,
    pub tags: Vec<String>,
    pub comment: String,
}

/// Fields that changed on an existing term. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TermChanges {
    pub fn is_empty(&self) -> bool {
        self.context.is_none()
            && self.reference.is_none()
            && self.tags.is_none()
            && self.comment.is_none()
    }
}

/// A partial update of one existing term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermUpdate {
    pub term: String,
    /// Context the remote record holds before the update. The service
    /// addresses a term by name and context together.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,
    pub changes: TermChanges,
}

/// The (term, context) pair that identifies one remote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub term: String,
    pub context: String,
}

/// Summary counters of a [`Plan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub adds: usize,
    pub updates: usize,
    pub deletes: usize,
    pub missing: usize,
}

/// Immutable reconciliation plan.
///
/// Built once by the diff engine (or loaded from a plan file) and never
/// mutated afterwards. `stats` is always derived from the lists, never
/// trusted from input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PlanFile")]
pub struct Plan {
    add_terms: Vec<NewTerm>,
    update_terms: Vec<TermUpdate>,
    delete_terms: Vec<String>,
    /// Remote context of each deleted term that has a non-empty one.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    delete_contexts: BTreeMap<String, String>,
    missing_translations: BTreeMap<String, Vec<String>>,
    obsolete_translations: BTreeMap<String, Vec<String>>,
    stats: PlanStats,
}

/// Serialized plan shape; a `stats` field in the input is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanFile {
    #[serde(default)]
    add_terms: Vec<NewTerm>,
    #[serde(default)]
    update_terms: Vec<TermUpdate>,
    #[serde(default)]
    delete_terms: Vec<String>,
    #[serde(default)]
    delete_contexts: BTreeMap<String, String>,
    #[serde(default)]
    missing_translations: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    obsolete_translations: BTreeMap<String, Vec<String>>,
}

impl TryFrom<PlanFile> for Plan {
    type Error = PlanError;

    fn try_from(file: PlanFile) -> Result<Self, Self::Error> {
        Plan::new(
            file.add_terms,
            file.update_terms,
            file.delete_terms,
            file.missing_translations,
            file.obsolete_translations,
        )?
        .with_delete_contexts(file.delete_contexts)
    }
}

impl Plan {
    /// Assemble a plan, checking that no term sits in two change lists.
    pub fn new(
        add_terms: Vec<NewTerm>,
        update_terms: Vec<TermUpdate>,
        delete_terms: Vec<String>,
        missing_translations: BTreeMap<String, Vec<String>>,
        obsolete_translations: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, PlanError> {
        check_disjoint(&add_terms, &update_terms, &delete_terms)?;

        let stats = PlanStats {
            adds: add_terms.len(),
            updates: update_terms.len(),
            deletes: delete_terms.len(),
            missing: missing_translations.values().map(Vec::len).sum(),
        };
        Ok(Self {
            add_terms,
            update_terms,
            delete_terms,
            delete_contexts: BTreeMap::new(),
            missing_translations,
            obsolete_translations,
            stats,
        })
    }

    /// Attach the remote context of deleted terms. Blank contexts are
    /// dropped; a term outside `deleteTerms` is an error.
    pub fn with_delete_contexts(
        mut self,
        contexts: BTreeMap<String, String>,
    ) -> Result<Self, PlanError> {
        for (term, context) in contexts {
            if !self.delete_terms.contains(&term) {
                return Err(PlanError::StrayContext { term });
            }
            if !context.is_empty() {
                self.delete_contexts.insert(term, context);
            }
        }
        Ok(self)
    }

    pub fn add_terms(&self) -> &[NewTerm] {
        &self.add_terms
    }

    pub fn update_terms(&self) -> &[TermUpdate] {
        &self.update_terms
    }

    pub fn delete_terms(&self) -> &[String] {
        &self.delete_terms
    }

    /// Deleted terms with the remote context needed to address them.
    pub fn delete_refs(&self) -> Vec<TermRef> {
        self.delete_terms
            .iter()
            .map(|term| TermRef {
                term: term.clone(),
                context: self.delete_contexts.get(term).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn missing_translations(&self) -> &BTreeMap<String, Vec<String>> {
        &self.missing_translations
    }

    pub fn obsolete_translations(&self) -> &BTreeMap<String, Vec<String>> {
        &self.obsolete_translations
    }

    pub fn stats(&self) -> PlanStats {
        self.stats
    }

    /// True when there is nothing to add, update, or delete.
    pub fn is_empty(&self) -> bool {
        self.add_terms.is_empty() && self.update_terms.is_empty() && self.delete_terms.is_empty()
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    ///
    /// Equal plans always hash equal; used to detect an unchanged plan
    /// between runs.
    pub fn fingerprint(&self) -> Result<String, PlanError> {
        let bytes = serde_json::to_vec(self)?;
        let mut h = Sha256::new();
        h.update(&bytes);
        Ok(hex::encode(h.finalize()))
    }
}

fn check_disjoint(
    add_terms: &[NewTerm],
    update_terms: &[TermUpdate],
    delete_terms: &[String],
) -> Result<(), PlanError> {
    let mut seen: HashMap<&str, &'static str> = HashMap::new();
    let listed = add_terms
        .iter()
        .map(|t| (t.term.as_str(), "addTerms"))
        .chain(update_terms.iter().map(|u| (u.term.as_str(), "updateTerms")))
        .chain(delete_terms.iter().map(|d| (d.as_str(), "deleteTerms")));
    for (term, list) in listed {
        if let Some(first) = seen.insert(term, list) {
            if first != list {
                return Err(PlanError::Overlap {
                    term: term.to_string(),
                    first,
                    second: list,
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One failure recorded during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub operation: String,
    pub message: String,
}

/// Outcome of one sync invocation, dry or live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub audit_id: Uuid,
    pub dry_run: bool,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub mt_triggered: Vec<String>,
    pub errors: Vec<OperationError>,
    pub rate_limit_waits: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncResult {
    /// An empty result tagged with a fresh audit id.
    pub fn start(dry_run: bool) -> Self {
        Self {
            audit_id: Uuid::new_v4(),
            dry_run,
            created: 0,
            updated: 0,
            deleted: 0,
            mt_triggered: Vec::new(),
            errors: Vec::new(),
            rate_limit_waits: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
