//! Request and response payload shapes of the translation service.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use termsync_core::{NewTerm, RemoteTerm, TermRef, TermUpdate};

use crate::error::ApiError;

/// Server-reported counters of a mutating call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCounts {
    #[serde(default)]
    pub parsed: u64,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub deleted: u64,
}

/// A project language as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub translations: u64,
    #[serde(default)]
    pub percentage: f64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `term` + `context` select the record; the rest are the new values.
#[derive(Serialize)]
struct WireUpdate<'a> {
    term: &'a str,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_context: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

pub(crate) fn encode_new_terms(terms: &[NewTerm]) -> Result<String, ApiError> {
    serde_json::to_string(terms).map_err(|e| ApiError::Decode(e.to_string()))
}

pub(crate) fn encode_updates(updates: &[TermUpdate]) -> Result<String, ApiError> {
    let wire: Vec<WireUpdate<'_>> = updates
        .iter()
        .map(|u| WireUpdate {
            term: &u.term,
            context: &u.current_context,
            new_context: u.changes.context.as_deref(),
            reference: u.changes.reference.as_deref(),
            tags: u.changes.tags.as_deref(),
            comment: u.changes.comment.as_deref(),
        })
        .collect();
    serde_json::to_string(&wire).map_err(|e| ApiError::Decode(e.to_string()))
}

pub(crate) fn encode_term_refs(terms: &[TermRef]) -> Result<String, ApiError> {
    serde_json::to_string(terms).map_err(|e| ApiError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireTerm {
    term: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    translation: Option<WireTranslation>,
}

#[derive(Debug, Deserialize)]
struct WireTranslation {
    #[serde(default)]
    content: Value,
}

#[derive(Debug, Deserialize)]
struct TermsResult {
    #[serde(default)]
    terms: Vec<WireTerm>,
}

#[derive(Debug, Deserialize)]
struct CountsResult {
    #[serde(default)]
    terms: TermCounts,
}

#[derive(Debug, Deserialize)]
struct LanguagesResult {
    #[serde(default)]
    languages: Vec<Language>,
}

fn decode<T: DeserializeOwned>(result: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(result).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

pub(crate) fn decode_terms(result: Value) -> Result<Vec<RemoteTerm>, ApiError> {
    let parsed: TermsResult = decode(result, "terms list")?;
    Ok(parsed
        .terms
        .into_iter()
        .map(|t| RemoteTerm {
            term: t.term,
            context: t.context.unwrap_or_default(),
            reference: t.reference.unwrap_or_default(),
            tags: t.tags.unwrap_or_default(),
            comment: t.comment.unwrap_or_default(),
            created: t.created.as_deref().and_then(parse_timestamp),
            updated: t.updated.as_deref().and_then(parse_timestamp),
        })
        .collect())
}

/// Term → content for every term that has a non-empty translation.
pub(crate) fn decode_translations(result: Value) -> Result<HashMap<String, String>, ApiError> {
    let parsed: TermsResult = decode(result, "translated terms list")?;
    Ok(parsed
        .terms
        .into_iter()
        .filter_map(|t| {
            let content = t.translation.and_then(|tr| present_content(&tr.content))?;
            Some((t.term, content))
        })
        .collect())
}

pub(crate) fn decode_counts(result: Value) -> Result<TermCounts, ApiError> {
    let parsed: CountsResult = decode(result, "term counters")?;
    Ok(parsed.terms)
}

pub(crate) fn decode_languages(result: Value) -> Result<Vec<Language>, ApiError> {
    let parsed: LanguagesResult = decode(result, "languages list")?;
    Ok(parsed.languages)
}

/// A translation is present when it is a non-empty string, or a plural
/// object with at least one non-empty form.
pub fn present_content(content: &Value) -> Option<String> {
    match content {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(forms) => {
            let any = forms
                .values()
                .any(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()));
            any.then(|| content.to_string())
        }
        _ => None,
    }
}

/// Accepts RFC 3339, `2013-06-10T11:08:53+0000`, and a bare
/// `2013-06-10 11:08:53` (taken as UTC). Anything else is dropped.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
