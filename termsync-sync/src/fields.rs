//! Remote term fields derived from a local key.
//!
//! The same derivation feeds both new terms and the field-by-field
//! comparison against existing ones, so an unchanged key always derives
//! byte-identical fields.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use termsync_core::LocalKey;

/// Joins the usage snippets that make up a term's context.
pub const CONTEXT_SEPARATOR: &str = " | ";

/// Directory names that mark a feature area of an application.
pub const FEATURE_DIRS: &[&str] = &[
    "account",
    "admin",
    "auth",
    "billing",
    "cart",
    "checkout",
    "dashboard",
    "home",
    "notifications",
    "onboarding",
    "profile",
    "reports",
    "search",
    "settings",
];

const MAX_CONTEXT_SNIPPETS: usize = 2;
const MAX_REFERENCE_FILES: usize = 3;
const MAX_FEATURE_TAGS: usize = 2;
const MAX_EXAMPLES: usize = 2;

/// Context, reference, tags, and comment for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    pub context: String,
    pub reference: String,
    pub tags: Vec<String>,
    pub comment: String,
}

pub fn derive(key: &LocalKey) -> DerivedFields {
    let files = distinct_files(key);
    DerivedFields {
        context: context(key),
        reference: files
            .iter()
            .take(MAX_REFERENCE_FILES)
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        tags: tags(key, &files),
        comment: comment(key, files.len()),
    }
}

/// Order-independent tag comparison.
pub fn same_tags(a: &[String], b: &[String]) -> bool {
    let left: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let right: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    left == right
}

/// Snippets of the first two usage sites; blank ones are dropped, not
/// replaced by a later site.
fn context(key: &LocalKey) -> String {
    key.usages
        .iter()
        .take(MAX_CONTEXT_SNIPPETS)
        .map(|u| u.snippet.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Usage files in first-seen order, rendered with `/` separators.
fn distinct_files(key: &LocalKey) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();
    for usage in &key.usages {
        let display = usage.file.to_string_lossy().replace('\\', "/");
        if seen.insert(display.clone()) {
            files.push(display);
        }
    }
    files
}

fn usage_pattern(file_count: usize) -> &'static str {
    match file_count {
        0 => "unused",
        1 => "single",
        _ => "shared",
    }
}

fn tags(key: &LocalKey, files: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    if let Some(framework) = key.framework.as_deref().map(str::trim) {
        if !framework.is_empty() {
            push(framework.to_ascii_lowercase());
        }
    }
    if key.dynamic {
        push("dynamic".to_string());
    }
    push(format!("usage:{}", usage_pattern(files.len())));
    for feature in feature_dirs(files).into_iter().take(MAX_FEATURE_TAGS) {
        push(feature);
    }
    tags
}

/// Known feature directories appearing in any usage path, first-seen order.
fn feature_dirs(files: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for file in files {
        let path = Path::new(file);
        let Some(dir) = path.parent() else { continue };
        for component in dir.components() {
            let Component::Normal(part) = component else { continue };
            let name = part.to_string_lossy().to_ascii_lowercase();
            if FEATURE_DIRS.contains(&name.as_str()) && !found.contains(&name) {
                found.push(name);
            }
        }
    }
    found
}

fn comment(key: &LocalKey, file_count: usize) -> String {
    let mut lines = Vec::new();
    let phrase = key.phrase.trim();
    if !phrase.is_empty() && phrase != key.key {
        lines.push(format!("Text: \"{phrase}\""));
    }
    if file_count > 1 {
        lines.push(format!("Used in {file_count} files"));
    }
    for example in key
        .examples
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .take(MAX_EXAMPLES)
    {
        lines.push(format!("Example: {example}"));
    }
    lines.join("\n")
}
