//! Diff engine: local keys × remote snapshot → [`Plan`].
//!
//! Pure and deterministic. Adds and updates follow local insertion order,
//! deletes follow remote insertion order, so the same inputs always
//! serialize to the same plan bytes.

use std::collections::{BTreeMap, HashMap};

use termsync_core::{LocalKey, NewTerm, Plan, RemoteTerm, TermChanges, TermUpdate, Translations};

use crate::error::DiffError;
use crate::fields::{self, DerivedFields};

/// Knobs of one diff computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Remove remote terms that no longer exist locally.
    pub delete_extraneous: bool,
    /// Languages whose translation coverage is checked.
    pub include_langs: Vec<String>,
}

/// Identifier → record, keeping first-seen position and last-seen value.
struct Lookup<'a, T> {
    order: Vec<&'a str>,
    by_id: HashMap<&'a str, &'a T>,
}

impl<'a, T> Lookup<'a, T> {
    fn build(
        items: &'a [T],
        id: impl Fn(&T) -> &str,
        on_empty: impl Fn(usize) -> DiffError,
    ) -> Result<Self, DiffError> {
        let mut order = Vec::with_capacity(items.len());
        let mut by_id = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let key = id(item);
            if key.trim().is_empty() {
                return Err(on_empty(index));
            }
            if by_id.insert(key, item).is_none() {
                order.push(key);
            }
        }
        Ok(Self { order, by_id })
    }

    fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn iter(&self) -> impl Iterator<Item = (&'a str, &'a T)> + '_ {
        self.order.iter().map(|id| (*id, self.by_id[id]))
    }
}

/// Compute the reconciliation plan.
pub fn diff(
    local: &[LocalKey],
    remote: &[RemoteTerm],
    translations: &Translations,
    options: &DiffOptions,
) -> Result<Plan, DiffError> {
    let langs = normalize_langs(&options.include_langs)?;
    let local = Lookup::build(local, |k| k.key.as_str(), |index| DiffError::EmptyLocalKey { index })?;
    let remote = Lookup::build(
        remote,
        |t| t.term.as_str(),
        |index| DiffError::EmptyRemoteTerm { index },
    )?;

    let has_translation = |lang: &str, id: &str| {
        translations
            .get(lang)
            .and_then(|m| m.get(id))
            .is_some_and(|content| !content.trim().is_empty())
    };

    let mut add_terms = Vec::new();
    let mut update_terms = Vec::new();
    let mut missing: BTreeMap<String, Vec<String>> = langs
        .iter()
        .map(|lang| (lang.to_string(), Vec::new()))
        .collect();

    for (id, key) in local.iter() {
        let derived = fields::derive(key);
        match remote.by_id.get(id) {
            None => {
                add_terms.push(new_term(id, derived));
                for bucket in missing.values_mut() {
                    bucket.push(id.to_string());
                }
            }
            Some(existing) => {
                let changes = changes(existing, derived);
                if !changes.is_empty() {
                    update_terms.push(TermUpdate {
                        term: id.to_string(),
                        current_context: existing.context.clone(),
                        changes,
                    });
                }
                for (lang, bucket) in missing.iter_mut() {
                    if !has_translation(lang, id) {
                        bucket.push(id.to_string());
                    }
                }
            }
        }
    }

    let mut delete_terms = Vec::new();
    let mut delete_contexts = BTreeMap::new();
    let mut obsolete: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if options.delete_extraneous {
        obsolete = langs
            .iter()
            .map(|lang| (lang.to_string(), Vec::new()))
            .collect();
        for (id, term) in remote.iter().filter(|(id, _)| !local.contains(id)) {
            delete_terms.push(id.to_string());
            delete_contexts.insert(id.to_string(), term.context.clone());
            for (lang, bucket) in obsolete.iter_mut() {
                if has_translation(lang, id) {
                    bucket.push(id.to_string());
                }
            }
        }
    }

    Ok(Plan::new(add_terms, update_terms, delete_terms, missing, obsolete)?
        .with_delete_contexts(delete_contexts)?)
}

/// Language codes trimmed and deduplicated in order. A blank code is an error.
pub fn normalize_langs(langs: &[String]) -> Result<Vec<String>, DiffError> {
    let mut out: Vec<String> = Vec::with_capacity(langs.len());
    for (index, lang) in langs.iter().enumerate() {
        let lang = lang.trim();
        if lang.is_empty() {
            return Err(DiffError::EmptyLanguage { index });
        }
        if !out.iter().any(|seen| seen == lang) {
            out.push(lang.to_string());
        }
    }
    Ok(out)
}

fn new_term(id: &str, derived: DerivedFields) -> NewTerm {
    NewTerm {
        term: id.to_string(),
        context: derived.context,
        reference: derived.reference,
        tags: derived.tags,
        comment: derived.comment,
    }
}

fn changes(existing: &RemoteTerm, derived: DerivedFields) -> TermChanges {
    TermChanges {
        context: (derived.context != existing.context).then_some(derived.context),
        reference: (derived.reference != existing.reference).then_some(derived.reference),
        tags: (!fields::same_tags(&derived.tags, &existing.tags)).then_some(derived.tags),
        comment: (derived.comment != existing.comment).then_some(derived.comment),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use termsync_core::UsageSite;

    use super::*;

    fn local(id: &str) -> LocalKey {
        LocalKey {
            key: id.to_string(),
            phrase: String::new(),
            usages: vec![UsageSite {
                file: PathBuf::from(format!("src/{id}.tsx")),
                line: 3,
                snippet: format!("t('{id}')"),
            }],
            framework: Some("react".into()),
            dynamic: false,
            examples: vec![],
        }
    }

    /// A remote term whose fields match what `local(id)` derives.
    fn remote_matching(id: &str) -> RemoteTerm {
        let derived = fields::derive(&local(id));
        RemoteTerm {
            term: id.to_string(),
            context: derived.context,
            reference: derived.reference,
            tags: derived.tags,
            comment: derived.comment,
            created: None,
            updated: None,
        }
    }

    fn remote_bare(id: &str) -> RemoteTerm {
        RemoteTerm {
            term: id.to_string(),
            context: String::new(),
            reference: String::new(),
            tags: vec![],
            comment: String::new(),
            created: None,
            updated: None,
        }
    }

    fn opts(delete: bool, langs: &[&str]) -> DiffOptions {
        DiffOptions {
            delete_extraneous: delete,
            include_langs: langs.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn ids(terms: &[NewTerm]) -> Vec<&str> {
        terms.iter().map(|t| t.term.as_str()).collect()
    }

    #[test]
    fn mixed_scenario() {
        let plan = diff(
            &[local("a"), local("b")],
            &[remote_matching("b"), remote_bare("c")],
            &Translations::new(),
            &opts(true, &["de"]),
        )
        .unwrap();

        assert_eq!(ids(plan.add_terms()), vec!["a"]);
        assert_eq!(plan.delete_terms(), ["c".to_string()]);
        assert!(plan.update_terms().is_empty());
        assert_eq!(plan.missing_translations()["de"], vec!["a", "b"]);
        assert_eq!(plan.stats().missing, 2);
    }

    #[test]
    fn identical_sets_produce_an_empty_plan() {
        let plan = diff(
            &[local("a"), local("b")],
            &[remote_matching("a"), remote_matching("b")],
            &Translations::new(),
            &opts(true, &[]),
        )
        .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.stats(), termsync_core::PlanStats::default());
    }

    #[test]
    fn only_changed_fields_are_updated() {
        let mut stale = remote_matching("a");
        stale.comment = "outdated".into();
        let plan = diff(&[local("a")], &[stale], &Translations::new(), &opts(false, &[])).unwrap();
        assert_eq!(plan.update_terms().len(), 1);
        let changes = &plan.update_terms()[0].changes;
        assert_eq!(changes.comment.as_deref(), Some(""));
        assert!(changes.context.is_none());
        assert!(changes.reference.is_none());
        assert!(changes.tags.is_none());
    }

    #[test]
    fn updates_and_deletes_remember_the_remote_context() {
        let mut stale = remote_matching("a");
        stale.context = "old snippet".into();
        let mut gone = remote_bare("b");
        gone.context = "footer".into();
        let plan = diff(
            &[local("a")],
            &[stale, gone, remote_bare("c")],
            &Translations::new(),
            &opts(true, &[]),
        )
        .unwrap();

        let update = &plan.update_terms()[0];
        assert_eq!(update.current_context, "old snippet");
        assert_eq!(update.changes.context.as_deref(), Some("t('a')"));

        let refs = plan.delete_refs();
        assert_eq!((refs[0].term.as_str(), refs[0].context.as_str()), ("b", "footer"));
        assert_eq!((refs[1].term.as_str(), refs[1].context.as_str()), ("c", ""));
    }

    #[test]
    fn language_codes_are_trimmed_and_deduplicated() {
        let langs = ["de ".to_string(), " fr".to_string(), "de".to_string()];
        assert_eq!(normalize_langs(&langs).unwrap(), vec!["de", "fr"]);
    }

    #[test]
    fn reordered_tags_do_not_produce_an_update() {
        let mut reordered = remote_matching("a");
        reordered.tags.reverse();
        assert!(reordered.tags.len() > 1);
        let plan =
            diff(&[local("a")], &[reordered], &Translations::new(), &opts(false, &[])).unwrap();
        assert!(plan.update_terms().is_empty());
    }

    #[test]
    fn extraneous_terms_are_kept_unless_deletion_is_requested() {
        let plan = diff(&[], &[remote_bare("x")], &Translations::new(), &opts(false, &["de"]))
            .unwrap();
        assert!(plan.delete_terms().is_empty());
        assert!(plan.obsolete_translations().is_empty());
    }

    #[test]
    fn empty_local_with_deletion_removes_everything_in_remote_order() {
        let remote = [remote_bare("z"), remote_bare("a"), remote_bare("m")];
        let plan = diff(&[], &remote, &Translations::new(), &opts(true, &[])).unwrap();
        assert_eq!(plan.delete_terms(), ["z", "a", "m"].map(String::from));
    }

    #[test]
    fn orphaned_translations_are_reported_as_obsolete() {
        let mut translations: Translations = HashMap::new();
        translations.insert(
            "de".into(),
            HashMap::from([("old".to_string(), "Alt".to_string())]),
        );
        let plan = diff(
            &[],
            &[remote_bare("old"), remote_bare("untranslated")],
            &translations,
            &opts(true, &["de", "fr"]),
        )
        .unwrap();
        assert_eq!(plan.obsolete_translations()["de"], vec!["old"]);
        assert!(plan.obsolete_translations()["fr"].is_empty());
    }

    #[test]
    fn existing_translations_are_not_missing() {
        let mut translations: Translations = HashMap::new();
        translations.insert("de".into(), HashMap::from([("a".to_string(), "A".to_string())]));
        translations.insert("fr".into(), HashMap::from([("a".to_string(), "  ".to_string())]));
        let plan = diff(
            &[local("a")],
            &[remote_matching("a")],
            &translations,
            &opts(false, &["de", "fr"]),
        )
        .unwrap();
        assert!(plan.missing_translations()["de"].is_empty());
        assert_eq!(plan.missing_translations()["fr"], vec!["a"]);
        assert_eq!(plan.stats().missing, 1);
    }

    #[test]
    fn empty_include_langs_means_nothing_missing() {
        let plan = diff(
            &[local("a"), local("b")],
            &[remote_bare("c")],
            &Translations::new(),
            &opts(true, &[]),
        )
        .unwrap();
        assert!(plan.missing_translations().is_empty());
        assert!(plan.obsolete_translations().is_empty());
        assert_eq!(plan.stats().missing, 0);
    }

    #[test]
    fn duplicate_local_keys_keep_position_and_take_last_value() {
        let mut second = local("a");
        second.phrase = "Second wins".into();
        let plan = diff(
            &[local("a"), local("b"), second],
            &[],
            &Translations::new(),
            &opts(false, &[]),
        )
        .unwrap();
        assert_eq!(ids(plan.add_terms()), vec!["a", "b"]);
        assert!(plan.add_terms()[0].comment.contains("Second wins"));
    }

    #[test]
    fn duplicate_languages_are_collapsed() {
        let plan = diff(&[local("a")], &[], &Translations::new(), &opts(false, &["de", "de"]))
            .unwrap();
        assert_eq!(plan.missing_translations().len(), 1);
        assert_eq!(plan.stats().missing, 1);
    }

    #[test]
    fn malformed_inputs_are_errors() {
        let err = diff(&[local(" ")], &[], &Translations::new(), &opts(false, &[])).unwrap_err();
        assert!(matches!(err, DiffError::EmptyLocalKey { index: 0 }));

        let err = diff(&[], &[remote_bare("")], &Translations::new(), &opts(false, &[]))
            .unwrap_err();
        assert!(matches!(err, DiffError::EmptyRemoteTerm { index: 0 }));

        let err = diff(&[], &[], &Translations::new(), &opts(false, &["de", ""])).unwrap_err();
        assert!(matches!(err, DiffError::EmptyLanguage { index: 1 }));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let local_keys: Vec<LocalKey> = (0..50).map(|i| local(&format!("k{i}"))).collect();
        let remote: Vec<RemoteTerm> = (25..75).map(|i| remote_bare(&format!("k{i}"))).collect();
        let run = || {
            let plan = diff(&local_keys, &remote, &Translations::new(), &opts(true, &["de", "fr"]))
                .unwrap();
            serde_json::to_string(&plan).unwrap()
        };
        assert_eq!(run(), run());
    }
}
