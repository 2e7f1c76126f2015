//! In-memory [`TermsApi`] for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use termsync_client::{ApiError, Language, TermCounts, TermsApi};
use termsync_core::{NewTerm, RemoteTerm, TermRef, TermUpdate, Translations};

#[derive(Debug, Default)]
pub struct FakeApi {
    pub terms: Vec<RemoteTerm>,
    pub translations: Translations,
    /// Caps the count reported per mutating call, to mimic partial acceptance.
    pub accept_at_most: Option<u64>,
    /// `(endpoint, items)` for every call, in order.
    pub calls: RefCell<Vec<(&'static str, usize)>>,
    /// Every term reference passed to `delete_terms`, in order.
    pub deleted: RefCell<Vec<TermRef>>,
    /// Errors handed out, front first, before an endpoint starts succeeding.
    pub failures: RefCell<HashMap<&'static str, VecDeque<ApiError>>>,
}

impl FakeApi {
    pub fn fail(&self, endpoint: &'static str, err: ApiError) {
        self.failures
            .borrow_mut()
            .entry(endpoint)
            .or_default()
            .push_back(err);
    }

    pub fn endpoints(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|(e, _)| *e).collect()
    }

    fn record(&self, endpoint: &'static str, items: usize) -> Result<(), ApiError> {
        self.calls.borrow_mut().push((endpoint, items));
        match self
            .failures
            .borrow_mut()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn accepted(&self, items: usize) -> u64 {
        let items = items as u64;
        self.accept_at_most.map_or(items, |cap| items.min(cap))
    }
}

impl TermsApi for FakeApi {
    fn list_terms(&self) -> Result<Vec<RemoteTerm>, ApiError> {
        self.record("terms/list", 0)?;
        Ok(self.terms.clone())
    }

    fn list_translations(&self, language: &str) -> Result<HashMap<String, String>, ApiError> {
        self.record("terms/list", 0)?;
        Ok(self.translations.get(language).cloned().unwrap_or_default())
    }

    fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        self.record("languages/list", 0)?;
        Ok(self
            .translations
            .keys()
            .map(|code| Language {
                code: code.clone(),
                name: code.to_uppercase(),
                translations: 0,
                percentage: 0.0,
            })
            .collect())
    }

    fn add_terms(&self, terms: &[NewTerm]) -> Result<TermCounts, ApiError> {
        self.record("terms/add", terms.len())?;
        Ok(TermCounts {
            parsed: terms.len() as u64,
            added: self.accepted(terms.len()),
            ..TermCounts::default()
        })
    }

    fn update_terms(&self, updates: &[TermUpdate]) -> Result<TermCounts, ApiError> {
        self.record("terms/update", updates.len())?;
        Ok(TermCounts {
            parsed: updates.len() as u64,
            updated: self.accepted(updates.len()),
            ..TermCounts::default()
        })
    }

    fn delete_terms(&self, terms: &[TermRef]) -> Result<TermCounts, ApiError> {
        self.record("terms/delete", terms.len())?;
        self.deleted.borrow_mut().extend_from_slice(terms);
        Ok(TermCounts {
            parsed: terms.len() as u64,
            deleted: self.accepted(terms.len()),
            ..TermCounts::default()
        })
    }
}
