//! The remote operations the sync pipeline depends on.

use std::collections::HashMap;

use termsync_core::{NewTerm, RemoteTerm, TermRef, TermUpdate};

use crate::error::ApiError;
use crate::wire::{Language, TermCounts};

/// One logical remote operation per method.
///
/// [`crate::HttpClient`] is the production implementation; tests substitute
/// an in-memory fake.
pub trait TermsApi {
    /// Every term of the project, without translations.
    fn list_terms(&self) -> Result<Vec<RemoteTerm>, ApiError>;

    /// Term → content for the terms translated into `language`.
    fn list_translations(&self, language: &str) -> Result<HashMap<String, String>, ApiError>;

    fn list_languages(&self) -> Result<Vec<Language>, ApiError>;

    fn add_terms(&self, terms: &[NewTerm]) -> Result<TermCounts, ApiError>;

    fn update_terms(&self, updates: &[TermUpdate]) -> Result<TermCounts, ApiError>;

    fn delete_terms(&self, terms: &[TermRef]) -> Result<TermCounts, ApiError>;
}

impl<T: TermsApi + ?Sized> TermsApi for &T {
    fn list_terms(&self) -> Result<Vec<RemoteTerm>, ApiError> {
        (**self).list_terms()
    }

    fn list_translations(&self, language: &str) -> Result<HashMap<String, String>, ApiError> {
        (**self).list_translations(language)
    }

    fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        (**self).list_languages()
    }

    fn add_terms(&self, terms: &[NewTerm]) -> Result<TermCounts, ApiError> {
        (**self).add_terms(terms)
    }

    fn update_terms(&self, updates: &[TermUpdate]) -> Result<TermCounts, ApiError> {
        (**self).update_terms(updates)
    }

    fn delete_terms(&self, terms: &[TermRef]) -> Result<TermCounts, ApiError> {
        (**self).delete_terms(terms)
    }
}
