//! Blocking HTTP implementation of [`TermsApi`] over `ureq`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use termsync_core::{ConfigError, NewTerm, RemoteTerm, Settings, TermRef, TermUpdate};

use crate::api::TermsApi;
use crate::envelope::{normalize, RawResponse};
use crate::error::ApiError;
use crate::wire::{self, Language, TermCounts};

/// Connection settings for one sync session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_token: Option<String>,
    pub project_id: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Requires a project id; the token is checked later by [`HttpClient::new`].
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let project_id = settings
            .project_id
            .clone()
            .ok_or(ConfigError::MissingProjectId)?;
        Ok(Self {
            api_token: settings.api_token.clone(),
            project_id,
            base_url: settings.base_url.clone(),
            timeout: settings.request_timeout,
        })
    }
}

/// Client bound to one project and one credential.
pub struct HttpClient {
    agent: ureq::Agent,
    api_token: String,
    project_id: String,
    base_url: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Fails with a configuration error, before any network activity, when
    /// no credential is configured.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let api_token = config
            .api_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            agent,
            api_token,
            project_id: config.project_id,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn call(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut form: Vec<(&str, &str)> = vec![
            ("api_token", self.api_token.as_str()),
            ("id", self.project_id.as_str()),
        ];
        form.extend_from_slice(extra);

        tracing::debug!(endpoint, "remote call");
        let raw = match self.agent.post(&url).send_form(&form) {
            Ok(resp) => into_raw(resp)?,
            Err(ureq::Error::Status(_, resp)) => into_raw(resp)?,
            Err(ureq::Error::Transport(t)) => {
                return Err(ApiError::Transport(format!("{endpoint}: {t}")));
            }
        };
        let status = raw.status;
        let result = normalize(raw, Utc::now());
        if let Err(err) = &result {
            tracing::debug!(endpoint, status, error = %err, "remote call failed");
        }
        result
    }
}

fn into_raw(resp: ureq::Response) -> Result<RawResponse, ApiError> {
    let status = resp.status();
    let retry_after = resp.header("retry-after").map(str::to_string);
    let body = resp
        .into_string()
        .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;
    Ok(RawResponse {
        status,
        retry_after,
        body,
    })
}

impl TermsApi for HttpClient {
    fn list_terms(&self) -> Result<Vec<RemoteTerm>, ApiError> {
        wire::decode_terms(self.call("terms/list", &[])?)
    }

    fn list_translations(&self, language: &str) -> Result<HashMap<String, String>, ApiError> {
        wire::decode_translations(self.call("terms/list", &[("language", language)])?)
    }

    fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        wire::decode_languages(self.call("languages/list", &[])?)
    }

    fn add_terms(&self, terms: &[NewTerm]) -> Result<TermCounts, ApiError> {
        let data = wire::encode_new_terms(terms)?;
        wire::decode_counts(self.call("terms/add", &[("data", &data)])?)
    }

    fn update_terms(&self, updates: &[TermUpdate]) -> Result<TermCounts, ApiError> {
        let data = wire::encode_updates(updates)?;
        wire::decode_counts(self.call("terms/update", &[("data", &data)])?)
    }

    fn delete_terms(&self, terms: &[TermRef]) -> Result<TermCounts, ApiError> {
        let data = wire::encode_term_refs(terms)?;
        wire::decode_counts(self.call("terms/delete", &[("data", &data)])?)
    }
}
