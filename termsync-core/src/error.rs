//! Error types for termsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading a config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No API token in the config file, the environment, or on the command line.
    #[error("missing API token; set `api_token` in termsync.yaml or TERMSYNC_API_TOKEN")]
    MissingCredential,

    /// Remote commands need a project to operate on.
    #[error("missing project id; set `project_id` in termsync.yaml or TERMSYNC_PROJECT_ID")]
    MissingProjectId,

    /// A config value is present but unusable.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.termsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Errors raised while building, loading, or saving a [`crate::Plan`].
#[derive(Debug, Error)]
pub enum PlanError {
    /// A term appears in more than one of add / update / delete.
    #[error("term '{term}' is listed in both {first} and {second}")]
    Overlap {
        term: String,
        first: &'static str,
        second: &'static str,
    },

    /// A delete context names a term that is not being deleted.
    #[error("deleteContexts names '{term}', which is not in deleteTerms")]
    StrayContext { term: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plan JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PlanError {
    PlanError::Io {
        path: path.into(),
        source,
    }
}
