//! YAML configuration.
//!
//! # Lookup order
//!
//! 1. `--config <path>` (must exist)
//! 2. `<cwd>/termsync.yaml`
//! 3. `<home>/.termsync/config.yaml`
//!
//! Missing files are not an error; defaults apply. `TERMSYNC_API_TOKEN` and
//! `TERMSYNC_PROJECT_ID` override whatever the file says.
//!
//! # API pattern
//!
//! As with the rest of this crate, `fn_at(home: &Path, …)` takes an explicit
//! home and is what tests call; `fn(…)` derives home from `dirs::home_dir()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.poeditor.com/v2";
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// The service allows one mutating request per 20 seconds.
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 20_000;
/// Reads are limited far less strictly than writes.
pub const DEFAULT_READ_DELAY_MS: u64 = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const ENV_API_TOKEN: &str = "TERMSYNC_API_TOKEN";
pub const ENV_PROJECT_ID: &str = "TERMSYNC_PROJECT_ID";

/// On-disk config document. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_langs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Values taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub api_token: Option<String>,
    pub project_id: Option<String>,
}

impl EnvOverrides {
    pub fn from_process_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_token: read(ENV_API_TOKEN),
            project_id: read(ENV_PROJECT_ID),
        }
    }
}

/// Fully resolved settings for one session.
///
/// Credential and project stay optional here: commands that never talk to
/// the service (dry runs of a saved plan) must work without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_token: Option<String>,
    pub project_id: Option<String>,
    pub base_url: String,
    pub batch_size: usize,
    pub rate_limit_delay: Duration,
    /// Spacing between read calls while fetching the remote snapshot.
    pub read_delay: Duration,
    pub include_langs: Vec<String>,
    pub request_timeout: Duration,
    /// The file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_token: None,
            project_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            rate_limit_delay: Duration::from_millis(DEFAULT_RATE_LIMIT_DELAY_MS),
            read_delay: Duration::from_millis(DEFAULT_READ_DELAY_MS),
            include_langs: Vec::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            source: None,
        }
    }
}

impl Settings {
    /// Token with everything but the last four characters masked.
    pub fn masked_token(&self) -> Option<String> {
        self.api_token.as_ref().map(|t| {
            let chars: Vec<char> = t.chars().collect();
            let keep = chars.len().min(4);
            let tail: String = chars[chars.len() - keep..].iter().collect();
            format!("{}{}", "*".repeat(chars.len() - keep), tail)
        })
    }

    /// Re-check invariants after callers applied their own overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.termsync/config.yaml`: pure, no I/O.
pub fn user_config_path_at(home: &Path) -> PathBuf {
    home.join(".termsync").join("config.yaml")
}

/// Pick the config file to read, or `None` when only defaults apply.
pub fn discover_at(
    home: &Path,
    cwd: &Path,
    explicit: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = cwd.join("termsync.yaml");
    if local.exists() {
        return Ok(Some(local));
    }
    let user = user_config_path_at(home);
    if user.exists() {
        return Ok(Some(user));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Load / resolve
// ---------------------------------------------------------------------------

/// Parse one config file.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Layer defaults, file values, and environment overrides.
pub fn resolve(file: ConfigFile, env: &EnvOverrides) -> Result<Settings, ConfigError> {
    let defaults = Settings::default();
    let settings = Settings {
        api_token: env
            .api_token
            .clone()
            .or(file.api_token)
            .filter(|t| !t.trim().is_empty()),
        project_id: env
            .project_id
            .clone()
            .or(file.project_id)
            .filter(|p| !p.trim().is_empty()),
        base_url: file
            .base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url),
        batch_size: file.batch_size.unwrap_or(defaults.batch_size),
        rate_limit_delay: file
            .rate_limit_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.rate_limit_delay),
        read_delay: file
            .read_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.read_delay),
        include_langs: file.include_langs.unwrap_or_default(),
        request_timeout: file
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
        source: None,
    };
    settings.validate()?;
    Ok(settings)
}

/// Discover, parse, and resolve settings relative to an explicit home.
pub fn load_at(
    home: &Path,
    cwd: &Path,
    explicit: Option<&Path>,
    env: &EnvOverrides,
) -> Result<Settings, ConfigError> {
    let path = discover_at(home, cwd, explicit)?;
    let file = match &path {
        Some(p) => load_file(p)?,
        None => ConfigFile::default(),
    };
    let mut settings = resolve(file, env)?;
    settings.source = path;
    Ok(settings)
}

/// `load_at` convenience wrapper using the real home, cwd, and environment.
pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    load_at(&home()?, &cwd, explicit, &EnvOverrides::from_process_env())
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_is_empty() {
        let s = resolve(ConfigFile::default(), &EnvOverrides::default()).unwrap();
        assert_eq!(s.batch_size, 100);
        assert_eq!(s.rate_limit_delay, Duration::from_secs(20));
        assert_eq!(s.read_delay, Duration::from_secs(1));
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert!(s.api_token.is_none());
        assert!(s.include_langs.is_empty());
    }

    #[test]
    fn env_overrides_file_values() {
        let file = ConfigFile {
            api_token: Some("from-file".into()),
            project_id: Some("1".into()),
            ..ConfigFile::default()
        };
        let env = EnvOverrides {
            api_token: Some("from-env".into()),
            project_id: None,
        };
        let s = resolve(file, &env).unwrap();
        assert_eq!(s.api_token.as_deref(), Some("from-env"));
        assert_eq!(s.project_id.as_deref(), Some("1"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let file = ConfigFile {
            api_token: Some("   ".into()),
            ..ConfigFile::default()
        };
        let s = resolve(file, &EnvOverrides::default()).unwrap();
        assert!(s.api_token.is_none());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let file = ConfigFile {
            batch_size: Some(0),
            ..ConfigFile::default()
        };
        let err = resolve(file, &EnvOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "batch_size", .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let file = ConfigFile {
            base_url: Some("http://localhost:8080/v2/".into()),
            ..ConfigFile::default()
        };
        let s = resolve(file, &EnvOverrides::default()).unwrap();
        assert_eq!(s.base_url, "http://localhost:8080/v2");
    }

    #[test]
    fn masked_token_keeps_last_four() {
        let s = Settings {
            api_token: Some("abcdef123456".into()),
            ..Settings::default()
        };
        assert_eq!(s.masked_token().as_deref(), Some("********3456"));

        let short = Settings {
            api_token: Some("ab".into()),
            ..Settings::default()
        };
        assert_eq!(short.masked_token().as_deref(), Some("ab"));
    }
}
