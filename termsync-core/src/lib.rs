//! termsync core library: domain types, configuration, plan files, errors.
//!
//! - [`types`]: local keys, remote terms, the [`Plan`] and [`SyncResult`]
//! - [`config`]: YAML config discovery and resolution into [`Settings`]
//! - [`plan_file`]: atomic plan persistence
//! - [`error`]: [`ConfigError`], [`PlanError`]

pub mod config;
pub mod error;
pub mod plan_file;
pub mod types;

pub use config::Settings;
pub use error::{ConfigError, PlanError};
pub use types::{
    LocalKey, NewTerm, OperationError, Plan, PlanStats, RemoteTerm, SyncResult, TermChanges,
    TermRef, TermUpdate, TranslationEntry, Translations, UsageSite,
};
