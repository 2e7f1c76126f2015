//! # termsync-client
//!
//! Remote API client for the translation service.
//!
//! Every call goes through [`envelope::normalize`], which turns transport
//! and protocol failures into a typed [`ApiError`] carrying the HTTP status
//! and, for throttling, the server's retry hint.

pub mod api;
pub mod envelope;
pub mod error;
pub mod http;
pub mod wire;

pub use api::TermsApi;
pub use error::{ApiError, ErrorClass};
pub use http::{ClientConfig, HttpClient};
pub use wire::{Language, TermCounts};
