//! Provider error types.
//!
//! All HTTP clients surface errors through [`ProviderError`]. Each
//! variant carries enough context for callers to decide how to handle
//! the failure without inspecting opaque strings. The trait adapters in
//! this crate degrade most of these to `None` before the engine ever
//! sees them; the Telegram client is the exception, because losing a
//! message must not look like success.

use thiserror::Error;

/// Unified error type for hydrocal providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with an error.
    #[error("{service} API error: {reason}")]
    Api { service: &'static str, reason: String },

    /// A required credential is missing from the environment.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// The response body did not have the expected shape.
    #[error("unexpected {service} response: {reason}")]
    BadResponse { service: &'static str, reason: String },

    /// An I/O operation failed (chart upload, file reads).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the providers crate.
pub type Result<T> = std::result::Result<T, ProviderError>;
