//! Error types for the hydrocal-core crate.

use thiserror::Error;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the conversation engine.
///
/// Provider outages are not errors (they degrade replies); only storage
/// failures bubble up, because a lost write must not be reported as
/// success.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] hydrocal_store::StoreError),
}
