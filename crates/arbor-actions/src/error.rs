//! Action error types.

use thiserror::Error;

/// Errors raised while decoding or invoking a server action.
///
/// Every variant is fatal for the request: the dispatcher performs no retry
/// and no rollback, and no partial payload is produced.
#[derive(Error, Debug)]
pub enum ActionError {
    /// No action is registered under the given identifier.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// The request body or argument encoding is malformed.
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// An argument referenced a temporary handle that was never registered.
    #[error("Unresolved temporary reference: {0}")]
    UnresolvedReference(String),

    /// The invoked action failed.
    #[error("Action invocation failed: {0}")]
    Invocation(#[from] anyhow::Error),
}
