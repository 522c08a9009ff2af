//! Locator error types.

use thiserror::Error;

/// Errors a component locator may raise.
///
/// A missing unit is never an error; the resolver probes many prefixes that
/// have no layout. These variants cover real failures while loading a unit
/// that does exist, and they abort the request.
#[derive(Error, Debug)]
pub enum LocateError {
    /// A unit was found but its definition could not be loaded.
    #[error("Malformed unit at '{path}': {reason}")]
    MalformedUnit { path: String, reason: String },

    /// The backing source is unreachable.
    #[error("Component source unavailable: {0}")]
    SourceUnavailable(String),
}
