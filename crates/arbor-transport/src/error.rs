//! Transport error types.

use thiserror::Error;

/// Errors raised while producing a response stream.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The response channel failed (receiver dropped, double completion).
    #[error("Stream error: {0}")]
    Stream(String),

    /// The tree-serialization collaborator failed.
    #[error("Serialize error: {0}")]
    Serialize(String),

    /// The document-rendering collaborator failed.
    #[error("Render error: {0}")]
    Render(String),
}
