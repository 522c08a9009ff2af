//! Streaming response type.

use futures::StreamExt;

use crate::{BodyStream, TransportError};

/// A response whose body is produced as it is consumed.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Body stream; polling it drives serialization and rendering.
    pub body: BodyStream,
}

impl StreamingResponse {
    /// Create a response.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: BodyStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }

    /// Drain the body into one buffer.
    ///
    /// Mostly useful in tests and non-streaming embeddings; streaming
    /// callers should forward chunks as they arrive instead.
    pub async fn collect_body(self) -> Result<Vec<u8>, TransportError> {
        let mut buf = Vec::new();
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
