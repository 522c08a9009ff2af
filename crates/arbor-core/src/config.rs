//! Handler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an Arbor request handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Application name (used in logs and the default document title).
    pub app_name: String,
    /// Capacity, in chunks, of the response byte channel.
    ///
    /// The producer blocks once this many chunks are in flight, which is
    /// what gives the response stream backpressure.
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,
    /// Emit human-readable logs instead of JSON.
    #[serde(default)]
    pub human_logs: bool,
}

fn default_stream_capacity() -> usize {
    16
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "arbor".to_string(),
            stream_capacity: default_stream_capacity(),
            human_logs: false,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given app name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Set the response channel capacity.
    pub fn with_stream_capacity(mut self, chunks: usize) -> Self {
        self.stream_capacity = chunks;
        self
    }

    /// Use human-readable log output.
    pub fn with_human_logs(mut self, enabled: bool) -> Self {
        self.human_logs = enabled;
        self
    }
}
