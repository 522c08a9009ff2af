//! Collaborator contracts for serialization and document rendering.

use arbor_actions::{FormState, TemporaryReferences};
use async_trait::async_trait;

use crate::{ChunkStream, ResponsePayload, StreamProducer, TransportError};

/// Options handed to the tree serializer.
#[derive(Debug, Default)]
pub struct SerializeOptions {
    /// Temporary references decoded alongside a direct invocation, so the
    /// serializer can write referenced values back to the client.
    pub temporary_references: Option<TemporaryReferences>,
}

/// Serializes a response payload into a byte stream.
///
/// Implementations write into `out` incrementally; the consumer may start
/// reading before serialization finishes.
#[async_trait]
pub trait TreeSerializer: Send + Sync {
    /// Serialize `payload` into `out`.
    async fn serialize(
        &self,
        payload: ResponsePayload,
        opts: SerializeOptions,
        out: StreamProducer,
    ) -> Result<(), TransportError>;
}

/// Options handed to the document renderer.
#[derive(Debug, Default)]
pub struct DocumentOptions {
    /// Form state from a progressive invocation, embedded for resumption.
    pub form_state: Option<FormState>,
    /// Simulate a script-disabled client (`__nojs` marker).
    pub debug_noscript: bool,
}

/// Turns a raw payload stream into a full document stream.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Consume the serialized payload from `payload` and write the document
    /// into `out`.
    async fn render_document(
        &self,
        payload: ChunkStream,
        opts: DocumentOptions,
        out: StreamProducer,
    ) -> Result<(), TransportError>;
}
