//! Transport negotiation.

use std::sync::Arc;

use arbor_core::RequestContext;
use futures::future::try_join;

use crate::{
    chunk_channel, fused_body, DocumentOptions, DocumentRenderer, ResponsePayload,
    SerializeOptions, StreamingResponse, TreeSerializer,
};
use arbor_actions::TemporaryReferences;

/// Query marker forcing the raw payload stream.
pub const RAW_MARKER: &str = "__rsc";
/// Query marker forcing a document response (with a capable Accept header).
pub const DOCUMENT_MARKER: &str = "__html";
/// Query marker simulating a script-disabled client.
pub const NOSCRIPT_MARKER: &str = "__nojs";

/// Content type of the raw payload stream.
pub const RAW_CONTENT_TYPE: &str = "text/x-component;charset=utf-8";
/// Content type of document responses.
pub const DOCUMENT_CONTENT_TYPE: &str = "text/html";

/// The two response transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Machine-readable serialized payload stream.
    RawStream,
    /// Full document produced by the rendering collaborator.
    Document,
}

/// Decide the transport for a request.
///
/// A pure function of headers and query markers, evaluated before any
/// payload byte exists: `__rsc` always wins; otherwise a client that does
/// not accept a document (and does not ask for one with `__html`) gets the
/// raw stream.
pub fn select_transport(ctx: &RequestContext) -> Transport {
    if ctx.has_query_flag(RAW_MARKER) {
        return Transport::RawStream;
    }
    let accepts_document = ctx
        .accept()
        .map(|a| a.contains(DOCUMENT_CONTENT_TYPE))
        .unwrap_or(false);
    if !accepts_document && !ctx.has_query_flag(DOCUMENT_MARKER) {
        return Transport::RawStream;
    }
    Transport::Document
}

/// Response headers for a transport.
///
/// Both transports set `Vary: Accept` so caches key on the negotiated
/// content type. This contract is load-bearing; it never varies per
/// request.
pub fn response_headers(transport: Transport) -> Vec<(String, String)> {
    let content_type = match transport {
        Transport::RawStream => RAW_CONTENT_TYPE,
        Transport::Document => DOCUMENT_CONTENT_TYPE,
    };
    vec![
        ("content-type".to_string(), content_type.to_string()),
        ("vary".to_string(), "accept".to_string()),
    ]
}

/// Produces the response for an assembled payload.
///
/// Collaborators are injected at construction; nothing is looked up from
/// ambient state at request time.
pub struct TransportNegotiator {
    serializer: Arc<dyn TreeSerializer>,
    renderer: Arc<dyn DocumentRenderer>,
    capacity: usize,
}

impl TransportNegotiator {
    /// Create a negotiator with injected collaborators.
    pub fn new(serializer: Arc<dyn TreeSerializer>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            serializer,
            renderer,
            capacity: 16,
        }
    }

    /// Create a negotiator from concrete collaborator values.
    pub fn with_collaborators<S, R>(serializer: S, renderer: R) -> Self
    where
        S: TreeSerializer + 'static,
        R: DocumentRenderer + 'static,
    {
        Self::new(Arc::new(serializer), Arc::new(renderer))
    }

    /// Set the chunk-channel capacity used for response bodies.
    pub fn with_capacity(mut self, chunks: usize) -> Self {
        self.capacity = chunks;
        self
    }

    /// Build the response for this request.
    ///
    /// The body is produced lazily: serializer and renderer work runs as
    /// the returned stream is polled, so bytes can reach the client before
    /// rendering finishes.
    pub fn respond(
        &self,
        ctx: &RequestContext,
        payload: ResponsePayload,
        references: Option<TemporaryReferences>,
    ) -> StreamingResponse {
        let transport = select_transport(ctx);
        let headers = response_headers(transport);

        let body = match transport {
            Transport::RawStream => {
                let (producer, rx) = chunk_channel(self.capacity, ctx.timing.clone());
                let serializer = Arc::clone(&self.serializer);
                let opts = SerializeOptions {
                    temporary_references: references,
                };
                let work = async move { serializer.serialize(payload, opts, producer).await };
                fused_body(work, rx)
            }
            Transport::Document => {
                let doc_opts = DocumentOptions {
                    form_state: payload.form_state.clone(),
                    debug_noscript: ctx.has_query_flag(NOSCRIPT_MARKER),
                };
                let (payload_tx, payload_rx) = chunk_channel(self.capacity, ctx.timing.clone());
                let (doc_tx, doc_rx) = chunk_channel(self.capacity, ctx.timing.clone());
                let serializer = Arc::clone(&self.serializer);
                let renderer = Arc::clone(&self.renderer);
                let opts = SerializeOptions {
                    temporary_references: references,
                };
                let work = async move {
                    let serialize = serializer.serialize(payload, opts, payload_tx);
                    let render = renderer.render_document(payload_rx, doc_opts, doc_tx);
                    try_join(serialize, render).await.map(|_| ())
                };
                fused_body(work, doc_rx)
            }
        };

        StreamingResponse::new(200, headers, body)
    }
}
