//! The request handler.

use std::sync::Arc;
use std::task::Poll;

use arbor_actions::{
    ActionCodec, ActionDispatcher, ActionError, ActionOutcome, ActionRegistry, ActionTable,
    FieldCodec, ACTION_HEADER,
};
use arbor_core::{LifecycleObserver, PipelinePhase, RequestContext, ServerConfig, TimingContext};
use arbor_observability::{LogFormat, StructuredLogger};
use arbor_router::{ComponentRegistry, ComponentSource, LocateError, RouteResolver};
use arbor_transport::{
    BodyStream, DocumentRenderer, HeadContent, JsonTreeSerializer, ResponsePayload, Shell,
    ShellDocumentRenderer, StreamingResponse, TransportError, TransportNegotiator, TreeSerializer,
};
use futures::{stream, StreamExt};
use thiserror::Error;

/// A fatal request failure.
///
/// These propagate out of the pipeline unformatted; turning them into a
/// non-200 wire response is the embedder's concern. The not-found route is
/// never an error, it produces a normal payload.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl HandlerError {
    /// Suggested status code for embedders that format errors.
    pub fn status_hint(&self) -> u16 {
        match self {
            HandlerError::Action(ActionError::DecodeFailure(_))
            | HandlerError::Action(ActionError::UnresolvedReference(_)) => 400,
            _ => 500,
        }
    }
}

/// The Arbor request pipeline.
///
/// Holds the per-application collaborators; everything per-request is
/// created in `handle` and dropped when the response stream ends.
pub struct RequestHandler {
    resolver: RouteResolver<Arc<dyn ComponentSource>>,
    dispatcher: ActionDispatcher,
    negotiator: TransportNegotiator,
    observer: Option<Arc<dyn LifecycleObserver>>,
    config: ServerConfig,
}

impl RequestHandler {
    /// Start building a handler.
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::default()
    }

    /// Handle one request.
    ///
    /// The returned response carries headers decided from the request alone;
    /// its body stream drives serialization (and document rendering) as it
    /// is polled.
    pub async fn handle(&self, ctx: RequestContext) -> Result<StreamingResponse, HandlerError> {
        let mut logger = StructuredLogger::new(ctx.request_id.clone())
            .with_route(ctx.path.clone())
            .with_format(if self.config.human_logs {
                LogFormat::Human
            } else {
                LogFormat::Json
            });
        if let Some(action_id) = ctx.header(ACTION_HEADER) {
            logger = logger.with_action(action_id);
        }
        self.notify(&ctx, PipelinePhase::Start);

        // Dispatch strictly before resolution: the tree rendered below must
        // reflect any state the action just changed.
        let outcome = match self.dispatcher.dispatch(&ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                logger.error_builder("action dispatch failed")
                    .field("error", e.to_string())
                    .emit();
                self.notify(&ctx, PipelinePhase::Error(e.to_string()));
                return Err(e.into());
            }
        };
        ctx.timing.mark("action_dispatched");
        self.notify(&ctx, PipelinePhase::ActionDispatched);
        if !matches!(outcome, ActionOutcome::RenderOnly) {
            logger.info_builder("action dispatched").emit();
        }

        let tree = match self.resolver.resolve(&ctx.path).await {
            Ok(tree) => tree,
            Err(e) => {
                self.notify(&ctx, PipelinePhase::Error(e.to_string()));
                return Err(e.into());
            }
        };
        ctx.timing.mark("route_resolved");
        self.notify(&ctx, PipelinePhase::RouteResolved);
        logger
            .debug_builder("route resolved")
            .field("tree", tree.outline())
            .emit();

        let (payload, references) = ResponsePayload::assemble(tree, outcome);
        self.notify(&ctx, PipelinePhase::PayloadAssembled);
        let mut response = self.negotiator.respond(&ctx, payload, references);
        self.notify(&ctx, PipelinePhase::Streaming);
        logger
            .info_builder("response ready")
            .field("content_type", response.header("content-type").unwrap_or(""))
            .emit();

        if let Some(observer) = &self.observer {
            response.body =
                observe_completion(response.body, Arc::clone(observer), ctx.timing.clone());
        }
        Ok(response)
    }

    fn notify(&self, ctx: &RequestContext, phase: PipelinePhase) {
        if let Some(observer) = &self.observer {
            observer.on_phase(phase, ctx.timing.elapsed());
        }
    }

    /// The handler configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Report the terminal phase once the body stream ends.
///
/// The producer marks `complete` on the shared timing only after the full
/// payload was written, so a stream that ends without the mark is reported
/// as an error.
fn observe_completion(
    body: BodyStream,
    observer: Arc<dyn LifecycleObserver>,
    timing: TimingContext,
) -> BodyStream {
    let mut notified = false;
    let tail = stream::poll_fn(move |_| {
        if !notified {
            notified = true;
            let phase = if timing.time_to("complete").is_some() {
                PipelinePhase::Completion
            } else {
                PipelinePhase::Error("response stream ended early".to_string())
            };
            observer.on_phase(phase, timing.elapsed());
        }
        Poll::Ready(None)
    });
    Box::pin(body.chain(tail))
}

/// Builder for `RequestHandler`.
///
/// Reference collaborators fill any seam left unset: the field codec, the
/// JSON tree serializer, and the shell document renderer.
pub struct HandlerBuilder {
    components: Option<Arc<dyn ComponentSource>>,
    actions: Option<Arc<dyn ActionRegistry>>,
    codec: Option<Arc<dyn ActionCodec>>,
    serializer: Option<Arc<dyn TreeSerializer>>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    observer: Option<Arc<dyn LifecycleObserver>>,
    config: ServerConfig,
}

impl Default for HandlerBuilder {
    fn default() -> Self {
        Self {
            components: None,
            actions: None,
            codec: None,
            serializer: None,
            renderer: None,
            observer: None,
            config: ServerConfig::default(),
        }
    }
}

impl HandlerBuilder {
    /// Set the component source.
    pub fn components(mut self, source: impl ComponentSource + 'static) -> Self {
        self.components = Some(Arc::new(source));
        self
    }

    /// Set the action registry.
    pub fn actions(mut self, registry: impl ActionRegistry + 'static) -> Self {
        self.actions = Some(Arc::new(registry));
        self
    }

    /// Set the action codec.
    pub fn codec(mut self, codec: impl ActionCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Set the tree serializer.
    pub fn serializer(mut self, serializer: impl TreeSerializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Set the document renderer.
    pub fn renderer(mut self, renderer: impl DocumentRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Observe pipeline phase transitions.
    pub fn observer(mut self, observer: impl LifecycleObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the handler.
    pub fn build(self) -> RequestHandler {
        let components = self
            .components
            .unwrap_or_else(|| Arc::new(ComponentRegistry::new()));
        let actions = self.actions.unwrap_or_else(|| Arc::new(ActionTable::new()));
        let codec = self.codec.unwrap_or_else(|| Arc::new(FieldCodec));
        let serializer = self
            .serializer
            .unwrap_or_else(|| Arc::new(JsonTreeSerializer));
        let renderer = self.renderer.unwrap_or_else(|| {
            Arc::new(ShellDocumentRenderer::new(Shell::new(HeadContent::new(
                self.config.app_name.clone(),
            ))))
        });

        RequestHandler {
            resolver: RouteResolver::new(components),
            dispatcher: ActionDispatcher::new(actions, codec),
            negotiator: TransportNegotiator::new(serializer, renderer)
                .with_capacity(self.config.stream_capacity),
            observer: self.observer,
            config: self.config,
        }
    }
}
