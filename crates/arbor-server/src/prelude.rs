//! Common imports for Arbor applications.
//!
//! ```rust,ignore
//! use arbor_server::prelude::*;
//! ```

pub use crate::{HandlerBuilder, HandlerError, RequestHandler};

pub use arbor_core::{
    LifecycleObserver, Method, PipelinePhase, RequestContext, RequestId, ServerConfig,
    TimingContext,
};

pub use arbor_router::{
    ComponentRegistry, ComponentSource, ComposedTree, NotFoundView, PathSegments, RouteResolver,
    StaticUnit, Unit, UnitKind, UnitRef,
};

pub use arbor_actions::{
    ActionCodec, ActionDispatcher, ActionError, ActionOutcome, ActionRegistry, ActionTable,
    ActionValue, FieldCodec, FnAction, FormData, FormState, FormValue, ServerAction,
    TemporaryReferences, ACTION_HEADER,
};

pub use arbor_transport::{
    select_transport, HeadContent, JsonTreeSerializer, ResponsePayload, Shell,
    ShellDocumentRenderer, StreamingResponse, Transport, TransportNegotiator, DOCUMENT_MARKER,
    NOSCRIPT_MARKER, RAW_MARKER,
};

pub use arbor_observability::{LogFormat, LogLevel, StructuredLogger};
