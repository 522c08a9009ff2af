//! Response transport for the Arbor pipeline.
//!
//! Packages a composed tree plus any action results into one payload, then
//! decides per request whether to answer with the raw serialized stream or
//! to delegate to the document-rendering collaborator:
//! - `ResponsePayload` - Assembled response payload
//! - `Transport` / `TransportNegotiator` - Header-driven transport choice
//! - `StreamProducer` / `fused_body` - Backpressured response streaming
//! - `TreeSerializer` / `DocumentRenderer` - Collaborator contracts
//! - `JsonTreeSerializer` / `ShellDocumentRenderer` - Reference collaborators
//!
//! The transport decision is a pure function of request headers and query
//! markers; it is made before any payload byte is produced.

mod error;
mod negotiate;
mod payload;
mod render;
mod response;
mod serialize;
mod shell;
mod stream;

pub use error::*;
pub use negotiate::*;
pub use payload::*;
pub use render::*;
pub use response::*;
pub use serialize::*;
pub use shell::*;
pub use stream::*;
