//! Arbor request pipeline.
//!
//! One request flows through four stages in a fixed order:
//!
//! ```text
//! request -> action dispatch -> route resolution -> payload assembly
//!         -> transport negotiation -> response stream
//! ```
//!
//! Dispatch runs strictly before resolution so a mutating POST renders the
//! tree it just changed: one round trip mutates and fetches.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use arbor_server::prelude::*;
//!
//! let handler = RequestHandler::builder()
//!     .components(
//!         ComponentRegistry::new()
//!             .layout("/", StaticUnit::new("root-layout"))
//!             .page("/", StaticUnit::new("home-page")),
//!     )
//!     .actions(ActionTable::new())
//!     .build();
//!
//! let response = handler.handle(RequestContext::for_url(Method::Get, "/")).await?;
//! ```

pub mod prelude;

mod handler;

pub use handler::*;
