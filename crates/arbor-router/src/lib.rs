//! Route resolution for the Arbor pipeline.
//!
//! This crate turns a request path into a composed UI tree:
//! - `PathSegments` - Parsed route segments
//! - `Unit` / `UnitKind` - Opaque renderable building blocks
//! - `ComponentSource` - Locator contract (absence is not an error)
//! - `ComponentRegistry` - Registry-backed locator
//! - `RouteResolver` - Page lookup + layout chain composition
//!
//! Pages are located at the full path; layouts are probed at every prefix
//! and wrapped around the page from the root outward.

mod error;
mod registry;
mod resolver;
mod segments;
mod unit;

pub use error::*;
pub use registry::*;
pub use resolver::*;
pub use segments::*;
pub use unit::*;
