//! Core abstractions for the Arbor request pipeline.
//!
//! This crate provides the fundamental types shared by every pipeline stage:
//! - `RequestContext` - Typed view of an incoming request
//! - `RequestId` - Per-request correlation identifier
//! - `PipelinePhase` / `TimingContext` - Request lifecycle tracking
//! - `ServerConfig` - Handler configuration

mod config;
mod context;
mod lifecycle;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
