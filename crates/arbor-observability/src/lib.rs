//! Observability for the Arbor pipeline.
//!
//! Currently this is structured logging with request correlation:
//! - `StructuredLogger` - Request-scoped logger
//! - `LogEntry` / `LogLevel` / `LogFormat` - Structured log model
//! - `LogBuilder` - Fluent entries with typed fields

mod logging;

pub use logging::*;
