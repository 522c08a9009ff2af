//! Server action dispatch for the Arbor pipeline.
//!
//! A POST request can invoke a server action in one of two protocols:
//! - **Direct**: the `x-rsc-action` header names the action; the body is a
//!   decoded argument list, possibly carrying temporary references.
//! - **Progressive**: no header; the body is a form submission that
//!   self-describes its target action (for clients without script).
//!
//! Dispatch always completes before route resolution so the freshly
//! rendered tree reflects the mutation (single round trip).

mod codec;
mod dispatch;
mod error;
mod form;
mod refs;

pub use codec::*;
pub use dispatch::*;
pub use error::*;
pub use form::*;
pub use refs::*;
