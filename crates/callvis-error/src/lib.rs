//! # callvis-error
//!
//! Unified error handling for callvis.
//!
//! - **ErrorKind**: what went wrong (e.g. `FuncNotFound`, `IoFailed`)
//! - **Error context**: the failing operation plus key/value pairs that locate the cause
//! - **Error source**: the wrapped underlying error, never leaked as a raw type
//!
//! Rendering has no recoverable error category: every error aborts the render
//! and is surfaced to the caller as is.
//!
//! ## Usage
//!
//! ```rust
//! use callvis_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::FuncNotFound, "callee missing from function table")
//!         .with_operation("graph::visit_edges")
//!         .with_context("func_id", "42"))
//! }
//! ```

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using the callvis Error
pub type Result<T> = std::result::Result<T, Error>;
