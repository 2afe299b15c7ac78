//! # esovm-error
//!
//! Unified error handling for the esovm machines.
//!
//! ## Design
//!
//! - **ErrorKind**: what went wrong (e.g. UnmatchedBracket, ExceededCycles)
//! - **ErrorClass**: where in the lifecycle it belongs (Syntax, Runtime, Unsupported, Host)
//! - **Error Context**: key-value pairs locating the cause (position, label, limit)
//! - **Error Source**: wrapped underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use esovm_error::{Error, ErrorClass, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::UnmatchedBracket, "unmatched '[' at position 0")
//!         .with_operation("tape::preprocess")
//!         .with_context("position", "0"))
//! }
//!
//! let err = example().unwrap_err();
//! assert_eq!(err.class(), ErrorClass::Syntax);
//! ```
//!
//! ## Principles
//!
//! - Syntax-class errors are returned from constructors, before any run state exists
//! - Runtime and Unsupported errors are captured by the run loop and become faults
//! - External errors are wrapped with `set_source(err)`

mod class;
mod error;
mod kind;

pub use class::ErrorClass;
pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using the esovm Error
pub type Result<T> = std::result::Result<T, Error>;
