//! # esovm VM
//!
//! Five esoteric-language machines sharing one execution lifecycle.
//!
//! ## Core Concepts
//! - **Machine**: a validated program plus the hooks the shared driver calls:
//!   decode, execute, advance, snapshot
//! - **Run**: [`run`] drives a machine from fresh state until it halts, faults
//!   or trips a resource limit; faults are recorded on the result, never raised
//! - **Stack**: integer stack shared by the stack-based variants, where popping
//!   an empty stack yields 0
//! - **Variants**: [`TapeMachine`] (Brainfuck), [`GridMachine`] (Befunge),
//!   [`TernaryMachine`] (Malbolge), [`TrieMachine`] (Whitespace) and
//!   [`GeometricMachine`] (Piet)
//!
//! ```
//! use esovm_vm::{Language, Options};
//!
//! let result = Language::Tape
//!     .run_source("++++++++[>++++++++<-]>+.", "", &Options::default())
//!     .unwrap();
//! assert_eq!(result.output, "A");
//! ```

pub mod error;
pub mod geometric;
pub mod grid;
pub mod io;
pub mod language;
pub mod machine;
pub mod normalize;
pub mod options;
pub mod pointer;
pub mod schema;
pub mod stack;
pub mod tape;
pub mod ternary;
pub mod trie;

pub use error::{Error, ErrorClass, ErrorKind, Result};
pub use geometric::{Color, ColorGrid, GeometricMachine, PixelGrid};
pub use grid::GridMachine;
pub use io::{InputCursor, Output};
pub use language::Language;
pub use machine::{run, ExecutionResult, ExecutionState, Machine, Snapshot};
pub use normalize::normalize;
pub use options::{Dialect, Options};
pub use pointer::{Direction, Pointer2D};
pub use schema::VmSchema;
pub use stack::{BinaryOp, Stack};
pub use tape::TapeMachine;
pub use ternary::TernaryMachine;
pub use trie::TrieMachine;
