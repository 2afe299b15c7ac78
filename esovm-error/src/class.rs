//! Error classes: the lifecycle stage an error belongs to

use std::fmt;

/// Which part of the execution lifecycle produced an error.
///
/// The class decides how an error travels: syntax errors abort construction,
/// runtime and unsupported errors are caught inside the run loop and rendered
/// as a trailing note, host errors come from the surrounding tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed program, detected while preprocessing
    Syntax,
    /// Fault raised while executing, including resource limits
    Runtime,
    /// Recognised but deliberately unimplemented feature
    Unsupported,
    /// Configuration, I/O and other errors outside the machines
    Host,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Syntax => "syntax",
            ErrorClass::Runtime => "runtime",
            ErrorClass::Unsupported => "unsupported",
            ErrorClass::Host => "host",
        }
    }

    /// Whether an error of this class can be captured as a run fault.
    pub fn is_fault(&self) -> bool {
        matches!(self, ErrorClass::Runtime | ErrorClass::Unsupported)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
