//! Error kinds for esovm operations

use crate::ErrorClass;
use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on ErrorKind to tell a malformed program from a runaway one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // Syntax errors (preprocessing)
    // =========================================================================
    /// A character or symbol sequence that decodes to no instruction
    InvalidInstruction,

    /// A loop bracket without its partner
    UnmatchedBracket,

    /// The program has no exit instruction anywhere
    MissingExit,

    /// A jump or call names a label that is never defined
    UndefinedLabel,

    /// The same label is marked twice
    DuplicateLabel,

    /// A number literal is malformed or does not fit
    InvalidNumber,

    // =========================================================================
    // Runtime faults
    // =========================================================================
    /// Division or modulo by zero under the fatal policy
    DivisionByZero,

    /// A data or instruction pointer left its addressable range
    PointerOutOfBounds,

    /// Too many values pushed onto a stack
    StackOverflow,

    /// The run hit the configured cycle cap
    ExceededCycles,

    /// The run hit the configured wall-clock cap
    ExceededTime,

    /// The accumulated output hit the configured length cap
    OutputTooLong,

    // =========================================================================
    // Unsupported
    // =========================================================================
    /// A recognised instruction that is deliberately not implemented
    UnsupportedFeature,

    // =========================================================================
    // Host errors
    // =========================================================================
    /// Invalid configuration or options
    ConfigInvalid,

    /// Invalid argument passed to a function
    InvalidArgument,

    /// Failed to parse host input (images, config files)
    ParseFailed,

    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Catch-all for unhandled cases
    Unexpected,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInstruction => "InvalidInstruction",
            ErrorKind::UnmatchedBracket => "UnmatchedBracket",
            ErrorKind::MissingExit => "MissingExit",
            ErrorKind::UndefinedLabel => "UndefinedLabel",
            ErrorKind::DuplicateLabel => "DuplicateLabel",
            ErrorKind::InvalidNumber => "InvalidNumber",

            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::PointerOutOfBounds => "PointerOutOfBounds",
            ErrorKind::StackOverflow => "StackOverflow",
            ErrorKind::ExceededCycles => "ExceededCycles",
            ErrorKind::ExceededTime => "ExceededTime",
            ErrorKind::OutputTooLong => "OutputTooLong",

            ErrorKind::UnsupportedFeature => "UnsupportedFeature",

            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::Unexpected => "Unexpected",
        }
    }

    /// The lifecycle class an error of this kind belongs to by default
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::InvalidInstruction
            | ErrorKind::UnmatchedBracket
            | ErrorKind::MissingExit
            | ErrorKind::UndefinedLabel
            | ErrorKind::DuplicateLabel
            | ErrorKind::InvalidNumber => ErrorClass::Syntax,

            ErrorKind::DivisionByZero
            | ErrorKind::PointerOutOfBounds
            | ErrorKind::StackOverflow
            | ErrorKind::ExceededCycles
            | ErrorKind::ExceededTime
            | ErrorKind::OutputTooLong => ErrorClass::Runtime,

            ErrorKind::UnsupportedFeature => ErrorClass::Unsupported,

            _ => ErrorClass::Host,
        }
    }

    /// Whether this kind is one of the three resource limits
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            ErrorKind::ExceededCycles | ErrorKind::ExceededTime | ErrorKind::OutputTooLong
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::UnmatchedBracket.to_string(), "UnmatchedBracket");
        assert_eq!(ErrorKind::ExceededCycles.to_string(), "ExceededCycles");
    }

    #[test]
    fn test_class() {
        assert_eq!(ErrorKind::MissingExit.class(), ErrorClass::Syntax);
        assert_eq!(ErrorKind::DivisionByZero.class(), ErrorClass::Runtime);
        assert_eq!(ErrorKind::UnsupportedFeature.class(), ErrorClass::Unsupported);
        assert_eq!(ErrorKind::IoFailed.class(), ErrorClass::Host);
    }

    #[test]
    fn test_is_resource_limit() {
        assert!(ErrorKind::ExceededTime.is_resource_limit());
        assert!(ErrorKind::OutputTooLong.is_resource_limit());
        assert!(!ErrorKind::DivisionByZero.is_resource_limit());
    }
}
