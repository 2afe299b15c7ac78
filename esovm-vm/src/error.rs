//! esovm VM error helpers
//!
//! Re-exports esovm-error and provides machine-specific conveniences.

pub use esovm_error::{Error, ErrorClass, ErrorKind, Result};

// =============================================================================
// VM-specific error constructors
// =============================================================================

/// Create an UnmatchedBracket error
pub fn unmatched_bracket(bracket: char, position: usize) -> Error {
    Error::new(
        ErrorKind::UnmatchedBracket,
        format!("unmatched '{}' at position {}", bracket, position),
    )
    .with_context("position", position.to_string())
}

/// Create an InvalidInstruction error at a source position
pub fn invalid_instruction(position: usize, detail: impl Into<String>) -> Error {
    Error::invalid_instruction(position, detail)
}

/// Create a MissingExit error
pub fn missing_exit(exit: &str) -> Error {
    Error::new(ErrorKind::MissingExit, format!("program has no {} instruction", exit))
}

/// Create an UndefinedLabel error
pub fn undefined_label(label: impl Into<String>) -> Error {
    Error::undefined_label(label)
}

/// Create a DuplicateLabel error
pub fn duplicate_label(label: impl Into<String>, position: usize) -> Error {
    let label = label.into();
    Error::new(
        ErrorKind::DuplicateLabel,
        format!("label '{}' marked again at position {}", label, position),
    )
    .with_context("label", label)
    .with_context("position", position.to_string())
}

/// Create an InvalidNumber error
pub fn invalid_number(position: usize, reason: impl Into<String>) -> Error {
    Error::new(
        ErrorKind::InvalidNumber,
        format!("invalid number at position {}: {}", position, reason.into()),
    )
    .with_context("position", position.to_string())
}

/// Create a DivisionByZero error
pub fn division_by_zero() -> Error {
    Error::division_by_zero()
}

/// Create a PointerOutOfBounds error
pub fn pointer_out_of_bounds(what: &str, position: i64) -> Error {
    Error::new(
        ErrorKind::PointerOutOfBounds,
        format!("{} moved out of bounds to {}", what, position),
    )
    .with_context("position", position.to_string())
}

/// Create an ExceededCycles error
pub fn exceeded_cycles(max: u64) -> Error {
    Error::new(ErrorKind::ExceededCycles, format!("reached {} cycles", max))
        .with_context("max_cycles", max.to_string())
}

/// Create an ExceededTime error
pub fn exceeded_time(max_ms: u64) -> Error {
    Error::new(ErrorKind::ExceededTime, format!("ran for {}ms", max_ms))
        .with_context("max_time_ms", max_ms.to_string())
}

/// Create an OutputTooLong error
pub fn output_too_long(max: usize) -> Error {
    Error::new(ErrorKind::OutputTooLong, format!("reached {} characters", max))
        .with_context("max_output", max.to_string())
}

/// Create an UnsupportedFeature error
pub fn unsupported(feature: impl Into<String>) -> Error {
    Error::unsupported(feature)
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message)
}

/// Create a ParseFailed error
pub fn parse_failed(message: impl Into<String>) -> Error {
    Error::parse_failed(message)
}

/// Create a StackOverflow error
pub fn stack_overflow(max: usize) -> Error {
    Error::new(ErrorKind::StackOverflow, format!("stack depth exceeded maximum {}", max))
        .with_context("max_depth", max.to_string())
}
