//! # Run Options
//!
//! One option set covers every machine; each variant reads the fields it
//! understands and ignores the rest. Options deserialize from JSON with every
//! field optional.

use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default cycle cap
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;

/// Default wall-clock cap in milliseconds
pub const DEFAULT_MAX_TIME_MS: u64 = 1_000;

/// Default output cap in characters
pub const DEFAULT_MAX_OUTPUT: usize = 500;

/// Grid machine dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "93")]
    Befunge93,
    #[serde(alias = "98")]
    Befunge98,
}

impl FromStr for Dialect {
    type Err = esovm_error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "93" | "befunge93" | "befunge-93" => Ok(Dialect::Befunge93),
            "98" | "befunge98" | "befunge-98" => Ok(Dialect::Befunge98),
            other => Err(error::config_invalid(format!("unknown dialect '{}'", other))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Befunge93 => write!(f, "befunge93"),
            Dialect::Befunge98 => write!(f, "befunge98"),
        }
    }
}

/// Options recognised by the machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Debug verbosity; any value above 0 attaches a diagnostic snapshot
    pub debug: u8,
    /// Tape machine: fault on characters that are not opcodes
    pub strict: bool,
    /// Canonicalise raw source text before parsing
    pub normalize: bool,
    /// Grid machine dialect
    pub dialect: Dialect,
    /// Grid machine: wrap around the edges instead of halting
    pub wrap: bool,
    /// Geometric machine: pixels per codel edge
    pub codel_size: u32,
    /// Geometric machine: record the path and render a trace image
    pub trace: bool,
    /// Seed for random direction choice; drawn from OS entropy when unset
    pub seed: Option<u64>,
    pub max_cycles: u64,
    pub max_time_ms: u64,
    pub max_output: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: 0,
            strict: false,
            normalize: false,
            dialect: Dialect::default(),
            wrap: false,
            codel_size: 1,
            trace: false,
            seed: None,
            max_cycles: DEFAULT_MAX_CYCLES,
            max_time_ms: DEFAULT_MAX_TIME_MS,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document, filling unset fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Options = serde_json::from_str(json).map_err(|e| {
            error::config_invalid(format!("invalid options: {}", e))
                .with_operation("options::from_json")
                .set_source(e)
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Reject options no machine can run with
    pub fn validate(&self) -> Result<()> {
        if self.codel_size == 0 {
            return Err(error::config_invalid("codel_size must be at least 1"));
        }
        if self.max_cycles == 0 {
            return Err(error::config_invalid("max_cycles must be at least 1"));
        }
        if self.max_time_ms == 0 {
            return Err(error::config_invalid("max_time_ms must be at least 1"));
        }
        if self.max_output == 0 {
            return Err(error::config_invalid("max_output must be at least 1"));
        }
        Ok(())
    }

    pub fn with_debug(mut self, level: u8) -> Self {
        self.debug = level;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_codel_size(mut self, size: u32) -> Self {
        self.codel_size = size;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_cycles(mut self, max: u64) -> Self {
        self.max_cycles = max;
        self
    }

    pub fn with_max_time_ms(mut self, max: u64) -> Self {
        self.max_time_ms = max;
        self
    }

    pub fn with_max_output(mut self, max: usize) -> Self {
        self.max_output = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.max_cycles, 10_000);
        assert_eq!(options.max_time_ms, 1_000);
        assert_eq!(options.max_output, 500);
        assert_eq!(options.dialect, Dialect::Befunge93);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let options = Options::from_json(r#"{"max_cycles": 50, "dialect": "98"}"#).unwrap();
        assert_eq!(options.max_cycles, 50);
        assert_eq!(options.dialect, Dialect::Befunge98);
        assert_eq!(options.max_output, 500);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = Options::from_json(r#"{"max_cycles": "many"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Options::from_json(r#"{"codel_size": 0}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("98".parse::<Dialect>().unwrap(), Dialect::Befunge98);
        assert_eq!("Befunge-93".parse::<Dialect>().unwrap(), Dialect::Befunge93);
        assert!("97".parse::<Dialect>().is_err());
    }
}
