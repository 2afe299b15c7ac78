//! # Languages
//!
//! The five machine variants by name, and a convenience entry point that
//! builds the right machine for a text program.

use crate::error::{Error, ErrorKind, Result};
use crate::geometric::{GeometricMachine, PixelGrid};
use crate::grid::GridMachine;
use crate::machine::{run, ExecutionResult};
use crate::normalize::normalize;
use crate::options::Options;
use crate::tape::TapeMachine;
use crate::ternary::TernaryMachine;
use crate::trie::TrieMachine;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A machine variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Linear tape machine (Brainfuck)
    Tape,
    /// 2D self-directing grid machine (Befunge)
    Grid,
    /// Self-modifying ternary machine (Malbolge)
    Ternary,
    /// Trie-decoded bytecode machine (Whitespace)
    Trie,
    /// Geometric color-block machine (Piet)
    Geometric,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Tape,
        Language::Grid,
        Language::Ternary,
        Language::Trie,
        Language::Geometric,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Tape => "tape",
            Language::Grid => "grid",
            Language::Ternary => "ternary",
            Language::Trie => "trie",
            Language::Geometric => "geometric",
        }
    }

    /// The esoteric language each machine runs
    pub fn dialect_name(&self) -> &'static str {
        match self {
            Language::Tape => "Brainfuck",
            Language::Grid => "Befunge",
            Language::Ternary => "Malbolge",
            Language::Trie => "Whitespace",
            Language::Geometric => "Piet",
        }
    }

    /// Alternative names accepted by `from_str`
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Language::Tape => &["brainfuck", "bf"],
            Language::Grid => &["befunge", "bef", "befunge93", "befunge98"],
            Language::Ternary => &["malbolge", "mb"],
            Language::Trie => &["whitespace", "ws"],
            Language::Geometric => &["piet"],
        }
    }

    /// Whether programs are text (every variant but geometric)
    pub fn is_text(&self) -> bool {
        !matches!(self, Language::Geometric)
    }

    /// Build the machine for a text program and run it.
    ///
    /// Syntax errors are returned; faults during the run are on the result.
    /// Geometric programs are images and go through
    /// [`GeometricMachine::from_pixels`] instead.
    pub fn run_source(&self, source: &str, input: &str, options: &Options) -> Result<ExecutionResult> {
        options.validate()?;
        let source = if options.normalize {
            normalize(*self, source)
        } else {
            source.to_string()
        };
        let result = match self {
            Language::Tape => run(&TapeMachine::new(&source, options)?, input),
            Language::Grid => run(&GridMachine::new(&source, options)?, input),
            Language::Ternary => run(&TernaryMachine::new(&source, options)?, input),
            Language::Trie => run(&TrieMachine::new(&source, options)?, input),
            Language::Geometric => {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    "geometric programs are images; use GeometricMachine::from_pixels",
                )
                .with_operation("language::run_source"))
            }
        };
        Ok(result)
    }

    /// Run a geometric program from decoded pixels
    pub fn run_pixels(pixels: &PixelGrid, input: &str, options: &Options) -> Result<ExecutionResult> {
        options.validate()?;
        Ok(run(&GeometricMachine::from_pixels(pixels, options)?, input))
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.name() == lower || lang.aliases().contains(&lower.as_str()))
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidArgument, format!("unknown language '{}'", s))
                    .with_context("language", s)
            })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
