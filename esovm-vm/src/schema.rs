//! # Instruction Reference
//!
//! A structured description of every machine's instruction set and the
//! shared execution limits. Renders as markdown for people and as JSON for
//! tools.

use crate::geometric::{Command as GeometricCommand, COMMAND_TABLE};
use crate::language::Language;
use crate::options::{DEFAULT_MAX_CYCLES, DEFAULT_MAX_OUTPUT, DEFAULT_MAX_TIME_MS};
use crate::trie::{Arg, COMMANDS};
use serde::Serialize;

/// Reference for one or more machines
#[derive(Debug, Clone, Serialize)]
pub struct VmSchema {
    pub version: &'static str,
    pub description: &'static str,
    pub languages: Vec<LanguageSchema>,
    pub limits: Limits,
}

impl Default for VmSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl VmSchema {
    /// Reference for every machine
    pub fn new() -> Self {
        Self::with_languages(&Language::ALL)
    }

    /// Reference for a single machine
    pub fn for_language(language: Language) -> Self {
        Self::with_languages(&[language])
    }

    fn with_languages(languages: &[Language]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            description: "esovm runs five esoteric machines behind one lifecycle: decode the \
                          instruction under the pointer, execute it, advance, and stop on halt, \
                          fault or a resource limit.",
            languages: languages.iter().map(|&language| LanguageSchema::new(language)).collect(),
            limits: Limits::default(),
        }
    }

    /// Render as markdown
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# esovm instruction reference\n\n");
        out.push_str(self.description);
        out.push_str("\n\n");
        out.push_str(&format!(
            "**Limits**: {} cycles, {}ms, {} output characters by default\n\n",
            self.limits.max_cycles, self.limits.max_time_ms, self.limits.max_output
        ));

        for language in &self.languages {
            out.push_str(&format!("## {} ({})\n\n", language.name, language.dialect));
            out.push_str(&format!("{}\n\n", language.description));
            out.push_str(&format!("**Memory**: {}\n\n", language.memory));
            for category in &language.categories {
                out.push_str(&format!("### {}\n", category.name));
                for op in &category.opcodes {
                    out.push_str(&format!("- `{}` **{}**: {}\n", op.encoding, op.name, op.description));
                }
                out.push('\n');
            }
        }
        out
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Instruction set of one machine
#[derive(Debug, Clone, Serialize)]
pub struct LanguageSchema {
    pub name: &'static str,
    pub dialect: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub memory: &'static str,
    pub categories: Vec<OpcodeCategory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpcodeCategory {
    pub name: &'static str,
    pub opcodes: Vec<OpcodeSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpcodeSpec {
    pub name: String,
    /// How the instruction is written
    pub encoding: String,
    pub description: &'static str,
}

fn op(name: &str, encoding: &str, description: &'static str) -> OpcodeSpec {
    OpcodeSpec {
        name: name.to_string(),
        encoding: encoding.to_string(),
        description,
    }
}

fn category(name: &'static str, opcodes: Vec<OpcodeSpec>) -> OpcodeCategory {
    OpcodeCategory { name, opcodes }
}

impl LanguageSchema {
    pub fn new(language: Language) -> Self {
        let (description, memory, categories) = match language {
            Language::Tape => (
                "Linear tape machine. Characters other than the eight instructions are comments \
                 unless strict mode is on.",
                "Tape of unbounded integer cells growing to the right; moving left of cell 0 faults.",
                tape_categories(),
            ),
            Language::Grid => (
                "Two-dimensional machine. The pointer starts top-left heading right; leaving the \
                 grid halts unless wrapping is enabled.",
                "Program grid, readable and writable with g and p; integer stack.",
                grid_categories(),
            ),
            Language::Ternary => (
                "Self-modifying ternary machine. The instruction is (cell + address) mod 94 and \
                 every executed cell is encrypted afterwards.",
                "59049 ten-trit words; registers a, c and d.",
                ternary_categories(),
            ),
            Language::Trie => (
                "Instructions are spelled in space (S), tab (T) and linefeed (L); everything else \
                 is a comment. Numbers are a sign then binary digits ended by L.",
                "Integer stack, integer heap, call stack.",
                trie_categories(),
            ),
            Language::Geometric => (
                "Programs are images. The command is chosen by the hue and lightness change \
                 between adjacent color blocks; eight blocked exits in a row end the program.",
                "Integer stack; direction pointer and codel chooser.",
                geometric_categories(),
            ),
        };
        Self {
            name: language.name(),
            dialect: language.dialect_name(),
            aliases: language.aliases(),
            description,
            memory,
            categories,
        }
    }
}

fn tape_categories() -> Vec<OpcodeCategory> {
    vec![
        category(
            "Pointer and cells",
            vec![
                op("right", ">", "Move the data pointer right"),
                op("left", "<", "Move the data pointer left"),
                op("increment", "+", "Add one to the current cell"),
                op("decrement", "-", "Subtract one from the current cell"),
            ],
        ),
        category(
            "I/O",
            vec![
                op("output", ".", "Write the current cell as a character"),
                op("input", ",", "Read a character into the current cell; end of input halts"),
            ],
        ),
        category(
            "Control",
            vec![
                op("loop", "[", "Jump past the matching ] if the current cell is zero"),
                op("end loop", "]", "Jump back to the matching [ if the current cell is nonzero"),
            ],
        ),
    ]
}

fn grid_categories() -> Vec<OpcodeCategory> {
    vec![
        category(
            "Stack and arithmetic",
            vec![
                op("digit", "0-9", "Push the digit"),
                op("arithmetic", "+ - * / %", "Pop b, a; push a op b. Division by zero faults"),
                op("not", "!", "Push 1 if the popped value is zero, else 0"),
                op("greater", "`", "Pop b, a; push 1 if a > b"),
                op("dup", ":", "Duplicate the top value"),
                op("swap", "\\", "Swap the top two values"),
                op("discard", "$", "Pop and discard"),
            ],
        ),
        category(
            "Direction",
            vec![
                op("go", "> < ^ v", "Set the direction"),
                op("random", "?", "Pick one of the four directions"),
                op("horizontal if", "_", "Pop; right if zero, else left"),
                op("vertical if", "|", "Pop; down if zero, else up"),
                op("bridge", "#", "Skip the next cell"),
                op("halt", "@", "End the program"),
            ],
        ),
        category(
            "Grid and I/O",
            vec![
                op("string mode", "\"", "Toggle pushing cells by code point"),
                op("put", "p", "Pop y, x, v; write v at (x, y)"),
                op("get", "g", "Pop y, x; push the cell at (x, y), 0 outside the grid"),
                op("output number", ".", "Pop and write as a number followed by a space"),
                op("output char", ",", "Pop and write as a character"),
                op("input number", "&", "Read a number; -1 at end of input"),
                op("input char", "~", "Read a character; -1 at end of input"),
            ],
        ),
        category(
            "Befunge-98 (dialect 98)",
            vec![
                op("hex digit", "a-f", "Push 10 to 15"),
                op("clear", "n", "Clear the stack"),
                op("reflect", "r", "Reverse the direction"),
                op("turn", "[ ]", "Turn left or right"),
                op("compare", "w", "Pop b, a; turn left if a < b, right if a > b"),
                op("jump", "j", "Pop n; move n cells"),
                op("fetch", "'", "Push the next cell and skip it"),
                op("store", "s", "Pop into the next cell and skip it"),
                op("skip", ";", "Skip to the matching ;"),
                op("delta", "x", "Pop dy, dx; set the direction vector"),
                op("quit", "q", "End the program"),
                op("unsupported", "h l m t i o = y k { } u ( )", "Fault as an unsupported feature"),
            ],
        ),
    ]
}

fn ternary_categories() -> Vec<OpcodeCategory> {
    vec![category(
        "Instructions (by decoded value)",
        vec![
            op("jump", "4", "c = [d]"),
            op("output", "5", "Write a mod 256 as a character"),
            op("input", "23", "Read a character into a; end of input reads 59048"),
            op("rotate", "39", "a = [d] = [d] rotated one trit right"),
            op("move", "40", "d = [d]"),
            op("crazy", "62", "a = [d] = crz([d], a)"),
            op("nop", "68", "Nothing; any other value also runs as nop"),
            op("halt", "81", "End the program"),
        ],
    )]
}

fn trie_categories() -> Vec<OpcodeCategory> {
    let describe = |name: &str| -> &'static str {
        match name {
            "Push" => "Push the number",
            "Dup" => "Duplicate the top value",
            "Copy" => "Copy the nth value onto the top",
            "Swap" => "Swap the top two values",
            "Discard" => "Pop and discard",
            "Slide" => "Drop n values under the top",
            "Add" | "Sub" | "Mul" => "Pop b, a; push a op b",
            "Div" | "Mod" => "Floored; division by zero faults",
            "Store" => "Pop value, address; store in the heap",
            "Retrieve" => "Pop address; push the heap value, 0 if unset",
            "Mark" => "Define a label here",
            "Call" => "Call a label",
            "Jump" => "Jump to a label",
            "JumpZero" => "Pop; jump if zero",
            "JumpNegative" => "Pop; jump if negative",
            "Return" => "Return from a call; with no caller, end the program",
            "Exit" => "End the program",
            "OutChar" => "Pop and write as a character",
            "OutNum" => "Pop and write as a number",
            "ReadChar" => "Pop address; store a character there, -1 at end of input",
            _ => "Pop address; store a number read from the next line, -1 at end of input",
        }
    };
    let mut groups: Vec<OpcodeCategory> = ["Stack", "Arithmetic", "Heap", "Flow", "I/O"]
        .into_iter()
        .map(|name| category(name, Vec::new()))
        .collect();
    for (command, symbols, arg) in COMMANDS {
        let group = match (symbols.as_bytes()[0], symbols.as_bytes()[1]) {
            (b'S', _) => 0,
            (b'T', b'S') => 1,
            (b'T', b'T') => 2,
            (b'L', _) => 3,
            _ => 4,
        };
        let name = format!("{:?}", command);
        let encoding = match arg {
            Arg::None => symbols.to_string(),
            Arg::Number => format!("{} <number>", symbols),
            Arg::Label => format!("{} <label>", symbols),
        };
        let description = describe(&name);
        groups[group].opcodes.push(OpcodeSpec {
            name,
            encoding,
            description,
        });
    }
    groups
}

fn geometric_categories() -> Vec<OpcodeCategory> {
    let describe = |command: GeometricCommand| -> &'static str {
        match command {
            GeometricCommand::Push => "Push the size of the block just left",
            GeometricCommand::Pop => "Pop and discard",
            GeometricCommand::Add | GeometricCommand::Subtract | GeometricCommand::Multiply => {
                "Pop b, a; push a op b"
            }
            GeometricCommand::Divide | GeometricCommand::Mod => "Floored; division by zero is ignored",
            GeometricCommand::Not => "Push 1 if the popped value is zero, else 0",
            GeometricCommand::Greater => "Pop b, a; push 1 if a > b",
            GeometricCommand::Pointer => "Pop n; rotate the direction pointer n quarter turns clockwise",
            GeometricCommand::Switch => "Pop n; toggle the codel chooser if n is odd",
            GeometricCommand::Duplicate => "Duplicate the top value",
            GeometricCommand::Roll => "Pop count, depth; roll the top depth values count times",
            GeometricCommand::InNumber => "Read a number; ignored at end of input",
            GeometricCommand::InChar => "Read a character; ignored at end of input",
            GeometricCommand::OutNumber => "Pop and write as a number",
            GeometricCommand::OutChar => "Pop and write as a character",
        }
    };
    let opcodes = COMMAND_TABLE
        .iter()
        .enumerate()
        .flat_map(|(hue, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(lightness, command)| command.map(|c| (hue, lightness, c)))
        })
        .map(|(hue, lightness, command)| OpcodeSpec {
            name: format!("{:?}", command),
            encoding: format!("hue +{}, lightness +{}", hue, lightness),
            description: describe(command),
        })
        .collect();
    vec![category("Color changes", opcodes)]
}

/// Default resource limits
#[derive(Debug, Clone, Serialize)]
pub struct Limits {
    pub max_cycles: u64,
    pub max_time_ms: u64,
    pub max_output: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            max_time_ms: DEFAULT_MAX_TIME_MS,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_covers_every_language() {
        let schema = VmSchema::new();
        assert_eq!(schema.languages.len(), 5);
        for language in &schema.languages {
            assert!(!language.categories.is_empty(), "{} has no opcodes", language.name);
        }
    }

    #[test]
    fn test_trie_reference_lists_every_command() {
        let schema = VmSchema::for_language(Language::Trie);
        let count: usize = schema.languages[0].categories.iter().map(|c| c.opcodes.len()).sum();
        assert_eq!(count, COMMANDS.len());
        let markdown = schema.to_markdown();
        assert!(markdown.contains("`LSS <label>` **Mark**"));
        assert!(markdown.contains("`TLTT` **ReadNum**"));
    }

    #[test]
    fn test_geometric_reference_has_seventeen_commands() {
        let schema = VmSchema::for_language(Language::Geometric);
        assert_eq!(schema.languages[0].categories[0].opcodes.len(), 17);
    }

    #[test]
    fn test_schema_json() {
        let json = VmSchema::for_language(Language::Tape).to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["languages"][0]["name"], "tape");
        assert_eq!(parsed["limits"]["max_cycles"], 10000);
    }
}
