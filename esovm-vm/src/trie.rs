//! # Trie Machine
//!
//! Whitespace-encoded machine with variable-length instructions. Only space
//! (S), tab (T) and linefeed (L) are significant; instructions are recognised
//! by walking a prefix trie of their symbol strings, and some take a number or
//! label argument terminated by L.
//!
//! The whole program is decoded once at construction. That pass indexes
//! labels, rejects duplicates and jumps to missing labels, and requires at
//! least one exit instruction.

use crate::error::{self, Result};
use crate::language::Language;
use crate::machine::{ExecutionState, Machine, Snapshot};
use crate::options::Options;
use crate::stack::BinaryOp;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Deepest call nesting before the run faults
pub const MAX_CALL_DEPTH: usize = 1 << 16;

/// One significant source character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Space
    S,
    /// Tab
    T,
    /// Linefeed
    L,
}

impl Symbol {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(Symbol::S),
            '\t' => Some(Symbol::T),
            '\n' => Some(Symbol::L),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Symbol::S => 0,
            Symbol::T => 1,
            Symbol::L => 2,
        }
    }

    fn letter(self) -> char {
        match self {
            Symbol::S => 'S',
            Symbol::T => 'T',
            Symbol::L => 'L',
        }
    }
}

/// Argument a command reads after its opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    None,
    Number,
    Label,
}

/// Instruction names, as stored in the trie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Push,
    Dup,
    Copy,
    Swap,
    Discard,
    Slide,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Store,
    Retrieve,
    Mark,
    Call,
    Jump,
    JumpZero,
    JumpNegative,
    Return,
    Exit,
    OutChar,
    OutNum,
    ReadChar,
    ReadNum,
}

/// Every command with its symbol string and argument
pub const COMMANDS: [(Command, &str, Arg); 24] = [
    (Command::Push, "SS", Arg::Number),
    (Command::Dup, "SLS", Arg::None),
    (Command::Copy, "STS", Arg::Number),
    (Command::Swap, "SLT", Arg::None),
    (Command::Discard, "SLL", Arg::None),
    (Command::Slide, "STL", Arg::Number),
    (Command::Add, "TSSS", Arg::None),
    (Command::Sub, "TSST", Arg::None),
    (Command::Mul, "TSSL", Arg::None),
    (Command::Div, "TSTS", Arg::None),
    (Command::Mod, "TSTT", Arg::None),
    (Command::Store, "TTS", Arg::None),
    (Command::Retrieve, "TTT", Arg::None),
    (Command::Mark, "LSS", Arg::Label),
    (Command::Call, "LST", Arg::Label),
    (Command::Jump, "LSL", Arg::Label),
    (Command::JumpZero, "LTS", Arg::Label),
    (Command::JumpNegative, "LTT", Arg::Label),
    (Command::Return, "LTL", Arg::None),
    (Command::Exit, "LLL", Arg::None),
    (Command::OutChar, "TLSS", Arg::None),
    (Command::OutNum, "TLST", Arg::None),
    (Command::ReadChar, "TLTS", Arg::None),
    (Command::ReadNum, "TLTT", Arg::None),
];

#[derive(Debug, Default)]
struct Node {
    children: [Option<usize>; 3],
    command: Option<(Command, Arg)>,
}

/// Prefix trie over S/T/L, stored as an arena of nodes
#[derive(Debug)]
pub struct CommandTrie {
    nodes: Vec<Node>,
}

impl CommandTrie {
    pub fn new() -> Self {
        let mut trie = Self {
            nodes: vec![Node::default()],
        };
        for (command, symbols, arg) in COMMANDS {
            trie.insert(symbols, command, arg);
        }
        trie
    }

    fn insert(&mut self, symbols: &str, command: Command, arg: Arg) {
        let mut node = 0;
        for symbol in symbols.chars().map(|c| match c {
            'S' => Symbol::S,
            'T' => Symbol::T,
            _ => Symbol::L,
        }) {
            node = match self.nodes[node].children[symbol.index()] {
                Some(child) => child,
                None => {
                    self.nodes.push(Node::default());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].children[symbol.index()] = Some(child);
                    child
                }
            };
        }
        self.nodes[node].command = Some((command, arg));
    }

    /// Walk from the root along `symbols`. Returns the command and how many
    /// symbols it used, or the index of the first symbol with no edge.
    fn walk(&self, symbols: &[(Symbol, usize)]) -> std::result::Result<(Command, Arg, usize), WalkError> {
        let mut node = 0;
        for (used, (symbol, _)) in symbols.iter().enumerate() {
            node = self.nodes[node].children[symbol.index()].ok_or(WalkError::DeadEnd(used))?;
            if let Some((command, arg)) = self.nodes[node].command {
                return Ok((command, arg, used + 1));
            }
        }
        Err(WalkError::Exhausted)
    }
}

impl Default for CommandTrie {
    fn default() -> Self {
        Self::new()
    }
}

enum WalkError {
    DeadEnd(usize),
    Exhausted,
}

/// Decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieOp {
    Push(i64),
    Dup,
    Copy(i64),
    Swap,
    Discard,
    Slide(i64),
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Store,
    Retrieve,
    Mark(Label),
    Call(Label),
    Jump(Label),
    JumpZero(Label),
    JumpNegative(Label),
    Return,
    Exit,
    OutChar,
    OutNum,
    ReadChar,
    ReadNum,
}

impl TrieOp {
    fn target(&self) -> Option<&Label> {
        match self {
            TrieOp::Call(label) | TrieOp::Jump(label) | TrieOp::JumpZero(label) | TrieOp::JumpNegative(label) => {
                Some(label)
            }
            _ => None,
        }
    }
}

/// A label, kept as its S/T spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<empty>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Registers of one trie run
#[derive(Debug, Clone, Default)]
pub struct TrieState {
    pub ip: usize,
    /// Set by control flow; replaces the default `ip + 1`
    pub next: Option<usize>,
    pub heap: BTreeMap<i64, i64>,
    pub calls: Vec<usize>,
}

/// A decoded, label-checked trie program
#[derive(Debug, Clone)]
pub struct TrieMachine {
    ops: Vec<TrieOp>,
    /// Source offset of each instruction's first symbol
    positions: Vec<usize>,
    /// Label to the index of the instruction after its mark
    labels: HashMap<Label, usize>,
    options: Options,
}

impl TrieMachine {
    pub fn new(source: &str, options: &Options) -> Result<Self> {
        options.validate()?;
        let symbols: Vec<(Symbol, usize)> = source
            .chars()
            .enumerate()
            .filter_map(|(pos, ch)| Symbol::from_char(ch).map(|s| (s, pos)))
            .collect();
        let trie = CommandTrie::new();

        let mut ops = Vec::new();
        let mut positions = Vec::new();
        let mut labels = HashMap::new();
        let mut cursor = 0;
        while cursor < symbols.len() {
            let start = symbols[cursor].1;
            let (command, arg, used) = match trie.walk(&symbols[cursor..]) {
                Ok(found) => found,
                Err(WalkError::DeadEnd(offset)) => {
                    let (symbol, pos) = symbols[cursor + offset];
                    return Err(error::invalid_instruction(
                        pos,
                        format!("no instruction continues with {}", symbol.letter()),
                    )
                    .with_operation("trie::preprocess"));
                }
                Err(WalkError::Exhausted) => {
                    return Err(error::invalid_instruction(start, "program ends inside an instruction")
                        .with_operation("trie::preprocess"));
                }
            };
            cursor += used;

            let op = match arg {
                Arg::None => simple_op(command),
                Arg::Number => {
                    let (value, used) = parse_number(&symbols[cursor..], start)?;
                    cursor += used;
                    number_op(command, value)
                }
                Arg::Label => {
                    let (label, used) = parse_label(&symbols[cursor..], start)?;
                    cursor += used;
                    label_op(command, label)
                }
            };

            if let TrieOp::Mark(label) = &op {
                if labels.insert(label.clone(), ops.len() + 1).is_some() {
                    return Err(error::duplicate_label(label.to_string(), start).with_operation("trie::preprocess"));
                }
            }
            ops.push(op);
            positions.push(start);
        }

        if !ops.contains(&TrieOp::Exit) {
            return Err(error::missing_exit("exit (LLL)").with_operation("trie::preprocess"));
        }
        for (op, position) in ops.iter().zip(&positions) {
            if let Some(label) = op.target() {
                if !labels.contains_key(label) {
                    return Err(error::undefined_label(label.to_string())
                        .with_operation("trie::preprocess")
                        .with_context("position", position.to_string()));
                }
            }
        }

        debug!("trie program: {} instructions, {} labels", ops.len(), labels.len());
        Ok(Self {
            ops,
            positions,
            labels,
            options: options.clone(),
        })
    }

    pub fn ops(&self) -> &[TrieOp] {
        &self.ops
    }

    /// Where execution continues after jumping to `label`
    pub fn label(&self, label: &Label) -> Option<usize> {
        self.labels.get(label).copied()
    }

    fn resolve(&self, label: &Label) -> Result<usize> {
        self.label(label)
            .ok_or_else(|| error::undefined_label(label.to_string()).with_operation("trie::execute"))
    }

    fn binary(&self, state: &mut ExecutionState<TrieState>, op: BinaryOp) -> Result<()> {
        state.stack.binary(op, false).map_err(|e| {
            e.with_operation("trie::execute")
                .with_context("position", self.positions[state.machine.ip].to_string())
        })
    }
}

fn simple_op(command: Command) -> TrieOp {
    match command {
        Command::Dup => TrieOp::Dup,
        Command::Swap => TrieOp::Swap,
        Command::Discard => TrieOp::Discard,
        Command::Add => TrieOp::Add,
        Command::Sub => TrieOp::Sub,
        Command::Mul => TrieOp::Mul,
        Command::Div => TrieOp::Div,
        Command::Mod => TrieOp::Mod,
        Command::Store => TrieOp::Store,
        Command::Retrieve => TrieOp::Retrieve,
        Command::Return => TrieOp::Return,
        Command::OutChar => TrieOp::OutChar,
        Command::OutNum => TrieOp::OutNum,
        Command::ReadChar => TrieOp::ReadChar,
        Command::ReadNum => TrieOp::ReadNum,
        _ => TrieOp::Exit,
    }
}

fn number_op(command: Command, value: i64) -> TrieOp {
    match command {
        Command::Copy => TrieOp::Copy(value),
        Command::Slide => TrieOp::Slide(value),
        _ => TrieOp::Push(value),
    }
}

fn label_op(command: Command, label: Label) -> TrieOp {
    match command {
        Command::Call => TrieOp::Call(label),
        Command::Jump => TrieOp::Jump(label),
        Command::JumpZero => TrieOp::JumpZero(label),
        Command::JumpNegative => TrieOp::JumpNegative(label),
        _ => TrieOp::Mark(label),
    }
}

/// Parse a signed binary number: a sign symbol (S positive, T negative) then
/// digits S=0 / T=1 up to L. A bare L is zero.
fn parse_number(symbols: &[(Symbol, usize)], start: usize) -> Result<(i64, usize)> {
    let Some(&(sign, _)) = symbols.first() else {
        return Err(error::invalid_number(start, "missing sign").with_operation("trie::preprocess"));
    };
    let negative = match sign {
        Symbol::L => return Ok((0, 1)),
        Symbol::S => false,
        Symbol::T => true,
    };
    let mut value: i64 = 0;
    for (used, &(symbol, pos)) in symbols.iter().enumerate().skip(1) {
        let bit = match symbol {
            Symbol::L => return Ok((if negative { -value } else { value }, used + 1)),
            Symbol::S => 0,
            Symbol::T => 1,
        };
        value = value
            .checked_mul(2)
            .and_then(|v| v.checked_add(bit))
            .ok_or_else(|| error::invalid_number(pos, "does not fit in 64 bits").with_operation("trie::preprocess"))?;
    }
    Err(error::invalid_number(start, "missing terminator").with_operation("trie::preprocess"))
}

/// Parse a label: S/T symbols up to L
fn parse_label(symbols: &[(Symbol, usize)], start: usize) -> Result<(Label, usize)> {
    let mut spelling = String::new();
    for (used, &(symbol, _)) in symbols.iter().enumerate() {
        if symbol == Symbol::L {
            return Ok((Label(spelling), used + 1));
        }
        spelling.push(symbol.letter());
    }
    Err(error::invalid_instruction(start, "label is missing its terminator").with_operation("trie::preprocess"))
}

impl Machine for TrieMachine {
    type State = TrieState;
    type Op = TrieOp;

    fn language(&self) -> Language {
        Language::Trie
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn init_state(&self) -> TrieState {
        TrieState::default()
    }

    fn decode(&self, state: &ExecutionState<TrieState>) -> Result<Option<TrieOp>> {
        Ok(self.ops.get(state.machine.ip).cloned())
    }

    fn execute(&self, op: &TrieOp, state: &mut ExecutionState<TrieState>) -> Result<()> {
        match op {
            TrieOp::Push(value) => state.stack.push(*value)?,
            TrieOp::Dup => state.stack.dup()?,
            TrieOp::Copy(n) => {
                if *n < 0 {
                    return Err(error::pointer_out_of_bounds("stack copy", *n).with_operation("trie::execute"));
                }
                state.stack.copy_n(*n as usize)?;
            }
            TrieOp::Swap => state.stack.swap()?,
            TrieOp::Discard => state.stack.discard(),
            TrieOp::Slide(n) => state.stack.slide((*n).max(0) as usize),
            TrieOp::Add => self.binary(state, BinaryOp::Add)?,
            TrieOp::Sub => self.binary(state, BinaryOp::Sub)?,
            TrieOp::Mul => self.binary(state, BinaryOp::Mul)?,
            TrieOp::Div => self.binary(state, BinaryOp::FloorDiv)?,
            TrieOp::Mod => self.binary(state, BinaryOp::FloorMod)?,
            TrieOp::Store => {
                let value = state.stack.pop();
                let address = state.stack.pop();
                state.machine.heap.insert(address, value);
            }
            TrieOp::Retrieve => {
                let address = state.stack.pop();
                let value = state.machine.heap.get(&address).copied().unwrap_or(0);
                state.stack.push(value)?;
            }
            TrieOp::Mark(_) => {}
            TrieOp::Call(label) => {
                if state.machine.calls.len() >= MAX_CALL_DEPTH {
                    return Err(error::stack_overflow(MAX_CALL_DEPTH)
                        .with_operation("trie::execute")
                        .with_context("label", label.to_string()));
                }
                let target = self.resolve(label)?;
                state.machine.calls.push(state.machine.ip + 1);
                state.machine.next = Some(target);
            }
            TrieOp::Jump(label) => state.machine.next = Some(self.resolve(label)?),
            TrieOp::JumpZero(label) => {
                if state.stack.pop() == 0 {
                    state.machine.next = Some(self.resolve(label)?);
                }
            }
            TrieOp::JumpNegative(label) => {
                if state.stack.pop() < 0 {
                    state.machine.next = Some(self.resolve(label)?);
                }
            }
            TrieOp::Return => match state.machine.calls.pop() {
                Some(address) => state.machine.next = Some(address),
                None => state.halt(),
            },
            TrieOp::Exit => state.halt(),
            TrieOp::OutChar => {
                let value = state.stack.pop();
                state.output.push_code(value);
            }
            TrieOp::OutNum => {
                let value = state.stack.pop();
                state.output.push_str(&value.to_string());
            }
            TrieOp::ReadChar => {
                let address = state.stack.pop();
                let value = state.input.read_char().map_or(-1, |ch| ch as i64);
                state.machine.heap.insert(address, value);
            }
            TrieOp::ReadNum => {
                let address = state.stack.pop();
                let value = match state.input.read_line() {
                    Some(line) => line.trim().parse::<i64>().unwrap_or(0),
                    None => -1,
                };
                state.machine.heap.insert(address, value);
            }
        }
        Ok(())
    }

    fn advance(&self, _op: &TrieOp, state: &mut ExecutionState<TrieState>) -> Result<()> {
        let regs = &mut state.machine;
        regs.ip = regs.next.take().unwrap_or(regs.ip + 1);
        Ok(())
    }

    fn snapshot(&self, state: &ExecutionState<TrieState>) -> Snapshot {
        let regs = &state.machine;
        let mut snapshot = Snapshot::new(self.language(), state)
            .register("ip", regs.ip)
            .register("call_depth", regs.calls.len())
            .register("heap_size", regs.heap.len())
            .memory(regs.heap.iter().map(|(k, v)| (*k, *v)));
        snapshot.labels = self.labels.iter().map(|(label, index)| (label.to_string(), *index)).collect();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::run;
    use crate::ErrorKind;

    /// Build a program from visible S/T/L letters; anything else is dropped
    fn ws(marked: &str) -> String {
        marked
            .chars()
            .filter_map(|c| match c {
                'S' => Some(' '),
                'T' => Some('\t'),
                'L' => Some('\n'),
                _ => None,
            })
            .collect()
    }

    fn run_ws(marked: &str, input: &str) -> crate::machine::ExecutionResult {
        let machine = TrieMachine::new(&ws(marked), &Options::default()).unwrap();
        run(&machine, input)
    }

    fn build_err(marked: &str) -> crate::Error {
        TrieMachine::new(&ws(marked), &Options::default()).unwrap_err()
    }

    #[test]
    fn test_exit_only() {
        let result = run_ws("LLL", "");
        assert!(result.is_ok());
        assert!(result.output.is_empty());
        assert_eq!(result.cycles, 1);
    }

    #[test]
    fn test_missing_exit() {
        assert_eq!(build_err("SS STL").kind(), ErrorKind::MissingExit);
        assert_eq!(build_err("").kind(), ErrorKind::MissingExit);
    }

    #[test]
    fn test_dead_end_names_position() {
        let err = build_err("STT LLL");
        assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
        assert_eq!(err.context_value("position"), Some("2"));
    }

    #[test]
    fn test_truncated_instruction() {
        assert_eq!(build_err("LLL TS").kind(), ErrorKind::InvalidInstruction);
        assert_eq!(build_err("LLL SS STT").kind(), ErrorKind::InvalidNumber);
    }

    #[test]
    fn test_label_checks() {
        assert_eq!(build_err("LSL STL LLL").kind(), ErrorKind::UndefinedLabel);
        assert_eq!(build_err("LSS SL LSS SL LLL").kind(), ErrorKind::DuplicateLabel);
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = format!("exit:{}", ws("LLL"));
        let machine = TrieMachine::new(&source, &Options::default()).unwrap();
        assert_eq!(machine.ops(), &[TrieOp::Exit]);
    }

    #[test]
    fn test_arithmetic() {
        // 6 * 7
        let result = run_ws("SS STTSL SS STTTL TSSL TLST LLL", "");
        assert_eq!(result.output, "42");

        // floored: -7 / 2 = -4, -7 mod 2 = 1
        assert_eq!(run_ws("SS TTTTL SS STSL TSTS TLST LLL", "").output, "-4");
        assert_eq!(run_ws("SS TTTTL SS STSL TSTT TLST LLL", "").output, "1");
    }

    #[test]
    fn test_division_by_zero_faults() {
        let result = run_ws("SS STL SSL TSTS LLL", "");
        assert_eq!(result.fault.unwrap().kind(), ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_output_chars() {
        let result = run_ws("SS STSSTSSSL TLSS SS STTSTSSTL TLSS LLL", "");
        assert_eq!(result.output, "Hi");
    }

    #[test]
    fn test_heap_and_call() {
        // heap[0] = 65; call T; exit; T: print heap[0]; return
        let program = "SS SL SS STSSSSSTL TTS LSTTL LLL LSSTL SS SL TTT TLSS LTL";
        let result = run_ws(program, "");
        assert!(result.is_ok());
        assert_eq!(result.output, "A");
    }

    #[test]
    fn test_read_number() {
        let program = "SS SL TLTT SS SL TTT TLST LLL";
        assert_eq!(run_ws(program, "12\n").output, "12");
        assert_eq!(run_ws(program, "").output, "-1");
    }

    #[test]
    fn test_return_with_empty_call_stack_exits() {
        let result = run_ws("LTL LLL", "");
        assert!(result.is_ok());
        assert_eq!(result.cycles, 1);
    }

    #[test]
    fn test_infinite_loop_hits_cycle_cap() {
        let machine = TrieMachine::new(&ws("LSS SL LSL SL LLL"), &Options::default().with_max_cycles(100)).unwrap();
        let result = run(&machine, "");
        assert_eq!(result.fault.unwrap().kind(), ErrorKind::ExceededCycles);
    }

    #[test]
    fn test_snapshot_lists_labels() {
        let machine = TrieMachine::new(&ws("LSS TL LLL"), &Options::default().with_debug(1)).unwrap();
        let snapshot = run(&machine, "").snapshot.unwrap();
        assert_eq!(snapshot.labels.get("T"), Some(&1));
    }
}
