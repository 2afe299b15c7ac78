//! # Tape Machine
//!
//! Linear-memory machine (Brainfuck). One data pointer walks a tape of
//! unbounded integer cells that grows to the right on demand. Loop brackets
//! are matched once at construction and cached in both directions.

use crate::error::{self, Result};
use crate::language::Language;
use crate::machine::{ExecutionState, Machine, Snapshot};
use crate::options::Options;
use log::debug;
use std::collections::HashMap;

/// Tape instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeOp {
    /// `>`
    Right,
    /// `<`
    Left,
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    LoopOpen,
    /// `]`
    LoopClose,
}

impl TapeOp {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '>' => Some(TapeOp::Right),
            '<' => Some(TapeOp::Left),
            '+' => Some(TapeOp::Increment),
            '-' => Some(TapeOp::Decrement),
            '.' => Some(TapeOp::Output),
            ',' => Some(TapeOp::Input),
            '[' => Some(TapeOp::LoopOpen),
            ']' => Some(TapeOp::LoopClose),
            _ => None,
        }
    }
}

/// Registers of one tape run
#[derive(Debug, Clone)]
pub struct TapeState {
    pub tape: Vec<i64>,
    pub pointer: usize,
    pub ip: usize,
}

/// A validated tape program
#[derive(Debug, Clone)]
pub struct TapeMachine {
    ops: Vec<TapeOp>,
    /// Source position of each op, for diagnostics
    positions: Vec<usize>,
    open_to_close: HashMap<usize, usize>,
    close_to_open: HashMap<usize, usize>,
    options: Options,
}

impl TapeMachine {
    /// Parse and validate a program.
    ///
    /// Unmatched brackets are always an error. Other characters are comments
    /// unless `options.strict` is set; whitespace is always allowed.
    pub fn new(source: &str, options: &Options) -> Result<Self> {
        options.validate()?;
        let mut ops = Vec::new();
        let mut positions = Vec::new();
        for (position, ch) in source.chars().enumerate() {
            match TapeOp::from_char(ch) {
                Some(op) => {
                    ops.push(op);
                    positions.push(position);
                }
                None if options.strict && !ch.is_whitespace() => {
                    return Err(error::invalid_instruction(position, format!("'{}'", ch))
                        .with_operation("tape::preprocess"));
                }
                None => {}
            }
        }

        let mut open_to_close = HashMap::new();
        let mut close_to_open = HashMap::new();
        let mut brackets = Vec::new();
        for (index, op) in ops.iter().enumerate() {
            match op {
                TapeOp::LoopOpen => brackets.push(index),
                TapeOp::LoopClose => {
                    let open = brackets.pop().ok_or_else(|| {
                        error::unmatched_bracket(']', positions[index])
                            .with_operation("tape::preprocess")
                    })?;
                    open_to_close.insert(open, index);
                    close_to_open.insert(index, open);
                }
                _ => {}
            }
        }
        if let Some(open) = brackets.pop() {
            return Err(error::unmatched_bracket('[', positions[open])
                .with_operation("tape::preprocess"));
        }

        debug!("tape program: {} ops, {} loops", ops.len(), open_to_close.len());
        Ok(Self {
            ops,
            positions,
            open_to_close,
            close_to_open,
            options: options.clone(),
        })
    }

    /// Number of executable ops after comments are dropped
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Loop jump tables, (open -> close, close -> open), keyed by op index
    pub fn jump_tables(&self) -> (&HashMap<usize, usize>, &HashMap<usize, usize>) {
        (&self.open_to_close, &self.close_to_open)
    }
}

impl Machine for TapeMachine {
    type State = TapeState;
    type Op = TapeOp;

    fn language(&self) -> Language {
        Language::Tape
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn init_state(&self) -> TapeState {
        TapeState {
            tape: vec![0],
            pointer: 0,
            ip: 0,
        }
    }

    fn decode(&self, state: &ExecutionState<TapeState>) -> Result<Option<TapeOp>> {
        Ok(self.ops.get(state.machine.ip).copied())
    }

    fn execute(&self, op: &TapeOp, state: &mut ExecutionState<TapeState>) -> Result<()> {
        let regs = &mut state.machine;
        match op {
            TapeOp::Right => {
                regs.pointer += 1;
                if regs.pointer == regs.tape.len() {
                    regs.tape.push(0);
                }
            }
            TapeOp::Left => {
                if regs.pointer == 0 {
                    return Err(error::pointer_out_of_bounds("data pointer", -1)
                        .with_operation("tape::execute")
                        .with_context("source_position", self.positions[regs.ip].to_string()));
                }
                regs.pointer -= 1;
            }
            TapeOp::Increment => {
                let cell = &mut regs.tape[regs.pointer];
                *cell = cell.wrapping_add(1);
            }
            TapeOp::Decrement => {
                let cell = &mut regs.tape[regs.pointer];
                *cell = cell.wrapping_sub(1);
            }
            TapeOp::Output => state.output.push_code(regs.tape[regs.pointer]),
            TapeOp::Input => match state.input.read_char() {
                Some(ch) => regs.tape[regs.pointer] = ch as i64,
                None => state.done = true,
            },
            TapeOp::LoopOpen => {
                if regs.tape[regs.pointer] == 0 {
                    regs.ip = self.open_to_close[&regs.ip];
                }
            }
            TapeOp::LoopClose => {
                if regs.tape[regs.pointer] != 0 {
                    regs.ip = self.close_to_open[&regs.ip];
                }
            }
        }
        Ok(())
    }

    fn advance(&self, _op: &TapeOp, state: &mut ExecutionState<TapeState>) -> Result<()> {
        state.machine.ip += 1;
        Ok(())
    }

    fn snapshot(&self, state: &ExecutionState<TapeState>) -> Snapshot {
        let regs = &state.machine;
        Snapshot::new(self.language(), state)
            .register("ip", regs.ip)
            .register("pointer", regs.pointer)
            .register("tape_len", regs.tape.len())
            .memory(regs.tape.iter().enumerate().map(|(i, v)| (i as i64, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::run;
    use crate::ErrorKind;

    fn machine(source: &str) -> TapeMachine {
        TapeMachine::new(source, &Options::default()).unwrap()
    }

    #[test]
    fn test_output_code_point_three() {
        let result = run(&machine("+++."), "");
        assert!(result.is_ok());
        assert_eq!(result.output, "\u{3}");
    }

    #[test]
    fn test_hello() {
        let source = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.";
        let result = run(&machine(source), "");
        assert!(result.is_ok());
        assert_eq!(result.output, "Hello");
    }

    #[test]
    fn test_unmatched_open_reports_position_zero() {
        let err = TapeMachine::new("[", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedBracket);
        assert_eq!(err.context_value("position"), Some("0"));
    }

    #[test]
    fn test_unmatched_close_reports_source_position() {
        let err = TapeMachine::new("ab+]", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedBracket);
        assert_eq!(err.context_value("position"), Some("3"));
    }

    #[test]
    fn test_jump_tables_symmetric() {
        let tape = machine("+[->[-]<[>+<-]]>[.]");
        let (open_to_close, close_to_open) = tape.jump_tables();
        assert_eq!(open_to_close.len(), 4);
        for (close, open) in close_to_open {
            assert_eq!(open_to_close[open], *close);
        }
    }

    #[test]
    fn test_strict_mode() {
        let err = TapeMachine::new("+x", &Options::default().with_strict(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
        assert_eq!(err.context_value("position"), Some("1"));

        assert!(TapeMachine::new("+ +\n.", &Options::default().with_strict(true)).is_ok());
        assert!(TapeMachine::new("+x", &Options::default()).is_ok());
    }

    #[test]
    fn test_left_of_zero_faults() {
        let result = run(&machine("+<"), "");
        let fault = result.fault.unwrap();
        assert_eq!(fault.kind(), ErrorKind::PointerOutOfBounds);
    }

    #[test]
    fn test_echo_until_end_of_input() {
        let result = run(&machine(",[.,]"), "hi");
        assert!(result.is_ok());
        assert_eq!(result.output, "hi");

        let result = run(&machine(",.,."), "a");
        assert!(result.is_ok());
        assert_eq!(result.output, "a");
    }

    #[test]
    fn test_cells_are_unmasked() {
        let result = run(&machine("-."), "");
        assert_eq!(result.output, "\u{FFFD}");

        let tape = TapeMachine::new(&"+".repeat(300), &Options::default()).unwrap();
        let mut state = ExecutionState::new("", tape.init_state());
        while let Some(op) = tape.decode(&state).unwrap() {
            tape.execute(&op, &mut state).unwrap();
            tape.advance(&op, &mut state).unwrap();
        }
        assert_eq!(state.machine.tape[0], 300);
    }

    #[test]
    fn test_infinite_loop_hits_cycle_cap() {
        let tape = TapeMachine::new("+[]", &Options::default().with_max_cycles(100)).unwrap();
        let result = run(&tape, "");
        assert_eq!(result.fault.unwrap().kind(), ErrorKind::ExceededCycles);
        assert_eq!(result.cycles, 100);
    }

    #[test]
    fn test_empty_program() {
        let result = run(&machine(""), "");
        assert!(result.is_ok());
        assert!(result.output.is_empty());
    }
}
