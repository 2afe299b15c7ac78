//! # Ternary Machine
//!
//! Self-modifying machine over 3^10 ternary words (Malbolge). The program is
//! loaded into the low cells and the rest of memory is filled with the crazy
//! operation over the two preceding cells. The executed instruction depends on
//! both the cell value and its address, and every executed cell is encrypted
//! in place afterwards.

use crate::error::{self, Result};
use crate::language::Language;
use crate::machine::{ExecutionState, Machine, Snapshot};
use crate::options::Options;
use log::debug;

/// Number of memory cells, 3^10
pub const MEMORY_SIZE: usize = 59049;

/// Largest word; also what input reads at end of stream
pub const MAX_WORD: i64 = MEMORY_SIZE as i64 - 1;

const TRITS: usize = 10;

/// Result trit indexed by `[d trit][a trit]`
const CRZ_TABLE: [[i64; 3]; 3] = [[1, 0, 0], [1, 0, 2], [2, 2, 1]];

/// Substitution applied to a cell after it executes, indexed by
/// `(value - 33) mod 94`
const ENCRYPT: &[u8; 94] =
    b"5z]&gqtyfr$(we4{WP)H-Zn,[%\\3dL+Q;>U!pJS72FhOA1CB6v^=I_0/8|jsb9m<.TVac`uY*MK'X~xDl}REokN:#?G\"i@";

/// Ternary instruction, decoded from `(mem[c] + c) mod 94`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TernaryOp {
    /// 4: continue at `mem[d]`
    Jump,
    /// 5: write `a mod 256`
    Output,
    /// 23: read a character into `a`
    Input,
    /// 39: `a = mem[d] = rotr(mem[d])`
    Rotate,
    /// 40: `d = mem[d]`
    Move,
    /// 62: `a = mem[d] = crz(mem[d], a)`
    Crazy,
    /// 68
    Nop,
    /// 81
    Halt,
}

impl TernaryOp {
    pub const LEGAL: [i64; 8] = [4, 5, 23, 39, 40, 62, 68, 81];

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            4 => Some(TernaryOp::Jump),
            5 => Some(TernaryOp::Output),
            23 => Some(TernaryOp::Input),
            39 => Some(TernaryOp::Rotate),
            40 => Some(TernaryOp::Move),
            62 => Some(TernaryOp::Crazy),
            68 => Some(TernaryOp::Nop),
            81 => Some(TernaryOp::Halt),
            _ => None,
        }
    }

    /// Decode the cell at `address`. Illegal values run as nop.
    pub fn decode(cell: i64, address: usize) -> Self {
        Self::from_value((cell + address as i64).rem_euclid(94)).unwrap_or(TernaryOp::Nop)
    }
}

/// Tritwise crazy operation
pub fn crz(d: i64, a: i64) -> i64 {
    let (mut d, mut a) = (d.rem_euclid(MEMORY_SIZE as i64), a.rem_euclid(MEMORY_SIZE as i64));
    let mut result = 0;
    let mut power = 1;
    for _ in 0..TRITS {
        result += CRZ_TABLE[(d % 3) as usize][(a % 3) as usize] * power;
        d /= 3;
        a /= 3;
        power *= 3;
    }
    result
}

/// Rotate a word one trit to the right
pub fn rotr(value: i64) -> i64 {
    let value = value.rem_euclid(MEMORY_SIZE as i64);
    value / 3 + (value % 3) * (MEMORY_SIZE as i64 / 3)
}

fn encrypt(value: i64) -> i64 {
    ENCRYPT[(value - 33).rem_euclid(94) as usize] as i64
}

/// Registers of one ternary run
#[derive(Debug, Clone)]
pub struct TernaryState {
    pub memory: Vec<i64>,
    pub a: i64,
    pub c: usize,
    pub d: usize,
    /// Target of a jump executed this cycle, applied by advance
    pub jump: Option<usize>,
}

/// A loaded ternary program with its memory image
#[derive(Debug, Clone)]
pub struct TernaryMachine {
    image: Vec<i64>,
    loaded: usize,
    options: Options,
}

impl TernaryMachine {
    /// Validate and load a program, then fill the rest of memory.
    ///
    /// Whitespace is skipped. Every other character must be printable ASCII
    /// and decode to a legal instruction at the address it loads into.
    pub fn new(source: &str, options: &Options) -> Result<Self> {
        options.validate()?;
        let mut image = Vec::with_capacity(MEMORY_SIZE);
        for ch in source.chars().filter(|ch| !ch.is_whitespace()) {
            let address = image.len();
            if address >= MEMORY_SIZE {
                return Err(error::invalid_instruction(address, "program does not fit in memory")
                    .with_operation("ternary::load"));
            }
            let code = ch as i64;
            if !(33..=126).contains(&code) {
                return Err(error::invalid_instruction(address, format!("'{}' is not printable ASCII", ch))
                    .with_operation("ternary::load"));
            }
            if TernaryOp::from_value((code + address as i64) % 94).is_none() {
                return Err(error::invalid_instruction(address, format!("'{}' is not a legal instruction here", ch))
                    .with_operation("ternary::load")
                    .with_context("decoded", ((code + address as i64) % 94).to_string()));
            }
            image.push(code);
        }

        let loaded = image.len();
        for address in loaded..MEMORY_SIZE {
            let prev2 = address.checked_sub(2).map_or(0, |i| image[i]);
            let prev1 = address.checked_sub(1).map_or(0, |i| image[i]);
            image.push(crz(prev2, prev1));
        }

        debug!("ternary program: {} cells loaded", loaded);
        Ok(Self {
            image,
            loaded,
            options: options.clone(),
        })
    }

    /// Cells taken by the program text
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn image(&self) -> &[i64] {
        &self.image
    }
}

impl Machine for TernaryMachine {
    type State = TernaryState;
    type Op = TernaryOp;

    fn language(&self) -> Language {
        Language::Ternary
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn init_state(&self) -> TernaryState {
        TernaryState {
            memory: self.image.clone(),
            a: 0,
            c: 0,
            d: 0,
            jump: None,
        }
    }

    fn decode(&self, state: &ExecutionState<TernaryState>) -> Result<Option<TernaryOp>> {
        let regs = &state.machine;
        Ok(Some(TernaryOp::decode(regs.memory[regs.c], regs.c)))
    }

    fn execute(&self, op: &TernaryOp, state: &mut ExecutionState<TernaryState>) -> Result<()> {
        let regs = &mut state.machine;
        match op {
            TernaryOp::Jump => regs.jump = Some(regs.memory[regs.d].rem_euclid(MEMORY_SIZE as i64) as usize),
            TernaryOp::Output => state.output.push_code(regs.a.rem_euclid(256)),
            TernaryOp::Input => {
                regs.a = match state.input.read_char() {
                    Some('\n') => 10,
                    Some(ch) => ch as i64,
                    None => MAX_WORD,
                };
            }
            TernaryOp::Rotate => {
                let value = rotr(regs.memory[regs.d]);
                regs.memory[regs.d] = value;
                regs.a = value;
            }
            TernaryOp::Move => regs.d = regs.memory[regs.d].rem_euclid(MEMORY_SIZE as i64) as usize,
            TernaryOp::Crazy => {
                let value = crz(regs.memory[regs.d], regs.a);
                regs.memory[regs.d] = value;
                regs.a = value;
            }
            TernaryOp::Nop => {}
            TernaryOp::Halt => state.halt(),
        }
        Ok(())
    }

    fn advance(&self, _op: &TernaryOp, state: &mut ExecutionState<TernaryState>) -> Result<()> {
        let regs = &mut state.machine;
        regs.memory[regs.c] = encrypt(regs.memory[regs.c]);
        regs.c = match regs.jump.take() {
            Some(target) => target,
            None => (regs.c + 1) % MEMORY_SIZE,
        };
        regs.d = (regs.d + 1) % MEMORY_SIZE;
        Ok(())
    }

    fn snapshot(&self, state: &ExecutionState<TernaryState>) -> Snapshot {
        let regs = &state.machine;
        let window = (regs.c..regs.c + 16)
            .chain(regs.d..regs.d + 16)
            .map(|address| address % MEMORY_SIZE)
            .map(|address| (address as i64, regs.memory[address]));
        Snapshot::new(self.language(), state)
            .register("a", regs.a)
            .register("c", regs.c)
            .register("d", regs.d)
            .memory(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::run;
    use crate::ErrorKind;

    /// Source that decodes to `ops` when loaded from address 0
    fn assemble(ops: &[i64]) -> String {
        ops.iter()
            .enumerate()
            .map(|(address, op)| {
                let code = (op - address as i64).rem_euclid(94);
                let code = if code < 33 { code + 94 } else { code };
                char::from(code as u8)
            })
            .collect()
    }

    #[test]
    fn test_crz_and_rotr() {
        assert_eq!(crz(0, 0), 29524);
        assert_eq!(crz(MAX_WORD, MAX_WORD), 29524);
        assert_eq!(crz(0, MAX_WORD), 0);
        assert_eq!(rotr(1), 19683);
        assert_eq!(rotr(3), 1);
        assert_eq!(rotr(0), 0);
    }

    #[test]
    fn test_encrypt_is_permutation() {
        let mut seen: Vec<i64> = (33..=126).map(encrypt).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 94);
        assert!(seen.iter().all(|v| (33..=126).contains(v)));
    }

    #[test]
    fn test_illegal_first_char_is_syntax_error() {
        let err = TernaryMachine::new("a", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
        assert_eq!(err.context_value("position"), Some("0"));
    }

    #[test]
    fn test_whitespace_skipped_at_load() {
        let machine = TernaryMachine::new(" Q\n", &Options::default()).unwrap();
        assert_eq!(machine.loaded(), 1);
    }

    #[test]
    fn test_halt_only() {
        let machine = TernaryMachine::new("Q", &Options::default()).unwrap();
        let result = run(&machine, "");
        assert!(result.is_ok());
        assert!(result.output.is_empty());
        assert_eq!(result.cycles, 1);
    }

    #[test]
    fn test_memory_fill() {
        let machine = TernaryMachine::new("Q", &Options::default()).unwrap();
        let image = machine.image();
        assert_eq!(image.len(), MEMORY_SIZE);
        assert_eq!(image[1], crz(0, image[0]));
        assert_eq!(image[2], crz(image[0], image[1]));
    }

    #[test]
    fn test_echo_one_character() {
        let source = assemble(&[23, 5, 81]);
        assert_eq!(source, "ubO");
        let machine = TernaryMachine::new(&source, &Options::default()).unwrap();
        assert_eq!(run(&machine, "A").output, "A");
        assert_eq!(run(&machine, "").output, "\u{a8}");
    }

    #[test]
    fn test_executed_cells_are_encrypted() {
        let machine = TernaryMachine::new("ubO", &Options::default()).unwrap();
        let mut state = ExecutionState::new("x", machine.init_state());
        let op = machine.decode(&state).unwrap().unwrap();
        assert_eq!(op, TernaryOp::Input);
        machine.execute(&op, &mut state).unwrap();
        machine.advance(&op, &mut state).unwrap();
        assert_eq!(state.machine.memory[0], encrypt('u' as i64));
        assert_eq!((state.machine.c, state.machine.d), (1, 1));
        assert_eq!(state.machine.a, 'x' as i64);
    }

    #[test]
    fn test_nop_run_hits_cycle_cap() {
        let source = assemble(&[68; 200]);
        let machine = TernaryMachine::new(&source, &Options::default().with_max_cycles(100)).unwrap();
        let result = run(&machine, "");
        assert_eq!(result.fault.unwrap().kind(), ErrorKind::ExceededCycles);
        assert_eq!(result.cycles, 100);
    }

    #[test]
    fn test_jump_lands_on_target() {
        let machine = TernaryMachine::new(&assemble(&[4, 81]), &Options::default()).unwrap();
        let mut state = ExecutionState::new("", machine.init_state());
        state.machine.d = 5;
        state.machine.memory[5] = 1;
        let before = state.machine.memory[0];

        machine.execute(&TernaryOp::Jump, &mut state).unwrap();
        machine.advance(&TernaryOp::Jump, &mut state).unwrap();
        assert_eq!((state.machine.c, state.machine.d), (1, 6));
        assert_eq!(state.machine.memory[0], encrypt(before));
        assert!(state.machine.jump.is_none());
        assert_eq!(machine.decode(&state).unwrap(), Some(TernaryOp::Halt));
    }
}
