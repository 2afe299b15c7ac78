//! # Grid Machine
//!
//! Two-dimensional self-directing machine (Befunge). The instruction pointer
//! is a [`Pointer2D`] walking a grid of cells that the program can read and
//! rewrite with `g` and `p`. Rows keep their own lengths; bounds are checked
//! against the current row. Walking off the grid halts the program normally
//! unless `options.wrap` is set, in which case the pointer wraps around the
//! bounding box.
//!
//! The Befunge-93 instruction table is always active. `Dialect::Befunge98`
//! additionally enables a secondary table; members of that table that this
//! machine does not implement fault with `UnsupportedFeature`.

use crate::error::{self, Result};
use crate::language::Language;
use crate::machine::{ExecutionState, Machine, Snapshot};
use crate::options::{Dialect, Options};
use crate::pointer::{Direction, Pointer2D};
use crate::stack::BinaryOp;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Widest a row may grow through `p`
pub const MAX_ROW_WIDTH: usize = 1 << 16;

const SPACE: i64 = ' ' as i64;

/// Grid instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOp {
    /// `0`-`9`, and `a`-`f` under Befunge-98
    Push(i64),
    /// A cell pushed by code point while in string mode
    PushChar(i64),
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Not,
    Greater,
    /// `>` `v` `<` `^`
    Go(Direction),
    /// `?`
    Random,
    /// `_`: pop, right on zero, else left
    HorizontalIf,
    /// `|`: pop, down on zero, else up
    VerticalIf,
    /// `"`
    ToggleString,
    Dup,
    Swap,
    Discard,
    OutputNumber,
    OutputChar,
    /// `#`: skip the next cell
    Bridge,
    /// `p`
    Put,
    /// `g`
    Get,
    InputNumber,
    InputChar,
    /// `@`
    Halt,
    /// Space and anything the active dialect ignores
    Nop,

    // Befunge-98 secondary table
    /// `n`
    ClearStack,
    /// `r`, and unknown cells under Befunge-98
    Reflect,
    /// `[`
    TurnLeft,
    /// `]`
    TurnRight,
    /// `w`
    Compare,
    /// `j`
    JumpForward,
    /// `'`
    Fetch,
    /// `s`
    Store,
    /// `;`
    SkipComment,
    /// `x`
    SetDelta,
    /// `q`
    Quit,
    /// A recognised Befunge-98 instruction this machine does not implement
    Unsupported(char, &'static str),
}

impl GridOp {
    /// Decode a cell outside string mode
    pub fn decode(cell: i64, dialect: Dialect) -> Self {
        let Some(ch) = u32::try_from(cell).ok().and_then(char::from_u32) else {
            return match dialect {
                Dialect::Befunge93 => GridOp::Nop,
                Dialect::Befunge98 => GridOp::Reflect,
            };
        };
        if let Some(op) = Self::primary(ch) {
            return op;
        }
        match dialect {
            Dialect::Befunge93 => GridOp::Nop,
            Dialect::Befunge98 => Self::secondary(ch).unwrap_or(GridOp::Reflect),
        }
    }

    fn primary(ch: char) -> Option<Self> {
        let op = match ch {
            '0'..='9' => GridOp::Push(ch as i64 - '0' as i64),
            '+' => GridOp::Add,
            '-' => GridOp::Sub,
            '*' => GridOp::Mul,
            '/' => GridOp::Div,
            '%' => GridOp::Mod,
            '!' => GridOp::Not,
            '`' => GridOp::Greater,
            '>' => GridOp::Go(Direction::Right),
            '<' => GridOp::Go(Direction::Left),
            '^' => GridOp::Go(Direction::Up),
            'v' => GridOp::Go(Direction::Down),
            '?' => GridOp::Random,
            '_' => GridOp::HorizontalIf,
            '|' => GridOp::VerticalIf,
            '"' => GridOp::ToggleString,
            ':' => GridOp::Dup,
            '\\' => GridOp::Swap,
            '$' => GridOp::Discard,
            '.' => GridOp::OutputNumber,
            ',' => GridOp::OutputChar,
            '#' => GridOp::Bridge,
            'p' => GridOp::Put,
            'g' => GridOp::Get,
            '&' => GridOp::InputNumber,
            '~' => GridOp::InputChar,
            '@' => GridOp::Halt,
            ' ' => GridOp::Nop,
            _ => return None,
        };
        Some(op)
    }

    fn secondary(ch: char) -> Option<Self> {
        let op = match ch {
            'a'..='f' => GridOp::Push(ch as i64 - 'a' as i64 + 10),
            'n' => GridOp::ClearStack,
            'r' => GridOp::Reflect,
            '[' => GridOp::TurnLeft,
            ']' => GridOp::TurnRight,
            'w' => GridOp::Compare,
            'j' => GridOp::JumpForward,
            '\'' => GridOp::Fetch,
            's' => GridOp::Store,
            ';' => GridOp::SkipComment,
            'x' => GridOp::SetDelta,
            'q' => GridOp::Quit,
            'z' => GridOp::Nop,
            'h' | 'l' | 'm' => GridOp::Unsupported(ch, "3D movement"),
            't' => GridOp::Unsupported(ch, "concurrency"),
            'i' | 'o' => GridOp::Unsupported(ch, "file I/O"),
            '=' => GridOp::Unsupported(ch, "system execute"),
            'y' => GridOp::Unsupported(ch, "system info"),
            'k' => GridOp::Unsupported(ch, "iterate"),
            '{' | '}' | 'u' => GridOp::Unsupported(ch, "stack stack"),
            '(' | ')' => GridOp::Unsupported(ch, "fingerprints"),
            _ => return None,
        };
        Some(op)
    }
}

/// Registers of one grid run; the grid itself is a private copy
#[derive(Debug, Clone)]
pub struct GridState {
    pub grid: Vec<Vec<i64>>,
    pub pointer: Pointer2D,
    pub string_mode: bool,
    /// Source for `?`; seeded from `options.seed` when set
    pub rng: StdRng,
}

impl GridState {
    /// Cell at `(x, y)`, or None outside the current row
    pub fn cell(&self, x: i64, y: i64) -> Option<i64> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize).copied()
    }

    fn width(&self, row: usize) -> usize {
        self.grid.get(row).map_or(0, Vec::len)
    }

    fn bounding_width(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// A parsed grid program
#[derive(Debug, Clone)]
pub struct GridMachine {
    rows: Vec<Vec<i64>>,
    options: Options,
}

impl GridMachine {
    /// Split a program into rows. Every character is a valid cell, so this
    /// only fails on invalid options.
    pub fn new(source: &str, options: &Options) -> Result<Self> {
        options.validate()?;
        let rows: Vec<Vec<i64>> = source
            .lines()
            .map(|line| line.chars().map(|ch| ch as i64).collect())
            .collect();
        debug!(
            "grid program: {} rows, widest {}, dialect {}",
            rows.len(),
            rows.iter().map(Vec::len).max().unwrap_or(0),
            options.dialect
        );
        Ok(Self {
            rows,
            options: options.clone(),
        })
    }

    /// Where `pointer` lands after one step, or None if it leaves the grid
    /// and wrapping is off
    fn step(&self, regs: &GridState, pointer: Pointer2D) -> Option<Pointer2D> {
        let mut next = pointer;
        let height = regs.grid.len();
        if next.advance() && Pointer2D::in_bounds(next.x, next.y, height, |row| regs.width(row)) {
            return Some(next);
        }
        if !self.options.wrap || height == 0 {
            return None;
        }
        // an overflowing step still wraps onto the grid
        let wrap = |pos: i64, delta: i64, size: usize| (pos as i128 + delta as i128).rem_euclid(size as i128) as i64;
        let width = regs.bounding_width().max(1);
        next.move_to(wrap(pointer.x, pointer.dx, width), wrap(pointer.y, pointer.dy, height));
        Some(next)
    }

    /// Cell under a pointer; positions past a short row read as spaces when
    /// wrapping
    fn cell_at(&self, regs: &GridState, pointer: &Pointer2D) -> Option<i64> {
        match regs.cell(pointer.x, pointer.y) {
            Some(cell) => Some(cell),
            None if self.options.wrap && pointer.y >= 0 && (pointer.y as usize) < regs.grid.len() => {
                Some(SPACE)
            }
            None => None,
        }
    }

    /// Move the pointer one cell, halting if it leaves the grid
    fn move_pointer(&self, state: &mut ExecutionState<GridState>) {
        match self.step(&state.machine, state.machine.pointer) {
            Some(next) => state.machine.pointer = next,
            None => {
                debug!("grid pointer left the grid at {}", state.machine.pointer);
                state.halt();
            }
        }
    }

    fn put(&self, regs: &mut GridState, x: i64, y: i64, value: i64) -> Result<()> {
        let height = regs.grid.len();
        if y < 0 || y as usize >= height || x < 0 || x as usize >= MAX_ROW_WIDTH {
            return Err(error::pointer_out_of_bounds("put", x)
                .with_operation("grid::execute")
                .with_context("x", x.to_string())
                .with_context("y", y.to_string()));
        }
        let row = &mut regs.grid[y as usize];
        if x as usize >= row.len() {
            row.resize(x as usize + 1, SPACE);
        }
        row[x as usize] = value;
        Ok(())
    }

    fn get(&self, regs: &GridState, x: i64, y: i64) -> i64 {
        if y < 0 || y as usize >= regs.grid.len() || x < 0 {
            return 0;
        }
        regs.cell(x, y).unwrap_or(SPACE)
    }

    fn binary(&self, state: &mut ExecutionState<GridState>, op: BinaryOp) -> Result<()> {
        state
            .stack
            .binary(op, false)
            .map_err(|e| e.with_operation("grid::execute"))
    }
}

impl Machine for GridMachine {
    type State = GridState;
    type Op = GridOp;

    fn language(&self) -> Language {
        Language::Grid
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn init_state(&self) -> GridState {
        GridState {
            grid: self.rows.clone(),
            pointer: Pointer2D::new(0, 0, Direction::Right),
            string_mode: false,
            rng: self.options.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }

    fn decode(&self, state: &ExecutionState<GridState>) -> Result<Option<GridOp>> {
        let regs = &state.machine;
        let Some(cell) = self.cell_at(regs, &regs.pointer) else {
            return Ok(None);
        };
        if regs.string_mode {
            return Ok(Some(if cell == '"' as i64 {
                GridOp::ToggleString
            } else {
                GridOp::PushChar(cell)
            }));
        }
        Ok(Some(GridOp::decode(cell, self.options.dialect)))
    }

    fn execute(&self, op: &GridOp, state: &mut ExecutionState<GridState>) -> Result<()> {
        match *op {
            GridOp::Push(n) | GridOp::PushChar(n) => state.stack.push(n)?,
            GridOp::Add => self.binary(state, BinaryOp::Add)?,
            GridOp::Sub => self.binary(state, BinaryOp::Sub)?,
            GridOp::Mul => self.binary(state, BinaryOp::Mul)?,
            GridOp::Div => self.binary(state, BinaryOp::Div)?,
            GridOp::Mod => self.binary(state, BinaryOp::Mod)?,
            GridOp::Greater => self.binary(state, BinaryOp::Greater)?,
            GridOp::Not => state.stack.not()?,
            GridOp::Go(direction) => state.machine.pointer.set_direction(direction),
            GridOp::Random => {
                let direction = Direction::ALL[state.machine.rng.gen_range(0..Direction::ALL.len())];
                state.machine.pointer.set_direction(direction);
            }
            GridOp::HorizontalIf => {
                let direction = if state.stack.pop() == 0 { Direction::Right } else { Direction::Left };
                state.machine.pointer.set_direction(direction);
            }
            GridOp::VerticalIf => {
                let direction = if state.stack.pop() == 0 { Direction::Down } else { Direction::Up };
                state.machine.pointer.set_direction(direction);
            }
            GridOp::ToggleString => state.machine.string_mode = !state.machine.string_mode,
            GridOp::Dup => state.stack.dup()?,
            GridOp::Swap => state.stack.swap()?,
            GridOp::Discard => state.stack.discard(),
            GridOp::OutputNumber => {
                let value = state.stack.pop();
                state.output.push_str(&format!("{} ", value));
            }
            GridOp::OutputChar => {
                let value = state.stack.pop();
                state.output.push_code(value);
            }
            GridOp::Bridge => self.move_pointer(state),
            GridOp::Put => {
                let y = state.stack.pop();
                let x = state.stack.pop();
                let value = state.stack.pop();
                self.put(&mut state.machine, x, y, value)?;
            }
            GridOp::Get => {
                let y = state.stack.pop();
                let x = state.stack.pop();
                let value = self.get(&state.machine, x, y);
                state.stack.push(value)?;
            }
            GridOp::InputNumber => {
                let value = state.input.read_number().unwrap_or(-1);
                state.stack.push(value)?;
            }
            GridOp::InputChar => {
                let value = state.input.read_char().map_or(-1, |ch| ch as i64);
                state.stack.push(value)?;
            }
            GridOp::Halt | GridOp::Quit => state.halt(),
            GridOp::Nop => {}

            GridOp::ClearStack => state.stack.clear(),
            GridOp::Reflect => state.machine.pointer.reflect(),
            GridOp::TurnLeft => state.machine.pointer.rotate_counter_clockwise(),
            GridOp::TurnRight => state.machine.pointer.rotate_clockwise(),
            GridOp::Compare => {
                let b = state.stack.pop();
                let a = state.stack.pop();
                if a < b {
                    state.machine.pointer.rotate_counter_clockwise();
                } else if a > b {
                    state.machine.pointer.rotate_clockwise();
                }
            }
            GridOp::JumpForward => {
                let count = state.stack.pop();
                let limit = (state.machine.grid.len() * state.machine.bounding_width().max(1)) as u64;
                if count < 0 {
                    state.machine.pointer.reflect();
                }
                for _ in 0..count.unsigned_abs().min(limit) {
                    self.move_pointer(state);
                    if state.done {
                        break;
                    }
                }
                if count < 0 {
                    state.machine.pointer.reflect();
                }
            }
            GridOp::Fetch => {
                self.move_pointer(state);
                if !state.done {
                    let regs = &state.machine;
                    let value = self.cell_at(regs, &regs.pointer).unwrap_or(SPACE);
                    state.stack.push(value)?;
                }
            }
            GridOp::Store => {
                let value = state.stack.pop();
                self.move_pointer(state);
                if !state.done {
                    let (x, y) = state.machine.pointer.position();
                    self.put(&mut state.machine, x, y, value)?;
                }
            }
            GridOp::SkipComment => {
                let limit = state.machine.grid.iter().map(Vec::len).sum::<usize>() + 1;
                for _ in 0..limit {
                    self.move_pointer(state);
                    if state.done {
                        break;
                    }
                    let regs = &state.machine;
                    if self.cell_at(regs, &regs.pointer) == Some(';' as i64) {
                        break;
                    }
                }
            }
            GridOp::SetDelta => {
                let dy = state.stack.pop();
                let dx = state.stack.pop();
                state.machine.pointer.set_delta(dx, dy);
            }
            GridOp::Unsupported(ch, feature) => {
                let (x, y) = state.machine.pointer.position();
                return Err(error::unsupported(feature)
                    .with_operation("grid::execute")
                    .with_context("instruction", ch.to_string())
                    .with_context("x", x.to_string())
                    .with_context("y", y.to_string()));
            }
        }
        Ok(())
    }

    fn advance(&self, _op: &GridOp, state: &mut ExecutionState<GridState>) -> Result<()> {
        self.move_pointer(state);
        Ok(())
    }

    fn snapshot(&self, state: &ExecutionState<GridState>) -> Snapshot {
        let regs = &state.machine;
        let row = regs.pointer.y.max(0) as usize;
        let cells = regs
            .grid
            .get(row)
            .map(|cells| cells.iter().enumerate().map(|(x, v)| (x as i64, *v)).collect::<Vec<_>>())
            .unwrap_or_default();
        Snapshot::new(self.language(), state)
            .register("pointer", regs.pointer)
            .register("string_mode", regs.string_mode)
            .register("dialect", self.options.dialect)
            .memory(cells)
    }
}
