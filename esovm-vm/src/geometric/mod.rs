//! # Geometric Machine
//!
//! Color-block machine (Piet). The program is a grid of codels; a direction
//! pointer (DP) and codel chooser (CC) pick the codel the pointer leaves its
//! current block from, and the hue and lightness change between the two
//! blocks selects the command.
//!
//! Each cycle is one attempted move:
//!
//! - into another colored block, running the command the color change encodes;
//! - into, through or out of white, running nothing;
//! - into black or off the grid, which is a retry. Retries alternate between
//!   toggling CC and rotating DP; the eighth in a row ends the program, which
//!   is the only way a geometric program halts.

mod color;
mod image;
mod region;

pub use color::{Color, ColorGrid, Hue, Lightness};
pub use image::PixelGrid;
pub use region::{Block, CodelChooser};

use crate::error::Result;
use crate::language::Language;
use crate::machine::{ExecutionState, Machine, Snapshot};
use crate::options::Options;
use crate::pointer::Direction;
use crate::stack::BinaryOp;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;

/// Consecutive blocked exits before the program ends
pub const MAX_RETRIES: u8 = 8;

/// Walls a white slide may hit before the program ends
pub const MAX_WHITE_ATTEMPTS: u8 = 4;

/// Longest path that is still rendered into a trace image
pub const MAX_TRACE_STEPS: usize = 2000;

/// Pixels per codel side in a rendered trace
pub const TRACE_SCALE: usize = 8;

/// Command selected by a color change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Push,
    Pop,
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Not,
    Greater,
    Pointer,
    Switch,
    Duplicate,
    Roll,
    InNumber,
    InChar,
    OutNumber,
    OutChar,
}

/// Commands indexed by `[hue steps][lightness steps]`
pub const COMMAND_TABLE: [[Option<Command>; 3]; 6] = [
    [None, Some(Command::Push), Some(Command::Pop)],
    [Some(Command::Add), Some(Command::Subtract), Some(Command::Multiply)],
    [Some(Command::Divide), Some(Command::Mod), Some(Command::Not)],
    [Some(Command::Greater), Some(Command::Pointer), Some(Command::Switch)],
    [Some(Command::Duplicate), Some(Command::Roll), Some(Command::InNumber)],
    [Some(Command::InChar), Some(Command::OutNumber), Some(Command::OutChar)],
];

impl Command {
    /// Command for moving from `from` to `to`
    pub fn between(from: &Color, to: &Color) -> Option<Self> {
        let (hue, lightness) = from.steps_to(to)?;
        COMMAND_TABLE[hue][lightness]
    }
}

/// One attempted move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometricOp {
    /// Into an adjacent colored block
    Step {
        to: (i64, i64),
        command: Option<Command>,
        block_size: i64,
    },
    /// Into or out of white, with no command
    Slide { to: (i64, i64) },
    /// The way ahead is black or off the grid
    Blocked,
}

/// Where the pointer is in its traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// On a colored block, looking for the way out
    SeekingExit,
    /// On a colored block after this many consecutive blocked exits
    BlockedRetry(u8),
    /// Sliding across white, after this many walls
    TraversingWhite(u8),
}

/// Registers of one geometric run
#[derive(Debug, Clone)]
pub struct GeometricState {
    pub position: (i64, i64),
    pub dp: Direction,
    pub cc: CodelChooser,
    pub phase: Phase,
    /// (codel, DP) pairs seen during the current white slide
    pub white_seen: HashSet<((i64, i64), Direction)>,
    /// Visited codels, recorded when tracing
    pub path: Vec<(i64, i64)>,
}

/// A geometric program
#[derive(Debug, Clone)]
pub struct GeometricMachine {
    grid: ColorGrid,
    options: Options,
}

impl GeometricMachine {
    pub fn new(grid: ColorGrid, options: &Options) -> Result<Self> {
        options.validate()?;
        debug!("geometric program: {}x{} codels", grid.width(), grid.height());
        Ok(Self {
            grid,
            options: options.clone(),
        })
    }

    /// Sample an image into codels of `options.codel_size` pixels
    pub fn from_pixels(pixels: &PixelGrid, options: &Options) -> Result<Self> {
        options.validate()?;
        let size = options.codel_size as usize;
        if pixels.width() % size != 0 || pixels.height() % size != 0 {
            warn!(
                "image {}x{} is not a multiple of codel size {}",
                pixels.width(),
                pixels.height(),
                size
            );
        }
        Self::new(ColorGrid::from_pixels(pixels, options.codel_size), options)
    }

    pub fn grid(&self) -> &ColorGrid {
        &self.grid
    }

    fn color(&self, codel: (i64, i64)) -> Option<Color> {
        self.grid.get(codel.0, codel.1)
    }

    fn is_open(&self, codel: (i64, i64)) -> bool {
        self.color(codel).is_some_and(|color| !color.is_black())
    }

    /// Apply a command's effect to the stack and pointers
    pub fn apply(&self, command: Command, block_size: i64, state: &mut ExecutionState<GeometricState>) -> Result<()> {
        let stack = &mut state.stack;
        match command {
            Command::Push => stack.push(block_size)?,
            Command::Pop => stack.discard(),
            Command::Add => stack.binary(BinaryOp::Add, true)?,
            Command::Subtract => stack.binary(BinaryOp::Sub, true)?,
            Command::Multiply => stack.binary(BinaryOp::Mul, true)?,
            Command::Divide => stack.binary(BinaryOp::FloorDiv, true)?,
            Command::Mod => stack.binary(BinaryOp::FloorMod, true)?,
            Command::Not => stack.not()?,
            Command::Greater => stack.binary(BinaryOp::Greater, true)?,
            Command::Pointer => {
                let turns = stack.pop();
                state.machine.dp = state.machine.dp.rotated(turns.rem_euclid(4));
            }
            Command::Switch => {
                if stack.pop().rem_euclid(2) == 1 {
                    state.machine.cc = state.machine.cc.toggled();
                }
            }
            Command::Duplicate => stack.dup()?,
            Command::Roll => {
                let count = stack.pop();
                let depth = stack.pop();
                if !stack.roll(depth, count) {
                    stack.push(depth)?;
                    stack.push(count)?;
                }
            }
            Command::InNumber => {
                if let Some(value) = state.input.read_number() {
                    stack.push(value)?;
                }
            }
            Command::InChar => {
                if let Some(ch) = state.input.read_char() {
                    stack.push(ch as i64)?;
                }
            }
            Command::OutNumber => {
                let value = stack.pop();
                state.output.push_str(&value.to_string());
            }
            Command::OutChar => {
                let value = stack.pop();
                state.output.push_code(value);
            }
        }
        Ok(())
    }

    /// Render the grid upscaled, with every visited codel marked in the
    /// inverse of its color
    pub fn render_trace(&self, path: &[(i64, i64)]) -> PixelGrid {
        let mut image = PixelGrid::new(
            self.grid.width() * TRACE_SCALE,
            self.grid.height() * TRACE_SCALE,
            [0xFF, 0xFF, 0xFF],
        );
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                let color = self.color((x as i64, y as i64)).unwrap_or(Color::White);
                image.fill_square(x * TRACE_SCALE, y * TRACE_SCALE, TRACE_SCALE, color.to_rgb());
            }
        }
        let inset = TRACE_SCALE / 4;
        for &(x, y) in path {
            let Some(color) = self.color((x, y)) else { continue };
            let [r, g, b] = color.to_rgb();
            image.fill_square(
                x as usize * TRACE_SCALE + inset,
                y as usize * TRACE_SCALE + inset,
                TRACE_SCALE - 2 * inset,
                [0xFF - r, 0xFF - g, 0xFF - b],
            );
        }
        image
    }
}

impl Machine for GeometricMachine {
    type State = GeometricState;
    type Op = GeometricOp;

    fn language(&self) -> Language {
        Language::Geometric
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn init_state(&self) -> GeometricState {
        let start = (0, 0);
        let phase = match self.color(start) {
            Some(Color::White) => Phase::TraversingWhite(0),
            _ => Phase::SeekingExit,
        };
        GeometricState {
            position: start,
            dp: Direction::Right,
            cc: CodelChooser::Left,
            phase,
            white_seen: HashSet::new(),
            path: if self.options.trace { vec![start] } else { Vec::new() },
        }
    }

    fn decode(&self, state: &ExecutionState<GeometricState>) -> Result<Option<GeometricOp>> {
        let regs = &state.machine;
        let current = match self.color(regs.position) {
            None | Some(Color::Black) => return Ok(None),
            Some(color) => color,
        };
        let (dx, dy) = regs.dp.delta();

        if current.is_white() {
            let to = (regs.position.0 + dx, regs.position.1 + dy);
            return Ok(Some(if self.is_open(to) {
                GeometricOp::Slide { to }
            } else {
                GeometricOp::Blocked
            }));
        }

        let Some(block) = Block::flood_fill(&self.grid, regs.position) else {
            return Ok(None);
        };
        let exit = block.exit_codel(regs.dp, regs.cc);
        let to = (exit.0 + dx, exit.1 + dy);
        let op = match self.color(to) {
            None | Some(Color::Black) => GeometricOp::Blocked,
            Some(Color::White) => GeometricOp::Slide { to },
            Some(next) => GeometricOp::Step {
                to,
                command: Command::between(&current, &next),
                block_size: block.size() as i64,
            },
        };
        Ok(Some(op))
    }

    fn execute(&self, op: &GeometricOp, state: &mut ExecutionState<GeometricState>) -> Result<()> {
        match *op {
            GeometricOp::Step {
                command: Some(command),
                block_size,
                ..
            } => self.apply(command, block_size, state)?,
            GeometricOp::Step { command: None, .. } | GeometricOp::Slide { .. } => {}
            GeometricOp::Blocked => {
                let regs = &mut state.machine;
                match regs.phase {
                    Phase::TraversingWhite(walls) => {
                        let walls = walls + 1;
                        if walls >= MAX_WHITE_ATTEMPTS {
                            debug!("white slide walled in at {:?}", regs.position);
                            state.halt();
                            return Ok(());
                        }
                        regs.cc = regs.cc.toggled();
                        regs.dp = regs.dp.clockwise();
                        regs.phase = Phase::TraversingWhite(walls);
                    }
                    Phase::SeekingExit | Phase::BlockedRetry(_) => {
                        let retries = match regs.phase {
                            Phase::BlockedRetry(n) => n + 1,
                            _ => 1,
                        };
                        if retries >= MAX_RETRIES {
                            debug!("block at {:?} has no exit", regs.position);
                            state.halt();
                            return Ok(());
                        }
                        if retries % 2 == 1 {
                            regs.cc = regs.cc.toggled();
                        } else {
                            regs.dp = regs.dp.clockwise();
                        }
                        regs.phase = Phase::BlockedRetry(retries);
                    }
                }
            }
        }
        Ok(())
    }

    fn advance(&self, op: &GeometricOp, state: &mut ExecutionState<GeometricState>) -> Result<()> {
        let to = match *op {
            GeometricOp::Step { to, .. } | GeometricOp::Slide { to } => to,
            GeometricOp::Blocked => return Ok(()),
        };
        let regs = &mut state.machine;
        regs.position = to;
        if self.options.trace {
            regs.path.push(to);
        }
        if self.color(to).is_some_and(|color| color.is_white()) {
            if !matches!(regs.phase, Phase::TraversingWhite(_)) {
                regs.phase = Phase::TraversingWhite(0);
            }
            if !regs.white_seen.insert((to, regs.dp)) {
                debug!("white slide revisited {:?} heading {}", to, regs.dp);
                state.halt();
            }
        } else {
            regs.phase = Phase::SeekingExit;
            regs.white_seen.clear();
        }
        Ok(())
    }

    fn snapshot(&self, state: &ExecutionState<GeometricState>) -> Snapshot {
        let regs = &state.machine;
        Snapshot::new(self.language(), state)
            .register("position", regs.position)
            .register("dp", regs.dp)
            .register("cc", regs.cc)
            .register("phase", regs.phase)
            .register("color", self.color(regs.position))
    }

    fn trace(&self, state: &ExecutionState<GeometricState>) -> Option<PixelGrid> {
        if !self.options.trace {
            return None;
        }
        let path = &state.machine.path;
        if path.len() > MAX_TRACE_STEPS {
            debug!("trace of {} steps is too long to render", path.len());
            return None;
        }
        Some(self.render_trace(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::run;
    use crate::ErrorKind;

    const LR: Color = Color::Chromatic(Hue::Red, Lightness::Light);
    const NR: Color = Color::Chromatic(Hue::Red, Lightness::Normal);
    const DR: Color = Color::Chromatic(Hue::Red, Lightness::Dark);
    const DM: Color = Color::Chromatic(Hue::Magenta, Lightness::Dark);
    const W: Color = Color::White;
    const K: Color = Color::Black;

    fn machine(rows: Vec<Vec<Color>>, options: Options) -> GeometricMachine {
        GeometricMachine::new(ColorGrid::from_rows(rows), &options).unwrap()
    }

    /// Pushes 2 and prints it, then ends in a block with no open exit
    fn print_two() -> Vec<Vec<Color>> {
        vec![vec![LR, LR, NR, DM], vec![K, K, DM, DM]]
    }

    #[test]
    fn test_command_table() {
        assert_eq!(Command::between(&LR, &NR), Some(Command::Push));
        assert_eq!(Command::between(&NR, &DM), Some(Command::OutNumber));
        assert_eq!(Command::between(&DM, &NR), Some(Command::Multiply));
        assert_eq!(Command::between(&NR, &NR), None);
    }

    #[test]
    fn test_push_and_print() {
        let result = run(&machine(print_two(), Options::default()), "");
        assert!(result.is_ok());
        assert_eq!(result.output, "2");
        assert_eq!(result.cycles, 2 + MAX_RETRIES as u64);
    }

    #[test]
    fn test_enclosed_block_halts_after_retries() {
        let result = run(&machine(vec![vec![NR]], Options::default()), "");
        assert!(result.is_ok());
        assert!(result.output.is_empty());
        assert_eq!(result.cycles, MAX_RETRIES as u64);
    }

    #[test]
    fn test_black_start_halts() {
        let result = run(&machine(vec![vec![K, NR]], Options::default()), "");
        assert!(result.is_ok());
        assert_eq!(result.cycles, 1);
    }

    #[test]
    fn test_retry_sequence() {
        let machine = machine(vec![vec![NR]], Options::default());
        let mut state = ExecutionState::new("", machine.init_state());
        let mut seen = Vec::new();
        for _ in 0..4 {
            machine.execute(&GeometricOp::Blocked, &mut state).unwrap();
            seen.push((state.machine.dp, state.machine.cc));
        }
        assert_eq!(
            seen,
            vec![
                (Direction::Right, CodelChooser::Right),
                (Direction::Down, CodelChooser::Right),
                (Direction::Down, CodelChooser::Left),
                (Direction::Left, CodelChooser::Left),
            ]
        );
        assert_eq!(state.machine.phase, Phase::BlockedRetry(4));
    }

    #[test]
    fn test_white_passes_without_command() {
        let machine = machine(vec![vec![NR, W, DR]], Options::default());
        let mut state = ExecutionState::new("", machine.init_state());
        for expected in [(1, 0), (2, 0)] {
            let op = machine.decode(&state).unwrap().unwrap();
            assert_eq!(op, GeometricOp::Slide { to: expected });
            machine.execute(&op, &mut state).unwrap();
            machine.advance(&op, &mut state).unwrap();
        }
        assert_eq!(state.machine.phase, Phase::SeekingExit);
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_pointer_and_switch() {
        let machine = machine(vec![vec![NR]], Options::default());
        let mut state = ExecutionState::new("", machine.init_state());
        state.stack.push(3).unwrap();
        machine.apply(Command::Pointer, 1, &mut state).unwrap();
        assert_eq!(state.machine.dp, Direction::Up);
        state.stack.push(-1).unwrap();
        machine.apply(Command::Pointer, 1, &mut state).unwrap();
        assert_eq!(state.machine.dp, Direction::Left);

        state.stack.push(-3).unwrap();
        machine.apply(Command::Switch, 1, &mut state).unwrap();
        assert_eq!(state.machine.cc, CodelChooser::Right);
        state.stack.push(2).unwrap();
        machine.apply(Command::Switch, 1, &mut state).unwrap();
        assert_eq!(state.machine.cc, CodelChooser::Right);
    }

    #[test]
    fn test_roll_and_ignored_division() {
        let machine = machine(vec![vec![NR]], Options::default());
        let mut state = ExecutionState::new("", machine.init_state());
        for value in [1, 2, 3, 3, 1] {
            state.stack.push(value).unwrap();
        }
        machine.apply(Command::Roll, 1, &mut state).unwrap();
        assert_eq!(state.stack.as_slice(), &[3, 1, 2]);

        state.stack.push(0).unwrap();
        machine.apply(Command::Divide, 1, &mut state).unwrap();
        assert_eq!(state.stack.as_slice(), &[3, 1, 2, 0]);

        state.stack.push(9).unwrap();
        machine.apply(Command::Roll, 1, &mut state).unwrap();
        assert_eq!(state.stack.as_slice(), &[3, 1, 2, 0, 9]);
    }

    #[test]
    fn test_input_at_end_is_ignored() {
        let machine = machine(vec![vec![NR]], Options::default());
        let mut state = ExecutionState::new("", machine.init_state());
        machine.apply(Command::InChar, 1, &mut state).unwrap();
        machine.apply(Command::InNumber, 1, &mut state).unwrap();
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_bouncing_program_hits_cycle_cap() {
        let machine = machine(vec![vec![NR, DR]], Options::default().with_max_cycles(100));
        let result = run(&machine, "");
        assert_eq!(result.fault.unwrap().kind(), ErrorKind::ExceededCycles);
    }

    #[test]
    fn test_trace_image() {
        let traced = machine(print_two(), Options::default().with_trace(true));
        let trace = run(&traced, "").trace.unwrap();
        assert_eq!((trace.width(), trace.height()), (4 * TRACE_SCALE, 2 * TRACE_SCALE));
        // corner keeps the codel color, centre of a visited codel is inverted
        assert_eq!(trace.get(0, 0), Some(LR.to_rgb()));
        let centre = TRACE_SCALE / 2;
        assert_eq!(trace.get(2 * TRACE_SCALE + centre, centre), Some([0x00, 0xFF, 0xFF]));

        let untraced = machine(print_two(), Options::default());
        assert!(run(&untraced, "").trace.is_none());
    }

    #[test]
    fn test_from_pixels() {
        let mut pixels = PixelGrid::new(4, 2, [0, 0, 0]);
        pixels.fill_square(0, 0, 2, NR.to_rgb());
        pixels.fill_square(2, 0, 2, DR.to_rgb());
        let machine = GeometricMachine::from_pixels(&pixels, &Options::default().with_codel_size(2)).unwrap();
        assert_eq!((machine.grid().width(), machine.grid().height()), (2, 1));
        assert_eq!(machine.grid().get(1, 0), Some(DR));
    }
}
