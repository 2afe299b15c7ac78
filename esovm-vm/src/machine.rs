//! # Machine Lifecycle
//!
//! Every variant implements [`Machine`]: decode the opcode under its
//! instruction pointer, execute it, then advance. [`run`] is the one driver
//! shared by all of them. It owns the per-run [`ExecutionState`], enforces the
//! three resource limits after every cycle and turns any fault into part of
//! the [`ExecutionResult`] instead of returning it.

use crate::error::{self, Error, Result};
use crate::geometric::PixelGrid;
use crate::io::{InputCursor, Output};
use crate::language::Language;
use crate::options::Options;
use crate::stack::Stack;
use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Stack entries included in a snapshot
pub const SNAPSHOT_STACK_LIMIT: usize = 32;

/// Memory cells or heap entries included in a snapshot
pub const SNAPSHOT_MEMORY_LIMIT: usize = 64;

/// State of one run. Created fresh by [`run`] and dropped when it returns.
#[derive(Debug)]
pub struct ExecutionState<S> {
    pub stack: Stack,
    pub input: InputCursor,
    pub output: Output,
    pub cycles: u64,
    pub started: Instant,
    pub done: bool,
    /// Variant-specific registers and memory
    pub machine: S,
}

impl<S> ExecutionState<S> {
    pub fn new(input: &str, machine: S) -> Self {
        Self {
            stack: Stack::new(),
            input: InputCursor::new(input),
            output: Output::new(),
            cycles: 0,
            started: Instant::now(),
            done: false,
            machine,
        }
    }

    /// Mark the program as finished; the driver stops after this cycle
    pub fn halt(&mut self) {
        self.done = true;
    }
}

/// Diagnostic view of a run, attached to the result in debug mode
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub language: String,
    pub cycles: u64,
    pub registers: BTreeMap<String, serde_json::Value>,
    /// Top of the stack, top first
    pub stack: Vec<i64>,
    /// Bounded excerpt of tape, memory or heap as (address, value)
    pub memory: Vec<(i64, i64)>,
    pub labels: BTreeMap<String, usize>,
}

impl Snapshot {
    pub fn new<S>(language: Language, state: &ExecutionState<S>) -> Self {
        Self {
            language: language.name().to_string(),
            cycles: state.cycles,
            registers: BTreeMap::new(),
            stack: state.stack.top(SNAPSHOT_STACK_LIMIT),
            memory: Vec::new(),
            labels: BTreeMap::new(),
        }
    }

    pub fn register(mut self, name: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.registers.insert(name.to_string(), value);
        self
    }

    pub fn memory(mut self, cells: impl IntoIterator<Item = (i64, i64)>) -> Self {
        self.memory = cells.into_iter().take(SNAPSHOT_MEMORY_LIMIT).collect();
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Outcome of a run
#[derive(Debug)]
pub struct ExecutionResult {
    pub language: Language,
    /// Text the program wrote
    pub output: String,
    /// Fault that stopped the run, if any
    pub fault: Option<Error>,
    pub cycles: u64,
    pub elapsed: Duration,
    pub snapshot: Option<Snapshot>,
    /// Rendered execution trace (geometric machine with tracing on)
    pub trace: Option<PixelGrid>,
}

impl ExecutionResult {
    /// Whether the run ended without a fault
    pub fn is_ok(&self) -> bool {
        self.fault.is_none()
    }

    /// The trailing note describing how the run ended
    pub fn annotation(&self) -> String {
        match &self.fault {
            Some(fault) => fault.annotation(),
            None => format!(
                "Finished in {} cycle{} ({}ms)",
                self.cycles,
                if self.cycles == 1 { "" } else { "s" },
                self.elapsed.as_millis()
            ),
        }
    }

    /// Program output followed by the trailing note
    pub fn report(&self) -> String {
        if self.output.is_empty() {
            self.annotation()
        } else if self.output.ends_with('\n') {
            format!("{}{}", self.output, self.annotation())
        } else {
            format!("{}\n{}", self.output, self.annotation())
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

/// Hooks a variant provides to the shared driver
pub trait Machine {
    /// Registers and memory owned by one run
    type State;
    /// Decoded instruction
    type Op: fmt::Debug;

    fn language(&self) -> Language;

    fn options(&self) -> &Options;

    /// Fresh registers for a new run
    fn init_state(&self) -> Self::State;

    /// Decode the instruction under the instruction pointer. `None` means
    /// the pointer ran off the program and the run ends normally.
    fn decode(&self, state: &ExecutionState<Self::State>) -> Result<Option<Self::Op>>;

    /// Apply an instruction's effect
    fn execute(&self, op: &Self::Op, state: &mut ExecutionState<Self::State>) -> Result<()>;

    /// Move the instruction pointer past an executed instruction
    fn advance(&self, op: &Self::Op, state: &mut ExecutionState<Self::State>) -> Result<()>;

    /// Register values and memory excerpt for diagnostics
    fn snapshot(&self, state: &ExecutionState<Self::State>) -> Snapshot;

    /// Rendered trace, for variants that record one
    fn trace(&self, _state: &ExecutionState<Self::State>) -> Option<PixelGrid> {
        None
    }
}

/// Run a machine to completion on `input`.
///
/// Never fails: faults raised while executing and resource limit trips are
/// recorded on the result.
pub fn run<M: Machine>(machine: &M, input: &str) -> ExecutionResult {
    let mut state = ExecutionState::new(input, machine.init_state());
    let fault = drive(machine, &mut state).err();

    if let Some(fault) = &fault {
        debug!("{} run stopped after {} cycles: {}", machine.language(), state.cycles, fault);
    } else {
        debug!("{} run finished after {} cycles", machine.language(), state.cycles);
    }

    let options = machine.options();
    let snapshot = (options.debug > 0).then(|| machine.snapshot(&state));
    let trace = machine.trace(&state);
    ExecutionResult {
        language: machine.language(),
        output: state.output.as_str().to_string(),
        fault,
        cycles: state.cycles,
        elapsed: state.started.elapsed(),
        snapshot,
        trace,
    }
}

fn drive<M: Machine>(machine: &M, state: &mut ExecutionState<M::State>) -> Result<()> {
    let options = machine.options();
    let max_time = Duration::from_millis(options.max_time_ms);

    while !state.done {
        match machine.decode(state)? {
            Some(op) => {
                trace!("{} cycle {}: {:?}", machine.language(), state.cycles, op);
                machine.execute(&op, state)?;
                if !state.done {
                    machine.advance(&op, state)?;
                }
            }
            None => state.halt(),
        }
        state.cycles += 1;

        if state.done {
            break;
        }
        if state.cycles >= options.max_cycles {
            warn!("{} exceeded {} cycles", machine.language(), options.max_cycles);
            return Err(error::exceeded_cycles(options.max_cycles).with_operation("machine::run"));
        }
        if state.started.elapsed() >= max_time {
            warn!("{} exceeded {}ms", machine.language(), options.max_time_ms);
            return Err(error::exceeded_time(options.max_time_ms).with_operation("machine::run"));
        }
        if state.output.len() >= options.max_output {
            warn!("{} output reached {} characters", machine.language(), options.max_output);
            return Err(error::output_too_long(options.max_output).with_operation("machine::run"));
        }
    }
    Ok(())
}
