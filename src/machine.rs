//! This module defines the `TuringMachine` struct, the execution engine. It owns a
//! [`TransitionTable`] and a [`SegmentedTape`], and drives the read, look up, write, move
//! cycle until a halting transition is applied.
//!
//! There is no step limit: a table without any `STOP` transition runs until the process is
//! interrupted. Use [`TuringMachine::run_steps`] to bound a run.

use crate::loader::ProgramLoader;
use crate::medium::{FlatFile, Medium};
use crate::store::SegmentedTape;
use crate::table::TransitionTable;
use crate::types::{Bit, MachineConfig, RunReport, Step, TapeMachineError, Transition};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// The mutable part of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MachineContext {
    /// The current internal state.
    pub state: usize,
    /// The absolute head position.
    pub head: i64,
    /// Index of the segment the head is in, which is always the resident one.
    pub segment: i64,
}

/// What the machine is about to do, reported before the step is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    pub state: usize,
    pub position: i64,
    pub symbol: Bit,
    pub transition: Transition,
}

/// Receives one event per executed step, and the report once the machine halts.
pub trait StepObserver {
    fn on_step(&mut self, event: &StepEvent) -> Result<(), TapeMachineError>;

    fn on_halt(&mut self, _report: &RunReport) -> Result<(), TapeMachineError> {
        Ok(())
    }
}

/// Discards every event.
impl StepObserver for () {
    fn on_step(&mut self, _event: &StepEvent) -> Result<(), TapeMachineError> {
        Ok(())
    }
}

/// A single-tape binary Turing machine over a segmented tape.
#[derive(Debug)]
pub struct TuringMachine<M: Medium = FlatFile<File>> {
    table: TransitionTable,
    tape: SegmentedTape<M>,
    context: MachineContext,
    step_count: u64,
    halted: bool,
    report: Option<RunReport>,
}

impl TuringMachine<FlatFile<File>> {
    /// Loads an instruction set and opens a tape file.
    pub fn open(
        instructions: &Path,
        tape: &Path,
        config: MachineConfig,
    ) -> Result<Self, TapeMachineError> {
        let table = ProgramLoader::load_table(instructions, config.slot_order)?;
        let tape = SegmentedTape::open(tape, config.segment_size)?;
        Self::new(table, tape)
    }
}

impl<M: Medium> TuringMachine<M> {
    /// Creates a machine in state 0 at position 0, with segment 0 loaded.
    pub fn new(
        table: TransitionTable,
        mut tape: SegmentedTape<M>,
    ) -> Result<Self, TapeMachineError> {
        tape.load_segment(0)?;

        Ok(Self {
            table,
            tape,
            context: MachineContext::default(),
            step_count: 0,
            halted: false,
            report: None,
        })
    }

    /// Executes a single step.
    ///
    /// The observer sees the step before any of its effects. A halting transition still
    /// writes and moves; the segment swap is skipped because nothing reads the tape after it.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if the machine can keep running.
    /// * `Ok(Step::Halt)` once a halting transition has been applied, and on every call after.
    pub fn step(&mut self, observer: &mut dyn StepObserver) -> Result<Step, TapeMachineError> {
        if self.halted {
            return Ok(Step::Halt);
        }

        let MachineContext { state, head, .. } = self.context;
        let symbol = self.tape.read(head)?;
        let transition = *self.table.lookup(state, symbol)?;

        observer.on_step(&StepEvent {
            state,
            position: head,
            symbol,
            transition,
        })?;

        self.tape.write(head, transition.write)?;
        self.context.state = transition.next_state;
        self.context.head += transition.direction.offset();
        self.step_count += 1;

        if transition.halt {
            self.halted = true;
            return Ok(Step::Halt);
        }

        let segment = self.tape.segment_of(self.context.head);
        if segment != self.context.segment {
            debug!(
                from = self.context.segment,
                to = segment,
                "Head crossed segment boundary"
            );
            self.tape.load_segment(segment)?;
            self.context.segment = segment;
        }

        Ok(Step::Continue)
    }

    /// Runs until a halting transition is applied, then flushes the tape and reports.
    pub fn run(
        &mut self,
        observer: &mut dyn StepObserver,
    ) -> Result<RunReport, TapeMachineError> {
        while self.step(observer)? == Step::Continue {}
        self.finish(observer)
    }

    /// Runs at most `limit` steps. The tape is flushed and reported only if the machine halts.
    pub fn run_steps(
        &mut self,
        limit: u64,
        observer: &mut dyn StepObserver,
    ) -> Result<Option<RunReport>, TapeMachineError> {
        for _ in 0..limit {
            if self.step(observer)? == Step::Halt {
                return self.finish(observer).map(Some);
            }
        }

        Ok(None)
    }

    /// Flushes the resident segment and builds the final report.
    ///
    /// Once a halted machine has reported, later calls return the same report without
    /// touching the tape or notifying the observer again.
    pub fn finish(
        &mut self,
        observer: &mut dyn StepObserver,
    ) -> Result<RunReport, TapeMachineError> {
        if let Some(report) = self.report {
            return Ok(report);
        }

        self.tape.close()?;

        let report = RunReport {
            state: self.context.state,
            position: self.context.head,
            bit: self.tape.peek(self.context.head)?,
            steps: self.step_count,
        };
        observer.on_halt(&report)?;
        if self.halted {
            self.report = Some(report);
        }

        Ok(report)
    }

    pub fn context(&self) -> MachineContext {
        self.context
    }

    /// The head position relative to the start of the resident segment.
    pub fn local_head(&self) -> i64 {
        self.context.head - self.context.segment * self.tape.segment_size() as i64
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The final report, once the machine has halted and flushed.
    pub fn report(&self) -> Option<RunReport> {
        self.report
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn tape(&self) -> &SegmentedTape<M> {
        &self.tape
    }

    pub fn tape_mut(&mut self) -> &mut SegmentedTape<M> {
        &mut self.tape
    }
}
