//! This module provides `StepLog`, the human-readable execution log. It writes a table with
//! one row per step to any writer, or nothing at all when silenced.

use crate::machine::{StepEvent, StepObserver};
use crate::types::{RunReport, TapeMachineError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// A step log writing to `W`, or a silent one.
pub struct StepLog<W: Write = Box<dyn Write>> {
    sink: Option<W>,
    header_written: bool,
}

impl StepLog {
    /// Logs to standard output.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()) as Box<dyn Write>)
    }

    /// Logs to a newly created (or truncated) file.
    pub fn to_file(path: &Path) -> Result<Self, TapeMachineError> {
        let file = File::create(path).map_err(|e| TapeMachineError::file(path, e))?;
        Ok(Self::new(Box::new(BufWriter::new(file)) as Box<dyn Write>))
    }
}

impl<W: Write> StepLog<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Some(sink),
            header_written: false,
        }
    }

    /// A log that discards everything.
    pub fn silent() -> Self {
        Self {
            sink: None,
            header_written: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Returns the underlying writer, if the log is not silent.
    pub fn into_inner(self) -> Option<W> {
        self.sink
    }

    fn emit(
        &mut self,
        write: impl FnOnce(&mut W) -> io::Result<()>,
    ) -> Result<(), TapeMachineError> {
        match self.sink.as_mut() {
            Some(sink) => write(sink).map_err(TapeMachineError::StepLog),
            None => Ok(()),
        }
    }
}

impl<W: Write> StepObserver for StepLog<W> {
    fn on_step(&mut self, event: &StepEvent) -> Result<(), TapeMachineError> {
        if !self.header_written {
            self.header_written = true;
            self.emit(|w| {
                writeln!(w, "Execution:")?;
                writeln!(w, "|Machine state | Position | Bit | Instruction")?;
                writeln!(w, "|{}", "=".repeat(49))
            })?;
        }

        self.emit(|w| {
            writeln!(
                w,
                "| {:<13}| {:<9}| {:<4}| {},{}->{}",
                event.state,
                event.position,
                event.symbol,
                event.state,
                event.symbol,
                event.transition
            )?;
            // The row must be out before this step's write can reach the tape.
            w.flush()
        })
    }

    fn on_halt(&mut self, _report: &RunReport) -> Result<(), TapeMachineError> {
        self.emit(|w| {
            writeln!(w, "STOP reached.")?;
            w.flush()
        })
    }
}
