//! This module defines the core data structures and types used throughout the simulator,
//! including tape symbols, transitions, execution results, configuration, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::Rule;

/// The number of tape cells held in memory at once unless configured otherwise.
pub const DEFAULT_SEGMENT_SIZE: usize = 128;
/// The largest state count an instruction set may declare.
pub const MAX_STATES: usize = 127;
/// The shortest transition line that can possibly be well formed (`0,0->0,0,R`).
pub const MIN_INSTRUCTION_LEN: usize = 10;

/// A single tape cell. The tape alphabet is binary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bit {
    #[default]
    Zero,
    One,
}

impl Bit {
    /// Decodes the ASCII representation used in tape files and instruction sets.
    pub fn from_ascii(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Bit::Zero),
            b'1' => Some(Bit::One),
            _ => None,
        }
    }

    pub fn to_ascii(self) -> u8 {
        match self {
            Bit::Zero => b'0',
            Bit::One => b'1',
        }
    }

    /// Row offset of this symbol inside a state's pair of table entries.
    pub fn index(self) -> usize {
        match self {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        if value {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.index(), f)
    }
}

/// Represents the possible directions the head can move. There is no `Stay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// The signed head displacement for this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

/// The outcome of reading `symbol` while in some state.
///
/// A table holds one of these for every `(state, symbol)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine enters after this transition.
    pub next_state: usize,
    /// The symbol written under the head before it moves.
    pub write: Bit,
    /// The direction the head moves after writing.
    pub direction: Direction,
    /// Whether the machine halts once this transition has been applied.
    pub halt: bool,
}

impl Transition {
    /// The transition used for any slot an instruction set leaves unspecified:
    /// keep the symbol, stay in the same state, move right, never halt.
    pub fn fallback(state: usize, symbol: Bit) -> Self {
        Self {
            next_state: state,
            write: symbol,
            direction: Direction::Right,
            halt: false,
        }
    }
}

impl fmt::Display for Transition {
    /// Formats the right-hand side of an instruction line, e.g. `1,0,LSTOP`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}{}",
            self.next_state,
            self.write,
            self.direction.as_char(),
            if self.halt { "STOP" } else { "" }
        )
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a step and continues execution.
    Continue,
    /// The machine applied a halting transition.
    Halt,
}

/// The final configuration of a halted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// The state the machine halted in.
    pub state: usize,
    /// The absolute head position after the halting move.
    pub position: i64,
    /// The symbol under the head at `position`.
    pub bit: Bit,
    /// Number of steps executed, including the halting one.
    pub steps: u64,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, TapeMachineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final state: {}", self.state)?;
        writeln!(f, "Final position: {}", self.position)?;
        write!(f, "Bit at final position: {}", self.bit)
    }
}

/// How transition lines are matched to table slots.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotOrder {
    /// The Nth data line fills slot `(N / 2, N % 2)` whatever its left-hand side says.
    #[default]
    LineOrder,
    /// Each line fills the slot named by its own `<state>,<symbol>` prefix.
    Declared,
}

/// Runtime configuration shared by the table builder and the tape store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Number of cells in the resident window.
    pub segment_size: usize,
    /// Slot assignment policy used when building the transition table.
    pub slot_order: SlotOrder,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            slot_order: SlotOrder::default(),
        }
    }
}

/// Represents the errors that can occur while loading or running a machine.
#[derive(Debug, Error)]
pub enum TapeMachineError {
    /// Missing or invalid command-line input.
    #[error("Invalid arguments: {0}")]
    Argument(String),
    /// A malformed header or transition line in an instruction set.
    #[error("Instruction format error on line {line} ({content:?}): {reason}")]
    InstructionFormat {
        line: usize,
        content: String,
        reason: String,
    },
    /// A raw grammar failure for a single line.
    #[error("Instruction grammar error: {0}")]
    Grammar(#[from] Box<pest::error::Error<Rule>>),
    /// A byte other than `'0'` or `'1'` inside the tape file.
    #[error("Unrecognised character in tape at offset {offset}: {found:?}")]
    TapeFormat { offset: u64, found: char },
    /// A file could not be opened or read.
    #[error("File error for {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A read or write against the tape medium failed.
    #[error("Tape store error: {0}")]
    Store(#[from] io::Error),
    /// A lookup for a state the table does not contain.
    #[error("Invalid state {state} (table has {max_states} states)")]
    InvalidState { state: usize, max_states: usize },
    /// A direct write outside the resident segment.
    #[error("Position {position} is outside resident segment {segment:?}")]
    OutsideSegment { position: i64, segment: Option<i64> },
    /// The step log could not be written.
    #[error("Failed to write step log: {0}")]
    StepLog(#[source] io::Error),
    /// The final report could not be serialized.
    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
    /// A configuration value outside its allowed range.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TapeMachineError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TapeMachineError::File {
            path: path.into(),
            source,
        }
    }
}
