//! This crate provides the core logic for a single-tape binary Turing machine whose tape is
//! stored in a file and paged through memory one fixed-size segment at a time.
//! It includes modules for parsing instruction sets into transition tables, the segmented
//! tape store and its file medium, the execution engine, and a set of built-in programs.

pub mod loader;
pub mod log;
pub mod machine;
pub mod medium;
pub mod parser;
pub mod programs;
pub mod store;
pub mod table;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the step log from the log module.
pub use crate::log::StepLog;
/// Re-exports the execution engine and its observer seam from the machine module.
pub use machine::{MachineContext, StepEvent, StepObserver, TuringMachine};
/// Re-exports the tape medium trait and its flat-file implementation.
pub use medium::{FlatFile, Medium};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the `SegmentedTape` struct from the store module.
pub use store::SegmentedTape;
/// Re-exports the transition table and its builder from the table module.
pub use table::{build, TableBuilder, TransitionTable};
/// Re-exports the shared types from the types module.
pub use types::{
    Bit, Direction, MachineConfig, RunReport, SlotOrder, Step, TapeMachineError, Transition,
    DEFAULT_SEGMENT_SIZE, MAX_STATES,
};
