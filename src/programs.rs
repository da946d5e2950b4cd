use crate::table::{build, TransitionTable};
use crate::types::TapeMachineError;

// Reference instruction sets shipped with the crate: (name, description, source)
const PROGRAM_TEXTS: [(&str, &str, &str); 4] = [
    (
        "increment",
        "Unary increment of the first run of 1s right of position 0",
        include_str!("../programs/increment.txt"),
    ),
    (
        "erase",
        "Clears the first run of 1s right of position 0",
        include_str!("../programs/erase.txt"),
    ),
    (
        "grow-left",
        "Writes 1 at positions 0 and -1, growing the tape leftward",
        include_str!("../programs/grow-left.txt"),
    ),
    (
        "infinite",
        "Moves right forever without changing the tape",
        include_str!("../programs/infinite.txt"),
    ),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<ProgramInfo> = PROGRAM_TEXTS
        .iter()
        .map(|&(name, description, source)| ProgramInfo {
            name,
            description,
            source,
        })
        .collect();
}

/// A built-in instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// The instruction-set text, in the same format as files on disk.
    pub source: &'static str,
}

impl ProgramInfo {
    /// Builds the transition table with line-order slot assignment.
    pub fn table(&self) -> Result<TransitionTable, TapeMachineError> {
        build(self.source)
    }
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Option<ProgramInfo> {
        PROGRAMS.iter().find(|program| program.name == name).copied()
    }

    /// List all program names
    pub fn list_program_names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|program| program.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_count() {
        assert_eq!(ProgramManager::get_program_count(), PROGRAM_TEXTS.len());
    }

    #[test]
    fn test_all_programs_build() {
        for program in PROGRAMS.iter() {
            assert!(program.table().is_ok(), "{} failed to build", program.name);
        }
    }

    #[test]
    fn test_get_program_by_name() {
        let program = ProgramManager::get_program_by_name("increment").unwrap();
        assert!(program.table().unwrap().can_halt());

        let infinite = ProgramManager::get_program_by_name("infinite").unwrap();
        assert!(!infinite.table().unwrap().can_halt());

        assert_eq!(ProgramManager::get_program_by_name("missing"), None);
    }

    #[test]
    fn test_list_program_names() {
        let names = ProgramManager::list_program_names();
        assert!(names.contains(&"increment"));
        assert!(names.contains(&"grow-left"));
    }
}
