//! This module provides the `ProgramLoader` struct, responsible for loading instruction sets
//! into transition tables from files, strings, and directories.

use crate::table::{TableBuilder, TransitionTable};
use crate::types::{SlotOrder, TapeMachineError};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of instruction-set files.
pub const INSTRUCTION_SET_EXTENSION: &str = "txt";

/// `ProgramLoader` is a utility struct for loading instruction sets.
/// It provides methods to load a table from an individual file, from string content,
/// and to discover and load every instruction set within a directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single instruction set from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - The instruction-set file to load.
    /// * `slot_order` - How transition lines are matched to table slots.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionTable)` if the file is read and parsed.
    /// * `Err(TapeMachineError::File)` if the file cannot be read.
    /// * `Err(TapeMachineError::InstructionFormat)` if the content is malformed.
    pub fn load_table(
        path: &Path,
        slot_order: SlotOrder,
    ) -> Result<TransitionTable, TapeMachineError> {
        let content = fs::read_to_string(path).map_err(|e| TapeMachineError::file(path, e))?;

        Self::load_table_from_string(&content, slot_order)
    }

    /// Loads a single instruction set from string content.
    pub fn load_table_from_string(
        content: &str,
        slot_order: SlotOrder,
    ) -> Result<TransitionTable, TapeMachineError> {
        TableBuilder::new().slot_order(slot_order).build(content)
    }

    /// Loads every instruction set (`.txt` extension) in a directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// is either the path and its table, or the error that loading it produced.
    pub fn load_tables(
        directory: &Path,
        slot_order: SlotOrder,
    ) -> Vec<Result<(PathBuf, TransitionTable), TapeMachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => return vec![Err(TapeMachineError::file(directory, e))],
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => return Some(Err(TapeMachineError::file(directory, e))),
                };

                // Skip directories and files that are not instruction sets
                if path.is_dir()
                    || path
                        .extension()
                        .is_none_or(|ext| ext != INSTRUCTION_SET_EXTENSION)
                {
                    return None;
                }

                Some(Self::load_table(&path, slot_order).map(|table| (path, table)))
            })
            .collect();

        // `read_dir` order is platform dependent.
        results.sort_by_key(|r| r.as_ref().ok().map(|(path, _)| path.clone()));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bit;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_table() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("flip.txt");
        write_file(&file_path, "STATES: 1\n0,0->0,1,R\n0,1->0,0,RSTOP\n");

        let table = ProgramLoader::load_table(&file_path, SlotOrder::LineOrder).unwrap();
        assert_eq!(table.max_states(), 1);
        assert!(table.lookup(0, Bit::One).unwrap().halt);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing.txt");

        match ProgramLoader::load_table(&file_path, SlotOrder::LineOrder) {
            Err(TapeMachineError::File { path, .. }) => assert_eq!(path, file_path),
            other => panic!("Expected a file error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_invalid_table() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.txt");
        write_file(&file_path, "This is not an instruction set");

        let result = ProgramLoader::load_table(&file_path, SlotOrder::LineOrder);
        assert!(matches!(
            result,
            Err(TapeMachineError::InstructionFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_load_tables_from_directory() {
        let dir = tempdir().unwrap();

        write_file(&dir.path().join("valid.txt"), "STATES: 2\n");
        write_file(&dir.path().join("invalid.txt"), "STATES: 200\n");
        write_file(&dir.path().join("ignored.tape"), "0101");
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let results = ProgramLoader::load_tables(dir.path(), SlotOrder::LineOrder);

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_load_tables_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_tables(&dir.path().join("nope"), SlotOrder::LineOrder);

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
