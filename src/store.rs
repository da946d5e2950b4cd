//! This module defines `SegmentedTape`, an unbounded binary tape kept in a [`Medium`] with
//! exactly one fixed-size window ("segment") resident in memory.
//!
//! Segment `i` covers tape positions `[i * size, (i + 1) * size)`. Tape position 0 lives at
//! medium offset `origin`, which starts at 0 and grows each time the tape is extended to
//! the left, so segments keep mapping onto the right bytes after a shift.
//!
//! Positions the medium holds no bytes for read as `0`. They are only written out once a
//! step writes to them: a flush stores the loaded prefix of a segment plus everything up
//! to its highest written cell, and nothing at all when the segment is clean.

use crate::medium::{FlatFile, Medium};
use crate::types::{Bit, TapeMachineError};
use std::fs::File;
use std::path::Path;
use tracing::{debug, trace, warn};

#[derive(Debug)]
struct Segment {
    index: i64,
    cells: Vec<Bit>,
    // Length of the prefix that exists in the medium or has been written since loading.
    materialized: usize,
    dirty: bool,
}

/// The Segmented Tape Store.
#[derive(Debug)]
pub struct SegmentedTape<M: Medium = FlatFile<File>> {
    medium: M,
    segment_size: usize,
    origin: u64,
    resident: Option<Segment>,
}

impl SegmentedTape<FlatFile<File>> {
    /// Opens a tape file. No segment is loaded yet.
    pub fn open(path: &Path, segment_size: usize) -> Result<Self, TapeMachineError> {
        Self::new(FlatFile::open(path)?, segment_size)
    }
}

impl<M: Medium> SegmentedTape<M> {
    pub fn new(medium: M, segment_size: usize) -> Result<Self, TapeMachineError> {
        if segment_size == 0 {
            return Err(TapeMachineError::Config(
                "segment size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            medium,
            segment_size,
            origin: 0,
            resident: None,
        })
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Medium offset of tape position 0.
    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Index of the resident segment, if any has been loaded.
    pub fn resident_index(&self) -> Option<i64> {
        self.resident.as_ref().map(|s| s.index)
    }

    /// Whether the resident segment has writes that are not yet in the medium.
    pub fn is_dirty(&self) -> bool {
        self.resident.as_ref().is_some_and(|s| s.dirty)
    }

    /// Index of the segment containing `position`.
    pub fn segment_of(&self, position: i64) -> i64 {
        position.div_euclid(self.size())
    }

    /// Whether `position` lies inside the resident segment.
    pub fn contains(&self, position: i64) -> bool {
        self.resident_index() == Some(self.segment_of(position))
    }

    /// Returns the bit at `position`, swapping segments first if needed.
    pub fn read(&mut self, position: i64) -> Result<Bit, TapeMachineError> {
        if !self.contains(position) {
            self.load_segment(self.segment_of(position))?;
        }

        let local = self.local(position);
        Ok(self
            .resident
            .as_ref()
            .and_then(|s| s.cells.get(local).copied())
            .unwrap_or_default())
    }

    /// Sets the bit at `position` in memory. `position` must be inside the resident segment.
    pub fn write(&mut self, position: i64, bit: Bit) -> Result<(), TapeMachineError> {
        let local = self.local(position);
        let segment = self.segment_of(position);

        match self.resident.as_mut() {
            Some(s) if s.index == segment => {
                s.cells[local] = bit;
                s.materialized = s.materialized.max(local + 1);
                s.dirty = true;
                Ok(())
            }
            other => Err(TapeMachineError::OutsideSegment {
                position,
                segment: other.map(|s| s.index),
            }),
        }
    }

    /// Makes segment `index` resident, flushing the current one first.
    ///
    /// Cells beyond the end of the medium, and every cell of a segment left of the medium's
    /// start, read as `0`.
    pub fn load_segment(&mut self, index: i64) -> Result<(), TapeMachineError> {
        self.flush_segment()?;

        let mut cells = vec![Bit::Zero; self.segment_size];
        let mut materialized = 0;

        let start = self.offset_of(index);
        if start >= 0 {
            let start = start as u64;
            let mut buf = vec![0u8; self.segment_size];
            let available = self.medium.read_at(start, &mut buf)?;

            for (i, &byte) in buf[..available].iter().enumerate() {
                cells[i] = Bit::from_ascii(byte).ok_or(TapeMachineError::TapeFormat {
                    offset: start + i as u64,
                    found: byte as char,
                })?;
            }
            materialized = available;
        }

        trace!(index, materialized, "Loaded segment");
        self.resident = Some(Segment {
            index,
            cells,
            materialized,
            dirty: false,
        });

        Ok(())
    }

    /// Writes the resident segment back to the medium. A clean segment is left alone.
    pub fn flush_segment(&mut self) -> Result<(), TapeMachineError> {
        let Some(index) = self.resident.as_ref().filter(|s| s.dirty).map(|s| s.index) else {
            return Ok(());
        };

        let mut start = self.offset_of(index);
        if start < 0 {
            self.extend_left(start.unsigned_abs())?;
            start = self.offset_of(index);
        }
        let start = start as u64;
        self.extend_right(start)?;

        if let Some(segment) = self.resident.as_mut() {
            let bytes: Vec<u8> = segment.cells[..segment.materialized]
                .iter()
                .map(|bit| bit.to_ascii())
                .collect();

            self.medium.write_at(start, &bytes)?;
            segment.dirty = false;
            trace!(index, bytes = bytes.len(), "Flushed segment");
        }

        Ok(())
    }

    /// Grows the tape leftward by `cells` zeros, shifting the whole medium right.
    pub fn extend_left(&mut self, cells: u64) -> Result<(), TapeMachineError> {
        debug!(cells, origin = self.origin, "Extending tape to the left");
        self.medium.extend_left(cells)?;
        self.origin += cells;
        Ok(())
    }

    /// Pads the medium with zeros up to `len` bytes.
    pub fn extend_right(&mut self, len: u64) -> Result<(), TapeMachineError> {
        if len > self.medium.len()? {
            debug!(len, "Extending tape to the right");
            self.medium.extend_right(len)?;
        }
        Ok(())
    }

    /// Returns the bit at `position` without changing the resident segment.
    pub fn peek(&mut self, position: i64) -> Result<Bit, TapeMachineError> {
        if self.contains(position) {
            return self.read(position);
        }

        let offset = self.origin as i64 + position;
        if offset < 0 {
            return Ok(Bit::Zero);
        }

        let mut buf = [0u8; 1];
        if self.medium.read_at(offset as u64, &mut buf)? == 0 {
            return Ok(Bit::Zero);
        }

        Bit::from_ascii(buf[0]).ok_or(TapeMachineError::TapeFormat {
            offset: offset as u64,
            found: buf[0] as char,
        })
    }

    /// Flushes the resident segment and syncs the medium. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), TapeMachineError> {
        self.flush_segment()?;
        self.medium.sync()?;
        Ok(())
    }

    fn size(&self) -> i64 {
        self.segment_size as i64
    }

    fn local(&self, position: i64) -> usize {
        position.rem_euclid(self.size()) as usize
    }

    fn offset_of(&self, index: i64) -> i64 {
        self.origin as i64 + index * self.size()
    }
}

impl<M: Medium> Drop for SegmentedTape<M> {
    fn drop(&mut self) {
        if let Some(s) = self.resident.as_ref().filter(|s| s.dirty) {
            warn!(index = s.index, "Dropping tape with unflushed segment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    type MemoryTape = SegmentedTape<FlatFile<Cursor<Vec<u8>>>>;

    fn tape(content: &str, segment_size: usize) -> MemoryTape {
        let medium = FlatFile::new(Cursor::new(content.as_bytes().to_vec()));
        SegmentedTape::new(medium, segment_size).unwrap()
    }

    fn content(tape: &MemoryTape) -> String {
        String::from_utf8(tape.medium().get_ref().get_ref().clone()).unwrap()
    }

    #[test]
    fn test_rejects_zero_segment_size() {
        let medium = FlatFile::new(Cursor::new(Vec::new()));
        assert!(matches!(
            SegmentedTape::new(medium, 0),
            Err(TapeMachineError::Config(_))
        ));
    }

    #[test]
    fn test_read_zero_fills_past_end() {
        let mut t = tape("101", 4);

        assert_eq!(t.read(0).unwrap(), Bit::One);
        assert_eq!(t.read(1).unwrap(), Bit::Zero);
        assert_eq!(t.read(2).unwrap(), Bit::One);
        assert_eq!(t.read(3).unwrap(), Bit::Zero);
        assert_eq!(t.read(9).unwrap(), Bit::Zero);
        assert_eq!(t.resident_index(), Some(2));
    }

    #[test]
    fn test_read_negative_positions_are_zero() {
        let mut t = tape("1111", 4);

        assert_eq!(t.read(-1).unwrap(), Bit::Zero);
        assert_eq!(t.resident_index(), Some(-1));
        assert_eq!(t.segment_of(-4), -1);
        assert_eq!(t.segment_of(-5), -2);
    }

    #[test]
    fn test_corrupt_tape_is_rejected() {
        let mut t = tape("01x1", 8);

        match t.read(0) {
            Err(TapeMachineError::TapeFormat { offset, found }) => {
                assert_eq!(offset, 2);
                assert_eq!(found, 'x');
            }
            other => panic!("Expected TapeFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_write_outside_resident_segment() {
        let mut t = tape("0000", 2);
        assert!(t.write(0, Bit::One).is_err());

        t.load_segment(0).unwrap();
        t.write(1, Bit::One).unwrap();
        assert!(matches!(
            t.write(2, Bit::One),
            Err(TapeMachineError::OutsideSegment { position: 2, segment: Some(0) })
        ));
    }

    #[test]
    fn test_swap_flushes_resident_segment() {
        let mut t = tape("0000", 2);
        t.load_segment(0).unwrap();
        t.write(1, Bit::One).unwrap();
        assert_eq!(content(&t), "0000");

        assert_eq!(t.read(2).unwrap(), Bit::Zero);
        assert_eq!(content(&t), "0100");
    }

    #[test]
    fn test_flush_without_writes_is_identity() {
        let mut t = tape("0110", 8);
        t.load_segment(0).unwrap();
        t.flush_segment().unwrap();
        t.flush_segment().unwrap();

        assert_eq!(content(&t), "0110");
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_flush_pads_gap_to_the_right() {
        let mut t = tape("11", 4);
        t.load_segment(2).unwrap();
        t.write(9, Bit::One).unwrap();
        t.close().unwrap();

        assert_eq!(content(&t), "1100000001");
    }

    #[test]
    fn test_flush_extends_left() {
        let mut t = tape("101", 4);
        t.load_segment(-1).unwrap();
        t.write(-1, Bit::One).unwrap();
        t.close().unwrap();

        assert_eq!(content(&t), "0001101");
        assert_eq!(t.origin(), 4);

        // Positions keep their meaning after the shift.
        assert_eq!(t.read(0).unwrap(), Bit::One);
        assert_eq!(t.read(1).unwrap(), Bit::Zero);
        assert_eq!(t.read(-1).unwrap(), Bit::One);
        assert_eq!(t.read(-4).unwrap(), Bit::Zero);
    }

    #[test]
    fn test_flush_far_left_extends_by_whole_segments() {
        let mut t = tape("1", 2);
        t.load_segment(-2).unwrap();
        t.write(-4, Bit::One).unwrap();
        t.close().unwrap();

        assert_eq!(content(&t), "10001");
        assert_eq!(t.origin(), 4);
    }

    #[test]
    fn test_peek_does_not_swap() {
        let mut t = tape("0101", 2);
        t.load_segment(0).unwrap();

        assert_eq!(t.peek(3).unwrap(), Bit::One);
        assert_eq!(t.peek(40).unwrap(), Bit::Zero);
        assert_eq!(t.peek(-3).unwrap(), Bit::Zero);
        assert_eq!(t.resident_index(), Some(0));
    }

    #[test]
    fn test_close_without_segment_is_noop() {
        let mut t = tape("01", 4);
        t.close().unwrap();
        assert_eq!(content(&t), "01");
    }

    proptest! {
        #[test]
        fn writes_survive_segment_swaps(
            bits in proptest::collection::vec(any::<bool>(), 1..64),
            segment_size in 1usize..16,
        ) {
            let mut t = tape("", segment_size);
            for (i, &b) in bits.iter().enumerate() {
                let position = i as i64;
                t.read(position).unwrap();
                t.write(position, Bit::from(b)).unwrap();
            }
            t.close().unwrap();

            let expected: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
            prop_assert_eq!(content(&t), expected);
        }
    }
}
