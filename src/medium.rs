//! This module provides the byte-level storage under the segmented tape.
//!
//! A [`Medium`] is a growable array of ASCII `'0'`/`'1'` bytes. It only grows: rightward by
//! padding `'0'` after the end, leftward by shifting every existing byte to a higher offset.
//! [`FlatFile`] implements it over any `Read + Write + Seek`, which covers both
//! `std::fs::File` and `std::io::Cursor` for in-memory tapes.

use crate::types::{Bit, TapeMachineError};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

const PAD_CHUNK: usize = 4096;

/// Byte-addressed storage for a tape that can be extended at either end.
pub trait Medium {
    /// Current length in bytes.
    fn len(&mut self) -> io::Result<u64>;

    /// Reads up to `buf.len()` bytes at `offset`, returning how many were available.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Overwrites bytes at `offset`. The range must start at or before the current end.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;

    /// Pads the end with `'0'` until the medium is `new_len` bytes long.
    fn extend_right(&mut self, new_len: u64) -> io::Result<()>;

    /// Inserts `amount` `'0'` bytes before offset 0, moving existing content right.
    ///
    /// This rewrites the whole medium.
    fn extend_left(&mut self, amount: u64) -> io::Result<()>;

    /// Pushes buffered writes down to the underlying storage.
    fn sync(&mut self) -> io::Result<()>;
}

/// A tape stored as a flat run of ASCII `'0'`/`'1'` bytes.
#[derive(Debug)]
pub struct FlatFile<F> {
    inner: F,
}

impl FlatFile<File> {
    /// Opens an existing tape file for reading and in-place writing.
    pub fn open(path: &Path) -> Result<Self, TapeMachineError> {
        File::options()
            .read(true)
            .write(true)
            .open(path)
            .map(Self::new)
            .map_err(|e| TapeMachineError::file(path, e))
    }
}

impl<F> FlatFile<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: Read + Write + Seek> FlatFile<F> {
    fn write_zeros(&mut self, mut count: u64) -> io::Result<()> {
        let chunk = [Bit::Zero.to_ascii(); PAD_CHUNK];
        while count > 0 {
            let n = count.min(PAD_CHUNK as u64) as usize;
            self.inner.write_all(&chunk[..n])?;
            count -= n as u64;
        }
        Ok(())
    }
}

impl<F: Read + Write + Seek> Medium for FlatFile<F> {
    fn len(&mut self) -> io::Result<u64> {
        self.inner.seek(SeekFrom::End(0))
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(filled)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        let len = self.len()?;
        if offset > len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("write at offset {offset} leaves a gap after end {len}"),
            ));
        }

        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.write_all(data)
    }

    fn extend_right(&mut self, new_len: u64) -> io::Result<()> {
        let len = self.len()?;
        if new_len > len {
            // `len()` left the cursor at the end.
            self.write_zeros(new_len - len)?;
        }
        Ok(())
    }

    fn extend_left(&mut self, amount: u64) -> io::Result<()> {
        if amount == 0 {
            return Ok(());
        }

        let mut content = Vec::new();
        self.inner.seek(SeekFrom::Start(0))?;
        self.inner.read_to_end(&mut content)?;

        self.inner.seek(SeekFrom::Start(0))?;
        self.write_zeros(amount)?;
        self.inner.write_all(&content)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
