//! The on-disk slot table
//!
//! A fixed array of [`Slot`] records; record `i` lives at byte offset
//! `16 * i`. The store opens a fresh descriptor for every operation so
//! handles stay fork-safe and nothing leaks across long-lived caches.
//! Callers are responsible for holding the matching advisory lock (see
//! [`crate::lock`]) around any read-check-then-write sequence.

use crate::slot::{SLOT_LEN, Slot};
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Random-access view over the index file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
    capacity: usize,
}

impl IndexStore {
    /// Bind a store to an index file path with a fixed slot count.
    #[must_use]
    pub fn new(path: PathBuf, capacity: usize) -> Self {
        Self { path, capacity }
    }

    /// Path of the backing index file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of slots in the table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn open_read(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| Error::io(e, &self.path, "open"))
    }

    /// Read the record for slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is outside `[0, capacity)`; an out-of-range index is a
    /// programming error, not a recoverable condition.
    pub fn read_slot(&self, i: usize) -> Result<Slot> {
        assert!(i < self.capacity, "slot index {i} out of range");
        let mut file = self.open_read()?;
        file.seek(SeekFrom::Start((SLOT_LEN * i) as u64))
            .map_err(|e| Error::io(e, &self.path, "seek"))?;
        let mut buf = [0u8; SLOT_LEN];
        file.read_exact(&mut buf)
            .map_err(|e| Error::io(e, &self.path, "read"))?;
        Ok(Slot::from_bytes(&buf))
    }

    /// Write the record for slot `i`.
    ///
    /// Only call while holding the exclusive lock on the index resource.
    ///
    /// # Panics
    ///
    /// Panics if `i` is outside `[0, capacity)`.
    pub fn write_slot(&self, i: usize, slot: Slot) -> Result<()> {
        assert!(i < self.capacity, "slot index {i} out of range");
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| Error::io(e, &self.path, "open"))?;
        file.seek(SeekFrom::Start((SLOT_LEN * i) as u64))
            .map_err(|e| Error::io(e, &self.path, "seek"))?;
        file.write_all(&slot.to_bytes())
            .map_err(|e| Error::io(e, &self.path, "write"))?;
        Ok(())
    }

    /// Reset every slot to the empty sentinel and trim the file to exactly
    /// `capacity` records. Part of the one-time initialization protocol; the
    /// caller holds the exclusive lock.
    pub fn write_sentinels(&self) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(e, &self.path, "open"))?;
        let sentinel = Slot::SENTINEL.to_bytes();
        let mut image = Vec::with_capacity(SLOT_LEN * self.capacity);
        for _ in 0..self.capacity {
            image.extend_from_slice(&sentinel);
        }
        file.write_all(&image)
            .map_err(|e| Error::io(e, &self.path, "write"))?;
        file.set_len((SLOT_LEN * self.capacity) as u64)
            .map_err(|e| Error::io(e, &self.path, "truncate"))?;
        Ok(())
    }

    /// Best-effort bulk read of every slot's data-file offset, without
    /// locking. Diagnostic only; may race with concurrent writers.
    pub fn read_all_offsets(&self) -> Result<Vec<u64>> {
        let mut file = self.open_read()?;
        let mut offsets = Vec::with_capacity(self.capacity);
        let mut buf = [0u8; SLOT_LEN];
        for _ in 0..self.capacity {
            file.read_exact(&mut buf)
                .map_err(|e| Error::io(e, &self.path, "read"))?;
            offsets.push(Slot::from_bytes(&buf).offset);
        }
        Ok(offsets)
    }
}
