//! The append-only payload file
//!
//! Payload bytes live in one flat file, addressed by the `(offset, length)`
//! pairs recorded in the index. The file only ever grows; bytes under an
//! occupied slot are never rewritten or truncated. Like the index store,
//! every operation opens its own descriptor.

use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append/read access to the data file.
#[derive(Debug, Clone)]
pub struct DataStore {
    path: PathBuf,
}

impl DataStore {
    /// Bind a store to a data file path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes` and return the offset they start at.
    ///
    /// Must be called while holding the exclusive lock that also guards the
    /// corresponding index write, so the returned offset and the recorded
    /// slot cannot diverge.
    pub fn append(&self, bytes: &[u8]) -> Result<u64> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(e, &self.path, "open"))?;
        let offset = file
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::io(e, &self.path, "seek"))?;
        file.write_all(bytes)
            .map_err(|e| Error::io(e, &self.path, "write"))?;
        Ok(offset)
    }

    /// Read exactly `length` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the file ends before `length` bytes could be read, or if
    /// `length` does not fit the platform's address space. The data file is
    /// never truncated beneath an occupied slot and slot lengths are bounded
    /// by what was once appended, so either case means the cache state is
    /// corrupt.
    pub fn read_at(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let Ok(len) = usize::try_from(length) else {
            panic!(
                "data file {} slot length {length} exceeds the address space; index record is corrupt",
                self.path.display()
            );
        };
        let mut file = File::open(&self.path).map_err(|e| Error::io(e, &self.path, "open"))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(e, &self.path, "seek"))?;
        let mut buf = vec![0u8; len];
        match file.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                panic!(
                    "data file {} truncated beneath an occupied slot (wanted {length} bytes at {offset})",
                    self.path.display()
                );
            }
            Err(e) => Err(Error::io(e, &self.path, "read")),
        }
    }

    /// Truncate the file to empty, creating it if needed. Part of the
    /// one-time initialization protocol.
    pub fn truncate(&self) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| Error::io(e, &self.path, "truncate"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> DataStore {
        let store = DataStore::new(dir.path().join("data"));
        store.truncate().unwrap();
        store
    }

    #[test]
    fn test_append_returns_monotonic_offsets() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.append(b"hello").unwrap(), 0);
        assert_eq!(store.append(b"world!").unwrap(), 5);
        assert_eq!(store.append(b"").unwrap(), 11);
    }

    #[test]
    fn test_read_at_exact_range() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append(b"aaabbbccc").unwrap();
        assert_eq!(store.read_at(3, 3).unwrap(), b"bbb");
        assert_eq!(store.read_at(0, 0).unwrap(), b"");
    }

    #[test]
    fn test_truncate_resets_length() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append(b"payload").unwrap();
        store.truncate().unwrap();
        assert_eq!(store.append(b"x").unwrap(), 0);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    #[should_panic(expected = "exceeds the address space")]
    fn test_unaddressable_length_panics() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append(b"abc").unwrap();
        let _ = store.read_at(0, u64::from(u32::MAX) + 1);
    }

    #[test]
    #[should_panic(expected = "truncated beneath an occupied slot")]
    fn test_short_read_panics() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append(b"abc").unwrap();
        let _ = store.read_at(0, 10);
    }
}
