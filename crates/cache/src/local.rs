//! Single-process engine variant

use crate::cache::{Cache, CacheOptions, CacheState, downgrade_disk_full};
use crate::{Result, snapshot};
use std::path::Path;

/// Write-once slot cache for use from a single process.
///
/// Skips the advisory locking of [`crate::MultiprocessCache`] but writes the
/// identical on-disk format, so its files and snapshots are interchangeable
/// with the multiprocess variant. Not safe to share between threads or
/// processes.
#[derive(Debug)]
pub struct LocalCache {
    state: CacheState,
}

impl LocalCache {
    /// Open a cache of `capacity` slots backed by fresh temp files in `dir`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(capacity, CacheOptions::new(dir.as_ref()))
    }

    /// Open a cache with explicit [`CacheOptions`].
    pub fn with_options(capacity: usize, options: CacheOptions) -> Result<Self> {
        Ok(Self {
            state: CacheState::open(capacity, options)?,
        })
    }
}

impl Cache for LocalCache {
    fn capacity(&self) -> usize {
        self.state.capacity()
    }

    fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    fn get(&self, i: usize) -> Result<Option<Vec<u8>>> {
        if self.state.is_closed() {
            return Ok(None);
        }
        self.state.get_present(i)
    }

    fn put(&self, i: usize, bytes: &[u8]) -> Result<bool> {
        if self.state.is_closed() {
            return Ok(false);
        }
        downgrade_disk_full(self.state.put_once(i, bytes))
    }

    fn offsets(&self) -> Result<Vec<u64>> {
        self.state.index().read_all_offsets()
    }

    fn preserve(&self, name: &str, overwrite: bool) -> Result<()> {
        snapshot::preserve(&self.state, name, overwrite)
    }

    fn preload(&mut self, name: &str) -> Result<()> {
        snapshot::preload(&self.state, name)
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn multiprocess_safe(&self) -> bool {
        false
    }

    fn multithread_safe(&self) -> bool {
        false
    }
}

impl Drop for LocalCache {
    fn drop(&mut self) {
        self.state.close();
    }
}
