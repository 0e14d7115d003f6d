//! Multiprocess-safe engine variant

use crate::cache::{Cache, CacheOptions, CacheState, downgrade_disk_full};
use crate::{Error, Result, snapshot};
use std::path::Path;

/// Write-once slot cache safe to share between independent OS processes.
///
/// Every read takes the shared advisory lock on the index resource and every
/// write the exclusive one, so cooperating processes need no shared memory:
/// handles in different processes pointed at the same file pair (see
/// [`CacheOptions::index_path`] / [`CacheOptions::data_path`]) observe a
/// totally ordered, write-once slot table. Within one process the same
/// discipline makes a handle-per-thread setup safe as well.
///
/// Construction initializes the file pair exactly once across racing
/// constructors through a deliberately lenient non-blocking handshake: the
/// loser proceeds immediately rather than waiting on the winner.
#[derive(Debug)]
pub struct MultiprocessCache {
    state: CacheState,
}

impl MultiprocessCache {
    /// Open a cache of `capacity` slots backed by fresh temp files in `dir`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(capacity, CacheOptions::new(dir.as_ref()))
    }

    /// Open a cache with explicit [`CacheOptions`]. Sharing between
    /// processes requires explicit index/data paths.
    pub fn with_options(capacity: usize, options: CacheOptions) -> Result<Self> {
        Ok(Self {
            state: CacheState::open(capacity, options)?,
        })
    }
}

impl Cache for MultiprocessCache {
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
        let _guard = self.state.lock().acquire_shared()?;
        self.state.get_present(i)
    }

    fn put(&self, i: usize, bytes: &[u8]) -> Result<bool> {
        if self.state.is_closed() {
            return Ok(false);
        }
        let _guard = self.state.lock().acquire_exclusive()?;
        downgrade_disk_full(self.state.put_once(i, bytes))
    }

    fn offsets(&self) -> Result<Vec<u64>> {
        // Diagnostic path, deliberately unlocked.
        self.state.index().read_all_offsets()
    }

    fn preserve(&self, name: &str, overwrite: bool) -> Result<()> {
        if self.state.is_closed() {
            return Err(Error::configuration("cannot preserve a closed cache"));
        }
        // Exclusive lock so the copied index/data pair is mutually
        // consistent even with concurrent writers.
        let _guard = self.state.lock().acquire_exclusive()?;
        snapshot::preserve(&self.state, name, overwrite)
    }

    fn preload(&mut self, name: &str) -> Result<()> {
        if self.state.is_closed() {
            return Err(Error::configuration("cannot preload into a closed cache"));
        }
        // Preload targets a freshly constructed handle before any sharing
        // starts, so it takes no lock; copying over a file this process
        // itself holds locked would also fail where OS file locks are
        // mandatory rather than advisory.
        snapshot::preload(&self.state, name)
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn multiprocess_safe(&self) -> bool {
        true
    }

    fn multithread_safe(&self) -> bool {
        true
    }
}

impl Drop for MultiprocessCache {
    fn drop(&mut self) {
        self.state.close();
    }
}
