//! Engine-common state, construction protocol, and the [`Cache`] trait
//!
//! Both engine variants wrap the same `CacheState`: the slot table, the
//! payload file, the lock coordinator, and the lifecycle flags. They differ
//! only in whether operations take the advisory locks around the shared
//! read/write paths.

use crate::codec::ValueCodec;
use crate::data::DataStore;
use crate::index::IndexStore;
use crate::lock::IndexLock;
use crate::slot::Slot;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Construction options for either cache variant.
///
/// `dir` is where generated index/data files (and snapshots) live; there is
/// deliberately no process-wide default directory. By default the backing
/// files are fresh temp files deleted again on [`Cache::close`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    dir: PathBuf,
    index_path: Option<PathBuf>,
    data_path: Option<PathBuf>,
    cleanup: bool,
}

impl CacheOptions {
    /// Options rooted at `dir` with generated backing files and cleanup on
    /// close.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index_path: None,
            data_path: None,
            cleanup: true,
        }
    }

    /// Use an explicit index file path instead of a generated temp file.
    ///
    /// The file is created (or truncated) during construction, before the
    /// non-blocking initialization lock attempt.
    #[must_use]
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    /// Use an explicit data file path instead of a generated temp file.
    #[must_use]
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Whether `close` unlinks the backing files (default: true).
    #[must_use]
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Shared engine state: capacity, file pair, lock coordinator, lifecycle.
#[derive(Debug)]
pub(crate) struct CacheState {
    capacity: usize,
    dir: PathBuf,
    index: IndexStore,
    data: DataStore,
    lock: IndexLock,
    cleanup: bool,
    closed: bool,
    owner_pid: u32,
    preserved: Mutex<HashSet<String>>,
}

fn fresh_file(dir: &Path) -> Result<PathBuf> {
    let tmp = tempfile::Builder::new()
        .prefix(".slotcache-")
        .tempfile_in(dir)
        .map_err(|e| Error::io(e, dir, "create temp file"))?;
    let (_file, path) = tmp.keep().map_err(|e| Error::io(e.error, dir, "persist"))?;
    Ok(path)
}

impl CacheState {
    /// Run the construction protocol: resolve the file pair, then initialize
    /// it exactly once across racing constructors via a non-blocking
    /// exclusive lock attempt.
    ///
    /// A constructor that loses the attempt proceeds immediately; it may
    /// briefly observe a partially initialized slot table while the winner is
    /// still writing sentinels. This leniency is deliberate (racing
    /// initializers never deadlock) and matches the write-once usage pattern,
    /// where puts only start after all consumers hold a handle.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub(crate) fn open(capacity: usize, options: CacheOptions) -> Result<Self> {
        assert!(capacity > 0, "cache capacity must be non-zero");

        fs::create_dir_all(&options.dir).map_err(|e| Error::io(e, &options.dir, "create_dir_all"))?;

        let data_path = match options.data_path {
            Some(path) => path,
            None => fresh_file(&options.dir)?,
        };
        let index_path = match options.index_path {
            Some(path) => {
                // Create or truncate up front, before the lock attempt, as
                // racing constructors on a shared path expect.
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)
                    .map_err(|e| Error::io(e, &path, "create"))?;
                path
            }
            None => fresh_file(&options.dir)?,
        };

        let state = Self {
            capacity,
            dir: options.dir,
            index: IndexStore::new(index_path.clone(), capacity),
            data: DataStore::new(data_path),
            lock: IndexLock::new(index_path),
            cleanup: options.cleanup,
            closed: false,
            owner_pid: std::process::id(),
            preserved: Mutex::new(HashSet::new()),
        };
        state.initialize()?;
        Ok(state)
    }

    fn initialize(&self) -> Result<()> {
        match self.lock.try_acquire_exclusive()? {
            Some(guard) => {
                self.index.write_sentinels()?;
                self.data.truncate()?;
                drop(guard);
                debug!(
                    index = %self.index.path().display(),
                    capacity = self.capacity,
                    "initialized cache file pair"
                );
            }
            None => {
                // Another process holds the lock: it is initializing, or has
                // already initialized, this file pair.
                debug!(
                    index = %self.index.path().display(),
                    "initialization lock busy, assuming peer initialization"
                );
            }
        }
        Ok(())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn index(&self) -> &IndexStore {
        &self.index
    }

    pub(crate) fn data(&self) -> &DataStore {
        &self.data
    }

    pub(crate) fn lock(&self) -> &IndexLock {
        &self.lock
    }

    /// Fail unless the calling process constructed this handle. Cleanup and
    /// snapshot operations are reserved for the owner so a handle inherited
    /// across a fork cannot delete or swap files it does not own.
    pub(crate) fn ensure_owner(&self, operation: &str) -> Result<()> {
        if std::process::id() == self.owner_pid {
            Ok(())
        } else {
            Err(Error::configuration(format!(
                "{operation} is only supported in the process that created the cache"
            )))
        }
    }

    #[cfg(test)]
    pub(crate) fn set_owner_pid(&mut self, pid: u32) {
        self.owner_pid = pid;
    }

    /// Whether this handle already preserved a snapshot under `name`.
    /// Re-preserving one's own snapshot refreshes it instead of failing the
    /// existence check.
    pub(crate) fn previously_preserved(&self, name: &str) -> bool {
        self.preserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Record a successful preserve under `name`.
    pub(crate) fn note_preserved(&self, name: &str) {
        self.preserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string());
    }

    /// Read path shared by both variants: slot lookup plus the payload read.
    /// The caller holds the shared lock where required.
    pub(crate) fn get_present(&self, i: usize) -> Result<Option<Vec<u8>>> {
        let slot = self.index.read_slot(i)?;
        match slot.location() {
            Some((offset, length)) => Ok(Some(self.data.read_at(offset, length)?)),
            None => Ok(None),
        }
    }

    /// Write path shared by both variants: check the slot, append the
    /// payload, then publish `(offset, length)`. The caller holds the
    /// exclusive lock where required.
    ///
    /// Publishing only after a complete append means a failed append can
    /// never strand an occupied slot pointing at missing bytes.
    pub(crate) fn put_once(&self, i: usize, bytes: &[u8]) -> Result<bool> {
        if self.index.read_slot(i)?.is_occupied() {
            return Ok(false);
        }
        let offset = self.data.append(bytes)?;
        self.index
            .write_slot(i, Slot::occupied(offset, bytes.len() as u64))?;
        Ok(true)
    }

    /// Idempotent teardown; unlinks the file pair when cleanup was requested
    /// and this process owns the handle. The two unlinks are independent and
    /// best-effort: a crash in between can orphan one file.
    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.cleanup && std::process::id() == self.owner_pid {
            let _ = fs::remove_file(self.data.path());
            let _ = fs::remove_file(self.index.path());
            debug!(
                index = %self.index.path().display(),
                "closed cache and removed backing files"
            );
        }
    }
}

/// Downgrade an out-of-space failure on the put path to a warning plus
/// `false`; a full disk is an expected steady-state outcome for a cache.
pub(crate) fn downgrade_disk_full(result: Result<bool>) -> Result<bool> {
    match result {
        Err(e) if e.is_disk_full() => {
            warn!("cache put skipped, no space left on device: {e}");
            Ok(false)
        }
        other => other,
    }
}

/// The engine contract shared by [`crate::LocalCache`] and
/// [`crate::MultiprocessCache`].
///
/// Slots are write-once: the first successful `put` to an index wins and
/// every later `put` to it reports `false`. There is no update, delete, or
/// eviction path.
pub trait Cache {
    /// Number of slots, fixed at construction.
    fn capacity(&self) -> usize;

    /// Whether the handle has been closed.
    fn is_closed(&self) -> bool;

    /// Fetch the bytes stored under `i`, or `None` if the slot is empty.
    ///
    /// Returns `None` for every index once the handle is closed.
    ///
    /// # Panics
    ///
    /// Panics if `i` is outside `[0, capacity)` on an open handle.
    fn get(&self, i: usize) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `i` if the slot is still empty.
    ///
    /// Returns `Ok(true)` when the value was stored, `Ok(false)` when the
    /// slot was already occupied, the handle is closed, or the disk is full.
    ///
    /// # Panics
    ///
    /// Panics if `i` is outside `[0, capacity)` on an open handle.
    fn put(&self, i: usize, bytes: &[u8]) -> Result<bool>;

    /// Best-effort, unlocked dump of every slot's data-file offset.
    fn offsets(&self) -> Result<Vec<u64>>;

    /// Export the live file pair under a durable snapshot name.
    ///
    /// Fails with [`Error::SnapshotExists`] when a destination exists and
    /// `overwrite` is false, leaving the existing snapshot untouched. May be
    /// called repeatedly, with the same or different names, without
    /// disturbing the live cache.
    fn preserve(&self, name: &str, overwrite: bool) -> Result<()>;

    /// Import a snapshot into this freshly constructed, not-yet-used handle
    /// of the same capacity. Snapshots are portable across variants.
    fn preload(&mut self, name: &str) -> Result<()>;

    /// Idempotent; unlinks the backing files when cleanup was requested and
    /// the calling process created the handle. Also invoked on drop.
    fn close(&mut self);

    /// Whether independent OS processes may share this cache's file pair.
    fn multiprocess_safe(&self) -> bool;

    /// Whether threads within one process may share this handle.
    fn multithread_safe(&self) -> bool;

    /// Typed fetch through a [`ValueCodec`]; decodes only a present,
    /// non-empty payload.
    fn get_value<T, C>(&self, i: usize, codec: &C) -> Result<Option<T>>
    where
        Self: Sized,
        C: ValueCodec<T>,
    {
        match self.get(i)? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(codec.decode(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Typed store through a [`ValueCodec`]; encoding failures are fatal.
    fn put_value<T, C>(&self, i: usize, value: &T, codec: &C) -> Result<bool>
    where
        Self: Sized,
        C: ValueCodec<T>,
    {
        let bytes = codec.encode(value)?;
        self.put(i, &bytes)
    }
}
