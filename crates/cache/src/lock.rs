//! Cross-process lock coordination over the index resource
//!
//! The index file is the single serialization point for the whole cache:
//! readers take a shared advisory lock, writers an exclusive one, and racing
//! initializers make a single non-blocking exclusive attempt. Locks are held
//! by RAII guards and released on drop; each acquisition opens a fresh
//! descriptor, so guards are safe to create after a fork.
//!
//! fs4 supplies the locking backend. The engines rely on advisory
//! semantics — a lock holder may reopen and copy its own files — which hold
//! for the POSIX locks fs4 uses on Unix; Windows `LockFileEx` locks are
//! mandatory, so sharing a cache across processes is supported on Unix only.

use crate::{Error, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock coordinator bound to the index file path.
#[derive(Debug, Clone)]
pub struct IndexLock {
    path: PathBuf,
}

/// RAII shared (read) lock on the index resource.
#[derive(Debug)]
pub struct SharedGuard {
    file: File,
}

/// RAII exclusive (write) lock on the index resource.
#[derive(Debug)]
pub struct ExclusiveGuard {
    file: File,
}

impl Drop for SharedGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl Drop for ExclusiveGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl IndexLock {
    /// Bind a coordinator to the index file path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the locked resource.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until a shared lock is granted. Multiple readers may hold it
    /// concurrently; it excludes exclusive holders.
    pub fn acquire_shared(&self) -> Result<SharedGuard> {
        let file = File::open(&self.path).map_err(|e| Error::io(e, &self.path, "open"))?;
        file.lock_shared()
            .map_err(|e| Error::io(e, &self.path, "lock_shared"))?;
        Ok(SharedGuard { file })
    }

    /// Block until the exclusive lock is granted. Excludes all other readers
    /// and writers.
    pub fn acquire_exclusive(&self) -> Result<ExclusiveGuard> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| Error::io(e, &self.path, "open"))?;
        file.lock_exclusive()
            .map_err(|e| Error::io(e, &self.path, "lock_exclusive"))?;
        Ok(ExclusiveGuard { file })
    }

    /// Single non-blocking exclusive attempt, used only during cache
    /// initialization. `Ok(None)` means another party already holds the lock
    /// (it is initializing or has initialized) and is never an error.
    pub fn try_acquire_exclusive(&self) -> Result<Option<ExclusiveGuard>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(e, &self.path, "open"))?;
        let acquired = file
            .try_lock_exclusive()
            .map_err(|e| Error::io(e, &self.path, "try_lock_exclusive"))?;
        if acquired {
            Ok(Some(ExclusiveGuard { file }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lock(dir: &TempDir) -> IndexLock {
        let path = dir.path().join("index");
        std::fs::write(&path, b"").unwrap();
        IndexLock::new(path)
    }

    #[test]
    fn test_shared_locks_coexist() {
        let dir = TempDir::new().unwrap();
        let lock = lock(&dir);
        let a = lock.acquire_shared().unwrap();
        let b = lock.acquire_shared().unwrap();
        drop(a);
        drop(b);
    }

    #[test]
    fn test_exclusive_blocks_try_acquire() {
        let dir = TempDir::new().unwrap();
        let lock = lock(&dir);
        let guard = lock.acquire_exclusive().unwrap();
        // A second descriptor cannot take the lock while the guard lives.
        assert!(lock.try_acquire_exclusive().unwrap().is_none());
        drop(guard);
        assert!(lock.try_acquire_exclusive().unwrap().is_some());
    }

    #[test]
    fn test_guard_drop_releases() {
        let dir = TempDir::new().unwrap();
        let lock = lock(&dir);
        drop(lock.acquire_exclusive().unwrap());
        let regained = lock.try_acquire_exclusive().unwrap();
        assert!(regained.is_some());
    }
}
