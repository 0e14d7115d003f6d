//! Write-once, fixed-capacity file cache shared between processes
//!
//! This crate is the storage layer beneath a lazy file-access/prefetch
//! library: fetch an expensive resource once, store it under a stable integer
//! index, and let any later process read it back without re-fetching.
//!
//! State lives in two plain files:
//! - an **index file** of exactly `N` 16-byte slot records (`u64` offset,
//!   `i64` length, little-endian; `(0, -1)` marks an empty slot), and
//! - an **append-only data file** holding the raw payload bytes the records
//!   point into.
//!
//! Slots are write-once: the first `put` to an index wins, later puts report
//! `false`, and there is no update, delete, or eviction path.
//!
//! # Engine variants
//!
//! [`MultiprocessCache`] coordinates uncoordinated OS processes purely
//! through advisory locks on the index file; [`LocalCache`] elides the
//! locking for guaranteed single-process use. Both write the identical
//! on-disk format, and snapshots taken with [`Cache::preserve`] can be
//! [`Cache::preload`]ed by either variant.
//!
//! # Example
//!
//! ```no_run
//! use slotcache::{Cache, MultiprocessCache};
//!
//! # fn main() -> slotcache::Result<()> {
//! let mut cache = MultiprocessCache::new(1024, "/tmp/prefetch")?;
//! if cache.put(7, b"payload")? {
//!     // first writer for slot 7
//! }
//! assert_eq!(cache.get(7)?.as_deref(), Some(&b"payload"[..]));
//! cache.close();
//! # Ok(())
//! # }
//! ```

mod cache;
mod codec;
mod data;
mod error;
mod index;
mod local;
mod lock;
mod multiprocess;
mod slot;
pub mod snapshot;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use cache::{Cache, CacheOptions};
pub use codec::{JsonCodec, ValueCodec};
pub use data::DataStore;
pub use index::IndexStore;
pub use local::LocalCache;
pub use lock::{ExclusiveGuard, IndexLock, SharedGuard};
pub use multiprocess::MultiprocessCache;
pub use slot::{SLOT_LEN, Slot};
