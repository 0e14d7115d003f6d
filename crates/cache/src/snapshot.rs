//! Snapshot export/import of the cache file pair
//!
//! A snapshot is the two files under a caller-supplied name: `<name>.idx`
//! (the slot table image) and `<name>.dat` (the payload image), both in the
//! cache directory. The pair is the entire portable representation of cache
//! state, so a snapshot preserved by one engine variant can be preloaded by
//! the other.

use crate::cache::CacheState;
use crate::slot::SLOT_LEN;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the index half of snapshot `name` under `dir`.
#[must_use]
pub fn index_image_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.idx"))
}

/// Path of the data half of snapshot `name` under `dir`.
#[must_use]
pub fn data_image_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.dat"))
}

/// Copy the live file pair to the snapshot destinations. The caller holds
/// whatever lock its variant requires for a consistent pair.
pub(crate) fn preserve(state: &CacheState, name: &str, overwrite: bool) -> Result<()> {
    if state.is_closed() {
        return Err(Error::configuration("cannot preserve a closed cache"));
    }
    state.ensure_owner("preserve")?;

    let index_dst = index_image_path(state.dir(), name);
    let data_dst = data_image_path(state.dir(), name);
    // A handle may re-preserve under a name it owns; that refreshes its own
    // snapshot rather than colliding with a foreign one.
    if !overwrite && !state.previously_preserved(name) {
        for dst in [&index_dst, &data_dst] {
            if dst.exists() {
                return Err(Error::SnapshotExists {
                    path: dst.as_path().into(),
                });
            }
        }
    }

    fs::copy(state.index().path(), &index_dst).map_err(|e| Error::io(e, &index_dst, "copy"))?;
    fs::copy(state.data().path(), &data_dst).map_err(|e| Error::io(e, &data_dst, "copy"))?;
    state.note_preserved(name);
    debug!(name, index = %index_dst.display(), "preserved cache snapshot");
    Ok(())
}

/// Copy a snapshot pair over this handle's own index/data files.
pub(crate) fn preload(state: &CacheState, name: &str) -> Result<()> {
    if state.is_closed() {
        return Err(Error::configuration("cannot preload into a closed cache"));
    }
    state.ensure_owner("preload")?;

    let index_src = index_image_path(state.dir(), name);
    let data_src = data_image_path(state.dir(), name);
    if !index_src.exists() || !data_src.exists() {
        return Err(Error::SnapshotMissing {
            name: name.to_string(),
        });
    }

    let image_len = fs::metadata(&index_src)
        .map_err(|e| Error::io(e, &index_src, "stat"))?
        .len();
    let expected = (SLOT_LEN * state.capacity()) as u64;
    if image_len != expected {
        return Err(Error::configuration(format!(
            "snapshot '{name}' holds {} slots but this cache holds {}",
            image_len / SLOT_LEN as u64,
            state.capacity()
        )));
    }

    fs::copy(&index_src, state.index().path())
        .map_err(|e| Error::io(e, state.index().path(), "copy"))?;
    fs::copy(&data_src, state.data().path())
        .map_err(|e| Error::io(e, state.data().path(), "copy"))?;
    debug!(name, "preloaded cache snapshot");
    Ok(())
}
