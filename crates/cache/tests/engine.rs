//! End-to-end engine behavior shared by both variants

use slotcache::{Cache, CacheOptions, JsonCodec, LocalCache, MultiprocessCache};
use tempfile::TempDir;

#[test]
fn test_put_get_roundtrip_multiprocess() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(10, dir.path()).unwrap();

    for i in 0..10usize {
        let payload = format!("payload-{i}").into_bytes();
        assert!(cache.put(i, &payload).unwrap());
    }
    for i in 0..10usize {
        let expected = format!("payload-{i}").into_bytes();
        assert_eq!(cache.get(i).unwrap(), Some(expected));
    }
}

#[test]
fn test_put_get_roundtrip_local() {
    let dir = TempDir::new().unwrap();
    let cache = LocalCache::new(10, dir.path()).unwrap();

    assert!(cache.put(3, b"abc").unwrap());
    assert_eq!(cache.get(3).unwrap().as_deref(), Some(&b"abc"[..]));
}

#[test]
fn test_get_before_put_is_absent() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(4, dir.path()).unwrap();
    for i in 0..4 {
        assert_eq!(cache.get(i).unwrap(), None);
    }
}

#[test]
fn test_slots_are_write_once() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(4, dir.path()).unwrap();

    assert!(cache.put(1, b"first").unwrap());
    assert!(!cache.put(1, b"second").unwrap());
    assert_eq!(cache.get(1).unwrap().as_deref(), Some(&b"first"[..]));
}

#[test]
fn test_empty_payload_occupies_slot() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(2, dir.path()).unwrap();

    assert!(cache.put(0, b"").unwrap());
    assert_eq!(cache.get(0).unwrap().as_deref(), Some(&b""[..]));
    assert!(!cache.put(0, b"later").unwrap());
}

#[test]
#[should_panic(expected = "out of range")]
fn test_get_out_of_range_panics() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(4, dir.path()).unwrap();
    let _ = cache.get(4);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_put_out_of_range_panics() {
    let dir = TempDir::new().unwrap();
    let cache = LocalCache::new(4, dir.path()).unwrap();
    let _ = cache.put(99, b"x");
}

#[test]
fn test_close_is_idempotent_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let mut cache = MultiprocessCache::new(4, dir.path()).unwrap();
    cache.put(0, b"x").unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);

    cache.close();
    cache.close();
    assert!(cache.is_closed());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_closed_handle_is_inert() {
    let dir = TempDir::new().unwrap();
    let mut cache = MultiprocessCache::new(4, dir.path()).unwrap();
    cache.put(2, b"x").unwrap();
    cache.close();

    // Absent for every index, in or out of range, without raising.
    assert_eq!(cache.get(2).unwrap(), None);
    assert_eq!(cache.get(400).unwrap(), None);
    assert!(!cache.put(3, b"y").unwrap());
}

#[test]
fn test_cleanup_false_leaves_files() {
    let dir = TempDir::new().unwrap();
    let mut cache =
        LocalCache::with_options(4, CacheOptions::new(dir.path()).cleanup(false)).unwrap();
    cache.put(0, b"x").unwrap();
    cache.close();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_drop_cleans_up() {
    let dir = TempDir::new().unwrap();
    {
        let cache = LocalCache::new(4, dir.path()).unwrap();
        cache.put(0, b"x").unwrap();
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_offsets_reflect_appends() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(3, dir.path()).unwrap();
    cache.put(0, b"aaaa").unwrap();
    cache.put(2, b"bb").unwrap();
    // Slot 1 is empty (sentinel offset 0); slot 2 follows slot 0's bytes.
    assert_eq!(cache.offsets().unwrap(), vec![0, 0, 4]);
}

#[test]
fn test_typed_access_through_codec() {
    let dir = TempDir::new().unwrap();
    let cache = MultiprocessCache::new(4, dir.path()).unwrap();
    let codec = JsonCodec;

    assert!(cache.put_value(1, &vec![10u32, 20, 30], &codec).unwrap());
    let back: Option<Vec<u32>> = cache.get_value(1, &codec).unwrap();
    assert_eq!(back, Some(vec![10, 20, 30]));

    let absent: Option<Vec<u32>> = cache.get_value(0, &codec).unwrap();
    assert_eq!(absent, None);
}

#[test]
fn test_unrelated_io_fault_propagates() {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data");
    let cache = MultiprocessCache::with_options(
        4,
        CacheOptions::new(dir.path())
            .index_path(dir.path().join("index"))
            .data_path(&data_path)
            .cleanup(false),
    )
    .unwrap();

    // Yank the data file out from under the engine: the next append fails
    // with a non-ENOSPC error, which must surface instead of being swallowed.
    std::fs::remove_file(&data_path).unwrap();
    let err = cache.put(0, b"x").unwrap_err();
    assert!(matches!(err, slotcache::Error::Io { .. }));
}

#[cfg(target_os = "linux")]
#[test]
fn test_disk_full_put_warns_and_reports_false() {
    let dir = TempDir::new().unwrap();
    // /dev/full accepts opens and seeks but fails every write with ENOSPC.
    let cache = MultiprocessCache::with_options(
        4,
        CacheOptions::new(dir.path())
            .index_path(dir.path().join("index"))
            .data_path("/dev/full")
            .cleanup(false),
    )
    .unwrap();

    assert!(!cache.put(0, b"payload").unwrap());
    // The handle stays usable afterwards.
    assert_eq!(cache.get(1).unwrap(), None);
    assert!(!cache.put(1, b"more").unwrap());
}

#[test]
fn test_capability_flags() {
    let dir = TempDir::new().unwrap();
    let local = LocalCache::new(1, dir.path()).unwrap();
    let shared = MultiprocessCache::new(1, dir.path()).unwrap();

    assert!(!local.multiprocess_safe());
    assert!(!local.multithread_safe());
    assert!(shared.multiprocess_safe());
    assert!(shared.multithread_safe());
    assert_eq!(local.capacity(), 1);
    assert_eq!(shared.capacity(), 1);
}
