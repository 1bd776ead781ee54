use crate::state::{CacheKind, SNAPSHOT_VERSION, Snapshot};

#[test]
fn test_snapshot_operations() {
    let mut snapshot = Snapshot::new("/home/ci/.gradle");
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    assert!(snapshot.captured_at_nanos > 0);

    snapshot.record(
        "caches/modules-2/files-2.1/org.apache.commons/commons-math3/3.1",
        CacheKind::ModuleCache,
        100,
    );
    snapshot.record("caches/7.5.1", CacheKind::VersionCache, 200);

    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.contains("caches/7.5.1"));
    assert!(!snapshot.contains("caches/7.3.3"));

    let state = snapshot.get("caches/7.5.1").unwrap();
    assert_eq!(state.kind, CacheKind::VersionCache);
    assert_eq!(state.signal_nanos, 200);
}

#[test]
fn test_record_refreshes_existing_key() {
    let mut snapshot = Snapshot::new("/home/ci/.gradle");
    snapshot.record("caches/7.5.1", CacheKind::VersionCache, 200);
    snapshot.record("caches/7.5.1", CacheKind::VersionCache, 300);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("caches/7.5.1").unwrap().signal_nanos, 300);
}

#[test]
fn test_count_of_kind() {
    let mut snapshot = Snapshot::new("/home/ci/.gradle");
    snapshot.record("caches/build-cache-1/aa", CacheKind::BuildCache, 1);
    snapshot.record("caches/build-cache-1/bb", CacheKind::BuildCache, 1);
    snapshot.record("wrapper/dists/gradle-7.3.3-bin", CacheKind::WrapperDistCache, 1);

    assert_eq!(snapshot.count_of(CacheKind::BuildCache), 2);
    assert_eq!(snapshot.count_of(CacheKind::WrapperDistCache), 1);
    assert_eq!(snapshot.count_of(CacheKind::ModuleCache), 0);
}

#[test]
fn test_kind_display_and_labels() {
    assert_eq!(CacheKind::ModuleCache.to_string(), "module");
    assert_eq!(CacheKind::WrapperDistCache.to_string(), "wrapper-dist");
    for kind in CacheKind::ALL {
        assert!(!kind.label().is_empty());
    }
}
