use kvd_core::handler::dispatch;
use kvd_core::model::{Kv, Request};
use kvd_core::storage::{build_storage, StorageKind};

#[test]
fn scenario_put_then_get() {
    let storage = build_storage(&StorageKind::Memory).unwrap();
    dispatch(&Request::put(b"k1".to_vec(), b"v1".to_vec()), storage.as_ref());
    let resp = dispatch(&Request::get(b"k1".to_vec()), storage.as_ref());
    assert!(resp.success);
    assert_eq!(resp.value, Some(b"v1".to_vec()));
}

#[test]
fn scenario_get_missing_key() {
    let storage = build_storage(&StorageKind::Memory).unwrap();
    let resp = dispatch(&Request::get(b"missing".to_vec()), storage.as_ref());
    assert!(!resp.success);
    assert_eq!(resp.message, "key not found");
}

#[test]
fn scenario_put_overwrite() {
    let storage = build_storage(&StorageKind::Memory).unwrap();
    dispatch(&Request::put(b"k".to_vec(), b"a".to_vec()), storage.as_ref());
    dispatch(&Request::put(b"k".to_vec(), b"b".to_vec()), storage.as_ref());
    let resp = dispatch(&Request::get(b"k".to_vec()), storage.as_ref());
    assert_eq!(resp.value, Some(b"b".to_vec()));
}

#[test]
fn scenario_lru_capacity_three() {
    let storage = build_storage(&StorageKind::MemoryLru { cache_capacity: 3 }).unwrap();
    dispatch(&Request::put(b"k1".to_vec(), b"v1".to_vec()), storage.as_ref());
    dispatch(&Request::put(b"k2".to_vec(), b"v2".to_vec()), storage.as_ref());
    dispatch(&Request::put(b"k3".to_vec(), b"v3".to_vec()), storage.as_ref());
    // The LRU is a performance layer over an authoritative map, so all
    // keys remain gettable regardless of cache eviction.
    dispatch(&Request::get(b"k1".to_vec()), storage.as_ref());
    dispatch(&Request::put(b"k4".to_vec(), b"v4".to_vec()), storage.as_ref());
    for (k, v) in [("k1", "v1"), ("k2", "v2"), ("k3", "v3"), ("k4", "v4")] {
        let resp = dispatch(&Request::get(k.as_bytes().to_vec()), storage.as_ref());
        assert_eq!(resp.value, Some(v.as_bytes().to_vec()), "key {} should still be present", k);
    }
}

#[test]
fn scenario_multi_put_then_multi_get() {
    let storage = build_storage(&StorageKind::Memory).unwrap();
    dispatch(
        &Request::multi_put(vec![Kv::new(b"a".to_vec(), b"1".to_vec()), Kv::new(b"b".to_vec(), b"2".to_vec())]),
        storage.as_ref(),
    );
    let resp = dispatch(
        &Request::multi_get(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]),
        storage.as_ref(),
    );
    assert!(resp.success);
    assert_eq!(
        resp.kvs,
        vec![
            Kv::new(b"a".to_vec(), b"1".to_vec()),
            Kv::new(b"b".to_vec(), b"2".to_vec()),
            Kv::new(b"c".to_vec(), Vec::new()),
        ]
    );
}

#[test]
fn scenario_file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.bin").to_str().unwrap().to_string();

    {
        let storage = build_storage(&StorageKind::File { path: path.clone() }).unwrap();
        dispatch(&Request::put(b"k1".to_vec(), b"v1".to_vec()), storage.as_ref());
        dispatch(&Request::put(b"k2".to_vec(), b"v2".to_vec()), storage.as_ref());
        storage.persist().unwrap();
    }

    {
        let storage = build_storage(&StorageKind::File { path: path.clone() }).unwrap();
        assert_eq!(dispatch(&Request::get(b"k1".to_vec()), storage.as_ref()).value, Some(b"v1".to_vec()));
        assert_eq!(dispatch(&Request::get(b"k2".to_vec()), storage.as_ref()).value, Some(b"v2".to_vec()));
        dispatch(&Request::put(b"k3".to_vec(), b"v3".to_vec()), storage.as_ref());
        dispatch(&Request::delete(b"k1".to_vec()), storage.as_ref());
        storage.persist().unwrap();
    }

    let storage = build_storage(&StorageKind::File { path }).unwrap();
    assert_eq!(dispatch(&Request::get(b"k1".to_vec()), storage.as_ref()).success, false);
    assert_eq!(dispatch(&Request::get(b"k2".to_vec()), storage.as_ref()).value, Some(b"v2".to_vec()));
    assert_eq!(dispatch(&Request::get(b"k3".to_vec()), storage.as_ref()).value, Some(b"v3".to_vec()));
}
