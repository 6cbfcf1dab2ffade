use super::Storage;
use crate::lru::LruCache;
use std::collections::HashMap;
use std::sync::Mutex;

/// The [`MemoryStorage`](super::MemoryStorage) map fronted by an
/// [`LruCache`]. The cache is strictly a performance layer: `get`
/// consults it first and populates it on an underlying hit; `put` and
/// `delete` keep it in sync, but the map is always the source of
/// truth.
pub struct MemoryLruStorage {
    data: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    cache: LruCache<Vec<u8>, Vec<u8>>,
}

impl MemoryLruStorage {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            cache: LruCache::new(cache_capacity),
        }
    }
}

impl Storage for MemoryLruStorage {
    fn put(&self, key: &[u8], value: &[u8]) -> bool {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        self.cache.put(key.to_vec(), value.to_vec());
        true
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(value) = self.cache.get(&key.to_vec()) {
            return Some(value);
        }
        let value = self.data.lock().unwrap().get(key).cloned()?;
        self.cache.put(key.to_vec(), value.clone());
        Some(value)
    }

    fn delete(&self, key: &[u8]) -> bool {
        self.cache.remove(&key.to_vec());
        self.data.lock().unwrap().remove(key).is_some()
    }

    fn get_all_entries(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.data.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_populates_cache_on_underlying_hit() {
        let s = MemoryLruStorage::new(10);
        s.data
            .lock()
            .unwrap()
            .insert(b"k".to_vec(), b"v".to_vec());
        assert_eq!(s.cache.get(&b"k".to_vec()), None);
        assert_eq!(s.get(b"k"), Some(b"v".to_vec()));
        assert_eq!(s.cache.get(&b"k".to_vec()), Some(b"v".to_vec()));
    }

    #[test]
    fn put_keeps_cache_and_map_in_sync() {
        let s = MemoryLruStorage::new(10);
        s.put(b"k", b"v1");
        s.put(b"k", b"v2");
        assert_eq!(s.get(b"k"), Some(b"v2".to_vec()));
    }

    #[test]
    fn delete_evicts_from_cache_and_map() {
        let s = MemoryLruStorage::new(10);
        s.put(b"k", b"v");
        assert!(s.delete(b"k"));
        assert_eq!(s.get(b"k"), None);
    }

    #[test]
    fn zero_capacity_cache_never_changes_semantics() {
        let s = MemoryLruStorage::new(0);
        s.put(b"k", b"v");
        assert_eq!(s.get(b"k"), Some(b"v".to_vec()));
    }
}
