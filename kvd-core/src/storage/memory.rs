use super::Storage;
use std::collections::HashMap;
use std::sync::Mutex;

/// A mutex-guarded in-memory map. The baseline storage backend; every
/// other backend either wraps one of these or reimplements the same
/// locking discipline directly.
pub struct MemoryStorage {
    data: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn put(&self, key: &[u8], value: &[u8]) -> bool {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        true
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn delete(&self, key: &[u8]) -> bool {
        self.data.lock().unwrap().remove(key).is_some()
    }

    fn get_all_entries(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.data.lock().unwrap().clone()
    }
}
