//! Volatile in-memory record backend.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::BackendError;
use crate::traits::VersionBackend;

/// In-memory record backend backed by a `RwLock<HashMap>`.
///
/// Useful for testing and for stores opened in volatile mode. All records
/// are discarded when the backend is dropped.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<(Vec<u8>, u32), Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionBackend for MemoryBackend {
    fn put_record(&self, key: &[u8], seq: u32, value: &[u8]) -> Result<(), BackendError> {
        let mut map = self.records.write().expect("lock poisoned");
        map.insert((key.to_vec(), seq), value.to_vec());
        Ok(())
    }

    fn get_record(&self, key: &[u8], seq: u32) -> Result<Option<Vec<u8>>, BackendError> {
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(&(key.to_vec(), seq)).cloned())
    }

    fn remove_record(&self, key: &[u8], seq: u32) -> Result<(), BackendError> {
        let mut map = self.records.write().expect("lock poisoned");
        map.remove(&(key.to_vec(), seq));
        Ok(())
    }

    fn wipe(&self) -> Result<(), BackendError> {
        let mut map = self.records.write().expect("lock poisoned");
        let dropped = map.len();
        map.clear();
        debug!(records = dropped, "wiped in-memory backend");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let backend = MemoryBackend::new();
        backend.put_record(b"key", 0, b"value").unwrap();
        let result = backend.get_record(b"key", 0).unwrap();
        assert_eq!(result, Some(b"value".to_vec()));
    }

    #[test]
    fn test_get_absent_returns_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get_record(b"missing", 0).unwrap(), None);
    }

    #[test]
    fn test_sequences_are_distinct_slots() {
        let backend = MemoryBackend::new();
        backend.put_record(b"key", 0, b"first").unwrap();
        backend.put_record(b"key", 1, b"second").unwrap();

        assert_eq!(backend.get_record(b"key", 0).unwrap(), Some(b"first".to_vec()));
        assert_eq!(backend.get_record(b"key", 1).unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_remove_record() {
        let backend = MemoryBackend::new();
        backend.put_record(b"key", 0, b"value").unwrap();
        backend.remove_record(b"key", 0).unwrap();
        assert_eq!(backend.get_record(b"key", 0).unwrap(), None);
    }

    #[test]
    fn test_remove_absent_record_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.remove_record(b"never", 7).is_ok());
    }

    #[test]
    fn test_wipe_erases_everything() {
        let backend = MemoryBackend::new();
        backend.put_record(b"a", 0, b"1").unwrap();
        backend.put_record(b"b", 0, b"2").unwrap();
        backend.put_record(b"b", 1, b"3").unwrap();

        backend.wipe().unwrap();

        assert_eq!(backend.get_record(b"a", 0).unwrap(), None);
        assert_eq!(backend.get_record(b"b", 0).unwrap(), None);
        assert_eq!(backend.get_record(b"b", 1).unwrap(), None);
    }
}
