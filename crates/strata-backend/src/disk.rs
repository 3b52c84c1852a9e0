//! Persistent record backend on Fjall.

use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tracing::debug;

use crate::error::BackendError;
use crate::traits::VersionBackend;

/// Persistent record backend storing all records in a single Fjall keyspace.
///
/// Record keys are length-prefixed composites
/// (`key length (u32 BE) ++ key ++ sequence (u32 BE)`), so user keys that
/// are prefixes of one another cannot collide.
pub struct FjallBackend {
    #[allow(dead_code)]
    db: Database,
    records: Keyspace,
}

impl FjallBackend {
    /// Open a persistent backend at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let db = Database::builder(path).open()?;
        Self::init(db)
    }

    /// Open a temporary backend that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self, BackendError> {
        let tmp = tempfile::tempdir()?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, BackendError> {
        let records = db.keyspace("records", KeyspaceCreateOptions::default)?;
        Ok(Self { db, records })
    }
}

impl VersionBackend for FjallBackend {
    fn put_record(&self, key: &[u8], seq: u32, value: &[u8]) -> Result<(), BackendError> {
        self.records.insert(record_key(key, seq), value)?;
        Ok(())
    }

    fn get_record(&self, key: &[u8], seq: u32) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.records.get(record_key(key, seq))?.map(|v| v.to_vec()))
    }

    fn remove_record(&self, key: &[u8], seq: u32) -> Result<(), BackendError> {
        self.records.remove(record_key(key, seq))?;
        Ok(())
    }

    fn wipe(&self) -> Result<(), BackendError> {
        let mut keys = Vec::new();
        for guard in self.records.iter() {
            let k = guard.key()?;
            keys.push(k.to_vec());
        }
        for key in &keys {
            self.records.remove(key.as_slice())?;
        }
        debug!(records = keys.len(), "wiped fjall backend");
        Ok(())
    }
}

/// Build the composite record key: `key length (u32 BE) ++ key ++ seq (u32 BE)`.
fn record_key(key: &[u8], seq: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + key.len());
    out.extend_from_slice(&(key.len() as u32).to_be_bytes());
    out.extend_from_slice(key);
    out.extend_from_slice(&seq.to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let backend = FjallBackend::open_temporary().unwrap();
        backend.put_record(b"key", 0, b"value").unwrap();
        assert_eq!(backend.get_record(b"key", 0).unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_get_absent_returns_none() {
        let backend = FjallBackend::open_temporary().unwrap();
        assert_eq!(backend.get_record(b"missing", 3).unwrap(), None);
    }

    #[test]
    fn test_overwrite_slot() {
        let backend = FjallBackend::open_temporary().unwrap();
        backend.put_record(b"key", 0, b"old").unwrap();
        backend.put_record(b"key", 0, b"new").unwrap();
        assert_eq!(backend.get_record(b"key", 0).unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_prefix_keys_do_not_collide() {
        let backend = FjallBackend::open_temporary().unwrap();
        backend.put_record(b"k", 0, b"short").unwrap();
        backend.put_record(b"kk", 0, b"long").unwrap();

        backend.remove_record(b"k", 0).unwrap();
        assert_eq!(backend.get_record(b"kk", 0).unwrap(), Some(b"long".to_vec()));
    }

    #[test]
    fn test_wipe_erases_everything() {
        let backend = FjallBackend::open_temporary().unwrap();
        backend.put_record(b"a", 0, b"1").unwrap();
        backend.put_record(b"a", 1, b"2").unwrap();
        backend.put_record(b"b", 0, b"3").unwrap();

        backend.wipe().unwrap();

        assert_eq!(backend.get_record(b"a", 0).unwrap(), None);
        assert_eq!(backend.get_record(b"a", 1).unwrap(), None);
        assert_eq!(backend.get_record(b"b", 0).unwrap(), None);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().to_path_buf();

        {
            let backend = FjallBackend::open(&path).unwrap();
            backend.put_record(b"key", 0, b"survives").unwrap();
        }

        {
            let backend = FjallBackend::open(&path).unwrap();
            assert_eq!(
                backend.get_record(b"key", 0).unwrap(),
                Some(b"survives".to_vec())
            );
        }
    }
}
