//! Per-key append-only version sequences over a record backend.

use std::collections::HashMap;

use strata_backend::{BackendError, VersionBackend};
use tracing::debug;

use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

/// Encoded form of [`RESERVED_KEY`](crate::RESERVED_KEY): the record key the
/// live-key directory is persisted under.
pub(crate) fn reserved_key_bytes() -> Vec<u8> {
    postcard::to_allocvec(crate::RESERVED_KEY).expect("serialization should not fail")
}

/// Maintains the per-key version sequences and the live-key directory.
///
/// Keys at this layer are already encoded to bytes. The directory — which
/// keys exist, in what order, with how many versions — is held in memory
/// and persisted under the reserved key's record slot after every
/// structural mutation, so it survives reopen.
pub(crate) struct HistoryIndex {
    backend: Box<dyn VersionBackend>,
    /// Live keys in first-append order.
    order: Vec<Vec<u8>>,
    /// Encoded key → number of recorded versions.
    counts: HashMap<Vec<u8>, u32>,
    /// The directory's record key.
    reserved: Vec<u8>,
}

impl HistoryIndex {
    /// Open an index over a backend, loading the persisted directory.
    pub(crate) fn open(backend: Box<dyn VersionBackend>) -> Result<Self> {
        let reserved = reserved_key_bytes();
        let mut order = Vec::new();
        let mut counts = HashMap::new();

        if let Some(bytes) = backend.get_record(&reserved, 0)? {
            let directory: Vec<(Vec<u8>, u32)> = postcard::from_bytes(&bytes)?;
            for (key, count) in directory {
                order.push(key.clone());
                counts.insert(key, count);
            }
        }

        debug!(keys = order.len(), "opened history index");
        Ok(Self {
            backend,
            order,
            counts,
            reserved,
        })
    }

    fn persist_directory(&self) -> Result<()> {
        let mut directory: Vec<(&[u8], u32)> = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let count = self.counts.get(key).copied().unwrap_or(0);
            directory.push((key.as_slice(), count));
        }
        let bytes = postcard::to_allocvec(&directory)?;
        self.backend.put_record(&self.reserved, 0, &bytes)?;
        Ok(())
    }

    /// Append `value` as the new current version for `key`.
    ///
    /// A key not currently live is registered at the end of the enumeration
    /// order, including a key that was erased earlier.
    pub(crate) fn append(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let count = self.counts.get(key).copied().unwrap_or(0);
        self.backend.put_record(key, count, value)?;
        if count == 0 {
            self.order.push(key.to_vec());
        }
        self.counts.insert(key.to_vec(), count + 1);
        self.persist_directory()?;
        debug!(versions = count + 1, "appended version");
        Ok(())
    }

    /// Number of recorded versions for `key` (0 when absent).
    pub(crate) fn version_count(&self, key: &[u8]) -> usize {
        self.counts.get(key).copied().unwrap_or(0) as usize
    }

    /// The current (most recent) value for `key`.
    pub(crate) fn latest(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.at_offset(key, 0)
    }

    /// The value `back` versions behind current (0 = current).
    pub(crate) fn at_offset(&self, key: &[u8], back: usize) -> Result<Vec<u8>> {
        let count = self.version_count(key);
        if count == 0 {
            return Err(StoreError::MissingKey);
        }
        if back >= count {
            return Err(StoreError::HistoryExhausted {
                requested: back,
                available: count,
            });
        }
        let seq = (count - 1 - back) as u32;
        match self.backend.get_record(key, seq)? {
            Some(bytes) => Ok(bytes),
            None => Err(StoreError::Backend(BackendError::Io(std::io::Error::other(
                "directory lists a version with no backing record",
            )))),
        }
    }

    /// Erase the whole history for `key`. Returns whether the key existed;
    /// erasing an absent key is not an error at this layer.
    pub(crate) fn erase_key(&mut self, key: &[u8]) -> Result<bool> {
        let Some(count) = self.counts.remove(key) else {
            return Ok(false);
        };
        for seq in 0..count {
            self.backend.remove_record(key, seq)?;
        }
        self.order.retain(|k| k != key);
        self.persist_directory()?;
        debug!(versions = count, "erased key history");
        Ok(true)
    }

    /// Erase every key's history and the bookkeeping slot.
    pub(crate) fn erase_all(&mut self) -> Result<()> {
        self.backend.wipe()?;
        self.order.clear();
        self.counts.clear();
        Ok(())
    }

    /// Live keys, in stable first-append order.
    pub(crate) fn known_keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.order.iter().map(|k| k.as_slice())
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn contains(&self, key: &[u8]) -> bool {
        self.counts.contains_key(key)
    }
}
