//! Core trait for durable version-record storage.

use crate::error::BackendError;

/// Storage for versioned key records.
///
/// Each record is addressed by the caller's encoded key plus a sequence
/// number ascending from 0 in write order. The backend stores records
/// opaquely; ordering, counting and enumeration of versions are the history
/// index's concern.
pub trait VersionBackend: Send + Sync {
    /// Store the record for one `(key, sequence)` slot, overwriting any
    /// previous record in that slot.
    fn put_record(&self, key: &[u8], seq: u32, value: &[u8]) -> Result<(), BackendError>;

    /// Retrieve the record at `(key, sequence)`. Returns `None` if absent.
    fn get_record(&self, key: &[u8], seq: u32) -> Result<Option<Vec<u8>>, BackendError>;

    /// Remove the record at `(key, sequence)`. Removing an absent record is
    /// not an error.
    fn remove_record(&self, key: &[u8], seq: u32) -> Result<(), BackendError>;

    /// Erase every record, including internal bookkeeping slots.
    fn wipe(&self) -> Result<(), BackendError>;
}
