//! Durable, versioned key-value store with a write-back value cache.
//!
//! Every insert appends a new version rather than overwriting, so any past
//! value stays retrievable by how many versions back it sits from current
//! ([`HistoryStore::past`]). For everyday use the store behaves like an
//! ordinary map: contains, get, insert, remove, iterate, len.
//!
//! Values read through [`HistoryStore::get`] come back as live
//! [`ValueHandle`]s: the same object on repeated reads of the same key,
//! mutable in place, persisted as a new version when the store flushes and
//! the value's encoding has diverged from the last committed snapshot.
//! Teardown flushes implicitly on every exit path.
//!
//! One key is reserved for the store's own bookkeeping ([`RESERVED_KEY`])
//! and is rejected for caller use.

mod cache;
mod error;
mod index;
mod store;

#[cfg(test)]
mod tests;

pub use cache::ValueHandle;
pub use error::StoreError;
pub use store::HistoryStore;

/// Key reserved for the store's live-key directory.
///
/// Using a key whose encoding matches this value fails with
/// [`StoreError::ReservedKey`].
pub const RESERVED_KEY: &str = "__strata_directory__";
