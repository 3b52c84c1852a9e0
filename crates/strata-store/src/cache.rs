//! Write-back cache of live value objects handed out to callers.
//!
//! `get` hands back a [`ValueHandle`] wrapping a shared, mutably borrowable
//! value. Repeated gets of the same key return the same live object, so
//! in-place mutation is visible across reads within a session. Nothing
//! watches those mutations: they reach the backend only when the store
//! flushes and finds a value's encoding diverged from the last committed
//! snapshot.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

/// A shared handle to a live value materialized from the store.
///
/// Handles are `Rc`-based and deliberately not `Send`: the store assumes a
/// single logical owner. Do not hold a mutable borrow across store calls
/// that flush — the store refuses to encode a value that is still mutably
/// borrowed and fails with [`StoreError::ValueBorrowed`].
pub struct ValueHandle<V>(Rc<RefCell<V>>);

impl<V> ValueHandle<V> {
    /// Wrap a value that never entered the store (e.g. a `get_or` default).
    pub(crate) fn detached(value: V) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrow the live value.
    pub fn borrow(&self) -> Ref<'_, V> {
        self.0.borrow()
    }

    /// Mutably borrow the live value. The mutation becomes durable on the
    /// next flush (or on store teardown).
    pub fn borrow_mut(&self) -> RefMut<'_, V> {
        self.0.borrow_mut()
    }
}

impl<V> Clone for ValueHandle<V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V: fmt::Debug> fmt::Debug for ValueHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => f.debug_tuple("ValueHandle").field(&*value).finish(),
            Err(_) => f.write_str("ValueHandle(<mutably borrowed>)"),
        }
    }
}

/// One cached association: the live object plus its last committed encoding.
struct CacheEntry<V> {
    live: Rc<RefCell<V>>,
    committed: Vec<u8>,
}

/// Tracks live values by encoded key, for diff-on-flush.
pub(crate) struct WriteBackCache<V> {
    entries: HashMap<Vec<u8>, CacheEntry<V>>,
}

impl<V> WriteBackCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Hand back the existing live object for `key`, if any.
    pub(crate) fn lookup(&self, key: &[u8]) -> Option<ValueHandle<V>> {
        self.entries
            .get(key)
            .map(|entry| ValueHandle(Rc::clone(&entry.live)))
    }

    /// Register a freshly materialized value and hand back its handle.
    ///
    /// `committed` is the encoding the value was decoded from — the baseline
    /// that later flushes diff against.
    pub(crate) fn admit(&mut self, key: Vec<u8>, committed: Vec<u8>, value: V) -> ValueHandle<V> {
        let live = Rc::new(RefCell::new(value));
        let handle = ValueHandle(Rc::clone(&live));
        self.entries.insert(key, CacheEntry { live, committed });
        handle
    }

    /// Drop the entry for `key`. A direct insert or a delete wins over any
    /// pending unflushed mutation.
    pub(crate) fn invalidate(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.entries.clear();
    }
}

impl<V: Serialize> WriteBackCache<V> {
    fn encode_live(entry: &CacheEntry<V>) -> Result<Vec<u8>> {
        let value = entry
            .live
            .try_borrow()
            .map_err(|_| StoreError::ValueBorrowed)?;
        Ok(postcard::to_allocvec(&*value)?)
    }

    /// Encode every live entry and collect those whose encoding no longer
    /// matches the committed snapshot. Snapshots are not updated here; the
    /// store calls [`mark_committed`](Self::mark_committed) once the append
    /// has succeeded.
    pub(crate) fn divergent(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        for (key, entry) in &self.entries {
            let encoded = Self::encode_live(entry)?;
            if encoded != entry.committed {
                out.push((key.clone(), encoded));
            }
        }
        Ok(out)
    }

    /// Same check for a single key. `None` means the entry is clean; an
    /// absent entry fails with [`StoreError::MissingKey`].
    pub(crate) fn divergent_one(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let entry = self.entries.get(key).ok_or(StoreError::MissingKey)?;
        let encoded = Self::encode_live(entry)?;
        Ok((encoded != entry.committed).then_some(encoded))
    }

    /// Record that `encoded` is now the durably committed form for `key`.
    pub(crate) fn mark_committed(&mut self, key: &[u8], encoded: Vec<u8>) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.committed = encoded;
        }
    }
}
