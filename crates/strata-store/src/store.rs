//! [`HistoryStore`] — the public associative-container surface.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_backend::{FjallBackend, MemoryBackend, VersionBackend};
use tracing::{debug, error};

use crate::cache::{ValueHandle, WriteBackCache};
use crate::error::StoreError;
use crate::index::{reserved_key_bytes, HistoryIndex};

type Result<T> = std::result::Result<T, StoreError>;

/// A durable, versioned mapping from keys to values.
///
/// Every insert appends a new version for its key; older versions stay
/// retrievable through [`past`] by how many versions back they sit from
/// current. For everyday use the store reads like an ordinary map:
///
/// ```ignore
/// let mut store: HistoryStore<String, u32> = HistoryStore::open("./data")?;
/// store.insert(&"a".to_string(), &123)?;
/// store.insert(&"a".to_string(), &456)?;
/// assert_eq!(*store.get(&"a".to_string())?.borrow(), 456);
/// assert_eq!(store.past(&"a".to_string(), 1)?, 123);
/// ```
///
/// Values handed out by [`get`] are live objects: mutate them in place
/// through the handle, then call [`flush`] (or tear the store down) to
/// persist the mutation as a new version.
///
/// The store assumes exactly one logical owner at a time; handles are
/// `Rc`-based and not `Send`. Concurrent access to the same durable
/// location must be serialized by the caller.
///
/// [`past`]: HistoryStore::past
/// [`get`]: HistoryStore::get
/// [`flush`]: HistoryStore::flush
pub struct HistoryStore<K, V: Serialize> {
    index: HistoryIndex,
    cache: RefCell<WriteBackCache<V>>,
    reserved: Vec<u8>,
    _key: PhantomData<fn() -> K>,
}

impl<K, V> HistoryStore<K, V>
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Open a store persisted at the given location.
    ///
    /// Reopening the same location reproduces the key/version state as of
    /// the last flush or teardown.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_backend(Box::new(FjallBackend::open(path)?))
    }

    /// Open a volatile store whose contents are discarded on drop.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    /// Open a store over an explicit backend.
    pub fn with_backend(backend: Box<dyn VersionBackend>) -> Result<Self> {
        Ok(Self {
            index: HistoryIndex::open(backend)?,
            cache: RefCell::new(WriteBackCache::new()),
            reserved: reserved_key_bytes(),
            _key: PhantomData,
        })
    }

    fn encode_key(&self, key: &K) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(key)?)
    }

    /// Encode a caller-supplied key, rejecting the reserved sentinel.
    fn user_key(&self, key: &K) -> Result<Vec<u8>> {
        let raw = self.encode_key(key)?;
        if raw == self.reserved {
            return Err(StoreError::ReservedKey);
        }
        Ok(raw)
    }

    /// Whether `key` currently has at least one recorded version.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        let raw = self.encode_key(key)?;
        if raw == self.reserved {
            return Ok(false);
        }
        Ok(self.index.contains(&raw))
    }

    /// The live value for `key`.
    ///
    /// Repeated gets of the same key return handles to the same live
    /// object, so in-place mutations are visible on subsequent reads.
    /// Mutations become durable only on [`flush`](Self::flush),
    /// [`flush_key`](Self::flush_key) or store teardown.
    pub fn get(&self, key: &K) -> Result<ValueHandle<V>> {
        let raw = self.user_key(key)?;
        if let Some(handle) = self.cache.borrow().lookup(&raw) {
            return Ok(handle);
        }
        let committed = self.index.latest(&raw)?;
        let value: V = postcard::from_bytes(&committed)?;
        Ok(self.cache.borrow_mut().admit(raw, committed, value))
    }

    /// Like [`get`](Self::get), but hands back `default` when the key is
    /// missing. The default stays detached from the store and is never
    /// flushed.
    pub fn get_or(&self, key: &K, default: V) -> Result<ValueHandle<V>> {
        match self.get(key) {
            Err(StoreError::MissingKey) => Ok(ValueHandle::detached(default)),
            other => other,
        }
    }

    /// Append `value` as the new current version for `key`.
    ///
    /// Any pending unflushed mutation of a previously handed-out handle for
    /// this key is discarded: a direct insert wins.
    pub fn insert(&mut self, key: &K, value: &V) -> Result<()> {
        let raw = self.user_key(key)?;
        let encoded = postcard::to_allocvec(value)?;
        self.index.append(&raw, &encoded)?;
        self.cache.get_mut().invalidate(&raw);
        Ok(())
    }

    /// Erase `key` and its entire version history.
    ///
    /// Fails with [`StoreError::MissingKey`] when the key is absent. A
    /// later insert under the same key starts a brand-new history with no
    /// continuity to what was erased.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        let raw = self.user_key(key)?;
        if !self.index.erase_key(&raw)? {
            return Err(StoreError::MissingKey);
        }
        self.cache.get_mut().invalidate(&raw);
        Ok(())
    }

    /// Erase every key, every version and all bookkeeping.
    pub fn clear(&mut self) -> Result<()> {
        self.index.erase_all()?;
        self.cache.get_mut().invalidate_all();
        Ok(())
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store has no live keys.
    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    /// Iterate the live keys in first-insert order.
    ///
    /// Each call walks the key set as it is now; a key removed and
    /// re-inserted moves to the end of the order.
    pub fn keys(&self) -> impl Iterator<Item = Result<K>> + '_ {
        self.index
            .known_keys()
            .map(|raw| postcard::from_bytes(raw).map_err(StoreError::from))
    }

    /// Iterate `(key, current value)` pairs.
    ///
    /// Values are decoded fresh from the index: unflushed in-place
    /// mutations of live handles are not reflected here.
    pub fn items(&self) -> impl Iterator<Item = Result<(K, V)>> + '_ {
        self.index.known_keys().map(move |raw| {
            let key: K = postcard::from_bytes(raw)?;
            let value: V = postcard::from_bytes(&self.index.latest(raw)?)?;
            Ok((key, value))
        })
    }

    /// The value recorded `back` versions behind current (0 = current).
    ///
    /// Returns an owned copy decoded from storage; history reads never go
    /// through the write-back cache. Fails with
    /// [`StoreError::NegativeOffset`] when `back < 0`, with
    /// [`StoreError::MissingKey`] when the key has no entries at all, and
    /// with [`StoreError::HistoryExhausted`] when fewer than `back + 1`
    /// versions are recorded.
    pub fn past(&self, key: &K, back: isize) -> Result<V> {
        if back < 0 {
            return Err(StoreError::NegativeOffset(back));
        }
        let raw = self.user_key(key)?;
        let bytes = self.index.at_offset(&raw, back as usize)?;
        Ok(postcard::from_bytes(&bytes)?)
    }

    /// Prune old versions. Reserved for a future retention policy; always
    /// fails rather than silently doing nothing.
    pub fn trim(&mut self) -> Result<()> {
        Err(StoreError::TrimUnimplemented)
    }

    /// Persist every cached value whose in-place mutations diverged from
    /// its last committed version.
    ///
    /// Divergence is detected by comparing encodings, so value types must
    /// encode deterministically (prefer `BTreeMap` over `HashMap` inside
    /// cached values). Unchanged entries commit nothing: flushing twice in
    /// a row appends no second version.
    pub fn flush(&mut self) -> Result<()> {
        self.commit_divergent()
    }

    /// Flush a single key's cached value.
    ///
    /// Fails with [`StoreError::MissingKey`] when no live handle exists for
    /// `key` (none was handed out, or it has been invalidated since).
    pub fn flush_key(&mut self, key: &K) -> Result<()> {
        let raw = self.user_key(key)?;
        if let Some(encoded) = self.cache.get_mut().divergent_one(&raw)? {
            self.index.append(&raw, &encoded)?;
            self.cache.get_mut().mark_committed(&raw, encoded);
        }
        Ok(())
    }

    /// Flush and tear the store down, surfacing any flush error.
    ///
    /// Dropping the store flushes too, but can only log failures; use
    /// `close` when the caller needs to observe them.
    pub fn close(mut self) -> Result<()> {
        // Drop flushes again afterwards and finds every entry clean.
        self.commit_divergent()
    }
}

impl<K, V: Serialize> HistoryStore<K, V> {
    fn commit_divergent(&mut self) -> Result<()> {
        let divergent = self.cache.get_mut().divergent()?;
        let committed = divergent.len();
        for (raw, encoded) in divergent {
            self.index.append(&raw, &encoded)?;
            self.cache.get_mut().mark_committed(&raw, encoded);
        }
        if committed > 0 {
            debug!(committed, "flushed divergent cache entries");
        }
        Ok(())
    }
}

impl<K, V: Serialize> Drop for HistoryStore<K, V> {
    fn drop(&mut self) {
        if let Err(e) = self.commit_divergent() {
            error!(error = %e, "failed to flush write-back cache on teardown");
        }
    }
}

impl<K, V: Serialize> fmt::Debug for HistoryStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("keys", &self.index.len())
            .finish_non_exhaustive()
    }
}
