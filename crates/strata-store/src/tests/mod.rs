//! Tests for the versioned store.

mod facade_tests;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::HistoryStore;

/// Fresh volatile store for tests.
fn test_store<K, V>() -> HistoryStore<K, V>
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    HistoryStore::open_in_memory().expect("open in-memory store")
}

fn s(text: &str) -> String {
    text.to_string()
}
