//! Tests for the map-like public surface and key-space rules.

use super::{s, test_store};
use crate::{StoreError, RESERVED_KEY};

#[test]
fn test_insert_get_roundtrip() {
    let mut store = test_store::<String, String>();
    store.insert(&s("plot"), &s("long island")).unwrap();

    assert_eq!(*store.get(&s("plot")).unwrap().borrow(), "long island");
}

#[test]
fn test_get_missing_key_fails() {
    let store = test_store::<String, String>();
    assert!(matches!(
        store.get(&s("aardvark")),
        Err(StoreError::MissingKey)
    ));
}

#[test]
fn test_get_or_returns_default_for_missing_key() {
    let store = test_store::<String, String>();
    let value = store.get_or(&s("b"), s("aardvark")).unwrap();
    assert_eq!(*value.borrow(), "aardvark");
}

#[test]
fn test_get_or_prefers_stored_value() {
    let mut store = test_store::<String, String>();
    store.insert(&s("b"), &s("bee")).unwrap();

    let value = store.get_or(&s("b"), s("aardvark")).unwrap();
    assert_eq!(*value.borrow(), "bee");
}

#[test]
fn test_contains_key() {
    let mut store = test_store::<String, u32>();
    assert!(!store.contains_key(&s("a")).unwrap());

    store.insert(&s("a"), &123).unwrap();
    assert!(store.contains_key(&s("a")).unwrap());

    store.remove(&s("a")).unwrap();
    assert!(!store.contains_key(&s("a")).unwrap());
}

#[test]
fn test_integer_keys() {
    let mut store = test_store::<i64, String>();
    store.insert(&123, &s("aardvark")).unwrap();
    assert_eq!(*store.get(&123).unwrap().borrow(), "aardvark");
}

#[test]
fn test_remove_missing_key_fails() {
    let mut store = test_store::<String, u32>();
    assert!(matches!(
        store.remove(&s("aardvark")),
        Err(StoreError::MissingKey)
    ));
}

#[test]
fn test_len_counts_keys_not_versions() {
    let mut store = test_store::<String, String>();
    for key in ["a", "b", "c", "d"] {
        store.insert(&s(key), &s(key)).unwrap();
    }
    // Extra versions do not change the key count.
    store.insert(&s("a"), &s("again")).unwrap();

    assert_eq!(store.len(), 4);
    assert!(!store.is_empty());
}

#[test]
fn test_items_yield_current_pairs() {
    let mut store = test_store::<String, String>();
    for key in ["a", "b", "c", "d"] {
        store.insert(&s(key), &s(key)).unwrap();
    }

    let mut seen = 0;
    for item in store.items() {
        let (key, value) = item.unwrap();
        assert_eq!(key, value);
        seen += 1;
    }
    assert_eq!(seen, store.len());
}

#[test]
fn test_keys_iteration_is_restartable() {
    let mut store = test_store::<String, u32>();
    store.insert(&s("a"), &1).unwrap();
    store.insert(&s("b"), &2).unwrap();

    let first: Vec<String> = store.keys().collect::<Result<_, _>>().unwrap();
    let second: Vec<String> = store.keys().collect::<Result<_, _>>().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, vec!["a", "b"]);
}

#[test]
fn test_reserved_key_get_fails() {
    let store = test_store::<String, String>();
    assert!(matches!(
        store.get(&RESERVED_KEY.to_string()),
        Err(StoreError::ReservedKey)
    ));
}

#[test]
fn test_reserved_key_insert_fails() {
    let mut store = test_store::<String, String>();
    assert!(matches!(
        store.insert(&RESERVED_KEY.to_string(), &s("aardvark")),
        Err(StoreError::ReservedKey)
    ));
}

#[test]
fn test_reserved_key_remove_fails() {
    let mut store = test_store::<String, String>();
    assert!(matches!(
        store.remove(&RESERVED_KEY.to_string()),
        Err(StoreError::ReservedKey)
    ));
}

#[test]
fn test_reserved_key_never_contained() {
    let store = test_store::<String, String>();
    assert!(!store.contains_key(&RESERVED_KEY.to_string()).unwrap());
}

#[test]
fn test_trim_always_fails() {
    let mut store = test_store::<String, String>();
    assert!(matches!(
        store.trim(),
        Err(StoreError::TrimUnimplemented)
    ));
}

#[test]
fn test_debug_does_not_touch_values() {
    let mut store = test_store::<String, String>();
    store.insert(&s("foo"), &s("bar")).unwrap();
    store.insert(&s("spam"), &s("spam spam spam")).unwrap();

    let repr = format!("{store:?}");
    assert!(repr.contains("HistoryStore"));
    assert!(repr.contains("keys: 2"));
}
