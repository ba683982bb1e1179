//! Keyed curve storage seen by the remapper.
//!
//! Stores only offer read and write/delete by key. There is no rename primitive;
//! the engine relocates data with reads, deletes and writes.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

use crate::error::StoreError;
use crate::key::{BindingKey, CapturedSet};

/// Trait implemented by anything holding curves addressed by BindingKey.
/// Adapters (clip files, wasm hosts) implement this and hand it to the engine.
pub trait CurveStore {
    /// Curve payload. The engine never inspects it, only moves it.
    type Value: Clone + fmt::Debug;

    fn get(&self, key: &BindingKey) -> Option<Self::Value>;

    /// Write `value` at `key`; `None` deletes the key.
    fn set(&mut self, key: &BindingKey, value: Option<Self::Value>) -> Result<(), StoreError>;

    fn delete(&mut self, key: &BindingKey) -> Result<(), StoreError> {
        self.set(key, None)
    }

    fn contains(&self, key: &BindingKey) -> bool {
        self.get(key).is_some()
    }
}

/// Ordered in-memory store. Re-setting an existing key keeps its position; deleting
/// a key keeps the order of the rest.
#[derive(Clone, Debug)]
pub struct MemoryStore<V> {
    rows: IndexMap<BindingKey, V>,
    read_only: HashSet<BindingKey>,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            rows: IndexMap::new(),
            read_only: HashSet::new(),
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a row, bypassing read-only checks.
    pub fn insert(&mut self, key: BindingKey, value: V) {
        self.rows.insert(key, value);
    }

    /// Mark a key as rejecting every write and delete.
    pub fn lock(&mut self, key: BindingKey) {
        self.read_only.insert(key);
    }

    pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.rows.keys()
    }

    /// Snapshot the current key order.
    pub fn bindings(&self) -> CapturedSet {
        self.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<V: Clone> FromIterator<(BindingKey, V)> for MemoryStore<V> {
    fn from_iter<I: IntoIterator<Item = (BindingKey, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (k, v) in iter {
            store.insert(k, v);
        }
        store
    }
}

impl<V: Clone + fmt::Debug> CurveStore for MemoryStore<V> {
    type Value = V;

    fn get(&self, key: &BindingKey) -> Option<V> {
        self.rows.get(key).cloned()
    }

    fn set(&mut self, key: &BindingKey, value: Option<V>) -> Result<(), StoreError> {
        if self.read_only.contains(key) {
            return Err(StoreError::Rejected {
                key: key.clone(),
                reason: "binding is read-only".into(),
            });
        }
        match value {
            Some(v) => self.insert(key.clone(), v),
            None => {
                self.rows.shift_remove(key);
            }
        }
        Ok(())
    }

    fn contains(&self, key: &BindingKey) -> bool {
        self.rows.contains_key(key)
    }
}
