//! Stable keys for array items.
//!
//! A renderer needs a key per element that survives moves and removals but
//! changes when the whole array is replaced. [`TrackedArray`] carries an
//! identity handle; [`KeyedArray`] hands out keys from a counter that never
//! goes backwards and rebuilds them whenever it sees a different handle.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Array items plus an identity handle.
///
/// Cloning yields a new identity, like replacing the array with a copy.
#[derive(Debug)]
pub struct TrackedArray {
    handle: u64,
    items: Vec<Value>,
}

impl TrackedArray {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            handle: next_handle(),
            items,
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

impl Clone for TrackedArray {
    fn clone(&self) -> Self {
        Self::new(self.items.clone())
    }
}

impl From<Vec<Value>> for TrackedArray {
    fn from(items: Vec<Value>) -> Self {
        Self::new(items)
    }
}

/// Per-element keys of a [`TrackedArray`].
#[derive(Debug, Default)]
pub struct KeyedArray {
    keys: Vec<u64>,
    /// Last key handed out; `None` before the first one.
    last_key: Option<u64>,
    last_seen: Option<u64>,
}

impl KeyedArray {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&mut self) -> u64 {
        let key = self.last_key.map_or(0, |k| k + 1);
        self.last_key = Some(key);
        key
    }

    /// Keys for `array`, rebuilt when its identity differs from the last one
    /// seen. Observing `None` keeps the cached keys.
    pub fn observe(&mut self, array: Option<&TrackedArray>) -> &[u64] {
        if let Some(array) = array
            && self.last_seen != Some(array.handle)
        {
            trace!(
                "keyed array: new identity {} with {} items",
                array.handle,
                array.len()
            );
            self.last_seen = Some(array.handle);
            self.keys = (0..array.len()).map(|_| self.next_key()).collect();
        }
        &self.keys
    }

    /// Key of the element at `index`, `None` when out of range.
    pub fn key(&self, index: usize) -> Option<u64> {
        self.keys.get(index).copied()
    }

    pub fn push(&mut self, array: &mut TrackedArray, value: Value) {
        self.observe(Some(array));
        let key = self.next_key();
        self.keys.push(key);
        array.items.push(value);
    }

    /// Swap two elements. Out of range indices leave both sides untouched.
    pub fn swap(&mut self, array: &mut TrackedArray, a: usize, b: usize) {
        self.observe(Some(array));
        if a >= array.len() || b >= array.len() {
            return;
        }
        self.keys.swap(a, b);
        array.items.swap(a, b);
    }

    /// Insert `value` at `index`, clamped to the array length.
    pub fn insert(&mut self, array: &mut TrackedArray, index: usize, value: Value) {
        self.observe(Some(array));
        let index = index.min(array.len());
        let key = self.next_key();
        self.keys.insert(index, key);
        array.items.insert(index, value);
    }

    /// Remove the element at `index`, returning it.
    pub fn remove(&mut self, array: &mut TrackedArray, index: usize) -> Option<Value> {
        self.observe(Some(array));
        if index >= array.len() {
            return None;
        }
        self.keys.remove(index);
        Some(array.items.remove(index))
    }
}
