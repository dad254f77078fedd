//! Cache Store Module
//!
//! Key-value store seam plus the open/closed handle the cache core reads
//! through. The store engine itself is owned elsewhere; `MemoryStore` is the
//! in-process implementation used by the server and tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::StoreError;

// == Key-Value Store ==
/// Blocking per-key store with atomic get and put.
pub trait KeyValueStore: Send + Sync {
    /// Fetches the raw bytes stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, replacing any existing value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}

// == Memory Store ==
/// In-memory store backed by a `HashMap` behind an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty MemoryStore.
    pub fn new() -> Self {
        Self::default()
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or_default()
    }

    // == Is Empty ==
    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Io("store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Io("store lock poisoned".to_string()))?;
        entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

// == Store Handle ==
/// Shared slot holding the store while it is open.
///
/// Opening and closing happen outside the cache core; readers and the merger
/// only ask for the current store and treat `None` as not ready.
#[derive(Default, Clone)]
pub struct StoreHandle {
    slot: Arc<RwLock<Option<Arc<dyn KeyValueStore>>>>,
}

impl StoreHandle {
    /// Creates a handle with no store attached.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Creates a handle already holding `store`.
    pub fn open_with(store: Arc<dyn KeyValueStore>) -> Self {
        let handle = Self::closed();
        handle.open(store);
        handle
    }

    /// Attaches a store, replacing any previous one.
    pub fn open(&self, store: Arc<dyn KeyValueStore>) {
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(store);
    }

    /// Detaches the store. Later reads see `Unavailable`.
    pub fn close(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        *slot = None;
    }

    /// Returns the open store, if any.
    pub fn current(&self) -> Option<Arc<dyn KeyValueStore>> {
        self.slot
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Whether a store is attached.
    pub fn is_open(&self) -> bool {
        self.current().is_some()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("open", &self.is_open())
            .finish()
    }
}
