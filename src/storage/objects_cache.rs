// std imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// internal imports
use crate::configuration::CacheConfiguration;
use crate::errors::store_error::StoreError;

/// Identity of a cached value. The database name is part of the key so
/// multiple stores can share one cache without mixing up their tables.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    database: String,
    table: String,
    key: String,
}

impl EntryKey {
    fn new(database: &str, table: &str, key: &str) -> Self {
        Self {
            database: database.to_string(),
            table: table.to_string(),
            key: key.to_string(),
        }
    }
}

/// Serialized value plus its bookkeeping
///
struct CacheEntry {
    bytes: Vec<u8>,
    /// Set when the cached bytes are newer than the persisted ones
    dirty: bool,
    /// Recency tick, larger means used later
    last_used: u64,
}

/// Dirty entry pushed out of the cache. The owning store has to write
/// it back to its table before dropping it.
///
#[derive(Debug)]
pub struct EvictedEntry {
    pub table: String,
    pub key: String,
    pub bytes: Vec<u8>,
}

/// Entry map plus the running byte total
///
struct CacheState {
    entries: HashMap<EntryKey, CacheEntry>,
    used_bytes: usize,
}

/// Shared cache for serialized identification objects, keyed by database,
/// table and object key. Keeps entries within a byte budget by evicting
/// the least recently used ones. Evicted and purged dirty entries are
/// handed back to the calling store, the cache itself never touches the
/// storage engine.
///
pub struct ObjectsCache {
    state: RwLock<CacheState>,
    /// Source of recency ticks
    tick: AtomicU64,
    capacity_bytes: usize,
}

impl ObjectsCache {
    /// Creates a new empty cache
    ///
    /// # Arguments
    /// * `configuration` - Cache sizing
    ///
    pub fn new(configuration: &CacheConfiguration) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                used_bytes: 0,
            }),
            tick: AtomicU64::new(0),
            capacity_bytes: configuration.capacity_bytes,
        }
    }

    /// Returns the byte budget
    ///
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Caches a value as clean, assuming the caller already persisted it.
    /// Values larger than the whole budget bypass the cache. Returns the
    /// dirty entries of `database` which were evicted to make room.
    ///
    /// # Arguments
    /// * `database` - Name of the owning database
    /// * `table` - Table name
    /// * `key` - Object key
    /// * `bytes` - Serialized value
    ///
    pub fn insert(
        &self,
        database: &str,
        table: &str,
        key: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<EvictedEntry>, StoreError> {
        if bytes.len() > self.capacity_bytes {
            return Ok(Vec::new());
        }
        let mut guard = self.lock_write("insert")?;
        let state = &mut *guard;
        let added = bytes.len();
        let entry = CacheEntry {
            bytes,
            dirty: false,
            last_used: self.tick.fetch_add(1, Ordering::Relaxed),
        };
        state.used_bytes += added;
        if let Some(previous) = state
            .entries
            .insert(EntryKey::new(database, table, key), entry)
        {
            state.used_bytes -= previous.bytes.len();
        }
        Ok(Self::evict(state, database, self.capacity_bytes))
    }

    /// Overwrites a cached value and marks it dirty, deferring the write
    /// to the storage engine. Returns `None` when the key is not resident,
    /// the caller has to go through the engine then. Values grown beyond
    /// the whole budget drop the stale entry and return `None` as well.
    ///
    /// # Arguments
    /// * `database` - Name of the owning database
    /// * `table` - Table name
    /// * `key` - Object key
    /// * `bytes` - Serialized value
    ///
    pub fn update(
        &self,
        database: &str,
        table: &str,
        key: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<Vec<EvictedEntry>>, StoreError> {
        let mut guard = self.lock_write("update")?;
        let state = &mut *guard;
        let entry_key = EntryKey::new(database, table, key);
        if !state.entries.contains_key(&entry_key) {
            return Ok(None);
        }
        if bytes.len() > self.capacity_bytes {
            if let Some(previous) = state.entries.remove(&entry_key) {
                state.used_bytes -= previous.bytes.len();
            }
            return Ok(None);
        }
        let last_used = self.tick.fetch_add(1, Ordering::Relaxed);
        if let Some(entry) = state.entries.get_mut(&entry_key) {
            state.used_bytes -= entry.bytes.len();
            state.used_bytes += bytes.len();
            entry.bytes = bytes;
            entry.dirty = true;
            entry.last_used = last_used;
        }
        Ok(Some(Self::evict(state, database, self.capacity_bytes)))
    }

    /// Returns a copy of the cached bytes and refreshes their recency
    ///
    /// # Arguments
    /// * `database` - Name of the owning database
    /// * `table` - Table name
    /// * `key` - Object key
    ///
    pub fn get(
        &self,
        database: &str,
        table: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let mut guard = self.lock_write("get")?;
        match guard.entries.get_mut(&EntryKey::new(database, table, key)) {
            Some(entry) => {
                entry.last_used = self.tick.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.bytes.clone()))
            }
            None => Ok(None),
        }
    }

    /// Checks residency without touching recency
    ///
    /// # Arguments
    /// * `database` - Name of the owning database
    /// * `table` - Table name
    /// * `key` - Object key
    ///
    pub fn contains(&self, database: &str, table: &str, key: &str) -> Result<bool, StoreError> {
        let guard = self.lock_read("contains")?;
        Ok(guard
            .entries
            .contains_key(&EntryKey::new(database, table, key)))
    }

    /// Drops a cached value, returning its bytes. Dirtiness is ignored,
    /// removal means the object is going away entirely.
    ///
    /// # Arguments
    /// * `database` - Name of the owning database
    /// * `table` - Table name
    /// * `key` - Object key
    ///
    pub fn remove(
        &self,
        database: &str,
        table: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let mut guard = self.lock_write("remove")?;
        let state = &mut *guard;
        match state.entries.remove(&EntryKey::new(database, table, key)) {
            Some(entry) => {
                state.used_bytes -= entry.bytes.len();
                Ok(Some(entry.bytes))
            }
            None => Ok(None),
        }
    }

    /// Drops every entry of a database, e.g. when its store closes.
    /// Returns the dirty ones so the store can write them back first.
    ///
    /// # Arguments
    /// * `database` - Name of the owning database
    ///
    pub fn purge_database(&self, database: &str) -> Result<Vec<EvictedEntry>, StoreError> {
        let mut guard = self.lock_write("purge")?;
        let state = &mut *guard;
        let entry_keys: Vec<EntryKey> = state
            .entries
            .keys()
            .filter(|entry_key| entry_key.database == database)
            .cloned()
            .collect();
        let mut purged = Vec::new();
        for entry_key in entry_keys {
            if let Some(entry) = state.entries.remove(&entry_key) {
                state.used_bytes -= entry.bytes.len();
                if entry.dirty {
                    purged.push(EvictedEntry {
                        table: entry_key.table,
                        key: entry_key.key,
                        bytes: entry.bytes,
                    });
                }
            }
        }
        Ok(purged)
    }

    /// Returns the byte total of the resident entries
    ///
    pub fn used_bytes(&self) -> Result<usize, StoreError> {
        Ok(self.lock_read("reading the byte total")?.used_bytes)
    }

    /// Returns the number of resident entries
    ///
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock_read("counting entries")?.entries.len())
    }

    /// Checks whether nothing is resident
    ///
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock_read("counting entries")?.entries.is_empty())
    }

    /// Evicts least recently used entries until the byte total fits the
    /// budget again. Dirty entries of other databases are skipped, their
    /// store writes them back on its own insert or close. Evicted dirty
    /// entries of `database` are collected for write back by the caller.
    ///
    fn evict(state: &mut CacheState, database: &str, capacity_bytes: usize) -> Vec<EvictedEntry> {
        let mut evicted = Vec::new();
        while state.used_bytes > capacity_bytes {
            let candidate = state
                .entries
                .iter()
                .filter(|(entry_key, entry)| !entry.dirty || entry_key.database == database)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(entry_key, _)| entry_key.clone());
            let entry_key = match candidate {
                Some(entry_key) => entry_key,
                None => break,
            };
            if let Some(entry) = state.entries.remove(&entry_key) {
                state.used_bytes -= entry.bytes.len();
                if entry.dirty {
                    evicted.push(EvictedEntry {
                        table: entry_key.table,
                        key: entry_key.key,
                        bytes: entry.bytes,
                    });
                }
            }
        }
        evicted
    }

    fn lock_read(&self, when: &'static str) -> Result<RwLockReadGuard<'_, CacheState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Interrupted(format!("locking the object cache for {}", when)))
    }

    fn lock_write(
        &self,
        when: &'static str,
    ) -> Result<RwLockWriteGuard<'_, CacheState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Interrupted(format!("locking the object cache for {}", when)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_cache(capacity_bytes: usize) -> ObjectsCache {
        ObjectsCache::new(&CacheConfiguration { capacity_bytes })
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let cache = create_cache(1024);
        let evicted = cache
            .insert("project", "proteins", "P68871", vec![1, 2, 3, 4])
            .unwrap();
        assert!(evicted.is_empty());
        assert!(cache.contains("project", "proteins", "P68871").unwrap());

        let result = cache.get("project", "proteins", "P68871").unwrap();
        assert_eq!(result, Some(vec![1, 2, 3, 4]));
        assert_eq!(cache.used_bytes().unwrap(), 4);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_insert_overwrites_and_keeps_the_byte_total_right() {
        let cache = create_cache(1024);
        cache
            .insert("project", "proteins", "P68871", vec![0; 8])
            .unwrap();
        cache
            .insert("project", "proteins", "P68871", vec![9; 2])
            .unwrap();
        assert_eq!(cache.used_bytes().unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(
            cache.get("project", "proteins", "P68871").unwrap(),
            Some(vec![9, 9])
        );
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted_first() {
        let cache = create_cache(8);
        cache.insert("project", "peptides", "k1", vec![0; 4]).unwrap();
        cache.insert("project", "peptides", "k2", vec![0; 4]).unwrap();

        let evicted = cache.insert("project", "peptides", "k3", vec![0; 4]).unwrap();
        // k1 was the oldest and clean, so it is dropped without write back
        assert!(evicted.is_empty());
        assert!(!cache.contains("project", "peptides", "k1").unwrap());
        assert!(cache.contains("project", "peptides", "k2").unwrap());
        assert!(cache.contains("project", "peptides", "k3").unwrap());
        assert_eq!(cache.used_bytes().unwrap(), 8);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = create_cache(8);
        cache.insert("project", "peptides", "k1", vec![0; 4]).unwrap();
        cache.insert("project", "peptides", "k2", vec![0; 4]).unwrap();
        cache.get("project", "peptides", "k1").unwrap();

        cache.insert("project", "peptides", "k3", vec![0; 4]).unwrap();
        assert!(cache.contains("project", "peptides", "k1").unwrap());
        assert!(!cache.contains("project", "peptides", "k2").unwrap());
    }

    #[test]
    fn test_evicted_dirty_entries_are_returned_for_write_back() {
        let cache = create_cache(8);
        cache.insert("project", "peptides", "k1", vec![0; 4]).unwrap();
        let updated = cache
            .update("project", "peptides", "k1", vec![7; 4])
            .unwrap();
        assert!(updated.is_some());
        cache.insert("project", "peptides", "k2", vec![0; 4]).unwrap();

        let evicted = cache.insert("project", "peptides", "k3", vec![0; 4]).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].table, "peptides");
        assert_eq!(evicted[0].key, "k1");
        assert_eq!(evicted[0].bytes, vec![7; 4]);
    }

    #[test]
    fn test_dirty_entries_of_other_databases_are_not_evicted() {
        let cache = create_cache(8);
        cache.insert("project_a", "peptides", "k1", vec![0; 4]).unwrap();
        cache
            .update("project_a", "peptides", "k1", vec![7; 4])
            .unwrap();
        cache.insert("project_b", "peptides", "k2", vec![0; 4]).unwrap();

        let evicted = cache.insert("project_b", "peptides", "k3", vec![0; 4]).unwrap();
        assert!(evicted.is_empty());
        // project_a still holds its dirty entry, project_b lost its clean one
        assert!(cache.contains("project_a", "peptides", "k1").unwrap());
        assert!(!cache.contains("project_b", "peptides", "k2").unwrap());
        assert!(cache.contains("project_b", "peptides", "k3").unwrap());
    }

    #[test]
    fn test_update_misses_when_not_resident() {
        let cache = create_cache(1024);
        let result = cache
            .update("project", "peptides", "unknown", vec![1, 2])
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_oversized_values_bypass_the_cache() {
        let cache = create_cache(8);
        let evicted = cache
            .insert("project", "proteins", "huge", vec![0; 16])
            .unwrap();
        assert!(evicted.is_empty());
        assert!(!cache.contains("project", "proteins", "huge").unwrap());
        assert_eq!(cache.used_bytes().unwrap(), 0);
    }

    #[test]
    fn test_purge_database_returns_only_its_dirty_entries() {
        let cache = create_cache(1024);
        cache.insert("project_a", "peptides", "k1", vec![0; 4]).unwrap();
        cache
            .update("project_a", "peptides", "k1", vec![7; 4])
            .unwrap();
        cache.insert("project_a", "peptides", "k2", vec![0; 4]).unwrap();
        cache.insert("project_b", "peptides", "k3", vec![0; 4]).unwrap();

        let purged = cache.purge_database("project_a").unwrap();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].key, "k1");
        assert_eq!(purged[0].bytes, vec![7; 4]);
        assert_eq!(cache.len().unwrap(), 1);
        assert!(cache.contains("project_b", "peptides", "k3").unwrap());
        assert_eq!(cache.used_bytes().unwrap(), 4);
    }

    #[test]
    fn test_remove_returns_the_bytes() {
        let cache = create_cache(1024);
        cache
            .insert("project", "proteins", "P68871", vec![1, 2, 3])
            .unwrap();
        let removed = cache.remove("project", "proteins", "P68871").unwrap();
        assert_eq!(removed, Some(vec![1, 2, 3]));
        assert!(cache.is_empty().unwrap());
        assert_eq!(cache.used_bytes().unwrap(), 0);
    }
}
