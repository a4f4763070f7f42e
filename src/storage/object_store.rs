// std imports
use std::path::Path;
use std::sync::Arc;

// 3rd party imports
use serde::de::DeserializeOwned;
use serde::Serialize;

// internal imports
use crate::errors::store_error::StoreError;
use crate::progress::ProgressSink;
use crate::storage::objects_cache::ObjectsCache;

/// Key/value storage engine behind the identification database. Tables
/// hold serialized identification objects under string keys. Implementors
/// route reads and writes through a shared [`ObjectsCache`] and are safe
/// to share between threads.
///
pub trait ObjectStore: Send + Sync {
    /// Opens a store for the database `<folder>/<name>`
    ///
    /// # Arguments
    /// * `folder` - Parent folder for project databases
    /// * `name` - Database name within the folder
    /// * `delete_old` - When true, wipes any existing database of that name first
    /// * `cache` - Shared object cache
    ///
    fn connect(
        folder: &Path,
        name: &str,
        delete_old: bool,
        cache: Arc<ObjectsCache>,
    ) -> Result<Self, StoreError>
    where
        Self: Sized;

    /// Connects an existing store instance to a database, closing any
    /// connection it currently holds
    ///
    /// # Arguments
    /// * `folder` - Parent folder for project databases
    /// * `name` - Database name within the folder
    /// * `delete_old` - When true, wipes any existing database of that name first
    /// * `cache` - Shared object cache
    ///
    fn establish_connection(
        &mut self,
        folder: &Path,
        name: &str,
        delete_old: bool,
        cache: Arc<ObjectsCache>,
    ) -> Result<(), StoreError>;

    /// Checks whether the store currently holds an open connection
    ///
    fn is_connection_active(&self) -> bool;

    /// Writes the dirty cache entries of this database back, flushes the
    /// engine and releases the connection. Idempotent.
    ///
    fn close(&mut self) -> Result<(), StoreError>;

    /// Creates a table. Existing tables are left untouched.
    ///
    /// # Arguments
    /// * `table` - Table name
    ///
    fn add_table(&self, table: &str) -> Result<(), StoreError>;

    /// Checks whether a table was created by this or an earlier connection
    ///
    /// # Arguments
    /// * `table` - Table name
    ///
    fn has_table(&self, table: &str) -> Result<bool, StoreError>;

    /// Lists the persisted table names
    ///
    fn table_names(&self) -> Result<Vec<String>, StoreError>;

    /// Serializes and upserts an object, writing through to the engine.
    /// With `cache_it` the serialized bytes additionally stay in the
    /// cache as clean.
    ///
    /// # Arguments
    /// * `table` - Table name, must have been created
    /// * `key` - Object key
    /// * `object` - Object to persist
    /// * `cache_it` - Whether to keep the bytes cached
    ///
    fn insert_object<T: Serialize>(
        &self,
        table: &str,
        key: &str,
        object: &T,
        cache_it: bool,
    ) -> Result<(), StoreError>;

    /// Overwrites an already stored object. When the key is cache resident
    /// the new bytes only go to the cache, marked dirty, and reach the
    /// engine on eviction or close. Otherwise the engine is checked for
    /// the key, [`StoreError::NotFound`] when there is nothing to
    /// overwrite.
    ///
    /// # Arguments
    /// * `table` - Table name, must have been created
    /// * `key` - Object key
    /// * `object` - New state of the object
    ///
    fn update_object<T: Serialize>(
        &self,
        table: &str,
        key: &str,
        object: &T,
    ) -> Result<(), StoreError>;

    /// Fetches and deserializes an object. With `use_db` false only the
    /// cache is consulted. Engine hits are cached as clean on the way
    /// out. `Ok(None)` when neither cache nor engine (nor the table)
    /// know the key.
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `key` - Object key
    /// * `use_db` - Whether to fall through to the engine on a cache miss
    ///
    fn retrieve_object<T: DeserializeOwned>(
        &self,
        table: &str,
        key: &str,
        use_db: bool,
    ) -> Result<Option<T>, StoreError>;

    /// Removes an object from cache and engine. Returns whether the
    /// engine actually held the key. [`StoreError::UnknownTable`] when
    /// the table was never created.
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `key` - Object key
    ///
    fn delete_object(&self, table: &str, key: &str) -> Result<bool, StoreError>;

    /// Checks whether a key exists, consulting the cache first when
    /// `use_cache` is set. Missing tables count as absent.
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `key` - Object key
    /// * `use_cache` - Whether cache residency counts
    ///
    fn in_db(&self, table: &str, key: &str, use_cache: bool) -> Result<bool, StoreError>;

    /// Warms the cache with stored objects, as clean entries. With `keys`
    /// only those keys are fetched, otherwise the whole table is read.
    /// Keys already resident are left untouched, their cached bytes may
    /// be newer than the persisted ones. The progress sink is incremented
    /// once per processed key. Returns the number of objects put into
    /// the cache, [`StoreError::UnknownTable`] when the table was never
    /// created.
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `keys` - Keys to fetch, `None` for the whole table
    /// * `progress` - Sink for progress reporting
    ///
    fn load_objects(
        &self,
        table: &str,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError>;
}
