// std imports
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// 3rd party imports
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

// internal imports
use crate::errors::store_error::StoreError;
use crate::progress::ProgressSink;
use crate::storage::object_store::ObjectStore;
use crate::storage::objects_cache::{EvictedEntry, ObjectsCache};

/// Tree sled creates on its own, hidden from `table_names`
const SLED_DEFAULT_TREE: &[u8] = b"__sled__default";

/// [`ObjectStore`] on top of a sled database, one tree per table and
/// bincode for the values. The database lives in `<folder>/<name>`.
/// Reads and writes go through the shared cache, dirty entries pushed
/// out of it are written back to their tree.
///
pub struct SledObjectStore {
    /// Database name, namespaces this store's entries in the shared cache
    name: String,
    db: Option<sled::Db>,
    /// Trees this connection has opened so far
    trees: RwLock<HashMap<String, sled::Tree>>,
    cache: Arc<ObjectsCache>,
}

impl SledObjectStore {
    /// Returns the database name
    ///
    pub fn database_name(&self) -> &str {
        &self.name
    }

    fn db(&self, when: &'static str) -> Result<&sled::Db, StoreError> {
        self.db.as_ref().ok_or(StoreError::NotConnected(when))
    }

    fn read_trees(
        &self,
        when: &'static str,
    ) -> Result<RwLockReadGuard<'_, HashMap<String, sled::Tree>>, StoreError> {
        self.trees
            .read()
            .map_err(|_| StoreError::Interrupted(format!("locking the tree map for {}", when)))
    }

    fn write_trees(
        &self,
        when: &'static str,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, sled::Tree>>, StoreError> {
        self.trees
            .write()
            .map_err(|_| StoreError::Interrupted(format!("locking the tree map for {}", when)))
    }

    fn tree_exists(db: &sled::Db, table: &str) -> bool {
        db.tree_names()
            .iter()
            .any(|name| name.as_ref() == table.as_bytes())
    }

    /// Hands out the tree of a table without ever creating it. `None`
    /// when the table was never created.
    ///
    fn tree(&self, table: &str, when: &'static str) -> Result<Option<sled::Tree>, StoreError> {
        if let Some(tree) = self.read_trees(when)?.get(table) {
            return Ok(Some(tree.clone()));
        }
        let db = self.db(when)?;
        if !Self::tree_exists(db, table) {
            return Ok(None);
        }
        let tree = db.open_tree(table).map_err(|err| StoreError::Io {
            operation: "opening",
            table: table.to_string(),
            key: None,
            source: err,
        })?;
        self.write_trees(when)?
            .insert(table.to_string(), tree.clone());
        Ok(Some(tree))
    }

    fn serialize_value<T: Serialize>(
        table: &str,
        key: &str,
        object: &T,
    ) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(object).map_err(|err| StoreError::Serialization {
            table: table.to_string(),
            key: key.to_string(),
            source: err,
        })
    }

    fn deserialize_value<T: DeserializeOwned>(
        table: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<T, StoreError> {
        bincode::deserialize(bytes).map_err(|err| StoreError::Serialization {
            table: table.to_string(),
            key: key.to_string(),
            source: err,
        })
    }

    /// Persists dirty cache entries which were evicted to make room
    ///
    fn write_back(&self, evicted: Vec<EvictedEntry>) -> Result<(), StoreError> {
        if evicted.is_empty() {
            return Ok(());
        }
        let db = self.db("writing back evicted values")?;
        for entry in evicted {
            Self::write_back_entry(db, entry)?;
        }
        Ok(())
    }

    fn write_back_entry(db: &sled::Db, entry: EvictedEntry) -> Result<(), StoreError> {
        let EvictedEntry { table, key, bytes } = entry;
        let tree = db.open_tree(&table).map_err(|err| StoreError::Io {
            operation: "writing back",
            table: table.clone(),
            key: Some(key.clone()),
            source: err,
        })?;
        tree.insert(key.as_bytes(), bytes)
            .map_err(|err| StoreError::Io {
                operation: "writing back",
                table,
                key: Some(key),
                source: err,
            })?;
        Ok(())
    }
}

impl ObjectStore for SledObjectStore {
    fn connect(
        folder: &Path,
        name: &str,
        delete_old: bool,
        cache: Arc<ObjectsCache>,
    ) -> Result<Self, StoreError> {
        let mut store = Self {
            name: String::new(),
            db: None,
            trees: RwLock::new(HashMap::new()),
            cache: cache.clone(),
        };
        store.establish_connection(folder, name, delete_old, cache)?;
        Ok(store)
    }

    fn establish_connection(
        &mut self,
        folder: &Path,
        name: &str,
        delete_old: bool,
        cache: Arc<ObjectsCache>,
    ) -> Result<(), StoreError> {
        if self.is_connection_active() {
            self.close()?;
        }
        let path = folder.join(name);
        if delete_old && path.exists() {
            fs::remove_dir_all(&path).map_err(|err| StoreError::Connection {
                operation: "wiping",
                database: name.to_string(),
                source: sled::Error::from(err),
            })?;
        }
        let db = sled::open(&path).map_err(|err| StoreError::Connection {
            operation: "opening",
            database: name.to_string(),
            source: err,
        })?;
        debug!("opened database `{}` at `{}`", name, path.display());
        self.name = name.to_string();
        self.db = Some(db);
        self.cache = cache;
        self.trees = RwLock::new(HashMap::new());
        Ok(())
    }

    fn is_connection_active(&self) -> bool {
        self.db.is_some()
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let db = match self.db.take() {
            Some(db) => db,
            None => return Ok(()),
        };
        for entry in self.cache.purge_database(&self.name)? {
            Self::write_back_entry(&db, entry)?;
        }
        db.flush().map_err(|err| StoreError::Connection {
            operation: "flushing",
            database: self.name.clone(),
            source: err,
        })?;
        // a poisoned map still has to be emptied so the tree handles drop
        let mut trees = match self.trees.write() {
            Ok(trees) => trees,
            Err(poisoned) => poisoned.into_inner(),
        };
        trees.clear();
        debug!("closed database `{}`", self.name);
        Ok(())
    }

    fn add_table(&self, table: &str) -> Result<(), StoreError> {
        if self.read_trees("creating a table")?.contains_key(table) {
            return Ok(());
        }
        let db = self.db("creating a table")?;
        let tree = db.open_tree(table).map_err(|err| StoreError::Io {
            operation: "creating",
            table: table.to_string(),
            key: None,
            source: err,
        })?;
        self.write_trees("creating a table")?
            .insert(table.to_string(), tree);
        Ok(())
    }

    fn has_table(&self, table: &str) -> Result<bool, StoreError> {
        if self.read_trees("checking a table")?.contains_key(table) {
            return Ok(true);
        }
        Ok(Self::tree_exists(self.db("checking a table")?, table))
    }

    fn table_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .db("listing tables")?
            .tree_names()
            .iter()
            .filter(|name| name.as_ref() != SLED_DEFAULT_TREE)
            .map(|name| String::from_utf8_lossy(name).to_string())
            .collect())
    }

    fn insert_object<T: Serialize>(
        &self,
        table: &str,
        key: &str,
        object: &T,
        cache_it: bool,
    ) -> Result<(), StoreError> {
        let bytes = Self::serialize_value(table, key, object)?;
        let tree = self
            .tree(table, "inserting an object")?
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let cached_bytes = if cache_it { Some(bytes.clone()) } else { None };
        tree.insert(key.as_bytes(), bytes)
            .map_err(|err| StoreError::Io {
                operation: "inserting",
                table: table.to_string(),
                key: Some(key.to_string()),
                source: err,
            })?;
        if let Some(bytes) = cached_bytes {
            let evicted = self.cache.insert(&self.name, table, key, bytes)?;
            self.write_back(evicted)?;
        }
        Ok(())
    }

    fn update_object<T: Serialize>(
        &self,
        table: &str,
        key: &str,
        object: &T,
    ) -> Result<(), StoreError> {
        let bytes = Self::serialize_value(table, key, object)?;
        // cache resident keys take the deferred path, the engine sees the
        // new value on eviction or close
        if let Some(evicted) = self.cache.update(&self.name, table, key, bytes.clone())? {
            self.write_back(evicted)?;
            return Ok(());
        }
        let tree = self
            .tree(table, "updating an object")?
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let present = tree
            .contains_key(key.as_bytes())
            .map_err(|err| StoreError::Io {
                operation: "updating",
                table: table.to_string(),
                key: Some(key.to_string()),
                source: err,
            })?;
        if !present {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                key: key.to_string(),
            });
        }
        tree.insert(key.as_bytes(), bytes)
            .map_err(|err| StoreError::Io {
                operation: "updating",
                table: table.to_string(),
                key: Some(key.to_string()),
                source: err,
            })?;
        Ok(())
    }

    fn retrieve_object<T: DeserializeOwned>(
        &self,
        table: &str,
        key: &str,
        use_db: bool,
    ) -> Result<Option<T>, StoreError> {
        if let Some(bytes) = self.cache.get(&self.name, table, key)? {
            return Ok(Some(Self::deserialize_value(table, key, &bytes)?));
        }
        if !use_db {
            return Ok(None);
        }
        let tree = match self.tree(table, "retrieving an object")? {
            Some(tree) => tree,
            None => return Ok(None),
        };
        let stored = tree.get(key.as_bytes()).map_err(|err| StoreError::Io {
            operation: "retrieving",
            table: table.to_string(),
            key: Some(key.to_string()),
            source: err,
        })?;
        match stored {
            Some(bytes) => {
                let object = Self::deserialize_value(table, key, &bytes)?;
                let evicted = self.cache.insert(&self.name, table, key, bytes.to_vec())?;
                self.write_back(evicted)?;
                Ok(Some(object))
            }
            None => Ok(None),
        }
    }

    fn delete_object(&self, table: &str, key: &str) -> Result<bool, StoreError> {
        self.cache.remove(&self.name, table, key)?;
        let tree = self
            .tree(table, "deleting an object")?
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let removed = tree.remove(key.as_bytes()).map_err(|err| StoreError::Io {
            operation: "deleting",
            table: table.to_string(),
            key: Some(key.to_string()),
            source: err,
        })?;
        Ok(removed.is_some())
    }

    fn in_db(&self, table: &str, key: &str, use_cache: bool) -> Result<bool, StoreError> {
        if use_cache && self.cache.contains(&self.name, table, key)? {
            return Ok(true);
        }
        let tree = match self.tree(table, "checking a key")? {
            Some(tree) => tree,
            None => return Ok(false),
        };
        tree.contains_key(key.as_bytes())
            .map_err(|err| StoreError::Io {
                operation: "checking",
                table: table.to_string(),
                key: Some(key.to_string()),
                source: err,
            })
    }

    fn load_objects(
        &self,
        table: &str,
        keys: Option<&[String]>,
        progress: Option<&ProgressSink>,
    ) -> Result<usize, StoreError> {
        let tree = self
            .tree(table, "loading objects")?
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let mut loaded = 0;
        match keys {
            Some(keys) => {
                for key in keys {
                    // resident keys may carry newer dirty bytes than the engine
                    if !self.cache.contains(&self.name, table, key)? {
                        let stored = tree.get(key.as_bytes()).map_err(|err| StoreError::Io {
                            operation: "loading",
                            table: table.to_string(),
                            key: Some(key.clone()),
                            source: err,
                        })?;
                        if let Some(bytes) = stored {
                            let evicted =
                                self.cache.insert(&self.name, table, key, bytes.to_vec())?;
                            self.write_back(evicted)?;
                            loaded += 1;
                        }
                    }
                    if let Some(progress) = progress {
                        progress.increment();
                    }
                }
            }
            None => {
                for item in tree.iter() {
                    let (key_bytes, bytes) = item.map_err(|err| StoreError::Io {
                        operation: "loading",
                        table: table.to_string(),
                        key: None,
                        source: err,
                    })?;
                    let key = String::from_utf8_lossy(&key_bytes).to_string();
                    if !self.cache.contains(&self.name, table, &key)? {
                        let evicted = self.cache.insert(&self.name, table, &key, bytes.to_vec())?;
                        self.write_back(evicted)?;
                        loaded += 1;
                    }
                    if let Some(progress) = progress {
                        progress.increment();
                    }
                }
            }
        }
        trace!("loaded {} objects from table `{}`", loaded, table);
        Ok(loaded)
    }
}

impl Drop for SledObjectStore {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("error while closing object store `{}`: {}", self.name, err);
        }
    }
}
