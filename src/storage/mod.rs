/// Database routing matches and parameters to their tables
pub mod identification_db;
/// Trait for key value engines backing the identification database
pub mod object_store;
/// Shared in memory cache with write back on eviction
pub mod objects_cache;
/// Object store implementation on sled
pub mod sled_object_store;
/// Table naming and classification
pub mod table_names;
