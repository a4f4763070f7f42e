/// Error of the object store, cache and identification database
pub mod store_error;
