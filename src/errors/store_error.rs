// 3rd party imports
use thiserror::Error;

/// Errors of the object store, the shared cache and the identification
/// database built on top of them.
///
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failure in the storage engine itself.
    /// `key` is `None` for whole-table operations.
    ///
    #[error("[ObjectStore] I/O error when {operation} on table `{table}`, key `{}`:\n\t{source}", .key.as_deref().unwrap_or("-"))]
    Io {
        operation: &'static str,
        table: String,
        key: Option<String>,
        #[source]
        source: sled::Error,
    },

    /// Failure while opening, wiping or flushing a whole database
    ///
    #[error("[ObjectStore] error when {operation} database `{database}`:\n\t{source}")]
    Connection {
        operation: &'static str,
        database: String,
        #[source]
        source: sled::Error,
    },

    /// Operation before `establish_connection` or after `close`
    ///
    #[error("[ObjectStore] no open connection when {0}")]
    NotConnected(&'static str),

    /// Write against a table which was never created
    ///
    #[error("[ObjectStore] table `{0}` was never created")]
    UnknownTable(String),

    /// Update against a key with nothing to overwrite
    ///
    #[error("[ObjectStore] nothing stored under key `{key}` in table `{table}`")]
    NotFound { table: String, key: String },

    /// A blocking wait could not complete because a cooperating thread
    /// panicked while holding a lock
    ///
    #[error("[ObjectStore] wait interrupted while {0}")]
    Interrupted(String),

    /// Value could not be encoded, or the stored bytes could not be
    /// decoded into the requested type
    ///
    #[error("[ObjectStore] unable to (de)serialize value for key `{key}` in table `{table}`:\n\t{source}")]
    Serialization {
        table: String,
        key: String,
        #[source]
        source: bincode::Error,
    },

    /// Spectrum match key without a file/title separator
    ///
    #[error("[IdentificationDb] spectrum key `{0}` has no file/title separator")]
    InvalidSpectrumKey(String),
}
