// Include readme in doc
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Readme.md"))]

/// Configuration for the store and its cache
pub mod configuration;
/// Shared constants
pub mod constants;
/// Error types
pub mod errors;
/// Identification matches and their annotations
pub mod matches;
/// Progress reporting and cancellation for long running loads
pub mod progress;
/// Persistent storage for identification matches
pub mod storage;
