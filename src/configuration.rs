// std imports
use std::path::PathBuf;

// internal imports
use crate::constants::DEFAULT_CACHE_CAPACITY_BYTES;

/// Sizing of the shared object cache
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct CacheConfiguration {
    /// Capacity in bytes. Values larger than the whole capacity
    /// bypass the cache and are written through directly.
    pub capacity_bytes: usize,
}

impl CacheConfiguration {
    /// Creates a new default cache configuration
    ///
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for CacheConfiguration {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CACHE_CAPACITY_BYTES,
        }
    }
}

/// Location and cache sizing of an identification database
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct StoreConfiguration {
    /// Parent folder for project databases
    pub folder: PathBuf,

    /// Database name within the folder
    pub name: String,

    /// Cache sizing
    pub cache: CacheConfiguration,
}

impl StoreConfiguration {
    /// Creates a new default store configuration
    ///
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a store configuration from a TOML document
    ///
    /// # Arguments
    /// * `content` - TOML document
    ///
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Renders the store configuration as TOML document
    ///
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for StoreConfiguration {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            name: "identification".to_string(),
            cache: CacheConfiguration::default(),
        }
    }
}

/// How sequences are compared when mapping tags onto peptide candidates
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMatchingMode {
    /// Plain character comparison
    CharacterSequence,
    /// Accounts for amino acids of identical mass
    AminoAcids,
    /// Additionally accounts for amino acids indistinguishable within the mass tolerance
    IndistinguishableAminoAcids,
}

/// Parameters forwarded to the peptide mapper when resolving sequence tags
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct SequenceMatchingParameters {
    /// Comparison mode
    pub mode: SequenceMatchingMode,

    /// Maximum share of unknown (X) amino acids tolerated in a candidate,
    /// `None` for no limit
    pub max_x_fraction: Option<f64>,
}

impl SequenceMatchingParameters {
    /// Creates new default sequence matching parameters
    ///
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SequenceMatchingParameters {
    fn default() -> Self {
        Self {
            mode: SequenceMatchingMode::AminoAcids,
            max_x_fraction: Some(0.25),
        }
    }
}
