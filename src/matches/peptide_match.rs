// 3rd party imports
use serde::{Deserialize, Serialize};

/// Aggregation of all spectrum matches explained by one peptide
///
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeptideMatch {
    /// Peptide sequence in ProForma format, doubles as the match key
    sequence: String,
    /// Keys of the spectrum matches mapping to this peptide
    spectrum_match_keys: Vec<String>,
    /// True once a setter ran, so callers know to write the match back
    #[serde(skip)]
    modified: bool,
}

impl PeptideMatch {
    /// Creates a new peptide match without spectrum matches
    ///
    /// # Arguments
    /// * `sequence` - Peptide sequence in ProForma format
    ///
    pub fn new(sequence: String) -> Self {
        Self {
            sequence,
            spectrum_match_keys: Vec::new(),
            modified: false,
        }
    }

    /// Returns the match key
    pub fn key(&self) -> &str {
        &self.sequence
    }

    /// Returns the peptide sequence in ProForma format
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Returns the keys of the spectrum matches mapping to this peptide
    pub fn spectrum_match_keys(&self) -> &[String] {
        &self.spectrum_match_keys
    }

    /// Records another spectrum match mapping to this peptide
    ///
    /// # Arguments
    /// * `spectrum_match_key` - Key of the spectrum match
    ///
    pub fn add_spectrum_match_key(&mut self, spectrum_match_key: String) {
        self.spectrum_match_keys.push(spectrum_match_key);
        self.modified = true;
    }

    /// Replaces the spectrum match keys
    ///
    /// # Arguments
    /// * `spectrum_match_keys` - Keys of the spectrum matches
    ///
    pub fn set_spectrum_match_keys(&mut self, spectrum_match_keys: Vec<String>) {
        self.spectrum_match_keys = spectrum_match_keys;
        self.modified = true;
    }

    /// Returns the number of spectrum matches mapping to this peptide
    pub fn spectrum_count(&self) -> usize {
        self.spectrum_match_keys.len()
    }

    /// Returns whether a setter ran since construction or the last
    /// [PeptideMatch::set_modified] call
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Overrides the modification marker
    ///
    /// # Arguments
    /// * `modified` - New marker value
    ///
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }
}
