// 3rd party imports
use serde::{Deserialize, Serialize};

// internal imports
use crate::constants::PROTEIN_KEY_SEPARATOR;

/// Builds the canonical key of a protein group from its accessions:
/// sorted, deduplicated and joined
///
/// # Arguments
/// * `accessions` - Accessions of the proteins in the group
///
pub fn protein_match_key(accessions: &[String]) -> String {
    let mut sorted: Vec<&str> = accessions.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(PROTEIN_KEY_SEPARATOR)
}

/// Group of proteins which cannot be distinguished by the observed
/// peptides, together with the peptide matches observed for it
///
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProteinMatch {
    /// Accessions of the proteins in the group
    accessions: Vec<String>,
    /// Accession of the leading protein of the group
    main_accession: Option<String>,
    /// Keys of the peptide matches observed for the group
    peptide_match_keys: Vec<String>,
    /// True once a setter ran, so callers know to write the match back
    #[serde(skip)]
    modified: bool,
}

impl ProteinMatch {
    /// Creates a new protein match without peptide matches
    ///
    /// # Arguments
    /// * `accessions` - Accessions of the proteins in the group
    ///
    pub fn new(accessions: Vec<String>) -> Self {
        Self {
            accessions,
            main_accession: None,
            peptide_match_keys: Vec::new(),
            modified: false,
        }
    }

    /// Returns the match key, derived from the accessions
    pub fn key(&self) -> String {
        protein_match_key(&self.accessions)
    }

    /// Returns the accessions of the proteins in the group
    pub fn accessions(&self) -> &[String] {
        &self.accessions
    }

    /// Returns the accession of the leading protein
    pub fn main_accession(&self) -> Option<&str> {
        self.main_accession.as_deref()
    }

    /// Sets the accession of the leading protein
    ///
    /// # Arguments
    /// * `main_accession` - Accession, `None` to clear
    ///
    pub fn set_main_accession(&mut self, main_accession: Option<String>) {
        self.main_accession = main_accession;
        self.modified = true;
    }

    /// Returns the keys of the peptide matches observed for the group
    pub fn peptide_match_keys(&self) -> &[String] {
        &self.peptide_match_keys
    }

    /// Records another peptide match for the group
    ///
    /// # Arguments
    /// * `peptide_match_key` - Key of the peptide match
    ///
    pub fn add_peptide_match_key(&mut self, peptide_match_key: String) {
        self.peptide_match_keys.push(peptide_match_key);
        self.modified = true;
    }

    /// Replaces the peptide match keys
    ///
    /// # Arguments
    /// * `peptide_match_keys` - Keys of the peptide matches
    ///
    pub fn set_peptide_match_keys(&mut self, peptide_match_keys: Vec<String>) {
        self.peptide_match_keys = peptide_match_keys;
        self.modified = true;
    }

    /// Returns whether a setter ran since construction or the last
    /// [ProteinMatch::set_modified] call
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        let first = ProteinMatch::new(vec!["P69905".to_string(), "P68871".to_string()]);
        let second = ProteinMatch::new(vec!["P68871".to_string(), "P69905".to_string()]);

        assert_eq!(first.key(), "P68871,P69905");
        assert_eq!(first.key(), second.key());
    }

    #[test]
    fn test_duplicate_accessions_collapse() {
        let protein_match =
            ProteinMatch::new(vec!["P68871".to_string(), "P68871".to_string()]);
        assert_eq!(protein_match.key(), "P68871");
    }

    #[test]
    fn test_setters_mark_modified() {
        let mut protein_match = ProteinMatch::new(vec!["P68871".to_string()]);
        assert!(!protein_match.is_modified());

        protein_match.set_main_accession(Some("P68871".to_string()));
        assert!(protein_match.is_modified());
        assert_eq!(protein_match.main_accession(), Some("P68871"));
    }
}
