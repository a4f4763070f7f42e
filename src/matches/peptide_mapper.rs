// internal imports
use crate::configuration::SequenceMatchingParameters;
use crate::matches::assumption::Tag;

/// Occurrence of a peptide sequence within a protein
///
#[derive(Debug, Clone, PartialEq)]
pub struct PeptideProteinMapping {
    /// Peptide sequence in ProForma format
    pub peptide_sequence: String,
    /// Accession of the protein containing the sequence
    pub protein_accession: String,
    /// Zero-based start position of the peptide within the protein sequence
    pub peptide_start: usize,
}

impl PeptideProteinMapping {
    /// Creates a new peptide/protein mapping
    ///
    /// # Arguments
    /// * `peptide_sequence` - Peptide sequence in ProForma format
    /// * `protein_accession` - Accession of the protein containing the sequence
    /// * `peptide_start` - Zero-based start position within the protein sequence
    ///
    pub fn new(peptide_sequence: String, protein_accession: String, peptide_start: usize) -> Self {
        Self {
            peptide_sequence,
            protein_accession,
            peptide_start,
        }
    }
}

/// Resolves sequence tags into peptide candidates from a protein sequence
/// database. Implementations wrap whatever index the application searches
/// against.
///
pub trait PeptideMapper {
    /// Returns every peptide/protein mapping compatible with the tag
    ///
    /// # Arguments
    /// * `tag` - Sequence tag to resolve
    /// * `matching` - Sequence matching parameters
    /// * `mass_tolerance` - Mass tolerance in Dalton for the tag's mass gaps
    ///
    fn map_tag(
        &self,
        tag: &Tag,
        matching: &SequenceMatchingParameters,
        mass_tolerance: f64,
    ) -> anyhow::Result<Vec<PeptideProteinMapping>>;
}

/// Distinct peptide sequences of the given mappings in first-seen order
///
/// # Arguments
/// * `mappings` - Mappings as returned by a peptide mapper
///
pub fn peptides_from_mappings(mappings: &[PeptideProteinMapping]) -> Vec<String> {
    let mut peptides: Vec<String> = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        if !peptides
            .iter()
            .any(|peptide| peptide == &mapping.peptide_sequence)
        {
            peptides.push(mapping.peptide_sequence.clone());
        }
    }
    peptides
}
