/// Assumptions proposed by advocates for a spectrum
pub mod assumption;
/// Identification match of any category
pub mod identification_match;
/// Parameter annotations attachable to matches
pub mod match_parameter;
/// Resolving sequence tags into peptide candidates
pub mod peptide_mapper;
/// Peptide matches
pub mod peptide_match;
/// Protein matches
pub mod protein_match;
/// Spectrum matches
pub mod spectrum_match;
