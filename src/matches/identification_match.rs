// std imports
use std::fmt::Display;

// 3rd party imports
use serde::{Deserialize, Serialize};

// internal imports
use crate::matches::peptide_match::PeptideMatch;
use crate::matches::protein_match::ProteinMatch;
use crate::matches::spectrum_match::SpectrumMatch;

/// Category of an identification match
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MatchCategory {
    Protein,
    Peptide,
    Spectrum,
}

impl Display for MatchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protein => write!(f, "protein"),
            Self::Peptide => write!(f, "peptide"),
            Self::Spectrum => write!(f, "spectrum"),
        }
    }
}

/// Identification match of any category
///
#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum IdentificationMatch {
    Protein(ProteinMatch),
    Peptide(PeptideMatch),
    Spectrum(SpectrumMatch),
}

impl IdentificationMatch {
    /// Returns the category of the match
    pub fn category(&self) -> MatchCategory {
        match self {
            Self::Protein(_) => MatchCategory::Protein,
            Self::Peptide(_) => MatchCategory::Peptide,
            Self::Spectrum(_) => MatchCategory::Spectrum,
        }
    }

    /// Returns the match key within its category
    pub fn key(&self) -> String {
        match self {
            Self::Protein(protein_match) => protein_match.key(),
            Self::Peptide(peptide_match) => peptide_match.key().to_string(),
            Self::Spectrum(spectrum_match) => spectrum_match.key(),
        }
    }

    /// Returns the protein match if this is one
    pub fn as_protein(&self) -> Option<&ProteinMatch> {
        match self {
            Self::Protein(protein_match) => Some(protein_match),
            _ => None,
        }
    }

    /// Returns the peptide match if this is one
    pub fn as_peptide(&self) -> Option<&PeptideMatch> {
        match self {
            Self::Peptide(peptide_match) => Some(peptide_match),
            _ => None,
        }
    }

    /// Returns the spectrum match if this is one
    pub fn as_spectrum(&self) -> Option<&SpectrumMatch> {
        match self {
            Self::Spectrum(spectrum_match) => Some(spectrum_match),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_key_dispatch() {
        let spectrum_match = IdentificationMatch::Spectrum(SpectrumMatch::new(
            "run_01.mzML".to_string(),
            "scan=1".to_string(),
        ));
        assert_eq!(spectrum_match.category(), MatchCategory::Spectrum);
        assert_eq!(spectrum_match.key(), "run_01.mzML:scan=1");
        assert!(spectrum_match.as_spectrum().is_some());
        assert!(spectrum_match.as_protein().is_none());

        let peptide_match =
            IdentificationMatch::Peptide(PeptideMatch::new("PEPTIDER".to_string()));
        assert_eq!(peptide_match.category(), MatchCategory::Peptide);
        assert_eq!(peptide_match.key(), "PEPTIDER");

        let protein_match =
            IdentificationMatch::Protein(ProteinMatch::new(vec!["P68871".to_string()]));
        assert_eq!(protein_match.category(), MatchCategory::Protein);
        assert_eq!(protein_match.key(), "P68871");
    }

    #[test]
    fn test_category_display() {
        assert_eq!(MatchCategory::Protein.to_string(), "protein");
        assert_eq!(MatchCategory::Peptide.to_string(), "peptide");
        assert_eq!(MatchCategory::Spectrum.to_string(), "spectrum");
    }
}
