// 3rd party imports
use fancy_regex::Regex;
use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

// internal imports
use crate::constants::{
    ASSUMPTIONS_TABLE_SUFFIX, PEPTIDE_PARAMETERS_TABLE_SUFFIX, PEPTIDE_TABLE,
    PROTEIN_PARAMETERS_TABLE_SUFFIX, PROTEIN_TABLE, PSM_PARAMETERS_TABLE_SUFFIX, PSM_TABLE_SUFFIX,
    RAW_ASSUMPTIONS_TABLE_SUFFIX, TABLE_NAME_MAX_LENGTH,
};

lazy_static! {
    /// Regex for finding character runs which cannot go into a table name
    ///
    static ref ILLEGAL_TABLE_NAME_CHARACTER_REGEX: Regex =
        Regex::new(r"[^0-9A-Za-z_]+").unwrap();
}

/// Number of hex digits of the digest suffix appended to altered names
const DIGEST_SUFFIX_LENGTH: usize = 8;

/// Sanitizes a raw name for use as a table name. Runs of characters other
/// than `[0-9A-Za-z_]` are replaced by a single `_`. Whenever the cleaned
/// form differs from the input or exceeds the length cap, a digest of the
/// raw input is appended so distinct inputs never collapse to the same
/// table name. Idempotent, so already sanitized names pass through
/// unchanged.
///
/// # Arguments
/// * `raw` - Raw name, e.g. an MS run file name or a parameter kind key
///
pub fn sanitize_table_name(raw: &str) -> String {
    let cleaned = ILLEGAL_TABLE_NAME_CHARACTER_REGEX
        .replace_all(raw, "_")
        .to_string();
    if cleaned == raw && raw.len() <= TABLE_NAME_MAX_LENGTH {
        return cleaned;
    }
    let digest = Sha256::digest(raw.as_bytes());
    let mut sanitized = cleaned;
    sanitized.truncate(TABLE_NAME_MAX_LENGTH - DIGEST_SUFFIX_LENGTH - 1);
    format!(
        "{}_{:02x}{:02x}{:02x}{:02x}",
        sanitized, digest[0], digest[1], digest[2], digest[3]
    )
}

/// Returns the name of the PSM table of an MS run file
///
/// # Arguments
/// * `spectrum_file` - Name of the MS run file
///
pub fn psm_table(spectrum_file: &str) -> String {
    format!("{}{}", sanitize_table_name(spectrum_file), PSM_TABLE_SUFFIX)
}

/// Returns the name of the assumptions table of an MS run file
///
/// # Arguments
/// * `spectrum_file` - Name of the MS run file
///
pub fn assumptions_table(spectrum_file: &str) -> String {
    format!(
        "{}{}",
        sanitize_table_name(spectrum_file),
        ASSUMPTIONS_TABLE_SUFFIX
    )
}

/// Returns the name of the raw assumptions table of an MS run file
///
/// # Arguments
/// * `spectrum_file` - Name of the MS run file
///
pub fn raw_assumptions_table(spectrum_file: &str) -> String {
    format!(
        "{}{}",
        sanitize_table_name(spectrum_file),
        RAW_ASSUMPTIONS_TABLE_SUFFIX
    )
}

/// Returns the name of the PSM parameter table of a parameter kind and
/// MS run file
///
/// # Arguments
/// * `parameter_key` - Stable identity of the parameter kind
/// * `spectrum_file` - Name of the MS run file
///
pub fn psm_parameters_table(parameter_key: &str, spectrum_file: &str) -> String {
    format!(
        "{}{}",
        sanitize_table_name(&format!("{}_{}", parameter_key, spectrum_file)),
        PSM_PARAMETERS_TABLE_SUFFIX
    )
}

/// Returns the name of the peptide parameter table of a parameter kind
///
/// # Arguments
/// * `parameter_key` - Stable identity of the parameter kind
///
pub fn peptide_parameters_table(parameter_key: &str) -> String {
    format!(
        "{}{}",
        sanitize_table_name(parameter_key),
        PEPTIDE_PARAMETERS_TABLE_SUFFIX
    )
}

/// Returns the name of the protein parameter table of a parameter kind
///
/// # Arguments
/// * `parameter_key` - Stable identity of the parameter kind
///
pub fn protein_parameters_table(parameter_key: &str) -> String {
    format!(
        "{}{}",
        sanitize_table_name(parameter_key),
        PROTEIN_PARAMETERS_TABLE_SUFFIX
    )
}

/// Kind of table, recognized by its name
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Proteins,
    Peptides,
    Psms,
    Assumptions,
    RawAssumptions,
    PsmParameters,
    PeptideParameters,
    ProteinParameters,
}

/// Classifies a persisted table name by its suffix, e.g. when rebuilding
/// the table registries of a reopened database. `_raw_assumptions` is
/// tested before `_assumptions` since the latter is a suffix of the
/// former. Returns `None` for table names this layer does not manage.
///
/// # Arguments
/// * `table_name` - Persisted table name
///
pub fn classify_table_name(table_name: &str) -> Option<TableKind> {
    if table_name == PROTEIN_TABLE {
        return Some(TableKind::Proteins);
    }
    if table_name == PEPTIDE_TABLE {
        return Some(TableKind::Peptides);
    }
    if table_name.ends_with(RAW_ASSUMPTIONS_TABLE_SUFFIX) {
        return Some(TableKind::RawAssumptions);
    }
    if table_name.ends_with(ASSUMPTIONS_TABLE_SUFFIX) {
        return Some(TableKind::Assumptions);
    }
    if table_name.ends_with(PSM_PARAMETERS_TABLE_SUFFIX) {
        return Some(TableKind::PsmParameters);
    }
    if table_name.ends_with(PEPTIDE_PARAMETERS_TABLE_SUFFIX) {
        return Some(TableKind::PeptideParameters);
    }
    if table_name.ends_with(PROTEIN_PARAMETERS_TABLE_SUFFIX) {
        return Some(TableKind::ProteinParameters);
    }
    if table_name.ends_with(PSM_TABLE_SUFFIX) {
        return Some(TableKind::Psms);
    }
    None
}

#[cfg(test)]
mod tests {
    // std imports
    use std::thread;

    use super::*;

    #[test]
    fn test_sanitize_keeps_clean_names() {
        let input = "qexactive_run_01";
        let result = sanitize_table_name(input);
        assert_eq!(result, input);
    }

    #[test]
    fn test_sanitize_replaces_illegal_runs_and_appends_digest() {
        let result = sanitize_table_name("run 01.mzML");
        assert!(result.starts_with("run_01_mzML_"));
        assert_eq!(
            result.len(),
            "run_01_mzML_".len() + 8,
            "expected an 8 hex digit digest suffix, got `{}`",
            result
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_table_name("run 01.mzML");
        let twice = sanitize_table_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sanitize_keeps_distinct_inputs_distinct() {
        // both clean to `run_01_mzML`, the digest keeps them apart
        let first = sanitize_table_name("run 01.mzML");
        let second = sanitize_table_name("run.01 mzML");
        assert_ne!(first, second);
    }

    #[test]
    fn test_sanitize_caps_the_length() {
        let input = "x".repeat(3 * TABLE_NAME_MAX_LENGTH);
        let result = sanitize_table_name(&input);
        assert!(result.len() <= TABLE_NAME_MAX_LENGTH);
        assert_eq!(result, sanitize_table_name(&result));
    }

    #[test]
    fn test_derivation_is_deterministic_across_threads() {
        let expected = psm_table("run 01.mzML");
        let handles: Vec<_> = (0..4)
            .map(|_| thread::spawn(|| psm_table("run 01.mzML")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_table_names_follow_the_naming_rules() {
        assert_eq!(psm_table("run_01"), "run_01_psms");
        assert_eq!(assumptions_table("run_01"), "run_01_assumptions");
        assert_eq!(raw_assumptions_table("run_01"), "run_01_raw_assumptions");
        assert_eq!(
            psm_parameters_table("validation_score", "run_01"),
            "validation_score_run_01_psm_parameters"
        );
        assert_eq!(
            peptide_parameters_table("validation_score"),
            "validation_score_peptide_parameters"
        );
        assert_eq!(
            protein_parameters_table("validation_score"),
            "validation_score_protein_parameters"
        );
    }

    #[test]
    fn test_classification_by_suffix() {
        assert_eq!(classify_table_name("proteins"), Some(TableKind::Proteins));
        assert_eq!(classify_table_name("peptides"), Some(TableKind::Peptides));
        assert_eq!(
            classify_table_name("run_01_psms"),
            Some(TableKind::Psms)
        );
        assert_eq!(
            classify_table_name("run_01_assumptions"),
            Some(TableKind::Assumptions)
        );
        assert_eq!(
            classify_table_name("run_01_raw_assumptions"),
            Some(TableKind::RawAssumptions)
        );
        assert_eq!(
            classify_table_name("validation_score_run_01_psm_parameters"),
            Some(TableKind::PsmParameters)
        );
        assert_eq!(
            classify_table_name("validation_score_peptide_parameters"),
            Some(TableKind::PeptideParameters)
        );
        assert_eq!(
            classify_table_name("validation_score_protein_parameters"),
            Some(TableKind::ProteinParameters)
        );
        assert_eq!(classify_table_name("something_else"), None);
    }
}
