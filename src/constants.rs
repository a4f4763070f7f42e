/// Name of the table holding protein matches
///
pub const PROTEIN_TABLE: &'static str = "proteins";

/// Name of the table holding peptide matches
///
pub const PEPTIDE_TABLE: &'static str = "peptides";

/// Suffix for per-MS-run-file PSM tables
///
pub const PSM_TABLE_SUFFIX: &'static str = "_psms";

/// Suffix for per-MS-run-file assumption map tables
///
pub const ASSUMPTIONS_TABLE_SUFFIX: &'static str = "_assumptions";

/// Suffix for per-MS-run-file raw (pre-filtering) assumption map tables
///
pub const RAW_ASSUMPTIONS_TABLE_SUFFIX: &'static str = "_raw_assumptions";

/// Suffix for per-kind-and-MS-run-file PSM parameter tables
///
pub const PSM_PARAMETERS_TABLE_SUFFIX: &'static str = "_psm_parameters";

/// Suffix for per-kind peptide match parameter tables
///
pub const PEPTIDE_PARAMETERS_TABLE_SUFFIX: &'static str = "_peptide_parameters";

/// Suffix for per-kind protein match parameter tables
///
pub const PROTEIN_PARAMETERS_TABLE_SUFFIX: &'static str = "_protein_parameters";

/// Separator between MS run file name and spectrum title in spectrum match keys.
/// File names must not contain it, titles may.
///
pub const SPECTRUM_KEY_SEPARATOR: char = ':';

/// Separator between accessions in protein match keys
///
pub const PROTEIN_KEY_SEPARATOR: &'static str = ",";

/// Max length of a sanitized table name including the digest suffix
///
pub const TABLE_NAME_MAX_LENGTH: usize = 120;

/// Default capacity of the shared object cache in bytes
///
pub const DEFAULT_CACHE_CAPACITY_BYTES: usize = 64 * 1024 * 1024;
