// 3rd party imports
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

// internal imports
use crate::configuration::SequenceMatchingParameters;
use crate::constants::SPECTRUM_KEY_SEPARATOR;
use crate::errors::store_error::StoreError;
use crate::matches::assumption::{
    AdvocateId, AssumptionsMap, PeptideAssumption, ScoredAssumptions,
    SpectrumIdentificationAssumption, TagAssumption,
};
use crate::matches::peptide_mapper::{peptides_from_mappings, PeptideMapper};

/// Builds the canonical key of a spectrum within a project
///
/// # Arguments
/// * `spectrum_file` - Name of the MS run file, must not contain the separator
/// * `spectrum_title` - Spectrum title within the file
///
pub fn spectrum_key(spectrum_file: &str, spectrum_title: &str) -> String {
    format!(
        "{}{}{}",
        spectrum_file, SPECTRUM_KEY_SEPARATOR, spectrum_title
    )
}

/// Returns the MS run file part of a spectrum key
///
/// # Arguments
/// * `spectrum_key` - Key as built by [spectrum_key]
///
pub fn spectrum_file_from_key(spectrum_key: &str) -> Result<&str, StoreError> {
    match spectrum_key.find(SPECTRUM_KEY_SEPARATOR) {
        Some(index) => Ok(&spectrum_key[..index]),
        None => Err(StoreError::InvalidSpectrumKey(spectrum_key.to_string())),
    }
}

/// Returns the spectrum title part of a spectrum key
///
/// # Arguments
/// * `spectrum_key` - Key as built by [spectrum_key]
///
pub fn spectrum_title_from_key(spectrum_key: &str) -> Result<&str, StoreError> {
    match spectrum_key.find(SPECTRUM_KEY_SEPARATOR) {
        Some(index) => Ok(&spectrum_key[index + SPECTRUM_KEY_SEPARATOR.len_utf8()..]),
        None => Err(StoreError::InvalidSpectrumKey(spectrum_key.to_string())),
    }
}

/// Identification result for one spectrum: every assumption the advocates
/// proposed for it, grouped by advocate and score.
///
/// The key is always re-derived from the current `(file, title)` pair, so
/// renaming a spectrum goes through [SpectrumMatch::set_key] and is
/// reflected in all subsequent key derivations.
///
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpectrumMatch {
    /// MS run file the spectrum belongs to
    spectrum_file: String,
    /// Spectrum title within the file
    spectrum_title: String,
    /// Ordinal number of the spectrum within the file, fallback identifier
    /// when title based lookup is ambiguous
    spectrum_number: u32,
    /// Assumptions which survived import filtering
    assumptions: AssumptionsMap,
    /// Assumptions as imported, before filtering and ranking
    raw_assumptions: AssumptionsMap,
    /// Best scoring peptide assumption
    best_peptide_assumption: Option<PeptideAssumption>,
    /// Best scoring tag assumption
    best_tag_assumption: Option<TagAssumption>,
    /// True once a setter ran, so callers know to write the match back
    #[serde(skip)]
    modified: bool,
}

impl SpectrumMatch {
    /// Creates a new spectrum match without any assumptions
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    /// * `spectrum_title` - Spectrum title within the file
    ///
    pub fn new(spectrum_file: String, spectrum_title: String) -> Self {
        Self {
            spectrum_file,
            spectrum_title,
            spectrum_number: 0,
            assumptions: AssumptionsMap::new(),
            raw_assumptions: AssumptionsMap::new(),
            best_peptide_assumption: None,
            best_tag_assumption: None,
            modified: false,
        }
    }

    /// Creates a new spectrum match holding one assumption
    ///
    /// # Arguments
    /// * `spectrum_file` - Name of the MS run file
    /// * `spectrum_title` - Spectrum title within the file
    /// * `assumption` - First assumption for the spectrum
    ///
    pub fn with_first_hit(
        spectrum_file: String,
        spectrum_title: String,
        assumption: SpectrumIdentificationAssumption,
    ) -> Self {
        let mut spectrum_match = Self::new(spectrum_file, spectrum_title);
        spectrum_match.add_hit(assumption);
        spectrum_match.modified = false;
        spectrum_match
    }

    /// Returns the key, re-derived from the current `(file, title)` pair
    pub fn key(&self) -> String {
        spectrum_key(&self.spectrum_file, &self.spectrum_title)
    }

    /// Replaces the `(file, title)` pair the key derives from
    ///
    /// # Arguments
    /// * `spectrum_file` - New MS run file name
    /// * `spectrum_title` - New spectrum title
    ///
    pub fn set_key(&mut self, spectrum_file: String, spectrum_title: String) {
        self.spectrum_file = spectrum_file;
        self.spectrum_title = spectrum_title;
        self.modified = true;
    }

    /// Returns the MS run file name
    pub fn spectrum_file(&self) -> &str {
        &self.spectrum_file
    }

    /// Returns the spectrum title
    pub fn spectrum_title(&self) -> &str {
        &self.spectrum_title
    }

    /// Returns the ordinal number of the spectrum within the file
    pub fn spectrum_number(&self) -> u32 {
        self.spectrum_number
    }

    /// Sets the ordinal number of the spectrum within the file
    ///
    /// # Arguments
    /// * `spectrum_number` - Ordinal number
    ///
    pub fn set_spectrum_number(&mut self, spectrum_number: u32) {
        self.spectrum_number = spectrum_number;
        self.modified = true;
    }

    /// Returns the assumptions grouped by advocate and score
    pub fn assumptions(&self) -> &AssumptionsMap {
        &self.assumptions
    }

    /// Replaces the assumptions
    ///
    /// # Arguments
    /// * `assumptions` - Assumptions grouped by advocate and score
    ///
    pub fn set_assumptions(&mut self, assumptions: AssumptionsMap) {
        self.assumptions = assumptions;
        self.modified = true;
    }

    /// Returns one advocate's assumptions keyed by score
    ///
    /// # Arguments
    /// * `advocate` - Advocate to look up
    ///
    pub fn assumptions_for_advocate(&self, advocate: AdvocateId) -> Option<&ScoredAssumptions> {
        self.assumptions.get(&advocate)
    }

    /// Returns the assumptions as imported, before filtering and ranking
    pub fn raw_assumptions(&self) -> &AssumptionsMap {
        &self.raw_assumptions
    }

    /// Replaces the raw assumptions
    ///
    /// # Arguments
    /// * `raw_assumptions` - Assumptions grouped by advocate and score
    ///
    pub fn set_raw_assumptions(&mut self, raw_assumptions: AssumptionsMap) {
        self.raw_assumptions = raw_assumptions;
        self.modified = true;
    }

    /// Returns the best scoring peptide assumption
    pub fn best_peptide_assumption(&self) -> Option<&PeptideAssumption> {
        self.best_peptide_assumption.as_ref()
    }

    /// Sets the best scoring peptide assumption
    ///
    /// # Arguments
    /// * `assumption` - Best peptide assumption, `None` to clear
    ///
    pub fn set_best_peptide_assumption(&mut self, assumption: Option<PeptideAssumption>) {
        self.best_peptide_assumption = assumption;
        self.modified = true;
    }

    /// Returns the best scoring tag assumption
    pub fn best_tag_assumption(&self) -> Option<&TagAssumption> {
        self.best_tag_assumption.as_ref()
    }

    /// Sets the best scoring tag assumption
    ///
    /// # Arguments
    /// * `assumption` - Best tag assumption, `None` to clear
    ///
    pub fn set_best_tag_assumption(&mut self, assumption: Option<TagAssumption>) {
        self.best_tag_assumption = assumption;
        self.modified = true;
    }

    /// Files an assumption under its advocate and score, building the
    /// nested map as needed
    ///
    /// # Arguments
    /// * `assumption` - Assumption to add
    ///
    pub fn add_hit(&mut self, assumption: SpectrumIdentificationAssumption) {
        let advocate = assumption.advocate();
        let score = OrderedFloat(assumption.score());
        self.assumptions
            .entry(advocate)
            .or_default()
            .entry(score)
            .or_default()
            .push(assumption);
        self.modified = true;
    }

    /// Removes one assumption, pruning its score tier and advocate entry
    /// when they become empty. Returns whether anything was removed.
    ///
    /// # Arguments
    /// * `assumption` - Assumption to remove
    ///
    pub fn remove_assumption(&mut self, assumption: &SpectrumIdentificationAssumption) -> bool {
        let advocate = assumption.advocate();
        let score = OrderedFloat(assumption.score());
        if let Some(scored_assumptions) = self.assumptions.get_mut(&advocate) {
            if let Some(assumptions) = scored_assumptions.get_mut(&score) {
                if let Some(index) = assumptions
                    .iter()
                    .position(|candidate| candidate == assumption)
                {
                    assumptions.remove(index);
                    if assumptions.is_empty() {
                        scored_assumptions.remove(&score);
                    }
                    if scored_assumptions.is_empty() {
                        self.assumptions.remove(&advocate);
                    }
                    self.modified = true;
                    return true;
                }
            }
        }
        false
    }

    /// Returns whether any assumption is present
    pub fn has_assumptions(&self) -> bool {
        self.assumptions
            .values()
            .any(|scored_assumptions| !scored_assumptions.is_empty())
    }

    /// Returns whether the given advocate proposed any assumption
    ///
    /// # Arguments
    /// * `advocate` - Advocate to look up
    ///
    pub fn has_assumptions_for_advocate(&self, advocate: AdvocateId) -> bool {
        match self.assumptions.get(&advocate) {
            Some(scored_assumptions) => !scored_assumptions.is_empty(),
            None => false,
        }
    }

    /// Returns the number of assumptions over all advocates and scores
    pub fn assumption_count(&self) -> usize {
        self.assumptions
            .values()
            .map(|scored_assumptions| {
                scored_assumptions
                    .values()
                    .map(Vec::len)
                    .sum::<usize>()
            })
            .sum()
    }

    /// Iterates all assumptions over all advocates and scores
    pub fn iter_assumptions(&self) -> impl Iterator<Item = &SpectrumIdentificationAssumption> {
        self.assumptions
            .values()
            .flat_map(|scored_assumptions| scored_assumptions.values())
            .flatten()
    }

    /// Returns whether a setter ran since construction or the last
    /// [SpectrumMatch::set_modified] call
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Overrides the modification marker, e.g. after writing the match back
    ///
    /// # Arguments
    /// * `modified` - New marker value
    ///
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Converts the tag based assumptions of this match into concrete
    /// peptide assumptions by resolving each tag against the given mapper.
    ///
    /// Per advocate the distinct scores are walked best first, as defined
    /// by `score_ascending`. Every tag assumption takes the next 1-based
    /// rank in processing order and each peptide candidate it resolves to
    /// becomes a peptide assumption carrying the tag's advocate, score,
    /// charge and identification file, with the originating tag assumption
    /// attached for traceability. Non-tag assumptions are skipped. The
    /// input match is left untouched, the result is a new match.
    ///
    /// # Arguments
    /// * `mapper` - Peptide mapper resolving tags against the search space
    /// * `matching` - Sequence matching parameters for the mapper
    /// * `mass_tolerance` - Mass tolerance in Dalton for the tag's mass gaps
    /// * `score_ascending` - True if a lower score is better
    ///
    pub fn peptides_from_tags<M>(
        &self,
        mapper: &M,
        matching: &SequenceMatchingParameters,
        mass_tolerance: f64,
        score_ascending: bool,
    ) -> anyhow::Result<SpectrumMatch>
    where
        M: PeptideMapper,
    {
        let mut expanded =
            SpectrumMatch::new(self.spectrum_file.clone(), self.spectrum_title.clone());

        for (advocate, scored_assumptions) in &self.assumptions {
            let scores: Vec<OrderedFloat<f64>> = if score_ascending {
                scored_assumptions.keys().copied().collect()
            } else {
                scored_assumptions.keys().rev().copied().collect()
            };

            let mut rank: u32 = 1;
            for score in scores {
                for assumption in &scored_assumptions[&score] {
                    let tag_assumption = match assumption {
                        SpectrumIdentificationAssumption::Tag(tag_assumption) => tag_assumption,
                        SpectrumIdentificationAssumption::Peptide(_) => continue,
                    };

                    let mappings = mapper.map_tag(tag_assumption.tag(), matching, mass_tolerance)?;
                    for peptide in peptides_from_mappings(&mappings) {
                        let mut peptide_assumption = PeptideAssumption::new(
                            peptide,
                            rank,
                            *advocate,
                            tag_assumption.identification_charge(),
                            tag_assumption.score(),
                            tag_assumption
                                .identification_file()
                                .map(|file| file.to_string()),
                        );
                        peptide_assumption.set_raw_score(Some(tag_assumption.score()));
                        peptide_assumption.set_derived_from_tag(tag_assumption.clone());
                        expanded.add_hit(SpectrumIdentificationAssumption::Peptide(
                            peptide_assumption,
                        ));
                    }
                    rank += 1;
                }
            }
        }

        expanded.modified = false;
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    // internal imports
    use crate::matches::assumption::{Tag, TagComponent};
    use crate::matches::peptide_mapper::PeptideProteinMapping;

    use super::*;

    const ADVOCATE: AdvocateId = 7;

    /// Maps every tag to one peptide built from the tag's sequence content
    struct SuffixMapper;

    impl PeptideMapper for SuffixMapper {
        fn map_tag(
            &self,
            tag: &Tag,
            _matching: &SequenceMatchingParameters,
            _mass_tolerance: f64,
        ) -> anyhow::Result<Vec<PeptideProteinMapping>> {
            Ok(vec![PeptideProteinMapping::new(
                format!("K{}R", tag.sequence_content()),
                "P68871".to_string(),
                0,
            )])
        }
    }

    fn tag_assumption(sequence: &str, score: f64) -> TagAssumption {
        let tag = Tag::new(vec![
            TagComponent::MassGap(230.5),
            TagComponent::Sequence(sequence.to_string()),
            TagComponent::MassGap(112.25),
        ]);
        TagAssumption::new(tag, 1, ADVOCATE, 2, score, Some("run_01.tags.txt".to_string()))
    }

    #[test]
    fn test_key_is_rederived_from_file_and_title() {
        let mut spectrum_match =
            SpectrumMatch::new("run_01.mzML".to_string(), "scan=2041".to_string());
        assert_eq!(spectrum_match.key(), "run_01.mzML:scan=2041");

        spectrum_match.set_key("run_02.mzML".to_string(), "scan=17".to_string());
        assert_eq!(spectrum_match.key(), "run_02.mzML:scan=17");
        assert!(spectrum_match.is_modified());
    }

    #[test]
    fn test_distinct_pairs_yield_distinct_keys() {
        let first = spectrum_key("run_01.mzML", "scan=1");
        let second = spectrum_key("run_01.mzM", "Lscan=1");
        assert_ne!(first, second);

        assert_eq!(spectrum_file_from_key(&first).unwrap(), "run_01.mzML");
        assert_eq!(spectrum_title_from_key(&first).unwrap(), "scan=1");
    }

    #[test]
    fn test_title_may_contain_the_separator() {
        let key = spectrum_key("run_01.mzML", "index:17");
        assert_eq!(spectrum_file_from_key(&key).unwrap(), "run_01.mzML");
        assert_eq!(spectrum_title_from_key(&key).unwrap(), "index:17");
    }

    #[test]
    fn test_key_without_separator_is_rejected() {
        assert!(matches!(
            spectrum_file_from_key("no_separator_here"),
            Err(StoreError::InvalidSpectrumKey(_))
        ));
    }

    #[test]
    fn test_add_hit_builds_nested_map() {
        let mut spectrum_match =
            SpectrumMatch::new("run_01.mzML".to_string(), "scan=1".to_string());
        assert!(!spectrum_match.has_assumptions());

        spectrum_match.add_hit(SpectrumIdentificationAssumption::Tag(tag_assumption(
            "AAA", 10.0,
        )));
        spectrum_match.add_hit(SpectrumIdentificationAssumption::Tag(tag_assumption(
            "CCC", 10.0,
        )));

        assert!(spectrum_match.has_assumptions());
        assert!(spectrum_match.has_assumptions_for_advocate(ADVOCATE));
        assert_eq!(spectrum_match.assumption_count(), 2);
        assert_eq!(
            spectrum_match
                .assumptions_for_advocate(ADVOCATE)
                .unwrap()
                .get(&OrderedFloat(10.0))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_remove_assumption_prunes_empty_tiers() {
        let mut spectrum_match =
            SpectrumMatch::new("run_01.mzML".to_string(), "scan=1".to_string());
        let assumption = SpectrumIdentificationAssumption::Tag(tag_assumption("AAA", 10.0));
        spectrum_match.add_hit(assumption.clone());

        assert!(spectrum_match.remove_assumption(&assumption));
        assert!(!spectrum_match.has_assumptions_for_advocate(ADVOCATE));
        assert!(spectrum_match.assumptions().is_empty());

        // removing again finds nothing
        assert!(!spectrum_match.remove_assumption(&assumption));
    }

    #[test]
    fn test_peptides_from_tags_assigns_ranks_in_score_order() {
        let mut spectrum_match =
            SpectrumMatch::new("run_01.mzML".to_string(), "scan=1".to_string());
        spectrum_match.add_hit(SpectrumIdentificationAssumption::Tag(tag_assumption(
            "AAA", 10.0,
        )));
        spectrum_match.add_hit(SpectrumIdentificationAssumption::Tag(tag_assumption(
            "CCC", 20.0,
        )));

        let expanded = spectrum_match
            .peptides_from_tags(&SuffixMapper, &SequenceMatchingParameters::new(), 0.5, true)
            .unwrap();

        assert_eq!(expanded.assumption_count(), 2);
        let ranks_by_peptide: Vec<(String, u32)> = expanded
            .iter_assumptions()
            .map(|assumption| {
                let peptide_assumption = assumption.as_peptide().unwrap();
                (
                    peptide_assumption.peptide().to_string(),
                    peptide_assumption.rank(),
                )
            })
            .collect();
        assert!(ranks_by_peptide.contains(&("KAAAR".to_string(), 1)));
        assert!(ranks_by_peptide.contains(&("KCCCR".to_string(), 2)));

        // the traceability annotation points back at the originating tag
        for assumption in expanded.iter_assumptions() {
            let peptide_assumption = assumption.as_peptide().unwrap();
            assert!(peptide_assumption.derived_from_tag().is_some());
            assert_eq!(
                peptide_assumption.raw_score(),
                Some(peptide_assumption.score())
            );
        }

        // the input match still holds its two tag assumptions
        assert_eq!(spectrum_match.assumption_count(), 2);
        assert!(spectrum_match
            .iter_assumptions()
            .all(|assumption| assumption.as_tag().is_some()));
    }

    #[test]
    fn test_peptides_from_tags_descending_score_order() {
        let mut spectrum_match =
            SpectrumMatch::new("run_01.mzML".to_string(), "scan=1".to_string());
        spectrum_match.add_hit(SpectrumIdentificationAssumption::Tag(tag_assumption(
            "AAA", 10.0,
        )));
        spectrum_match.add_hit(SpectrumIdentificationAssumption::Tag(tag_assumption(
            "CCC", 20.0,
        )));

        let expanded = spectrum_match
            .peptides_from_tags(
                &SuffixMapper,
                &SequenceMatchingParameters::new(),
                0.5,
                false,
            )
            .unwrap();

        let ranks_by_peptide: Vec<(String, u32)> = expanded
            .iter_assumptions()
            .map(|assumption| {
                let peptide_assumption = assumption.as_peptide().unwrap();
                (
                    peptide_assumption.peptide().to_string(),
                    peptide_assumption.rank(),
                )
            })
            .collect();
        assert!(ranks_by_peptide.contains(&("KCCCR".to_string(), 1)));
        assert!(ranks_by_peptide.contains(&("KAAAR".to_string(), 2)));
    }

    #[test]
    fn test_setters_mark_the_match_modified() {
        let mut spectrum_match =
            SpectrumMatch::new("run_01.mzML".to_string(), "scan=1".to_string());
        assert!(!spectrum_match.is_modified());

        spectrum_match.set_spectrum_number(2041);
        assert!(spectrum_match.is_modified());

        spectrum_match.set_modified(false);
        assert!(!spectrum_match.is_modified());

        spectrum_match.set_best_peptide_assumption(Some(PeptideAssumption::new(
            "PEPTIDER".to_string(),
            1,
            ADVOCATE,
            2,
            42.5,
            None,
        )));
        assert!(spectrum_match.is_modified());
    }
}
