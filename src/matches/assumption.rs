// std imports
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

// 3rd party imports
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Identifier of an advocate, the search engine or algorithm which
/// proposed an assumption
pub type AdvocateId = u32;

/// Assumptions of one advocate keyed by score. Scores key a `BTreeMap`
/// so iteration yields them in ascending order.
pub type ScoredAssumptions = BTreeMap<OrderedFloat<f64>, Vec<SpectrumIdentificationAssumption>>;

/// Assumptions grouped by advocate, then by score
pub type AssumptionsMap = HashMap<AdvocateId, ScoredAssumptions>;

/// Component of a sequence tag
///
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum TagComponent {
    /// Stretch of amino acids in ProForma format
    Sequence(String),
    /// Mass gap in Dalton
    MassGap(f64),
}

/// Partial, gapped amino acid sequence hypothesis for a spectrum,
/// inferred from fragment masses prior to any database matching
///
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tag {
    /// Components from N- to C-terminus
    components: Vec<TagComponent>,
}

impl Tag {
    /// Creates a new tag
    ///
    /// # Arguments
    /// * `components` - Components from N- to C-terminus
    ///
    pub fn new(components: Vec<TagComponent>) -> Self {
        Self { components }
    }

    /// Returns the components from N- to C-terminus
    pub fn components(&self) -> &[TagComponent] {
        &self.components
    }

    /// Returns the concatenated amino acid stretches without the mass gaps
    pub fn sequence_content(&self) -> String {
        self.components
            .iter()
            .filter_map(|component| match component {
                TagComponent::Sequence(sequence) => Some(sequence.as_str()),
                TagComponent::MassGap(_) => None,
            })
            .collect()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for component in &self.components {
            match component {
                TagComponent::Sequence(sequence) => write!(f, "{}", sequence)?,
                TagComponent::MassGap(mass) => write!(f, "<{}>", mass)?,
            }
        }
        Ok(())
    }
}

/// Assumption explaining a spectrum with a concrete peptide
///
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PeptideAssumption {
    /// Peptide sequence in ProForma format
    peptide: String,
    /// 1-based rank among the advocate's assumptions
    rank: u32,
    /// Advocate which proposed the assumption
    advocate: AdvocateId,
    /// Charge used for identification
    identification_charge: u8,
    /// Score as reported or rescaled by the advocate
    score: f64,
    /// Score before advocate specific rescaling
    raw_score: Option<f64>,
    /// Search engine result file this assumption was imported from
    identification_file: Option<String>,
    /// Tag assumption this assumption was derived from, if any
    derived_from_tag: Option<Box<TagAssumption>>,
}

impl PeptideAssumption {
    /// Creates a new peptide assumption
    ///
    /// # Arguments
    /// * `peptide` - Peptide sequence in ProForma format
    /// * `rank` - 1-based rank among the advocate's assumptions
    /// * `advocate` - Advocate which proposed the assumption
    /// * `identification_charge` - Charge used for identification
    /// * `score` - Score
    /// * `identification_file` - Search engine result file, if known
    ///
    pub fn new(
        peptide: String,
        rank: u32,
        advocate: AdvocateId,
        identification_charge: u8,
        score: f64,
        identification_file: Option<String>,
    ) -> Self {
        Self {
            peptide,
            rank,
            advocate,
            identification_charge,
            score,
            raw_score: None,
            identification_file,
            derived_from_tag: None,
        }
    }

    /// Returns the peptide sequence in ProForma format
    pub fn peptide(&self) -> &str {
        &self.peptide
    }

    /// Returns the 1-based rank
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the advocate
    pub fn advocate(&self) -> AdvocateId {
        self.advocate
    }

    /// Returns the charge used for identification
    pub fn identification_charge(&self) -> u8 {
        self.identification_charge
    }

    /// Returns the score
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Returns the score before advocate specific rescaling
    pub fn raw_score(&self) -> Option<f64> {
        self.raw_score
    }

    /// Sets the score before advocate specific rescaling
    ///
    /// # Arguments
    /// * `raw_score` - Raw score
    ///
    pub fn set_raw_score(&mut self, raw_score: Option<f64>) {
        self.raw_score = raw_score;
    }

    /// Returns the search engine result file, if known
    pub fn identification_file(&self) -> Option<&str> {
        self.identification_file.as_deref()
    }

    /// Returns the tag assumption this assumption was derived from, if any
    pub fn derived_from_tag(&self) -> Option<&TagAssumption> {
        self.derived_from_tag.as_deref()
    }

    /// Records the tag assumption this assumption was derived from
    ///
    /// # Arguments
    /// * `tag_assumption` - Originating tag assumption
    ///
    pub fn set_derived_from_tag(&mut self, tag_assumption: TagAssumption) {
        self.derived_from_tag = Some(Box::new(tag_assumption));
    }
}

/// Assumption explaining a spectrum with a partial sequence tag
///
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TagAssumption {
    /// Sequence tag
    tag: Tag,
    /// 1-based rank among the advocate's assumptions
    rank: u32,
    /// Advocate which proposed the assumption
    advocate: AdvocateId,
    /// Charge used for identification
    identification_charge: u8,
    /// Score as reported or rescaled by the advocate
    score: f64,
    /// Score before advocate specific rescaling
    raw_score: Option<f64>,
    /// Search engine result file this assumption was imported from
    identification_file: Option<String>,
}

impl TagAssumption {
    /// Creates a new tag assumption
    ///
    /// # Arguments
    /// * `tag` - Sequence tag
    /// * `rank` - 1-based rank among the advocate's assumptions
    /// * `advocate` - Advocate which proposed the assumption
    /// * `identification_charge` - Charge used for identification
    /// * `score` - Score
    /// * `identification_file` - Search engine result file, if known
    ///
    pub fn new(
        tag: Tag,
        rank: u32,
        advocate: AdvocateId,
        identification_charge: u8,
        score: f64,
        identification_file: Option<String>,
    ) -> Self {
        Self {
            tag,
            rank,
            advocate,
            identification_charge,
            score,
            raw_score: None,
            identification_file,
        }
    }

    /// Returns the sequence tag
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Returns the 1-based rank
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the advocate
    pub fn advocate(&self) -> AdvocateId {
        self.advocate
    }

    /// Returns the charge used for identification
    pub fn identification_charge(&self) -> u8 {
        self.identification_charge
    }

    /// Returns the score
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Returns the score before advocate specific rescaling
    pub fn raw_score(&self) -> Option<f64> {
        self.raw_score
    }

    /// Sets the score before advocate specific rescaling
    ///
    /// # Arguments
    /// * `raw_score` - Raw score
    ///
    pub fn set_raw_score(&mut self, raw_score: Option<f64>) {
        self.raw_score = raw_score;
    }

    /// Returns the search engine result file, if known
    pub fn identification_file(&self) -> Option<&str> {
        self.identification_file.as_deref()
    }
}

/// Hypothesis proposed by an advocate for a spectrum, either a concrete
/// peptide or a partial sequence tag
///
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum SpectrumIdentificationAssumption {
    Peptide(PeptideAssumption),
    Tag(TagAssumption),
}

impl SpectrumIdentificationAssumption {
    /// Returns the advocate
    pub fn advocate(&self) -> AdvocateId {
        match self {
            Self::Peptide(assumption) => assumption.advocate(),
            Self::Tag(assumption) => assumption.advocate(),
        }
    }

    /// Returns the 1-based rank
    pub fn rank(&self) -> u32 {
        match self {
            Self::Peptide(assumption) => assumption.rank(),
            Self::Tag(assumption) => assumption.rank(),
        }
    }

    /// Returns the score
    pub fn score(&self) -> f64 {
        match self {
            Self::Peptide(assumption) => assumption.score(),
            Self::Tag(assumption) => assumption.score(),
        }
    }

    /// Returns the score before advocate specific rescaling
    pub fn raw_score(&self) -> Option<f64> {
        match self {
            Self::Peptide(assumption) => assumption.raw_score(),
            Self::Tag(assumption) => assumption.raw_score(),
        }
    }

    /// Returns the charge used for identification
    pub fn identification_charge(&self) -> u8 {
        match self {
            Self::Peptide(assumption) => assumption.identification_charge(),
            Self::Tag(assumption) => assumption.identification_charge(),
        }
    }

    /// Returns the search engine result file, if known
    pub fn identification_file(&self) -> Option<&str> {
        match self {
            Self::Peptide(assumption) => assumption.identification_file(),
            Self::Tag(assumption) => assumption.identification_file(),
        }
    }

    /// Returns the peptide assumption if this is one
    pub fn as_peptide(&self) -> Option<&PeptideAssumption> {
        match self {
            Self::Peptide(assumption) => Some(assumption),
            Self::Tag(_) => None,
        }
    }

    /// Returns the tag assumption if this is one
    pub fn as_tag(&self) -> Option<&TagAssumption> {
        match self {
            Self::Tag(assumption) => Some(assumption),
            Self::Peptide(_) => None,
        }
    }
}
