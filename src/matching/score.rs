//! Scoring of extracted digit runs against a reference value.
//!
//! Strategies:
//! - `membership`: positional pairing with a character-membership test and a
//!   running count per photo (the historical behaviour, kept as default)
//! - `levenshtein`: edit distance between the line's digits and the
//!   reference digits, below a tolerance
//!
//! The membership heuristic is loose: any extracted digit that appears
//! anywhere in the paired reference run counts, so short or repetitive
//! strings can match by accident.

use serde::{Deserialize, Serialize};

use crate::models::PhotoCategory;

/// Count needed for each category before a photo is considered matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchThresholds {
    pub odometer: u32,
    pub plate: u32,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            odometer: 3,
            plate: 2,
        }
    }
}

impl MatchThresholds {
    pub fn for_category(&self, category: PhotoCategory) -> u32 {
        match category {
            PhotoCategory::Odometer => self.odometer,
            PhotoCategory::Plate => self.plate,
        }
    }
}

/// Available comparison strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Membership,
    Levenshtein,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Membership => "membership",
            Self::Levenshtein => "levenshtein",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "membership" => Some(Self::Membership),
            "levenshtein" | "edit-distance" => Some(Self::Levenshtein),
            _ => None,
        }
    }

    /// Build the strategy with its default parameters.
    pub fn build(&self, thresholds: MatchThresholds) -> Box<dyn MatchStrategy> {
        match self {
            Self::Membership => Box::new(MembershipStrategy::new(thresholds)),
            Self::Levenshtein => Box::new(LevenshteinStrategy::default()),
        }
    }
}

/// A way of deciding whether recognized lines confirm a reference value.
pub trait MatchStrategy: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    /// Start scoring one photo of `category` against the reference digit runs.
    fn scorer(&self, category: PhotoCategory, reference: &[String]) -> Box<dyn LineScorer>;
}

/// Per-photo scoring state, fed one accepted line at a time.
pub trait LineScorer: Send {
    /// Observe the digit runs of one accepted line. Returns true once the
    /// photo is matched.
    fn observe(&mut self, extracted: &[String]) -> bool;
}

/// Count paired positions whose extracted character occurs in the paired
/// reference run.
///
/// Runs are paired positionally and so are characters within a pair; the
/// shorter side bounds both.
pub fn membership_count(extracted: &[String], reference: &[String]) -> u32 {
    let mut count = 0;
    for (x, y) in extracted.iter().zip(reference) {
        for (a, _) in x.chars().zip(y.chars()) {
            if y.contains(a) {
                count += 1;
            }
        }
    }
    count
}

/// Character-membership strategy with per-category thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipStrategy {
    thresholds: MatchThresholds,
}

impl MembershipStrategy {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }
}

impl MatchStrategy for MembershipStrategy {
    fn name(&self) -> &'static str {
        "membership"
    }

    fn scorer(&self, category: PhotoCategory, reference: &[String]) -> Box<dyn LineScorer> {
        Box::new(MembershipScorer::new(
            reference.to_vec(),
            self.thresholds.for_category(category),
        ))
    }
}

/// Running membership count for one photo.
#[derive(Debug, Clone)]
pub struct MembershipScorer {
    reference: Vec<String>,
    threshold: u32,
    count: u32,
}

impl MembershipScorer {
    pub fn new(reference: Vec<String>, threshold: u32) -> Self {
        Self {
            reference,
            threshold,
            count: 0,
        }
    }

    /// Count accumulated so far.
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl LineScorer for MembershipScorer {
    fn observe(&mut self, extracted: &[String]) -> bool {
        self.count += membership_count(extracted, &self.reference);
        if self.count >= self.threshold {
            self.count = 0;
            return true;
        }
        false
    }
}

/// Edit-distance strategy: a line matches when its digits are within
/// `max_distance` edits of the reference digits.
#[derive(Debug, Clone, Copy)]
pub struct LevenshteinStrategy {
    pub max_distance: usize,
}

impl Default for LevenshteinStrategy {
    fn default() -> Self {
        Self { max_distance: 1 }
    }
}

impl MatchStrategy for LevenshteinStrategy {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn scorer(&self, _category: PhotoCategory, reference: &[String]) -> Box<dyn LineScorer> {
        Box::new(LevenshteinScorer {
            reference: reference.concat(),
            max_distance: self.max_distance,
        })
    }
}

struct LevenshteinScorer {
    reference: String,
    max_distance: usize,
}

impl LineScorer for LevenshteinScorer {
    fn observe(&mut self, extracted: &[String]) -> bool {
        let candidate = extracted.concat();
        if candidate.is_empty() || self.reference.is_empty() {
            return false;
        }
        levenshtein(&candidate, &self.reference) <= self.max_distance
    }
}

/// Edit distance between two strings, by characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
