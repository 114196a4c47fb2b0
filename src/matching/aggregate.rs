//! Folding a photo's recognized lines into a single extraction result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::{normalize, reference_runs};
use super::score::MatchStrategy;
use crate::models::PhotoCategory;

/// Outcome of reading one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub category: PhotoCategory,
    /// Digit runs of the accepted lines, concatenated in order.
    pub aggregated_digits: String,
    /// Every consulted line, unmodified, concatenated in order.
    pub raw_text: String,
    pub matched: bool,
}

impl ExtractionResult {
    /// Result for a photo that produced no usable text.
    pub fn unmatched(category: PhotoCategory) -> Self {
        Self {
            category,
            aggregated_digits: String::new(),
            raw_text: String::new(),
            matched: false,
        }
    }
}

/// Aggregate recognized lines for one photo and score them against `reference`.
///
/// Lines are consumed in order and only until the strategy reports a match;
/// lines after the matching one are never pulled from `lines`.
pub fn extract<I, S>(
    category: PhotoCategory,
    lines: I,
    reference: &str,
    strategy: &dyn MatchStrategy,
) -> ExtractionResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let reference = reference_runs(reference);
    let mut scorer = strategy.scorer(category, &reference);
    let mut result = ExtractionResult::unmatched(category);

    for line in lines {
        let line = line.as_ref();
        result.raw_text.push_str(line);

        let Some(token) = normalize(line) else {
            continue;
        };

        for run in &token.digit_runs {
            result.aggregated_digits.push_str(run);
        }
        debug!(
            "{}: accepted {:?}, aggregate now {:?}",
            category, token.digit_runs, result.aggregated_digits
        );

        if scorer.observe(&token.digit_runs) {
            result.matched = true;
            break;
        }
    }

    result
}
