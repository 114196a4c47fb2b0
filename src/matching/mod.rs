//! Interpretation of recognized text.
//!
//! Raw OCR lines are normalized into digit tokens, aggregated per photo, and
//! scored against the value the inspection claims (odometer reading or plate
//! number).

pub mod aggregate;
pub mod normalize;
pub mod score;

pub use aggregate::{extract, ExtractionResult};
pub use normalize::{normalize, Token, MIN_TOKEN_LEN};
pub use score::{
    LevenshteinStrategy, LineScorer, MatchStrategy, MatchThresholds, MembershipStrategy,
    StrategyKind,
};
