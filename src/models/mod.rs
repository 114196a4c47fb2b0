//! Data models for autoverify.

mod audit;
mod inspection;

pub use audit::MatchAuditRecord;
pub use inspection::{InspectionRecord, PhotoCategory, PhotoReference};
