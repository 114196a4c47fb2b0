//! Inspection records and their photographs.
//!
//! Records are read-only snapshots fetched once per reconciliation pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One inspection event in a vehicle's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: i32,
    pub odometer_reading: i64,
    pub sequence_number: i32,
    pub start_date: NaiveDate,
}

/// Which reading a photograph is expected to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCategory {
    Odometer,
    Plate,
}

impl PhotoCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Odometer => "odometer",
            Self::Plate => "plate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "odometer" | "odo" => Some(Self::Odometer),
            "plate" => Some(Self::Plate),
            _ => None,
        }
    }

    /// Photo position code used by the inspection tables.
    pub fn position_code(&self) -> i32 {
        match self {
            Self::Odometer => 1,
            Self::Plate => 2,
        }
    }

    /// Map a stored photo position code; positions other than odometer and
    /// plate are not verified.
    pub fn from_position_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Odometer),
            2 => Some(Self::Plate),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A photograph attached to an inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoReference {
    pub record_id: i32,
    pub category: PhotoCategory,
    pub image_url: String,
}
