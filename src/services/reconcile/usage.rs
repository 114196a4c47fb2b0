//! Odometer usage rate between two inspections.

use crate::models::InspectionRecord;

/// Distance and days between a record and its prior inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRateEstimate {
    pub odometer_delta: i64,
    pub elapsed_days: i64,
}

impl UsageRateEstimate {
    pub fn between(current: &InspectionRecord, prior: &InspectionRecord) -> Self {
        Self {
            odometer_delta: current.odometer_reading - prior.odometer_reading,
            elapsed_days: (current.start_date - prior.start_date).num_days(),
        }
    }

    /// Distance per day, or `None` when no time has elapsed (or the dates
    /// run backwards) and the rate is undefined.
    pub fn rate(&self) -> Option<f64> {
        if self.elapsed_days <= 0 {
            return None;
        }
        Some(self.odometer_delta as f64 / self.elapsed_days as f64)
    }
}
