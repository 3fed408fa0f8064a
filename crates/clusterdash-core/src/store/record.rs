//! The durable record and its change thresholds

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Number of selectable dashboard themes
pub const STYLE_COUNT: u8 = 5;

/// Odometer reading used when no record exists
pub const DEFAULT_TOTAL_ODOMETER: f64 = 89240.5;

/// Everything that survives a restart
///
/// Field names match the JSON keys on disk except `fuel_used_secondary`,
/// which is stored as `fuel_used_bpw`. Keys missing from an otherwise valid
/// file take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentRecord {
    /// Lifetime distance, miles
    pub total_odometer: f64,

    /// Resettable trip distance, miles
    pub trip_odometer: f64,

    /// Fuel used by the primary tracking method, gallons
    pub fuel_used: f64,

    /// Fuel used by the secondary (injector pulse width) method, gallons
    #[serde(rename = "fuel_used_bpw")]
    pub fuel_used_secondary: f64,

    /// Selected theme, `0..STYLE_COUNT`
    pub dashboard_style: u8,

    /// ISO-8601 time of the last successful write
    pub last_updated: String,

    /// Successful writes since the record was created
    pub save_count: u64,
}

impl Default for PersistentRecord {
    fn default() -> Self {
        Self {
            total_odometer: DEFAULT_TOTAL_ODOMETER,
            trip_odometer: 0.0,
            fuel_used: 0.0,
            fuel_used_secondary: 0.0,
            dashboard_style: 0,
            last_updated: Utc::now().to_rfc3339(),
            save_count: 0,
        }
    }
}

impl PersistentRecord {
    /// Clamp values a hand-edited or foreign file may carry out of range
    pub fn sanitize(&mut self) {
        if !self.total_odometer.is_finite() || self.total_odometer < 0.0 {
            self.total_odometer = 0.0;
        }
        if !self.trip_odometer.is_finite() || self.trip_odometer < 0.0 {
            self.trip_odometer = 0.0;
        }
        if self.dashboard_style >= STYLE_COUNT {
            self.dashboard_style = 0;
        }
    }

    /// Theme index after the current one, wrapping
    pub fn next_style(&self) -> u8 {
        (self.dashboard_style % STYLE_COUNT + 1) % STYLE_COUNT
    }
}

/// Minimum change per field before a write is worth doing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveThresholds {
    /// Miles
    pub odometer: f64,
    /// Miles
    pub trip: f64,
    /// Gallons, applies to both fuel accumulators
    pub fuel: f64,
}

impl Default for SaveThresholds {
    fn default() -> Self {
        Self {
            odometer: 0.1,
            trip: 0.1,
            fuel: 0.01,
        }
    }
}

impl SaveThresholds {
    /// Whether `current` has moved far enough from `persisted` to save
    pub fn exceeded(&self, persisted: &PersistentRecord, current: &PersistentRecord) -> bool {
        (current.total_odometer - persisted.total_odometer).abs() >= self.odometer
            || (current.trip_odometer - persisted.trip_odometer).abs() >= self.trip
            || (current.fuel_used - persisted.fuel_used).abs() >= self.fuel
            || (current.fuel_used_secondary - persisted.fuel_used_secondary).abs() >= self.fuel
    }
}
