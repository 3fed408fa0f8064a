//! Unit Conversion Functions
//!
//! The core stores every signal in its canonical unit (MPH, °F, PSI, miles,
//! MPG). These helpers are applied only when a value is handed to a gauge:
//! - Speed: mph ↔ km/h
//! - Temperature: °F ↔ °C
//! - Pressure: PSI ↔ kPa
//! - Distance: miles ↔ km
//! - Economy: MPG → L/100km

use serde::{Deserialize, Serialize};

/// Kilometres per mile
pub const KM_PER_MILE: f64 = 1.60934;

/// kPa per PSI
pub const KPA_PER_PSI: f64 = 6.89476;

/// MPG × L/100km for US gallons
pub const MPG_LP100KM_FACTOR: f64 = 235.214;

/// Returned by [`mpg_to_lp100km`] when economy is zero or negative
pub const LP100KM_INVALID: f64 = 999.9;

/// Convert mph to km/h
pub fn mph_to_kph(mph: f64) -> f64 {
    mph * KM_PER_MILE
}

/// Convert km/h to mph
pub fn kph_to_mph(kph: f64) -> f64 {
    kph / KM_PER_MILE
}

/// Convert Fahrenheit to Celsius
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Convert Celsius to Fahrenheit
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Convert PSI to kPa
pub fn psi_to_kpa(psi: f64) -> f64 {
    psi * KPA_PER_PSI
}

/// Convert kPa to PSI
pub fn kpa_to_psi(kpa: f64) -> f64 {
    kpa / KPA_PER_PSI
}

/// Convert miles to kilometres
pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}

/// Convert kilometres to miles
pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

/// Convert MPG (US) to litres per 100 km
///
/// Zero or negative economy has no finite equivalent, so it maps to
/// [`LP100KM_INVALID`] instead of infinity.
pub fn mpg_to_lp100km(mpg: f64) -> f64 {
    if mpg <= 0.0 {
        return LP100KM_INVALID;
    }
    MPG_LP100KM_FACTOR / mpg
}

/// Presentation unit system selected by the `METR_SW` switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    /// MPH, °F, PSI, miles, MPG
    #[default]
    #[serde(rename = "imperial")]
    Imperial,
    /// km/h, °C, kPa, km, L/100km
    #[serde(rename = "metric")]
    Metric,
}

impl UnitSystem {
    /// Pick the unit system from the metric switch state
    pub fn from_metric_switch(metric: bool) -> Self {
        if metric {
            UnitSystem::Metric
        } else {
            UnitSystem::Imperial
        }
    }

    /// Speed in display units
    pub fn speed(self, mph: f64) -> f64 {
        match self {
            UnitSystem::Imperial => mph,
            UnitSystem::Metric => mph_to_kph(mph),
        }
    }

    /// Temperature in display units
    pub fn temperature(self, fahrenheit: f64) -> f64 {
        match self {
            UnitSystem::Imperial => fahrenheit,
            UnitSystem::Metric => fahrenheit_to_celsius(fahrenheit),
        }
    }

    /// Pressure in display units
    pub fn pressure(self, psi: f64) -> f64 {
        match self {
            UnitSystem::Imperial => psi,
            UnitSystem::Metric => psi_to_kpa(psi),
        }
    }

    /// Distance in display units
    pub fn distance(self, miles: f64) -> f64 {
        match self {
            UnitSystem::Imperial => miles,
            UnitSystem::Metric => miles_to_km(miles),
        }
    }

    /// Fuel economy in display units
    pub fn economy(self, mpg: f64) -> f64 {
        match self {
            UnitSystem::Imperial => mpg,
            UnitSystem::Metric => mpg_to_lp100km(mpg),
        }
    }

    /// Unit label for speed gauges
    pub fn speed_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "MPH",
            UnitSystem::Metric => "KPH",
        }
    }

    /// Unit label for economy readouts
    pub fn economy_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "MPG",
            UnitSystem::Metric => "L/100",
        }
    }
}
