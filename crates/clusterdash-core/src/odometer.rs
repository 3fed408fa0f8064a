//! Distance & economy accounting
//!
//! Integrates speed over elapsed loop time into odometer and trip distance,
//! and derives average economy from the fuel-used accumulators.

/// Milliseconds per hour, for MPH·ms → miles
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Speeds at or below this are sensor noise while stationary
pub const MIN_MOVING_SPEED_MPH: f64 = 0.1;

/// Minimum trip distance and fuel used before an average is meaningful
pub const MIN_ECONOMY_INPUT: f64 = 0.01;

/// Ceiling for average economy; larger values come from a tiny fuel divisor
pub const MAX_AVERAGE_MPG: f64 = 50.0;

/// Fuel flow assumed at idle when the controller reports none
pub const IDLE_FLOW_FALLBACK_GPH: f64 = 0.8;

/// Distance covered at `speed_mph` over `delta_ms`
pub fn distance_increment(speed_mph: f64, delta_ms: u64) -> f64 {
    speed_mph * delta_ms as f64 / MS_PER_HOUR
}

/// Average economy for a trip, 0.0 when not yet computable
pub fn average_mpg(trip_miles: f64, fuel_used: f64, fuel_used_secondary: f64) -> f64 {
    let total_fuel = fuel_used + fuel_used_secondary;
    if total_fuel > MIN_ECONOMY_INPUT && trip_miles > MIN_ECONOMY_INPUT {
        (trip_miles / total_fuel).min(MAX_AVERAGE_MPG)
    } else {
        0.0
    }
}

/// Result of one integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integration {
    /// Miles added to both odometers
    pub increment: f64,
    /// Elapsed time the increment covers
    pub delta_ms: u64,
}

/// Speed integrator
///
/// The first SPEED reading after construction or [`reset`](Self::reset)
/// only seeds the timestamp; there is no interval to integrate over yet.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    last_speed_ms: Option<u64>,
    average_mpg: f64,
}

impl DistanceAccumulator {
    /// Accumulator awaiting its first SPEED reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous timestamp, e.g. on (re)connection
    pub fn reset(&mut self) {
        self.last_speed_ms = None;
    }

    /// Integrate one SPEED reading into `total` and `trip`
    ///
    /// Returns the step taken, or `None` when nothing was added (seeding
    /// frame, stationary, or no elapsed time). The average economy is
    /// recomputed whenever distance is added.
    pub fn integrate(
        &mut self,
        speed_mph: f64,
        now_ms: u64,
        total: &mut f64,
        trip: &mut f64,
        fuel_used: f64,
        fuel_used_secondary: f64,
    ) -> Option<Integration> {
        let previous = self.last_speed_ms.replace(now_ms)?;
        let delta_ms = now_ms.saturating_sub(previous);

        if delta_ms == 0 || !(speed_mph > MIN_MOVING_SPEED_MPH) {
            return None;
        }

        let increment = distance_increment(speed_mph, delta_ms);
        *total += increment;
        *trip += increment;
        self.average_mpg = average_mpg(*trip, fuel_used, fuel_used_secondary);

        Some(Integration {
            increment,
            delta_ms,
        })
    }

    /// Average economy as of the last integration step
    pub fn average_mpg(&self) -> f64 {
        self.average_mpg
    }

    /// Recompute the average outside an integration step, e.g. after a trip reset
    pub fn refresh_average(&mut self, trip: f64, fuel_used: f64, fuel_used_secondary: f64) {
        self.average_mpg = average_mpg(trip, fuel_used, fuel_used_secondary);
    }
}

/// How the instant-economy readout should be shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstantEconomy {
    /// Idling: fuel flow in gallons per hour
    GallonsPerHour(f64),
    /// Engine off
    EngineOff,
    /// Moving: miles per gallon
    MilesPerGallon(f64),
}

impl InstantEconomy {
    /// Decode the controller's `IMPG` value
    ///
    /// `0.0` marks idle, where flow from `FLOW` is shown instead (0.8 GPH
    /// when the flow reading is missing). Some themes draw GPH on a ×10
    /// scale and need `scale_gph_down`. `-1.0` marks engine off.
    pub fn decode(instant_mpg: f64, fuel_flow_gph: f64, scale_gph_down: bool) -> Self {
        if instant_mpg == 0.0 {
            let gph = if fuel_flow_gph > MIN_ECONOMY_INPUT {
                fuel_flow_gph
            } else {
                IDLE_FLOW_FALLBACK_GPH
            };
            let gph = if scale_gph_down { gph / 10.0 } else { gph };
            InstantEconomy::GallonsPerHour(gph)
        } else if instant_mpg == -1.0 {
            InstantEconomy::EngineOff
        } else {
            InstantEconomy::MilesPerGallon(instant_mpg)
        }
    }

    /// Readout label
    pub fn label(&self) -> &'static str {
        match self {
            InstantEconomy::GallonsPerHour(_) => "GPH",
            InstantEconomy::EngineOff => "OFF",
            InstantEconomy::MilesPerGallon(_) => "MPG",
        }
    }

    /// Value to draw
    pub fn value(&self) -> f64 {
        match self {
            InstantEconomy::GallonsPerHour(v) | InstantEconomy::MilesPerGallon(v) => *v,
            InstantEconomy::EngineOff => 0.0,
        }
    }

    /// Decimal places to draw
    pub fn decimals(&self) -> usize {
        match self {
            InstantEconomy::EngineOff => 0,
            _ => 1,
        }
    }
}
