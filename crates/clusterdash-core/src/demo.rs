//! Demo Mode - sweep generator for running without a controller
//!
//! Used only while the controller has never been connected. Speed climbs
//! steadily and wraps; RPM bounces between idle and redline. Auxiliary
//! gauges get fixed plausible readings. The sweep is deterministic and
//! advances once per render tick.

use crate::vehicle::AuxReadings;

/// Speed added per tick, MPH
pub const DEMO_SPEED_STEP: f64 = 0.4;
/// Speed above which the sweep wraps to zero, MPH
pub const DEMO_SPEED_MAX: f64 = 90.0;
/// RPM change per tick
pub const DEMO_RPM_STEP: f64 = 50.0;
/// Lower bound of the RPM sweep
pub const DEMO_RPM_MIN: f64 = 800.0;
/// Upper bound of the RPM sweep
pub const DEMO_RPM_MAX: f64 = 6500.0;

/// One tick of simulated output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoSample {
    /// Speed, MPH
    pub speed: f64,
    /// Engine speed, RPM
    pub rpm: f64,
}

/// Demo sweep simulator
#[derive(Debug, Clone)]
pub struct DemoSimulator {
    speed: f64,
    rpm: f64,
    /// +1 while revving up, -1 while revving down
    rpm_direction: f64,
}

impl Default for DemoSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoSimulator {
    /// Create a new simulator at standstill and idle
    pub fn new() -> Self {
        Self {
            speed: 0.0,
            rpm: DEMO_RPM_MIN,
            rpm_direction: 1.0,
        }
    }

    /// Advance one tick
    pub fn step(&mut self) -> DemoSample {
        self.speed += DEMO_SPEED_STEP;
        if self.speed > DEMO_SPEED_MAX {
            self.speed = 0.0;
        }

        self.rpm += DEMO_RPM_STEP * self.rpm_direction;
        if self.rpm >= DEMO_RPM_MAX {
            self.rpm_direction = -1.0;
        } else if self.rpm <= DEMO_RPM_MIN {
            self.rpm_direction = 1.0;
        }

        DemoSample {
            speed: self.speed,
            rpm: self.rpm,
        }
    }

    /// Current output without advancing
    pub fn sample(&self) -> DemoSample {
        DemoSample {
            speed: self.speed,
            rpm: self.rpm,
        }
    }

    /// Overwrite the auxiliary gauges with fixed demo values
    ///
    /// Battery and dimmer readings keep whatever they held.
    pub fn fill_aux(&self, aux: &mut AuxReadings) {
        aux.fuel_level = 65.0;
        aux.oil_pressure = 40.0;
        aux.coolant_temp = 185.0;
        aux.oil_temp = 200.0;
        aux.fuel_consumption = 2.5;
        aux.fuel_flow = 0.8;
    }
}
