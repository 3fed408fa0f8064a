//! Live vehicle readings
//!
//! Everything the renderer draws apart from the conditioned speed and RPM,
//! which live in [`crate::signal`]. Values are canonical units (MPH, °F,
//! PSI, miles, MPG); conversion happens at presentation time via
//! [`UnitSystem`].

use crate::odometer::InstantEconomy;
use crate::protocol::{SwitchFlags, TelemetryFrame};
use crate::unit_conversion::UnitSystem;

/// Themes that draw the idle GPH figure on a ×10 scale
const SCALED_GPH_STYLES: [u8; 2] = [0, 4];

/// Last known auxiliary sensor readings
#[derive(Debug, Clone, PartialEq)]
pub struct AuxReadings {
    /// Percent
    pub fuel_level: f64,
    /// PSI
    pub oil_pressure: f64,
    /// °F
    pub coolant_temp: f64,
    /// °F
    pub oil_temp: f64,
    /// Volts
    pub battery_voltage: f64,
    /// Dimmer position, percent
    pub brightness: f64,
    /// lb/hr
    pub fuel_consumption: f64,
    /// Miles
    pub fuel_range: f64,
    /// Raw `IMPG` value, see [`InstantEconomy::decode`]
    pub instant_mpg: f64,
    /// Average economy shown on the gauge, MPG
    pub average_mpg: f64,
    /// Gallons/hour
    pub fuel_flow: f64,
}

impl Default for AuxReadings {
    fn default() -> Self {
        Self {
            fuel_level: 50.0,
            oil_pressure: 40.0,
            coolant_temp: 185.0,
            oil_temp: 200.0,
            battery_voltage: 12.6,
            brightness: 75.0,
            fuel_consumption: 0.0,
            fuel_range: 0.0,
            instant_mpg: 0.0,
            average_mpg: 0.0,
            fuel_flow: 0.0,
        }
    }
}

/// Gauge selector switch positions, all off until reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaugeSwitches {
    /// Oil pressure gauge selected
    pub oil_pressure: bool,
    /// Oil temperature gauge selected
    pub oil_temp: bool,
    /// Coolant gauge selected
    pub coolant_temp: bool,
    /// Voltmeter selected
    pub volts: bool,
    /// Fuel range readout selected
    pub fuel_range: bool,
    /// Trip odometer readout selected
    pub trip_odo: bool,
    /// Instant economy readout selected
    pub inst_mpg: bool,
    /// Average economy readout selected
    pub avg_mpg: bool,
    /// Metric units selected
    pub metric: bool,
}

impl GaugeSwitches {
    /// Take every switch the frame reported, keep the rest
    pub fn apply(&mut self, flags: &SwitchFlags) {
        let pairs = [
            (&mut self.oil_pressure, flags.oil_pressure),
            (&mut self.oil_temp, flags.oil_temp),
            (&mut self.coolant_temp, flags.coolant_temp),
            (&mut self.volts, flags.volts),
            (&mut self.fuel_range, flags.fuel_range),
            (&mut self.trip_odo, flags.trip_odo),
            (&mut self.inst_mpg, flags.inst_mpg),
            (&mut self.avg_mpg, flags.avg_mpg),
            (&mut self.metric, flags.metric),
        ];
        for (slot, value) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Auxiliary readings, switches and button lamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    /// Auxiliary gauge readings
    pub aux: AuxReadings,
    /// Gauge selector switches
    pub switches: GaugeSwitches,
    /// Trip button currently pressed, for visual feedback
    pub trip_button: bool,
    /// Average button currently pressed, for visual feedback
    pub avg_button: bool,
    /// Controller's own trip odometer, when it reports one
    pub controller_trip: Option<f64>,
    /// Controller's own total odometer, when it reports one
    pub controller_total: Option<f64>,
}

impl VehicleState {
    /// State with startup defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy in every auxiliary field, switch and button the frame carried
    ///
    /// Speed and RPM are left to the signal conditioner.
    pub fn apply_frame(&mut self, frame: &TelemetryFrame) {
        let aux = &mut self.aux;
        let fields = [
            (&mut aux.fuel_level, frame.fuel_level),
            (&mut aux.oil_pressure, frame.oil_pressure),
            (&mut aux.coolant_temp, frame.coolant_temp),
            (&mut aux.oil_temp, frame.oil_temp),
            (&mut aux.battery_voltage, frame.battery_voltage),
            (&mut aux.brightness, frame.brightness),
            (&mut aux.fuel_consumption, frame.fuel_consumption),
            (&mut aux.fuel_range, frame.fuel_range),
            (&mut aux.instant_mpg, frame.instant_mpg),
            (&mut aux.average_mpg, frame.average_mpg),
            (&mut aux.fuel_flow, frame.fuel_flow),
        ];
        for (slot, value) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if frame.trip_odo.is_some() {
            self.controller_trip = frame.trip_odo;
        }
        if frame.total_odo.is_some() {
            self.controller_total = frame.total_odo;
        }

        self.switches.apply(&frame.switches);
        if let Some(pressed) = frame.trip_button {
            self.trip_button = pressed;
        }
        if let Some(pressed) = frame.avg_button {
            self.avg_button = pressed;
        }
    }

    /// Unit system selected by the metric switch
    pub fn units(&self) -> UnitSystem {
        UnitSystem::from_metric_switch(self.switches.metric)
    }

    /// Decoded instant economy for the given theme
    pub fn instant_economy(&self, style: u8) -> InstantEconomy {
        InstantEconomy::decode(
            self.aux.instant_mpg,
            self.aux.fuel_flow,
            SCALED_GPH_STYLES.contains(&style),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_line, DecodedLine};

    fn frame(line: &str) -> TelemetryFrame {
        match parse_line(line) {
            Some(DecodedLine::Frame(f)) => f,
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_frame_keeps_other_readings() {
        let mut state = VehicleState::new();
        state.apply_frame(&frame("OIL:55,COOLANT:201"));
        assert_eq!(state.aux.oil_pressure, 55.0);
        assert_eq!(state.aux.coolant_temp, 201.0);
        assert_eq!(state.aux.fuel_level, 50.0);
        assert_eq!(state.aux.battery_voltage, 12.6);
    }

    #[test]
    fn test_switches_and_buttons() {
        let mut state = VehicleState::new();
        state.apply_frame(&frame("METR_SW:1,TRIP_SW:1,TRIP_BTN:1"));
        assert!(state.switches.metric);
        assert!(state.switches.trip_odo);
        assert!(!state.switches.volts);
        assert!(state.trip_button);
        assert_eq!(state.units(), UnitSystem::Metric);

        state.apply_frame(&frame("METR_SW:0"));
        assert_eq!(state.units(), UnitSystem::Imperial);
        assert!(state.switches.trip_odo);
        assert!(state.trip_button);
    }

    #[test]
    fn test_instant_economy_scaling_by_style() {
        let mut state = VehicleState::new();
        state.apply_frame(&frame("IMPG:0,FLOW:1.5"));
        assert_eq!(state.instant_economy(1), InstantEconomy::GallonsPerHour(1.5));
        assert_eq!(state.instant_economy(4), InstantEconomy::GallonsPerHour(0.15));
    }
}
