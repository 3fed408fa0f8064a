//! Decoded telemetry frames and commands

use std::str::FromStr;

/// Every telemetry key the controller sends
///
/// Keys are case-sensitive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKey {
    /// `SPEED`
    Speed,
    /// `RPM`
    Rpm,
    /// `FUEL`
    Fuel,
    /// `OIL`
    Oil,
    /// `COOLANT`
    Coolant,
    /// `OILTEMP`
    OilTemp,
    /// `BATTERY`
    Battery,
    /// `BRIGHTNESS`
    Brightness,
    /// `FUEL_CONSUMPTION`
    FuelConsumption,
    /// `TRIP_ODO`
    TripOdo,
    /// `TOTAL_ODO`
    TotalOdo,
    /// `FUEL_USED`
    FuelUsed,
    /// `FUELRNG`
    FuelRange,
    /// `IMPG`
    InstantMpg,
    /// `AMPG`
    AverageMpg,
    /// `FLOW`
    Flow,
    /// `OIL_P_SW`
    OilPressureSwitch,
    /// `OIL_T_SW`
    OilTempSwitch,
    /// `COOL_SW`
    CoolantSwitch,
    /// `VOLT_SW`
    VoltSwitch,
    /// `FUELR_SW`
    FuelRangeSwitch,
    /// `TRIP_SW`
    TripSwitch,
    /// `IMPG_SW`
    InstantMpgSwitch,
    /// `AMPG_SW`
    AverageMpgSwitch,
    /// `METR_SW`
    MetricSwitch,
    /// `TRIP_BTN`
    TripButton,
    /// `AVG_BTN`
    AvgButton,
}

impl FrameKey {
    /// Wire name of the key
    pub fn as_str(self) -> &'static str {
        match self {
            FrameKey::Speed => "SPEED",
            FrameKey::Rpm => "RPM",
            FrameKey::Fuel => "FUEL",
            FrameKey::Oil => "OIL",
            FrameKey::Coolant => "COOLANT",
            FrameKey::OilTemp => "OILTEMP",
            FrameKey::Battery => "BATTERY",
            FrameKey::Brightness => "BRIGHTNESS",
            FrameKey::FuelConsumption => "FUEL_CONSUMPTION",
            FrameKey::TripOdo => "TRIP_ODO",
            FrameKey::TotalOdo => "TOTAL_ODO",
            FrameKey::FuelUsed => "FUEL_USED",
            FrameKey::FuelRange => "FUELRNG",
            FrameKey::InstantMpg => "IMPG",
            FrameKey::AverageMpg => "AMPG",
            FrameKey::Flow => "FLOW",
            FrameKey::OilPressureSwitch => "OIL_P_SW",
            FrameKey::OilTempSwitch => "OIL_T_SW",
            FrameKey::CoolantSwitch => "COOL_SW",
            FrameKey::VoltSwitch => "VOLT_SW",
            FrameKey::FuelRangeSwitch => "FUELR_SW",
            FrameKey::TripSwitch => "TRIP_SW",
            FrameKey::InstantMpgSwitch => "IMPG_SW",
            FrameKey::AverageMpgSwitch => "AMPG_SW",
            FrameKey::MetricSwitch => "METR_SW",
            FrameKey::TripButton => "TRIP_BTN",
            FrameKey::AvgButton => "AVG_BTN",
        }
    }
}

impl FromStr for FrameKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SPEED" => FrameKey::Speed,
            "RPM" => FrameKey::Rpm,
            "FUEL" => FrameKey::Fuel,
            "OIL" => FrameKey::Oil,
            "COOLANT" => FrameKey::Coolant,
            "OILTEMP" => FrameKey::OilTemp,
            "BATTERY" => FrameKey::Battery,
            "BRIGHTNESS" => FrameKey::Brightness,
            "FUEL_CONSUMPTION" => FrameKey::FuelConsumption,
            "TRIP_ODO" => FrameKey::TripOdo,
            "TOTAL_ODO" => FrameKey::TotalOdo,
            "FUEL_USED" => FrameKey::FuelUsed,
            "FUELRNG" => FrameKey::FuelRange,
            "IMPG" => FrameKey::InstantMpg,
            "AMPG" => FrameKey::AverageMpg,
            "FLOW" => FrameKey::Flow,
            "OIL_P_SW" => FrameKey::OilPressureSwitch,
            "OIL_T_SW" => FrameKey::OilTempSwitch,
            "COOL_SW" => FrameKey::CoolantSwitch,
            "VOLT_SW" => FrameKey::VoltSwitch,
            "FUELR_SW" => FrameKey::FuelRangeSwitch,
            "TRIP_SW" => FrameKey::TripSwitch,
            "IMPG_SW" => FrameKey::InstantMpgSwitch,
            "AMPG_SW" => FrameKey::AverageMpgSwitch,
            "METR_SW" => FrameKey::MetricSwitch,
            "TRIP_BTN" => FrameKey::TripButton,
            "AVG_BTN" => FrameKey::AvgButton,
            _ => return Err(()),
        })
    }
}

/// Gauge selector switch states, present only when the frame carried them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchFlags {
    /// Oil pressure gauge selected
    pub oil_pressure: Option<bool>,
    /// Oil temperature gauge selected
    pub oil_temp: Option<bool>,
    /// Coolant gauge selected
    pub coolant_temp: Option<bool>,
    /// Voltmeter selected
    pub volts: Option<bool>,
    /// Fuel range readout selected
    pub fuel_range: Option<bool>,
    /// Trip odometer readout selected
    pub trip_odo: Option<bool>,
    /// Instant economy readout selected
    pub inst_mpg: Option<bool>,
    /// Average economy readout selected
    pub avg_mpg: Option<bool>,
    /// Metric units selected
    pub metric: Option<bool>,
}

/// One decoded line of telemetry
///
/// Each field is `Some` only when its key appeared in the line with a
/// numeric value. Switches and buttons arrive as `0`/`1` floats; any value
/// whose integer part is non-zero counts as on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    /// Vehicle speed, MPH
    pub speed: Option<f64>,
    /// Engine speed, RPM
    pub rpm: Option<f64>,
    /// Fuel level, percent
    pub fuel_level: Option<f64>,
    /// Oil pressure, PSI
    pub oil_pressure: Option<f64>,
    /// Coolant temperature, °F
    pub coolant_temp: Option<f64>,
    /// Oil temperature, °F
    pub oil_temp: Option<f64>,
    /// Battery voltage, V
    pub battery_voltage: Option<f64>,
    /// Dimmer position, percent
    pub brightness: Option<f64>,
    /// Fuel consumption, lb/hr
    pub fuel_consumption: Option<f64>,
    /// Controller's own trip odometer, miles
    pub trip_odo: Option<f64>,
    /// Controller's own total odometer, miles
    pub total_odo: Option<f64>,
    /// Controller's fuel-used accumulator, gallons
    pub fuel_used: Option<f64>,
    /// Remaining range, miles
    pub fuel_range: Option<f64>,
    /// Instant economy (0 = idling, -1 = engine off)
    pub instant_mpg: Option<f64>,
    /// Controller's average economy, MPG
    pub average_mpg: Option<f64>,
    /// Fuel flow, gallons/hour
    pub fuel_flow: Option<f64>,
    /// Gauge selector switches
    pub switches: SwitchFlags,
    /// Trip button pressed
    pub trip_button: Option<bool>,
    /// Average button pressed
    pub avg_button: Option<bool>,
}

fn flag(value: f64) -> bool {
    value.trunc() != 0.0
}

impl TelemetryFrame {
    /// Store a parsed value under its key
    pub fn set(&mut self, key: FrameKey, value: f64) {
        match key {
            FrameKey::Speed => self.speed = Some(value),
            FrameKey::Rpm => self.rpm = Some(value),
            FrameKey::Fuel => self.fuel_level = Some(value),
            FrameKey::Oil => self.oil_pressure = Some(value),
            FrameKey::Coolant => self.coolant_temp = Some(value),
            FrameKey::OilTemp => self.oil_temp = Some(value),
            FrameKey::Battery => self.battery_voltage = Some(value),
            FrameKey::Brightness => self.brightness = Some(value),
            FrameKey::FuelConsumption => self.fuel_consumption = Some(value),
            FrameKey::TripOdo => self.trip_odo = Some(value),
            FrameKey::TotalOdo => self.total_odo = Some(value),
            FrameKey::FuelUsed => self.fuel_used = Some(value),
            FrameKey::FuelRange => self.fuel_range = Some(value),
            FrameKey::InstantMpg => self.instant_mpg = Some(value),
            FrameKey::AverageMpg => self.average_mpg = Some(value),
            FrameKey::Flow => self.fuel_flow = Some(value),
            FrameKey::OilPressureSwitch => self.switches.oil_pressure = Some(flag(value)),
            FrameKey::OilTempSwitch => self.switches.oil_temp = Some(flag(value)),
            FrameKey::CoolantSwitch => self.switches.coolant_temp = Some(flag(value)),
            FrameKey::VoltSwitch => self.switches.volts = Some(flag(value)),
            FrameKey::FuelRangeSwitch => self.switches.fuel_range = Some(flag(value)),
            FrameKey::TripSwitch => self.switches.trip_odo = Some(flag(value)),
            FrameKey::InstantMpgSwitch => self.switches.inst_mpg = Some(flag(value)),
            FrameKey::AverageMpgSwitch => self.switches.avg_mpg = Some(flag(value)),
            FrameKey::MetricSwitch => self.switches.metric = Some(flag(value)),
            FrameKey::TripButton => self.trip_button = Some(flag(value)),
            FrameKey::AvgButton => self.avg_button = Some(flag(value)),
        }
    }

    /// Both button states, when the frame carried both
    pub fn buttons(&self) -> Option<(bool, bool)> {
        Some((self.trip_button?, self.avg_button?))
    }

    /// Controller-side odometer snapshot, when the frame carried all three values
    pub fn odometer_snapshot(&self) -> Option<(f64, f64, f64)> {
        Some((self.total_odo?, self.trip_odo?, self.fuel_used?))
    }
}

/// Command lines sent by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Resend fuel accumulators and average MPG (`INIT_REQUEST:PERSISTENT_DATA`)
    InitRequest,
    /// Zero the trip odometer (`RESET_TRIP:`)
    ResetTrip,
    /// Advance to the next dashboard theme (`STYLE_CHANGE:`)
    StyleChange,
    /// Persist fuel accumulators (`SAVE_DATA:<fuel_used>,<fuel_used_secondary>`)
    SaveData {
        fuel_used: f64,
        fuel_used_secondary: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in [
            FrameKey::Speed,
            FrameKey::FuelConsumption,
            FrameKey::MetricSwitch,
            FrameKey::AvgButton,
        ] {
            assert_eq!(key.as_str().parse::<FrameKey>(), Ok(key));
        }
        assert!("speed".parse::<FrameKey>().is_err());
    }

    #[test]
    fn test_switch_values_truncate() {
        let mut frame = TelemetryFrame::default();
        frame.set(FrameKey::MetricSwitch, 1.0);
        frame.set(FrameKey::TripSwitch, 0.4);
        frame.set(FrameKey::TripButton, 1.0);
        assert_eq!(frame.switches.metric, Some(true));
        assert_eq!(frame.switches.trip_odo, Some(false));
        assert_eq!(frame.buttons(), None);

        frame.set(FrameKey::AvgButton, 0.0);
        assert_eq!(frame.buttons(), Some((true, false)));
    }
}
