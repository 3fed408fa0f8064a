//! Dashboard core
//!
//! [`DashboardCore`] owns every component and is advanced once per render
//! tick. Per tick, depending on the link:
//!
//! - never connected: step the demo sweep
//! - connected: decode at most one line, apply it, then run staleness checks
//! - lost: nothing changes, readings stay frozen
//!
//! and in every case refresh the brightness outputs.

use crate::brightness::BrightnessController;
use crate::config::DashboardConfig;
use crate::connection::{ConnectionState, Link};
use crate::demo::DemoSimulator;
use crate::gestures::{ButtonGestures, GestureEvent};
use crate::odometer::{DistanceAccumulator, InstantEconomy};
use crate::protocol::{ByteChannel, Command, DecodedLine, DecoderStats, OutboundMessage, TelemetryFrame};
use crate::signal::{Rpm, SignalConditioner};
use crate::store::{PersistentStore, StoreError, BACKUP_INTERVAL};
use crate::vehicle::VehicleState;

/// Log a failed store operation; memory stays authoritative either way
fn log_store_result<T>(what: &str, result: Result<T, StoreError>) {
    if let Err(e) = result {
        tracing::warn!(what, error = %e, "failed to save persistent data");
    }
}

/// All live dashboard state
#[derive(Debug)]
pub struct DashboardCore {
    link: Link,
    signals: SignalConditioner,
    distance: DistanceAccumulator,
    gestures: ButtonGestures,
    store: PersistentStore,
    vehicle: VehicleState,
    demo: DemoSimulator,
    brightness: BrightnessController,
}

impl DashboardCore {
    /// Assemble a core around a loaded store, seeding the average economy from it
    pub fn new(store: PersistentStore, brightness: BrightnessController) -> Self {
        let mut distance = DistanceAccumulator::new();
        let record = store.record();
        distance.refresh_average(
            record.trip_odometer,
            record.fuel_used,
            record.fuel_used_secondary,
        );

        let mut vehicle = VehicleState::new();
        vehicle.aux.average_mpg = distance.average_mpg();

        Self {
            link: Link::new(),
            signals: SignalConditioner::new(),
            distance,
            gestures: ButtonGestures::new(),
            store,
            vehicle,
            demo: DemoSimulator::new(),
            brightness,
        }
    }

    /// Load the store and backlight settings named by `config`
    pub fn from_config(config: &DashboardConfig) -> Self {
        let store =
            PersistentStore::load_with(&config.data_path, config.save_thresholds, BACKUP_INTERVAL);
        let brightness = BrightnessController::new(config.backlight_paths.clone());
        Self::new(store, brightness)
    }

    /// Start reading from the controller and push the stored fuel counters
    ///
    /// The next SPEED reading only seeds the distance timestamp.
    pub fn attach_channel(&mut self, channel: Box<dyn ByteChannel>) {
        self.link.attach(channel);
        self.distance.reset();
        self.gestures.reset();
        self.send_init_payload();
    }

    fn send_init_payload(&mut self) {
        let store = &self.store;
        self.link
            .write_with("init payload", |channel| store.send_init_payload(channel));
    }

    /// Advance one render tick
    pub fn tick(&mut self, now_ms: u64) {
        match self.link.state() {
            ConnectionState::NeverConnected => {
                self.demo.step();
                self.demo.fill_aux(&mut self.vehicle.aux);
            }
            ConnectionState::Connected => {
                match self.link.poll() {
                    Some(DecodedLine::Frame(frame)) => self.handle_frame(&frame, now_ms),
                    Some(DecodedLine::Command(command)) => self.handle_command(command),
                    None => {}
                }
                if self.link.is_connected() {
                    self.signals.check_timeouts(now_ms);
                }
            }
            ConnectionState::Lost => {}
        }

        self.brightness
            .update(self.link.is_connected(), self.vehicle.aux.brightness);
    }

    /// Apply one telemetry frame
    pub fn handle_frame(&mut self, frame: &TelemetryFrame, now_ms: u64) {
        self.signals.ingest(frame.speed, frame.rpm, now_ms);

        if let Some(speed) = frame.speed {
            self.integrate_distance(speed, now_ms);
        }

        // The controller's own AMPG, when sent, wins over the computed average
        self.vehicle.apply_frame(frame);

        if let Some((trip, avg)) = frame.buttons() {
            if let Some(event) = self.gestures.update(trip, avg, now_ms) {
                self.handle_gesture(event);
            }
        }

        if let Some((total, trip, fuel_used)) = frame.odometer_snapshot() {
            let secondary = self.store.record().fuel_used_secondary;
            log_store_result(
                "controller snapshot",
                self.store.update(total, trip, fuel_used, secondary),
            );
        }
    }

    fn integrate_distance(&mut self, speed: f64, now_ms: u64) {
        let record = self.store.record();
        let (mut total, mut trip) = (record.total_odometer, record.trip_odometer);
        let (fuel_used, secondary) = (record.fuel_used, record.fuel_used_secondary);

        let step = self.distance.integrate(
            speed,
            now_ms,
            &mut total,
            &mut trip,
            fuel_used,
            secondary,
        );
        if step.is_none() {
            return;
        }

        self.vehicle.aux.average_mpg = self.distance.average_mpg();
        log_store_result(
            "odometer",
            self.store.update(total, trip, fuel_used, secondary),
        );
    }

    /// Apply one command from the controller
    pub fn handle_command(&mut self, command: Command) {
        tracing::debug!(?command, "controller command");
        match command {
            Command::InitRequest => self.send_init_payload(),
            Command::ResetTrip => {
                self.reset_trip();
                self.link.send(OutboundMessage::AvgMpgUpdate(0.0));
            }
            Command::StyleChange => self.advance_style(),
            Command::SaveData {
                fuel_used,
                fuel_used_secondary,
            } => {
                log_store_result(
                    "fuel data",
                    self.store.set_fuel(fuel_used, fuel_used_secondary),
                );
            }
        }
    }

    fn handle_gesture(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::TripReset => {
                tracing::info!("trip reset by button hold");
                self.reset_trip();
            }
            GestureEvent::AvgReset => {
                // The controller owns the average; nothing to reset locally
                tracing::info!("average reset requested by button hold");
            }
            GestureEvent::StyleAdvance => self.advance_style(),
        }
    }

    fn reset_trip(&mut self) {
        log_store_result("trip reset", self.store.reset_trip());
        let record = self.store.record();
        self.distance
            .refresh_average(0.0, record.fuel_used, record.fuel_used_secondary);
        self.vehicle.aux.average_mpg = self.distance.average_mpg();
    }

    fn advance_style(&mut self) {
        let from = self.store.record().dashboard_style;
        log_store_result("dashboard style", self.store.advance_style());
        tracing::info!(from, to = self.store.record().dashboard_style, "dashboard style changed");
    }

    /// Close the link and write any unsaved state
    pub fn shutdown(&mut self) {
        self.link.close();
        match self.store.flush() {
            Ok(true) => tracing::info!("persistent data flushed on shutdown"),
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "failed to flush persistent data on shutdown"),
        }
    }

    /// State of the controller link
    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    /// Speed to draw, MPH
    pub fn speed(&self) -> f64 {
        match self.link.state() {
            ConnectionState::NeverConnected => self.demo.sample().speed,
            _ => self.signals.speed.display(),
        }
    }

    /// Smoothed RPM to draw
    pub fn rpm(&self) -> f64 {
        match self.link.state() {
            ConnectionState::NeverConnected => self.demo.sample().rpm,
            _ => self.signals.rpm.display(),
        }
    }

    /// Last raw RPM, `Unknown` when the signal is absent
    pub fn raw_rpm(&self) -> Rpm {
        self.signals.rpm.raw()
    }

    /// Auxiliary readings, switches and button lamps
    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    /// Persistent odometer, fuel and theme record
    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    /// Speed and RPM conditioning state
    pub fn signals(&self) -> &SignalConditioner {
        &self.signals
    }

    /// Button hold timers
    pub fn gestures(&self) -> &ButtonGestures {
        &self.gestures
    }

    /// Line decoder counters
    pub fn decoder_stats(&self) -> DecoderStats {
        self.link.decoder_stats()
    }

    /// Selected theme
    pub fn dashboard_style(&self) -> u8 {
        self.store.record().dashboard_style
    }

    /// Instant economy readout for the selected theme
    pub fn instant_economy(&self) -> InstantEconomy {
        self.vehicle.instant_economy(self.dashboard_style())
    }

    /// Software dimming factor for the renderer
    pub fn software_brightness(&self) -> f64 {
        self.brightness.software_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MemoryChannel;
    use tempfile::TempDir;

    fn core_in(dir: &TempDir) -> DashboardCore {
        let store = PersistentStore::load(dir.path().join("data.json"));
        DashboardCore::new(store, BrightnessController::new(Vec::new()))
    }

    #[test]
    fn test_demo_until_connected() {
        let dir = TempDir::new().unwrap();
        let mut core = core_in(&dir);

        core.tick(0);
        core.tick(16);
        assert_eq!(core.connection_state(), ConnectionState::NeverConnected);
        assert!((core.speed() - 0.8).abs() < 1e-9);
        assert_eq!(core.rpm(), 900.0);
        assert_eq!(core.vehicle().aux.fuel_level, 65.0);
        assert_eq!(core.software_brightness(), 0.75);
    }

    #[test]
    fn test_frame_then_freeze_on_loss() {
        let dir = TempDir::new().unwrap();
        let mut core = core_in(&dir);
        let channel = MemoryChannel::new();
        core.attach_channel(Box::new(channel.clone()));

        channel.feed_str("SPEED:42,RPM:2500,BRIGHTNESS:100\n");
        core.tick(100);
        assert_eq!(core.speed(), 42.0);
        assert_eq!(core.rpm(), 2500.0);
        assert_eq!(core.software_brightness(), 1.0);

        channel.fail_reads(true);
        core.tick(116);
        assert_eq!(core.connection_state(), ConnectionState::Lost);

        // Long past the timeout, values stay frozen
        core.tick(10_000);
        assert_eq!(core.speed(), 42.0);
        assert_eq!(core.rpm(), 2500.0);
        assert_eq!(core.software_brightness(), 0.75);
    }

    #[test]
    fn test_timeout_on_silent_link() {
        let dir = TempDir::new().unwrap();
        let mut core = core_in(&dir);
        let channel = MemoryChannel::new();
        core.attach_channel(Box::new(channel.clone()));

        channel.feed_str("SPEED:42,RPM:2500\n");
        core.tick(100);
        core.tick(599);
        assert_eq!(core.speed(), 42.0);
        core.tick(600);
        assert_eq!(core.speed(), 0.0);
        assert_eq!(core.raw_rpm(), Rpm::Unknown);
    }

    #[test]
    fn test_init_payload_sent_on_attach() {
        let dir = TempDir::new().unwrap();
        let mut core = core_in(&dir);
        core.store.set_fuel(3.0, 1.0).unwrap();
        core.store.update(core.store.record().total_odometer, 80.0, 3.0, 1.0).unwrap();

        let channel = MemoryChannel::new();
        core.attach_channel(Box::new(channel.clone()));
        assert_eq!(
            channel.take_written(),
            "INIT_DATA:3.0000,1.0000\nAVG_MPG_UPDATE:20.0\n"
        );
    }

    #[test]
    fn test_init_request_reply() {
        let dir = TempDir::new().unwrap();
        let mut core = core_in(&dir);
        let channel = MemoryChannel::new();
        core.attach_channel(Box::new(channel.clone()));
        channel.take_written();

        channel.feed_str("SAVE_DATA:1.5,0.25\n");
        core.tick(0);
        channel.feed_str("INIT_REQUEST:PERSISTENT_DATA\n");
        core.tick(16);
        assert_eq!(
            channel.take_written(),
            "INIT_DATA:1.5000,0.2500\nAVG_MPG_UPDATE:0.0\n"
        );
    }
}
