//! Render loop driver
//!
//! Opens the controller link, then advances a [`DashboardCore`] at the
//! configured rate until the shutdown flag is raised. Drawing is left to the
//! caller, which gets the core once per tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::DashboardConfig;
use crate::dashboard::DashboardCore;
use crate::protocol::{find_device_port, open_port, ByteChannel, ProtocolError, SerialChannel};

/// Port tried when nothing answers a probe
pub const FALLBACK_PORT: &str = "/dev/ttyACM0";

/// Millisecond tick counter starting at zero
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Clock starting at zero now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since the clock was created
    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Raise the returned flag on SIGINT or SIGTERM
pub fn install_shutdown_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;
    Ok(flag)
}

/// Open the controller link named by the config, or probe for one
pub fn open_channel(config: &DashboardConfig) -> Result<Box<dyn ByteChannel>, ProtocolError> {
    let settings = &config.connection;
    let name = match &settings.port {
        Some(port) => port.clone(),
        None => find_device_port(settings.baud_rate).unwrap_or_else(|| FALLBACK_PORT.to_string()),
    };

    let port = open_port(&name, Some(settings.baud_rate), Some(settings.timeout_ms))?;
    tracing::info!(port = %name, baud = settings.baud_rate, "connected to cluster controller");
    Ok(Box::new(SerialChannel::new(port)))
}

/// Run until `shutdown` is raised, calling `render` after every tick
///
/// A link that cannot be opened at startup leaves the dashboard in demo
/// mode for the whole run. The store is flushed before returning.
pub fn run<F>(config: &DashboardConfig, shutdown: Arc<AtomicBool>, render: F) -> DashboardCore
where
    F: FnMut(&DashboardCore),
{
    let mut core = DashboardCore::from_config(config);
    match open_channel(config) {
        Ok(channel) => core.attach_channel(channel),
        Err(e) => tracing::warn!(error = %e, "no controller, running in demo mode"),
    }

    drive(
        &mut core,
        Duration::from_millis(config.tick_interval_ms()),
        &shutdown,
        render,
    );
    core
}

/// Tick `core` every `interval` until `shutdown` is raised, then shut it down
pub fn drive<F>(core: &mut DashboardCore, interval: Duration, shutdown: &AtomicBool, mut render: F)
where
    F: FnMut(&DashboardCore),
{
    let clock = MonotonicClock::new();

    while !shutdown.load(Ordering::SeqCst) {
        let started = Instant::now();
        core.tick(clock.now_ms());
        render(core);

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    tracing::info!("shutting down");
    core.shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brightness::BrightnessController;
    use crate::protocol::MemoryChannel;
    use crate::store::PersistentStore;
    use tempfile::TempDir;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        thread::sleep(Duration::from_millis(5));
        let b = clock.now_ms();
        assert!(b >= a + 5);
    }

    #[test]
    fn test_drive_stops_on_flag_and_flushes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = PersistentStore::load(&path);
        let mut core = DashboardCore::new(store, BrightnessController::new(Vec::new()));

        let channel = MemoryChannel::new();
        core.attach_channel(Box::new(channel.clone()));
        // Below every threshold, so only the shutdown flush writes it
        channel.feed_str("TOTAL_ODO:89240.55,TRIP_ODO:0.05,FUEL_USED:0.005\n");

        let shutdown = AtomicBool::new(false);
        let mut ticks = 0;
        drive(&mut core, Duration::from_millis(1), &shutdown, |_| {
            ticks += 1;
            if ticks == 3 {
                shutdown.store(true, Ordering::SeqCst);
            }
        });

        assert_eq!(ticks, 3);
        assert!(!core.store().is_dirty());
        let on_disk = crate::store::read_record(&path).unwrap();
        assert_eq!(on_disk.trip_odometer, 0.05);
    }
}
