//! Display brightness from the dimmer channel
//!
//! The dimmer percentage drives two things: a software dimming factor the
//! renderer multiplies into every frame, and the panel backlight through
//! sysfs. The backlight is only rewritten when the request moves by more
//! than [`BACKLIGHT_HYSTERESIS`] points, since each write is a syscall on
//! the render thread.

use std::fs;
use std::path::PathBuf;

/// Lowest dimmer percentage honoured; the panels never go fully dark
pub const MIN_BRIGHTNESS_PERCENT: f64 = 20.0;

/// Highest dimmer percentage honoured
pub const MAX_BRIGHTNESS_PERCENT: f64 = 100.0;

/// Backlight request used while no controller is connected
pub const DISCONNECTED_BRIGHTNESS_PERCENT: f64 = 90.0;

/// Software dimming factor while no controller is connected
pub const DISCONNECTED_SOFTWARE_FACTOR: f64 = 0.75;

/// Minimum change in percent before the backlight is rewritten
pub const BACKLIGHT_HYSTERESIS: f64 = 2.0;

/// Backlight control files tried in order; the first writable one wins
pub const DEFAULT_BACKLIGHT_PATHS: [&str; 3] = [
    "/sys/class/backlight/rpi_backlight/brightness",
    "/sys/class/backlight/10-0045/brightness",
    "/sys/class/backlight/backlight/brightness",
];

/// Software dimming factor in `0.2..=1.0` for a dimmer percentage
pub fn software_factor(percent: f64) -> f64 {
    let p = percent.clamp(MIN_BRIGHTNESS_PERCENT, MAX_BRIGHTNESS_PERCENT);
    0.2 + (p - MIN_BRIGHTNESS_PERCENT) / 80.0 * 0.8
}

/// Raw backlight level (51 at 20%, 255 at 100%) for a dimmer percentage
pub fn backlight_level(percent: f64) -> u32 {
    let p = percent.clamp(MIN_BRIGHTNESS_PERCENT, MAX_BRIGHTNESS_PERCENT);
    (51.0 + (p - MIN_BRIGHTNESS_PERCENT) / 80.0 * 204.0) as u32
}

/// Dimmer to display mapping with backlight write rate limiting
#[derive(Debug, Clone)]
pub struct BrightnessController {
    backlight_paths: Vec<PathBuf>,
    last_requested: Option<f64>,
    software_factor: f64,
}

impl Default for BrightnessController {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLIGHT_PATHS.iter().map(PathBuf::from).collect())
    }
}

impl BrightnessController {
    /// Controller writing to the first usable path in `backlight_paths`
    pub fn new(backlight_paths: Vec<PathBuf>) -> Self {
        Self {
            backlight_paths,
            last_requested: None,
            software_factor: 1.0,
        }
    }

    /// Recompute for this tick
    ///
    /// `dimmer_percent` is only used while connected. Returns the backlight
    /// level when a write to the backlight was attempted.
    pub fn update(&mut self, connected: bool, dimmer_percent: f64) -> Option<u32> {
        let (requested, factor) = if connected {
            (dimmer_percent, software_factor(dimmer_percent))
        } else {
            (DISCONNECTED_BRIGHTNESS_PERCENT, DISCONNECTED_SOFTWARE_FACTOR)
        };
        self.software_factor = factor;

        let due = match self.last_requested {
            None => true,
            Some(last) => (requested - last).abs() > BACKLIGHT_HYSTERESIS,
        };
        if !due {
            return None;
        }

        self.last_requested = Some(requested);
        let level = backlight_level(requested);
        self.write_backlight(level);
        Some(level)
    }

    /// Current software dimming factor
    pub fn software_factor(&self) -> f64 {
        self.software_factor
    }

    /// Percent last sent to the backlight
    pub fn last_requested(&self) -> Option<f64> {
        self.last_requested
    }

    fn write_backlight(&self, level: u32) {
        for path in &self.backlight_paths {
            if !path.exists() {
                continue;
            }
            match fs::write(path, level.to_string()) {
                Ok(()) => return,
                Err(e) => {
                    tracing::trace!(path = %path.display(), error = %e, "backlight write failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mappings() {
        assert_eq!(software_factor(100.0), 1.0);
        assert_eq!(software_factor(20.0), 0.2);
        assert_eq!(software_factor(0.0), 0.2);
        assert!((software_factor(60.0) - 0.6).abs() < 1e-9);

        assert_eq!(backlight_level(100.0), 255);
        assert_eq!(backlight_level(5.0), 51);
        assert_eq!(backlight_level(60.0), 153);
    }

    #[test]
    fn test_out_of_range_dimmer_clamped() {
        assert_eq!(backlight_level(150.0), 255);
        assert_eq!(software_factor(150.0), 1.0);

        let mut controller = BrightnessController::new(Vec::new());
        assert_eq!(controller.update(true, 250.0), Some(255));
        assert_eq!(controller.software_factor(), 1.0);
    }

    #[test]
    fn test_hysteresis_and_first_writable_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let target = dir.path().join("brightness");
        fs::write(&target, "0").unwrap();

        let mut controller = BrightnessController::new(vec![missing.clone(), target.clone()]);
        assert_eq!(controller.update(true, 60.0), Some(153));
        assert_eq!(fs::read_to_string(&target).unwrap(), "153");

        assert_eq!(controller.update(true, 62.0), None);
        assert_eq!(controller.update(true, 62.5), Some(159));
        assert!(!missing.exists());
    }

    #[test]
    fn test_disconnected_defaults() {
        let mut controller = BrightnessController::new(Vec::new());
        assert_eq!(controller.update(false, 10.0), Some(backlight_level(90.0)));
        assert_eq!(controller.software_factor(), 0.75);
        assert_eq!(controller.update(false, 100.0), None);
    }
}
