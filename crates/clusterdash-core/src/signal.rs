//! Signal conditioning
//!
//! Converts the raw, intermittently present speed and RPM readings into
//! stable display values. Both signals share the same staleness rule: if no
//! reading arrives for [`SIGNAL_TIMEOUT_MS`] the display value drops to zero.
//!
//! All timestamps are milliseconds from the render loop's monotonic clock.

/// RPM changes smaller than this are treated as idle jitter
pub const RPM_DEADBAND: f64 = 50.0;

/// Fraction of the remaining gap closed per RPM update outside the deadband
pub const RPM_FAST_ALPHA: f64 = 0.9;

/// Time without a reading after which a signal is considered absent
pub const SIGNAL_TIMEOUT_MS: u64 = 500;

/// Raw engine speed as last reported
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Rpm {
    /// A reading arrived within the timeout
    Known(f64),
    /// No signal
    #[default]
    Unknown,
}

impl Rpm {
    /// The reading, when one is known
    pub fn value(self) -> Option<f64> {
        match self {
            Rpm::Known(v) => Some(v),
            Rpm::Unknown => None,
        }
    }

    /// Whether a reading is known
    pub fn is_known(self) -> bool {
        matches!(self, Rpm::Known(_))
    }
}

fn timed_out(last_update_ms: Option<u64>, now_ms: u64) -> bool {
    match last_update_ms {
        Some(last) => now_ms.saturating_sub(last) >= SIGNAL_TIMEOUT_MS,
        None => false,
    }
}

/// Deadband plus single-pole smoothing for RPM
///
/// A reading inside the deadband leaves the display untouched; anything
/// larger moves the display 90% of the way to the reading. The first reading
/// after startup or after a timeout is taken as-is.
#[derive(Debug, Clone, Default)]
pub struct RpmFilter {
    raw: Rpm,
    display: f64,
    last_update_ms: Option<u64>,
}

impl RpmFilter {
    /// Filter with no reading yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw reading, returning the new display value
    pub fn update(&mut self, raw: f64, now_ms: u64) -> f64 {
        let primed = self.raw.is_known();
        self.raw = Rpm::Known(raw);
        self.last_update_ms = Some(now_ms);

        if !primed {
            self.display = raw;
            return self.display;
        }

        let diff = (raw - self.display).abs();
        if diff >= RPM_DEADBAND {
            self.display += (raw - self.display) * RPM_FAST_ALPHA;
        }
        self.display
    }

    /// Drop to no-signal if the last reading is too old
    ///
    /// Returns true on the tick the timeout fires.
    pub fn check_timeout(&mut self, now_ms: u64) -> bool {
        if !timed_out(self.last_update_ms, now_ms) {
            return false;
        }
        self.raw = Rpm::Unknown;
        self.display = 0.0;
        self.last_update_ms = None;
        true
    }

    /// Last raw reading, `Unknown` after a timeout
    pub fn raw(&self) -> Rpm {
        self.raw
    }

    /// Smoothed value for the gauge
    pub fn display(&self) -> f64 {
        self.display
    }

    /// When the last RPM reading arrived
    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }
}

/// Speed passthrough with staleness timeout
///
/// The display tracks the raw reading exactly; only the timeout changes it.
#[derive(Debug, Clone, Default)]
pub struct SpeedFilter {
    raw: f64,
    display: f64,
    last_update_ms: Option<u64>,
}

impl SpeedFilter {
    /// Filter with no reading yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw reading, returning the new display value
    pub fn update(&mut self, raw: f64, now_ms: u64) -> f64 {
        self.raw = raw;
        self.display = raw;
        self.last_update_ms = Some(now_ms);
        self.display
    }

    /// Zero the display if the last reading is too old
    ///
    /// The raw value is kept so the last reported speed stays inspectable.
    pub fn check_timeout(&mut self, now_ms: u64) -> bool {
        if !timed_out(self.last_update_ms, now_ms) {
            return false;
        }
        self.display = 0.0;
        self.last_update_ms = None;
        true
    }

    /// Last raw reading
    pub fn raw(&self) -> f64 {
        self.raw
    }

    /// Value for the gauge, zero after a timeout
    pub fn display(&self) -> f64 {
        self.display
    }

    /// When the last SPEED reading arrived
    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }
}

/// Both conditioned signals
#[derive(Debug, Clone, Default)]
pub struct SignalConditioner {
    /// RPM conditioning
    pub rpm: RpmFilter,
    /// Speed conditioning
    pub speed: SpeedFilter,
}

impl SignalConditioner {
    /// Conditioner with no readings yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply whichever readings a frame carried
    pub fn ingest(&mut self, speed: Option<f64>, rpm: Option<f64>, now_ms: u64) {
        if let Some(speed) = speed {
            self.speed.update(speed, now_ms);
        }
        if let Some(rpm) = rpm {
            self.rpm.update(rpm, now_ms);
        }
    }

    /// Run both staleness checks
    pub fn check_timeouts(&mut self, now_ms: u64) {
        if self.speed.check_timeout(now_ms) {
            tracing::debug!(now_ms, "speed signal timed out");
        }
        if self.rpm.check_timeout(now_ms) {
            tracing::debug!(now_ms, "rpm signal timed out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rpm_reading_snaps() {
        let mut rpm = RpmFilter::new();
        assert_eq!(rpm.raw(), Rpm::Unknown);
        assert_eq!(rpm.update(820.0, 0), 820.0);
        assert_eq!(rpm.raw(), Rpm::Known(820.0));
    }

    #[test]
    fn test_deadband_holds_display() {
        let mut rpm = RpmFilter::new();
        rpm.update(800.0, 0);
        for (i, raw) in [830.0, 770.0, 849.9, 750.1].into_iter().enumerate() {
            assert_eq!(rpm.update(raw, 10 * (i as u64 + 1)), 800.0);
        }
    }

    #[test]
    fn test_fast_branch_closes_ninety_percent() {
        let mut rpm = RpmFilter::new();
        rpm.update(800.0, 0);
        let display = rpm.update(3000.0, 16);
        assert!((display - (800.0 + 2200.0 * 0.9)).abs() < 1e-9);

        let display = rpm.update(1000.0, 32);
        let expected = 2780.0 + (1000.0 - 2780.0) * 0.9;
        assert!((display - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rpm_zero_reading_is_a_signal() {
        let mut rpm = RpmFilter::new();
        rpm.update(0.0, 0);
        assert_eq!(rpm.raw(), Rpm::Known(0.0));
        // A known zero does not re-arm the snap
        assert_eq!(rpm.update(30.0, 10), 0.0);
    }

    #[test]
    fn test_rpm_timeout_resets_and_rearms_snap() {
        let mut rpm = RpmFilter::new();
        rpm.update(2500.0, 1000);
        assert!(!rpm.check_timeout(1499));
        assert_eq!(rpm.display(), 2500.0);

        assert!(rpm.check_timeout(1500));
        assert_eq!(rpm.raw(), Rpm::Unknown);
        assert_eq!(rpm.display(), 0.0);
        assert!(!rpm.check_timeout(5000));

        assert_eq!(rpm.update(900.0, 6000), 900.0);
    }

    #[test]
    fn test_speed_passthrough_and_timeout() {
        let mut speed = SpeedFilter::new();
        assert_eq!(speed.update(37.2, 100), 37.2);
        assert!(!speed.check_timeout(599));
        assert!(speed.check_timeout(601));
        assert_eq!(speed.display(), 0.0);
        assert_eq!(speed.raw(), 37.2);
    }

    #[test]
    fn test_never_received_does_not_time_out() {
        let mut conditioner = SignalConditioner::new();
        conditioner.check_timeouts(10_000);
        assert_eq!(conditioner.speed.display(), 0.0);
        assert_eq!(conditioner.rpm.raw(), Rpm::Unknown);
    }
}
