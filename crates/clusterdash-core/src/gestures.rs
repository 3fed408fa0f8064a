//! Button hold gestures
//!
//! The controller reports the two steering-column buttons as plain
//! pressed/released levels. Holding one for [`HOLD_TIME_MS`] fires its
//! gesture once; holding both fires the combo instead.

/// How long a button must stay down before its gesture fires
pub const HOLD_TIME_MS: u64 = 1000;

/// A gesture that completed on this update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// Trip button held: zero the trip odometer
    TripReset,
    /// Average button held: average economy reset requested
    AvgReset,
    /// Both held: advance the dashboard theme
    StyleAdvance,
}

/// Hold tracking for one button or the combo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldState {
    /// When the hold began, `None` while released
    pub started_ms: Option<u64>,
    /// Whether this hold already fired
    pub triggered: bool,
}

impl HoldState {
    /// Advance a held input, returning true on the update it fires
    fn hold(&mut self, now_ms: u64) -> bool {
        match self.started_ms {
            None => {
                self.started_ms = Some(now_ms);
                self.triggered = false;
                false
            }
            Some(start) => {
                if !self.triggered && now_ms.saturating_sub(start) >= HOLD_TIME_MS {
                    self.triggered = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn release(&mut self) {
        *self = HoldState::default();
    }

    /// Whether the button is currently timed as held
    pub fn is_held(&self) -> bool {
        self.started_ms.is_some()
    }
}

/// Gesture state machine for the trip and average buttons
///
/// While both buttons are down only the combo is timed; the single timers
/// are left as they are and reset only when their own button comes up. The
/// combo is reset only once both buttons are up, and a fired combo keeps
/// suppressing the single gestures until then, so letting go of one button
/// after a theme change does not also reset the trip.
#[derive(Debug, Clone, Default)]
pub struct ButtonGestures {
    trip: HoldState,
    avg: HoldState,
    combo: HoldState,
}

impl ButtonGestures {
    /// Gestures with no button held
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current button levels, returning a gesture if one fired
    pub fn update(&mut self, trip_pressed: bool, avg_pressed: bool, now_ms: u64) -> Option<GestureEvent> {
        if trip_pressed && avg_pressed {
            return self.combo.hold(now_ms).then_some(GestureEvent::StyleAdvance);
        }

        if !trip_pressed {
            self.trip.release();
        }
        if !avg_pressed {
            self.avg.release();
        }
        if !trip_pressed && !avg_pressed {
            self.combo.release();
        }
        if self.combo.triggered {
            return None;
        }

        let mut fired = None;
        if trip_pressed && self.trip.hold(now_ms) {
            fired = Some(GestureEvent::TripReset);
        }
        if avg_pressed && self.avg.hold(now_ms) {
            fired = Some(GestureEvent::AvgReset);
        }
        fired
    }

    /// Trip button hold timer
    pub fn trip(&self) -> HoldState {
        self.trip
    }

    /// Average button hold timer
    pub fn avg(&self) -> HoldState {
        self.avg
    }

    /// Two-button hold timer
    pub fn combo(&self) -> HoldState {
        self.combo
    }

    /// Forget all holds, e.g. when the link drops mid-press
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_hold_fires_once() {
        let mut g = ButtonGestures::new();
        assert_eq!(g.update(true, false, 0), None);
        assert_eq!(g.update(true, false, 999), None);
        assert_eq!(g.update(true, false, 1000), Some(GestureEvent::TripReset));
        assert_eq!(g.update(true, false, 5000), None);

        assert_eq!(g.update(false, false, 5016), None);
        assert!(!g.trip().is_held());
        assert_eq!(g.update(true, false, 6000), None);
        assert_eq!(g.update(true, false, 7000), Some(GestureEvent::TripReset));
    }

    #[test]
    fn test_short_press_does_nothing() {
        let mut g = ButtonGestures::new();
        g.update(false, true, 0);
        g.update(false, true, 600);
        g.update(false, false, 700);
        assert_eq!(g.update(false, true, 800), None);
        assert_eq!(g.update(false, true, 1700), None);
        assert_eq!(g.update(false, true, 1800), Some(GestureEvent::AvgReset));
    }

    #[test]
    fn test_combo_fires_once_until_both_released() {
        let mut g = ButtonGestures::new();
        assert_eq!(g.update(true, true, 100), None);
        assert_eq!(g.update(true, true, 1099), None);
        assert_eq!(g.update(true, true, 1100), Some(GestureEvent::StyleAdvance));
        assert_eq!(g.update(true, true, 3000), None);

        // One released: combo stays latched, no single gesture
        assert_eq!(g.update(true, false, 3100), None);
        assert_eq!(g.update(true, false, 5000), None);
        assert_eq!(g.update(true, true, 5100), None);

        g.update(false, false, 5200);
        assert_eq!(g.update(true, true, 5300), None);
        assert_eq!(g.update(true, true, 6300), Some(GestureEvent::StyleAdvance));
    }

    #[test]
    fn test_single_timer_runs_through_abandoned_combo() {
        let mut g = ButtonGestures::new();
        g.update(true, false, 0);
        g.update(true, true, 500);
        assert!(g.trip().is_held());
        // Combo let go before firing; the trip hold still counts from 0
        assert_eq!(g.update(true, false, 1000), Some(GestureEvent::TripReset));
    }

    #[test]
    fn test_single_timer_resets_on_own_release_only() {
        let mut g = ButtonGestures::new();
        g.update(false, true, 0);
        g.update(true, true, 200);
        g.update(true, false, 400);
        assert!(!g.avg().is_held());
        assert_eq!(g.update(true, false, 1300), None);
        assert_eq!(g.update(true, false, 1400), Some(GestureEvent::TripReset));
    }
}
