//! Follower session state and the control math
//!
//! The session owns everything the action handlers and the periodic
//! read are allowed to mutate: the running flag, the configured offset
//! and current limit, and the last commanded target. Handlers receive
//! it explicitly; there is no ambient state.

/// Clamp the derived output target to the device's physical range
pub fn compute_target(source: f64, offset: f64, full_scale: f64) -> f64 {
    (source + offset).clamp(0.0, full_scale)
}

/// Valid offset range for the current source reading
///
/// The negative bound reaches 0 V output, the positive bound reaches
/// full scale.
pub fn offset_bounds(source: f64, full_scale: f64) -> (f64, f64) {
    (-source, full_scale - source)
}

/// Mutable state of one follower run
#[derive(Debug, Clone)]
pub struct Session {
    pub running: bool,
    pub offset: f64,
    pub current_limit: f64,
    pub last_target: f64,
}

impl Session {
    /// Create a session in the STOPPED state
    pub fn new(current_limit: f64) -> Self {
        Self {
            running: false,
            offset: 0.0,
            current_limit,
            last_target: 0.0,
        }
    }

    /// Transition to RUNNING; returns false when already running
    pub fn start(&mut self) -> bool {
        let changed = !self.running;
        self.running = true;
        changed
    }

    /// Transition to STOPPED; returns false when already stopped
    pub fn stop(&mut self) -> bool {
        let changed = self.running;
        self.running = false;
        changed
    }

    /// Apply a proposed offset if it is inside the dynamic bounds
    ///
    /// Out-of-range proposals leave the prior offset unchanged.
    pub fn set_offset_checked(&mut self, value: f64, source: f64, full_scale: f64) -> bool {
        let (min, max) = offset_bounds(source, full_scale);
        if value < min || value > max {
            return false;
        }
        self.offset = value;
        true
    }

    /// Apply a proposed current limit if it is inside the static range
    pub fn set_limit_checked(&mut self, value: f64, min: f64, max: f64) -> bool {
        if value < min || value > max {
            return false;
        }
        self.current_limit = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SCALE: f64 = 40.0;

    #[test]
    fn test_target_in_range() {
        for source in [0.0, 1.0, 20.0, 39.9, 40.0] {
            for offset in [-50.0, -1.0, 0.0, 0.5, 10.0, 100.0] {
                let t = compute_target(source, offset, FULL_SCALE);
                assert!((0.0..=FULL_SCALE).contains(&t), "target {t} out of range");
            }
        }
    }

    #[test]
    fn test_target_monotonic_in_unclamped_region() {
        let a = compute_target(1.0, 0.5, FULL_SCALE);
        let b = compute_target(2.0, 0.5, FULL_SCALE);
        let c = compute_target(2.0, 1.0, FULL_SCALE);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_target_clamps() {
        assert_eq!(compute_target(1.0, -5.0, FULL_SCALE), 0.0);
        assert_eq!(compute_target(39.0, 5.0, FULL_SCALE), FULL_SCALE);
    }

    #[test]
    fn test_target_sequence() {
        let targets: Vec<f64> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&v| compute_target(v, 0.5, FULL_SCALE))
            .collect();
        assert_eq!(targets, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_offset_bounds_track_source() {
        assert_eq!(offset_bounds(1.0, FULL_SCALE), (-1.0, 39.0));
        assert_eq!(offset_bounds(0.0, FULL_SCALE), (0.0, 40.0));
    }

    #[test]
    fn test_offset_rejected_outside_bounds() {
        let mut session = Session::new(0.1);
        session.offset = 0.25;

        assert!(!session.set_offset_checked(-1.5, 1.0, FULL_SCALE));
        assert_eq!(session.offset, 0.25);

        assert!(!session.set_offset_checked(39.5, 1.0, FULL_SCALE));
        assert_eq!(session.offset, 0.25);

        assert!(session.set_offset_checked(-1.0, 1.0, FULL_SCALE));
        assert_eq!(session.offset, -1.0);
    }

    #[test]
    fn test_limit_static_range() {
        let mut session = Session::new(0.1);

        assert!(!session.set_limit_checked(0.01, 0.05, 5.0));
        assert!(!session.set_limit_checked(5.5, 0.05, 5.0));
        assert_eq!(session.current_limit, 0.1);

        assert!(session.set_limit_checked(2.0, 0.05, 5.0));
        assert_eq!(session.current_limit, 2.0);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut session = Session::new(0.1);

        assert!(session.start());
        assert!(!session.start());
        assert!(session.running);

        assert!(session.stop());
        assert!(!session.stop());
        assert!(!session.running);
    }
}
