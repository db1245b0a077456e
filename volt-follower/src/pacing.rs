//! Absolute-deadline pacing for the control loop
//!
//! The loop blocks in the dialog-action poll, so the poll timeout is
//! the loop's only timing source. Deadlines advance by exactly one
//! period per iteration; the returned timeout shrinks after a slow
//! iteration and bottoms out at the floor, so the schedule self-corrects
//! instead of accumulating drift.

use std::time::{Duration, Instant};

/// Fixed-period deadline scheduler
pub struct Pacer {
    deadline: Instant,
    period: Duration,
    floor: Duration,
}

impl Pacer {
    /// Create a pacer; the first deadline is `start + period`
    pub fn new(start: Instant, period: Duration, floor: Duration) -> Self {
        Self {
            deadline: start,
            period,
            floor,
        }
    }

    /// Advance to the next deadline and return the poll timeout for it
    pub fn next_timeout(&mut self, now: Instant) -> Duration {
        self.deadline += self.period;
        self.deadline.saturating_duration_since(now).max(self.floor)
    }

    /// The deadline the last `next_timeout` call targeted
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(500);
    const FLOOR: Duration = Duration::from_millis(10);

    #[test]
    fn test_no_drift_over_100_iterations() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start, PERIOD, FLOOR);

        let mut prev = None;
        for k in 1..=100u32 {
            // Instantaneous handlers: "now" is exactly the previous deadline
            let now = start + PERIOD * (k - 1);
            let timeout = pacer.next_timeout(now);

            assert_eq!(timeout, PERIOD);
            assert_eq!(pacer.deadline(), start + PERIOD * k);
            if let Some(prev) = prev {
                assert_eq!(pacer.deadline() - prev, PERIOD);
            }
            prev = Some(pacer.deadline());
        }
    }

    #[test]
    fn test_slow_iteration_gets_floor() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start, PERIOD, FLOOR);

        // Handler overran the whole period
        let late = start + PERIOD + Duration::from_millis(200);
        assert_eq!(pacer.next_timeout(late), FLOOR);
    }

    #[test]
    fn test_schedule_recovers_after_overrun() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start, PERIOD, FLOOR);

        // One overrun does not shift later deadlines
        pacer.next_timeout(start + Duration::from_millis(700));
        let timeout = pacer.next_timeout(start + Duration::from_millis(710));
        assert_eq!(pacer.deadline(), start + PERIOD * 2);
        assert_eq!(timeout, Duration::from_millis(290));
    }

    #[test]
    fn test_partial_delay_shrinks_timeout() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start, PERIOD, FLOOR);

        let timeout = pacer.next_timeout(start + Duration::from_millis(120));
        assert_eq!(timeout, Duration::from_millis(380));
    }
}
