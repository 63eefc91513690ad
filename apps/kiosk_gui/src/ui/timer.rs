use std::time::{Duration, Instant};

use kiosk_core::ResetTimer;

/// One-shot reset deadline polled by the UI loop. At most one is pending.
#[derive(Debug, Default)]
pub struct ResetDeadline {
    deadline: Option<Instant>,
}

impl ResetDeadline {
    pub fn arm_at(&mut self, now: Instant, delay: Duration) {
        if self.deadline.is_some() {
            tracing::warn!("reset timer re-armed while pending; keeping the newest deadline");
        }
        self.deadline = Some(now + delay);
    }

    /// Consumes the deadline when it has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl ResetTimer for ResetDeadline {
    fn arm_reset(&mut self, delay: Duration) {
        self.arm_at(Instant::now(), delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut timer = ResetDeadline::default();
        timer.arm_at(start, Duration::from_millis(3500));

        assert!(!timer.fire_if_due(start + Duration::from_millis(3499)));
        assert!(timer.fire_if_due(start + Duration::from_millis(3500)));
        assert!(!timer.fire_if_due(start + Duration::from_secs(10)));
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn rearming_keeps_a_single_deadline() {
        let start = Instant::now();
        let mut timer = ResetDeadline::default();
        timer.arm_at(start, Duration::from_millis(100));
        timer.arm_at(start, Duration::from_millis(500));

        assert!(!timer.fire_if_due(start + Duration::from_millis(200)));
        assert!(timer.fire_if_due(start + Duration::from_millis(500)));
        assert!(!timer.fire_if_due(start + Duration::from_millis(600)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let start = Instant::now();
        let mut timer = ResetDeadline::default();
        timer.arm_at(start, Duration::from_millis(1));
        timer.cancel();
        assert!(!timer.fire_if_due(start + Duration::from_secs(1)));
    }
}
