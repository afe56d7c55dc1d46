//! Wall-clock tick source anchored to deadlines rather than to poll times.

use std::time::{Duration, Instant};

use stretch_core::TickScheduler;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One-second clock that callers poll with [`ClockScheduler::take_due`].
///
/// Each delivered tick moves the deadline forward by exactly one period, so late
/// polls catch up instead of shifting every later tick. A `schedule` issued while
/// a tick is being handled continues from that tick's deadline.
pub(crate) struct ClockScheduler {
    period: Duration,
    next_due: Option<Instant>,
    claimed: Option<Instant>,
}

impl Default for ClockScheduler {
    fn default() -> Self {
        Self::with_period(TICK_PERIOD)
    }
}

impl ClockScheduler {
    fn with_period(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            claimed: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left before the next tick is due, `None` while cancelled.
    pub(crate) fn until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Claim the oldest tick due at `now`. Call until it returns `false`, handling one tick per `true`.
    pub(crate) fn take_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.claimed = Some(due);
                self.next_due = Some(due + self.period);
                true
            }
            _ => {
                self.claimed = None;
                false
            }
        }
    }

    fn schedule_at(&mut self, now: Instant) {
        let base = self.claimed.unwrap_or(now);
        self.next_due = Some(base + self.period);
    }
}

impl TickScheduler for ClockScheduler {
    fn schedule(&mut self) {
        self.schedule_at(Instant::now());
    }

    fn cancel(&mut self) {
        self.next_due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(sched: &mut ClockScheduler, now: Instant) -> usize {
        let mut n = 0;
        while sched.take_due(now) {
            n += 1;
        }
        n
    }

    #[test]
    fn idle_scheduler_has_nothing_due() {
        let mut sched = ClockScheduler::default();
        assert!(!sched.is_active());
        assert_eq!(sched.until_due(Instant::now()), None);
        assert_eq!(drain(&mut sched, Instant::now()), 0);
    }

    #[test]
    fn polling_slower_than_the_period_loses_no_ticks() {
        let period = Duration::from_millis(100);
        let poll = Duration::from_millis(33);
        let base = Instant::now();
        let end = base + Duration::from_secs(3);
        let mut sched = ClockScheduler::with_period(period);
        sched.schedule_at(base);

        let mut delivered = 0;
        let mut now = base;
        while now < end {
            now = (now + poll).min(end);
            delivered += drain(&mut sched, now);
        }
        assert_eq!(delivered, 30);
    }

    #[test]
    fn a_late_poll_catches_up_on_every_missed_tick() {
        let base = Instant::now();
        let mut sched = ClockScheduler::with_period(Duration::from_millis(100));
        sched.schedule_at(base);

        assert_eq!(drain(&mut sched, base + Duration::from_millis(99)), 0);
        assert_eq!(drain(&mut sched, base + Duration::from_millis(450)), 4);
        assert_eq!(
            sched.until_due(base + Duration::from_millis(450)),
            Some(Duration::from_millis(50))
        );
    }

    #[test]
    fn rescheduling_inside_a_tick_keeps_its_deadline() {
        let base = Instant::now();
        let mut sched = ClockScheduler::with_period(Duration::from_millis(100));
        sched.schedule_at(base);

        assert!(sched.take_due(base + Duration::from_millis(130)));
        sched.cancel();
        sched.schedule_at(base + Duration::from_millis(130));

        assert!(!sched.take_due(base + Duration::from_millis(199)));
        sched.cancel();
        sched.schedule_at(base + Duration::from_millis(130));
        assert!(sched.take_due(base + Duration::from_millis(230)));
    }

    #[test]
    fn resuming_after_a_pause_starts_a_fresh_period() {
        let base = Instant::now();
        let mut sched = ClockScheduler::with_period(Duration::from_millis(100));
        sched.schedule_at(base);
        assert_eq!(drain(&mut sched, base + Duration::from_millis(150)), 1);

        sched.cancel();
        assert_eq!(drain(&mut sched, base + Duration::from_millis(900)), 0);

        let resumed = base + Duration::from_millis(900);
        sched.schedule_at(resumed);
        assert_eq!(sched.until_due(resumed), Some(Duration::from_millis(100)));
    }

    #[test]
    fn cancel_stops_delivery() {
        let base = Instant::now();
        let mut sched = ClockScheduler::with_period(Duration::from_millis(5));
        sched.schedule_at(base);
        sched.cancel();
        assert!(!sched.is_active());
        assert_eq!(drain(&mut sched, base + Duration::from_secs(1)), 0);
    }

    #[test]
    fn real_clock_keeps_pace_under_coarse_polling() {
        let period = Duration::from_millis(50);
        let mut sched = ClockScheduler::with_period(period);
        let start = Instant::now();
        sched.schedule();

        let mut delivered = 0;
        while start.elapsed() < Duration::from_secs(1) {
            std::thread::sleep(Duration::from_millis(17));
            delivered += drain(&mut sched, Instant::now());
        }
        let expected = (start.elapsed().as_millis() / period.as_millis()) as usize;
        assert!(
            delivered + 1 >= expected && delivered <= expected,
            "delivered {delivered}, expected about {expected}"
        );
    }
}
