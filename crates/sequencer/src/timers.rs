use std::time::{Duration, Instant};

/// A bundle of one-shot timers sharing a single origin instant.
///
/// Offsets are relative to the origin rather than chained off each other, so
/// firing order is fixed at arm time and cancelling the bundle is one call.
#[derive(Debug, Clone)]
pub struct TimerSet<K> {
    origin: Instant,
    pending: Vec<(Duration, K)>,
}

impl<K> TimerSet<K> {
    pub fn arm(origin: Instant, entries: impl IntoIterator<Item = (Duration, K)>) -> Self {
        let mut pending: Vec<(Duration, K)> = entries.into_iter().collect();
        pending.sort_by_key(|(offset, _)| *offset);
        Self { origin, pending }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|(offset, _)| self.origin + *offset)
    }

    /// Removes and returns every timer whose deadline is at or before `now`,
    /// earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<K> {
        let elapsed = now.saturating_duration_since(self.origin);
        if now < self.origin {
            return Vec::new();
        }
        let split = self
            .pending
            .iter()
            .position(|(offset, _)| *offset > elapsed)
            .unwrap_or(self.pending.len());
        self.pending
            .drain(..split)
            .map(|(_, key)| key)
            .collect()
    }

    /// Drops every pending timer. Returns how many were still pending.
    pub fn cancel(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }
}

/// Repeating timer measured from the instant it was last armed.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next: Option<Instant>,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    pub fn arm(&mut self, now: Instant) {
        self.next = Some(now + self.period);
    }

    pub fn clear(&mut self) {
        self.next = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Number of periods that elapsed since the last poll.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let Some(mut next) = self.next else {
            return 0;
        };
        if self.period.is_zero() {
            return 0;
        }
        let mut fired = 0;
        while next <= now {
            fired += 1;
            next += self.period;
        }
        self.next = Some(next);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn fires_in_offset_order() {
        let origin = Instant::now();
        let mut timers = TimerSet::arm(origin, [(ms(600), "b"), (ms(200), "a"), (ms(1000), "c")]);
        assert_eq!(timers.next_deadline(), Some(origin + ms(200)));
        assert!(timers.due(origin + ms(199)).is_empty());
        assert_eq!(timers.due(origin + ms(200)), vec!["a"]);
        assert_eq!(timers.due(origin + ms(5000)), vec!["b", "c"]);
        assert!(timers.is_empty());
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn cancel_drops_everything_once() {
        let origin = Instant::now();
        let mut timers = TimerSet::arm(origin, [(ms(10), 1), (ms(20), 2)]);
        assert_eq!(timers.cancel(), 2);
        assert_eq!(timers.cancel(), 0);
        assert!(timers.due(origin + ms(100)).is_empty());
    }

    #[test]
    fn time_before_origin_fires_nothing() {
        let now = Instant::now();
        let origin = now + ms(50);
        let mut timers = TimerSet::arm(origin, [(Duration::ZERO, ())]);
        assert!(timers.due(now).is_empty());
        assert_eq!(timers.due(origin).len(), 1);
    }

    #[test]
    fn interval_counts_elapsed_periods() {
        let start = Instant::now();
        let mut interval = Interval::new(Duration::from_secs(6));
        assert_eq!(interval.poll(start + Duration::from_secs(60)), 0);
        interval.arm(start);
        assert_eq!(interval.poll(start + Duration::from_secs(5)), 0);
        assert_eq!(interval.poll(start + Duration::from_secs(6)), 1);
        assert_eq!(interval.poll(start + Duration::from_secs(19)), 2);
        assert_eq!(
            interval.next_deadline(),
            Some(start + Duration::from_secs(24))
        );
    }

    #[test]
    fn rearming_restarts_the_period() {
        let start = Instant::now();
        let mut interval = Interval::new(Duration::from_secs(6));
        interval.arm(start);
        interval.clear();
        assert!(!interval.is_armed());
        interval.arm(start + Duration::from_secs(4));
        assert_eq!(interval.poll(start + Duration::from_secs(9)), 0);
        assert_eq!(interval.poll(start + Duration::from_secs(10)), 1);
    }
}
