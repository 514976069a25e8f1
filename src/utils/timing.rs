use std::fmt;
use std::time::{Duration, Instant};
use log::trace;

/// Running duration totals for one repeated operation.
#[derive(Debug, Clone)]
pub struct TimingStats {
    label: &'static str,
    total: Duration,
    slowest: Duration,
    count: u32,
}

impl TimingStats {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            total: Duration::ZERO,
            slowest: Duration::ZERO,
            count: 0,
        }
    }

    /// Run `op` and record how long it took, whatever it returned.
    pub fn time<T>(&mut self, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = op();
        self.record(start.elapsed());
        result
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.slowest = self.slowest.max(elapsed);
        self.count += 1;
        trace!("{}: {:.2}ms (#{})", self.label, as_ms(elapsed), self.count);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn average_ms(&self) -> f64 {
        match self.count {
            0 => 0.0,
            n => as_ms(self.total) / f64::from(n),
        }
    }

    pub fn slowest_ms(&self) -> f64 {
        as_ms(self.slowest)
    }
}

impl fmt::Display for TimingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} avg {:.2}ms, max {:.2}ms over {}",
            self.label,
            self.average_ms(),
            self.slowest_ms(),
            self.count
        )
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_records_each_call() {
        let mut stats = TimingStats::new("decode");
        assert_eq!(stats.average_ms(), 0.0);

        let value = stats.time(|| 41 + 1);
        assert_eq!(value, 42);
        stats.record(Duration::from_millis(6));

        assert_eq!(stats.count(), 2);
        assert!(stats.slowest_ms() >= 6.0);
        assert!(stats.average_ms() >= 3.0);
        assert!(stats.to_string().starts_with("decode avg "));
        assert!(stats.to_string().ends_with("over 2"));
    }
}
