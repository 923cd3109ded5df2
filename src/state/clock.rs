use std::sync::Mutex;

use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// Source of the current venue time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Calendar date at the venue.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock converted to the configured venue offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: OffsetDateTime) {
        *self.lock() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OffsetDateTime> {
        // A poisoned guard still holds a valid timestamp.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(datetime!(2025-01-01 23:59 +07:00));
        clock.advance(Duration::minutes(2));
        assert_eq!(clock.now(), datetime!(2025-01-02 00:01 +07:00));
        assert_eq!(clock.today(), time::macros::date!(2025 - 01 - 02));
    }

    #[test]
    fn system_clock_reports_configured_offset() {
        let clock = SystemClock::new(offset!(+7));
        assert_eq!(clock.now().offset(), offset!(+7));
    }
}
