//! Test clock: deterministic `Clock` implementation for tests.

use std::sync::Mutex;

use arena_core::clock::Clock;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// The instant most tests pin their clock to: 2026-01-15 10:00:00 UTC.
    ///
    /// # Panics
    ///
    /// Never; the literal date is valid.
    #[must_use]
    pub fn reference() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    /// Returns a clock advanced by the given number of hours.
    #[must_use]
    pub fn hours_later(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that moves forward one microsecond every time it is read, so
/// two reads never agree.
#[derive(Debug)]
pub struct TickingClock {
    next: Mutex<DateTime<Utc>>,
}

impl TickingClock {
    /// Creates a clock whose first reading is `start`.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::microseconds(1);
        now
    }
}
