//! Wall-clock abstraction.
//!
//! Everything that needs "now" takes a [`Clock`] so tests can pin or advance
//! time instead of racing the system clock.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_tracks_utc_now() {
        let before = Utc::now();
        let observed = SystemClock.now();
        let after = Utc::now();
        assert!(before <= observed && observed <= after);
    }

    #[test]
    fn mock_clock_moves_only_when_told() {
        use crate::test_support::MockClock;
        use chrono::{TimeDelta, TimeZone};

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = MockClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(TimeDelta::minutes(90));
        assert_eq!(clock.now(), start + TimeDelta::minutes(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
