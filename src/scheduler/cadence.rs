use std::time::Duration;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use thiserror::Error;

use crate::clock::Clock;
use crate::config::TimeOfDay;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("cadence period must be at least one second")]
    InvalidPeriod,
    #[error("next run {next} is not after now {now}")]
    NonPositiveTick {
        next: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error("local time {local} cannot be resolved in the configured time zone")]
    UnresolvableLocalTime { local: NaiveDateTime },
    #[error("next run falls outside the representable date range")]
    OutOfRange,
}

/// Next alarm: the instant it fires and how long to wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub at: DateTime<Utc>,
    pub wait: Duration,
}

/// Fires once per period at a fixed wall-clock time of day in `tz`.
#[derive(Debug, Clone)]
pub struct DailyCadence<Tz: TimeZone> {
    tz: Tz,
    target: TimeOfDay,
    period: TimeDelta,
}

impl<Tz: TimeZone> DailyCadence<Tz> {
    pub fn new(tz: Tz, target: TimeOfDay) -> Self {
        Self {
            tz,
            target,
            period: TimeDelta::days(1),
        }
    }

    pub fn with_period(self, period: Duration) -> Result<Self, ScheduleError> {
        if period < Duration::from_secs(1) {
            return Err(ScheduleError::InvalidPeriod);
        }
        let period = TimeDelta::from_std(period).map_err(|_| ScheduleError::InvalidPeriod)?;
        Ok(Self { period, ..self })
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    #[must_use]
    pub fn target(&self) -> TimeOfDay {
        self.target
    }

    /// First occurrence of the target strictly after `now`.
    ///
    /// Starts from today's target in the cadence's zone and steps forward by
    /// the period on the local wall clock, so a daily cadence keeps its time
    /// of day across offset changes.
    pub fn next_run_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let mut candidate = now
            .with_timezone(&self.tz)
            .date_naive()
            .and_time(self.target.as_naive_time());

        loop {
            let resolved = self.resolve(candidate)?;
            if resolved > now {
                return Ok(resolved);
            }
            candidate = candidate
                .checked_add_signed(self.period)
                .ok_or(ScheduleError::OutOfRange)?;
        }
    }

    /// Next run and the time left until it. The clock is read again after
    /// the target is computed.
    pub fn next_tick(&self, clock: &dyn Clock) -> Result<Tick, ScheduleError> {
        let at = self.next_run_from(clock.now())?;
        let wait = duration_until(at, clock.now())?;
        Ok(Tick { at, wait })
    }

    fn resolve(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, ScheduleError> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => {
                // Spring-forward gap: the wall clock skips this hour.
                let shifted = local
                    .checked_add_signed(TimeDelta::hours(1))
                    .ok_or(ScheduleError::OutOfRange)?;
                self.tz
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or(ScheduleError::UnresolvableLocalTime { local })
            }
        }
    }
}

fn duration_until(
    next: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Duration, ScheduleError> {
    match (next - now).to_std() {
        Ok(wait) if !wait.is_zero() => Ok(wait),
        _ => Err(ScheduleError::NonPositiveTick { next, now }),
    }
}
