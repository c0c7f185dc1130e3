mod cli;
mod file;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cli::{Cli, LogLevel};
pub use file::{DEFAULT_CONFIG_PATH, LocalFileConfig};

/// App polled when nothing else is configured.
pub const DEFAULT_APP_ID: &str = "595068606";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid publish time {hour}:{minute:02}: hour must be 0-23 and minute 0-59")]
    InvalidTimeOfDay { hour: u32, minute: u32 },
    #[error("publish interval must be greater than zero and representable")]
    InvalidInterval,
    #[error("app id cannot be empty")]
    EmptyAppId,
    #[error("config file error at {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Read access to the values the scheduler and publisher run on.
pub trait ConfigSource {
    fn publish_time(&self) -> TimeOfDay;
    fn publish_interval(&self) -> PublishInterval;
    fn app_id(&self) -> &str;
}

/// Wall-clock hour and minute at which a digest is published each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeOfDay", into = "RawTimeOfDay")]
pub struct TimeOfDay(NaiveTime);

#[derive(Serialize, Deserialize)]
struct RawTimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ConfigError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or(ConfigError::InvalidTimeOfDay { hour, minute })
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    #[must_use]
    pub fn as_naive_time(self) -> NaiveTime {
        self.0
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<RawTimeOfDay> for TimeOfDay {
    type Error = ConfigError;

    fn try_from(raw: RawTimeOfDay) -> Result<Self, Self::Error> {
        Self::new(raw.hour, raw.minute)
    }
}

impl From<TimeOfDay> for RawTimeOfDay {
    fn from(time: TimeOfDay) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
        }
    }
}

/// Length of the window each digest covers. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublishInterval(TimeDelta);

impl PublishInterval {
    pub fn new(duration: Duration) -> Result<Self, ConfigError> {
        if duration.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        TimeDelta::from_std(duration)
            .map(Self)
            .map_err(|_| ConfigError::InvalidInterval)
    }

    pub fn from_days(days: u32) -> Result<Self, ConfigError> {
        Self::new(Duration::from_secs(u64::from(days) * SECONDS_PER_DAY))
    }

    #[must_use]
    pub fn as_time_delta(self) -> TimeDelta {
        self.0
    }

    #[must_use]
    pub fn as_secs(self) -> u64 {
        self.0.num_seconds().unsigned_abs()
    }
}

impl Default for PublishInterval {
    fn default() -> Self {
        Self(TimeDelta::hours(24))
    }
}

impl fmt::Display for PublishInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.as_secs();
        if secs % SECONDS_PER_DAY == 0 {
            write!(f, "{}d", secs / SECONDS_PER_DAY)
        } else {
            write!(f, "{secs}s")
        }
    }
}

/// Validated settings, loaded once at startup and treated as read-only
/// while the scheduler runs. Setters consume `self` and return a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    publish_time: TimeOfDay,
    publish_interval: PublishInterval,
    app_id: String,
}

impl Settings {
    pub fn new(
        publish_time: TimeOfDay,
        publish_interval: PublishInterval,
        app_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let app_id = validate_app_id(app_id.into())?;
        Ok(Self {
            publish_time,
            publish_interval,
            app_id,
        })
    }

    #[must_use]
    pub fn with_publish_time(self, publish_time: TimeOfDay) -> Self {
        Self {
            publish_time,
            ..self
        }
    }

    #[must_use]
    pub fn with_publish_interval(self, publish_interval: PublishInterval) -> Self {
        Self {
            publish_interval,
            ..self
        }
    }

    pub fn with_app_id(self, app_id: impl Into<String>) -> Result<Self, ConfigError> {
        let app_id = validate_app_id(app_id.into())?;
        Ok(Self { app_id, ..self })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            publish_time: TimeOfDay::default(),
            publish_interval: PublishInterval::default(),
            app_id: DEFAULT_APP_ID.to_string(),
        }
    }
}

impl ConfigSource for Settings {
    fn publish_time(&self) -> TimeOfDay {
        self.publish_time
    }

    fn publish_interval(&self) -> PublishInterval {
        self.publish_interval
    }

    fn app_id(&self) -> &str {
        &self.app_id
    }
}

fn validate_app_id(app_id: String) -> Result<String, ConfigError> {
    let trimmed = app_id.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyAppId);
    }
    Ok(trimmed.to_string())
}
