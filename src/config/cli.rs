use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;

use super::{ConfigError, ConfigSource, DEFAULT_CONFIG_PATH, PublishInterval, Settings, TimeOfDay};
use crate::adapter::rss_fetcher::DEFAULT_FEED_BASE_URL;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Publishes a digest of App Store reviews once per interval",
    long_about = None
)]
pub struct Cli {
    /// Change the hour (0-23) at which digests are scheduled
    #[arg(long)]
    pub hour: Option<u32>,

    /// Change the minute (0-59) at which digests are scheduled
    #[arg(long)]
    pub minute: Option<u32>,

    /// Change how many days of reviews each digest covers
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: Option<u32>,

    /// Configure the Apple app ID to poll
    #[arg(long = "app")]
    pub app_id: Option<String>,

    /// Publish a digest if none exists for the current interval, print its path and exit
    #[arg(long)]
    pub now: bool,

    /// Settings file, created with defaults when missing
    #[arg(long, env = "DIGEST_CONFIG_FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory under which digests are written, one subdirectory per app
    #[arg(long, env = "DIGEST_OUTPUT_DIR", default_value = "./output")]
    pub output_dir: PathBuf,

    /// Base URL of the review feed
    #[arg(long, env = "DIGEST_FEED_BASE_URL", default_value = DEFAULT_FEED_BASE_URL)]
    pub feed_base_url: String,

    /// Timeout for a single feed request in seconds
    #[arg(long, env = "DIGEST_FETCH_TIMEOUT_SECS", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl Cli {
    /// Applies the override flags to `settings`. The boolean is `true` when
    /// anything changed and the result should be persisted.
    pub fn apply_to(&self, settings: Settings) -> Result<(Settings, bool), ConfigError> {
        let mut settings = settings;
        let mut changed = false;

        if self.hour.is_some() || self.minute.is_some() {
            let current = settings.publish_time();
            let publish_time = TimeOfDay::new(
                self.hour.unwrap_or(current.hour()),
                self.minute.unwrap_or(current.minute()),
            )?;
            info!(%publish_time, "setting new publish time");
            settings = settings.with_publish_time(publish_time);
            changed = true;
        }

        if let Some(days) = self.interval {
            let publish_interval = PublishInterval::from_days(days)?;
            info!(%publish_interval, "setting new publish interval");
            settings = settings.with_publish_interval(publish_interval);
            changed = true;
        }

        if let Some(app_id) = &self.app_id {
            info!(app_id = %app_id, "setting new app id");
            settings = settings.with_app_id(app_id.as_str())?;
            changed = true;
        }

        Ok((settings, changed))
    }
}
