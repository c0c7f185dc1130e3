use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ConfigError, ConfigSource, PublishInterval, Settings, TimeOfDay};

pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

/// On-disk shape of [`Settings`]. Missing or zero values are filled in from
/// the defaults on load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    app_id: String,
    #[serde(default)]
    publish_interval_secs: u64,
    #[serde(default)]
    publish_time: TimeOfDay,
}

impl From<&Settings> for SettingsFile {
    fn from(settings: &Settings) -> Self {
        Self {
            app_id: settings.app_id().to_string(),
            publish_interval_secs: settings.publish_interval().as_secs(),
            publish_time: settings.publish_time(),
        }
    }
}

/// Settings persisted in a local TOML file.
///
/// Writes are not atomic; avoid running two instances against one file.
#[derive(Debug, Clone)]
pub struct LocalFileConfig {
    path: PathBuf,
    defaults: Settings,
}

impl LocalFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_defaults(path, Settings::default())
    }

    pub fn with_defaults(path: impl Into<PathBuf>, defaults: Settings) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, creating the file with defaults when it does not exist
    /// yet. An empty app id or a zero interval is replaced by the default and
    /// written back.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "config file does not exist yet, creating");
            self.save(&self.defaults)?;
            return Ok(self.defaults.clone());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::File {
            path: self.path.clone(),
            source,
        })?;
        let file: SettingsFile = toml::from_str(&content)?;

        let mut repaired = false;
        let app_id = if file.app_id.trim().is_empty() {
            repaired = true;
            self.defaults.app_id().to_string()
        } else {
            file.app_id
        };
        let publish_interval = if file.publish_interval_secs == 0 {
            repaired = true;
            self.defaults.publish_interval()
        } else {
            PublishInterval::new(Duration::from_secs(file.publish_interval_secs))?
        };

        let settings = Settings::new(file.publish_time, publish_interval, app_id)?;
        if repaired {
            self.save(&settings)?;
        }
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(&SettingsFile::from(settings))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::File {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        info!(
            path = %self.path.display(),
            app_id = settings.app_id(),
            publish_time = %settings.publish_time(),
            publish_interval = %settings.publish_interval(),
            "writing configuration"
        );
        fs::write(&self.path, content).map_err(|source| ConfigError::File {
            path: self.path.clone(),
            source,
        })
    }
}
