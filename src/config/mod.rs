//! Configuration for feedmirror.
//!
//! Read from `~/.config/feedmirror/config.toml` unless a path is given. When
//! the default file is missing, a commented template is written and its
//! defaults are used.

pub mod interval;

pub use interval::{format_interval, parse_interval};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::drive::{DriveSchema, OpenOptions};
use crate::engine::SyncConfig;

/// Logo published at `/images/<name>.svg` when no `logo` path is configured.
pub const DEFAULT_LOGO: &[u8] = include_bytes!("../../assets/logo.svg");

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 15 * 60 * 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace of the drive entries are mirrored into.
    pub drive_id: String,
    /// Delay between the end of one cycle and the start of the next, in ms.
    pub refresh_interval: u64,
    /// SQLite file backing the drive.
    pub storage_path: PathBuf,
    /// Source URLs, polled in this order.
    pub feeds: Vec<String>,
    pub announce: bool,
    /// IANA zone used to render `publishedDate`.
    pub timezone: String,
    /// Optional SVG replacing the bundled logo.
    pub logo: Option<PathBuf>,
    pub schema: DriveSchema,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drive_id: "feedmirror".to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            storage_path: default_storage_path(),
            feeds: Vec::new(),
            announce: true,
            timezone: "UTC".to_string(),
            logo: None,
            schema: DriveSchema {
                name: "feedmirror".to_string(),
                title: None,
                description: None,
            },
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedmirror")
        .join("drive.db")
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_config_path()?;
                if !default.exists() {
                    Self::create_default_config(&default)?;
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: config_path,
                source,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `~/.config/feedmirror/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedmirror").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.drive_id.trim().is_empty() {
            return Err(ConfigError::Invalid("drive_id must not be empty".into()));
        }
        if self.schema.name.trim().is_empty() {
            return Err(ConfigError::Invalid("schema.name must not be empty".into()));
        }
        if self.refresh_interval == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval must be greater than zero".into(),
            ));
        }
        for feed in &self.feeds {
            url::Url::parse(feed)
                .map_err(|e| ConfigError::Invalid(format!("feed {}: {}", feed, e)))?;
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone {}", self.timezone)))
    }

    /// Resolve everything the engine needs, reading the logo file if set.
    pub fn sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let logo = match &self.logo {
            Some(path) => fs::read(path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?,
            None => DEFAULT_LOGO.to_vec(),
        };

        Ok(SyncConfig {
            drive_id: self.drive_id.clone(),
            refresh_interval: Duration::from_millis(self.refresh_interval),
            feeds: self.feeds.clone(),
            schema: self.schema.clone(),
            open_options: OpenOptions {
                announce: self.announce,
            },
            timezone: self.timezone()?,
            logo,
        })
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# feedmirror configuration

# Namespace of the drive that receives the mirrored headlines
drive_id = "feedmirror"

# Milliseconds between the end of one sync cycle and the start of the next
refresh_interval = 900000

# SQLite file backing the drive (defaults to the user data directory)
# storage_path = "/var/lib/feedmirror/drive.db"

# RSS/Atom sources, polled in this order
feeds = [
    # "https://example.com/rss.xml",
]

# Advertise the drive to peers
announce = true

# Time zone used to render publishedDate
timezone = "UTC"

# SVG published at /images/<schema.name>.svg (bundled logo when unset)
# logo = "/path/to/logo.svg"

[schema]
name = "feedmirror"
# title = "My headlines"
# description = "Mirrored RSS headlines"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
