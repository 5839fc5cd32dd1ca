//! Worker configuration
//!
//! Loaded from an optional JSON file, then overridden by `SDR_*`
//! environment variables. Every field has a default, so an empty object
//! (or no file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "poll_backoff_ms": 500,
//!   "storage_root": "/var/lib/sdr-bitmap",
//!   "image_width": 512,
//!   "image_height": 512
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::experiment::RunnerSettings;
use crate::render::RenderSettings;
use crate::{Error, Result};

/// Environment variable overriding [`WorkerConfig::poll_backoff_ms`].
pub const ENV_POLL_BACKOFF_MS: &str = "SDR_POLL_BACKOFF_MS";
/// Environment variable overriding [`WorkerConfig::storage_root`].
pub const ENV_STORAGE_ROOT: &str = "SDR_STORAGE_ROOT";
/// Environment variable overriding [`WorkerConfig::queue_dir`].
pub const ENV_QUEUE_DIR: &str = "SDR_QUEUE_DIR";

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Sleep after an empty poll
    pub poll_backoff_ms: u64,
    /// Lease length of a received message
    pub visibility_timeout_ms: u64,
    /// Target width of grid renders
    pub image_width: u32,
    /// Target height of grid renders
    pub image_height: u32,
    /// Cell width of 1D strips
    pub strip_scale: u32,
    /// `N` of the primary binary encoder
    pub binary_bits: usize,
    /// Primary value used when a request has no `Value1`
    pub default_primary_value: String,
    /// Geospatial input used when a request has no `Value3`
    pub geo_latitude: f64,
    /// Root of the filesystem storage gateway
    pub storage_root: PathBuf,
    /// Spool directory of the directory queue
    pub queue_dir: PathBuf,
    /// Input sub-directory under `storage_root`
    pub input_dir: String,
    /// Artifact sub-directory under `storage_root`
    pub result_dir: String,
    /// Result record sub-directory under `storage_root`
    pub result_table: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_backoff_ms: 500,
            visibility_timeout_ms: 30_000,
            image_width: 1024,
            image_height: 1024,
            strip_scale: 200,
            binary_bits: 156,
            default_primary_value: "40148".to_string(),
            geo_latitude: 48.75,
            storage_root: PathBuf::from("./data"),
            queue_dir: PathBuf::from("./data/queue"),
            input_dir: "input".to_string(),
            result_dir: "results".to_string(),
            result_table: "results-table".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Configuration(format!("invalid config {}: {e}", path.display())))
    }

    /// Defaults or file, then environment overrides, then validation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for an unreadable file, an unparsable
    /// override, or a configuration rejected by [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SDR_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `SDR_POLL_BACKOFF_MS` is not an integer.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(ENV_POLL_BACKOFF_MS) {
            self.poll_backoff_ms = value.trim().parse().map_err(|e| {
                Error::Configuration(format!("{ENV_POLL_BACKOFF_MS}={value:?}: {e}"))
            })?;
        }
        if let Some(value) = lookup(ENV_STORAGE_ROOT) {
            self.storage_root = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_QUEUE_DIR) {
            self.queue_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// Check values that would make the worker spin or every render fail.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.poll_backoff_ms == 0, "poll_backoff_ms must be > 0"),
            (self.visibility_timeout_ms == 0, "visibility_timeout_ms must be > 0"),
            (self.image_width == 0 || self.image_height == 0, "image size must be > 0"),
            (self.strip_scale == 0, "strip_scale must be > 0"),
            (self.binary_bits == 0, "binary_bits must be > 0"),
            (!self.geo_latitude.is_finite(), "geo_latitude must be finite"),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(Error::Configuration((*message).to_string())),
            None => Ok(()),
        }
    }

    /// Empty-queue backoff.
    #[must_use]
    pub const fn poll_backoff(&self) -> Duration {
        Duration::from_millis(self.poll_backoff_ms)
    }

    /// Message lease length.
    #[must_use]
    pub const fn visibility_timeout(&self) -> Duration {
        Duration::from_millis(self.visibility_timeout_ms)
    }

    /// Render geometry.
    #[must_use]
    pub const fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            width: self.image_width,
            height: self.image_height,
            strip_scale: self.strip_scale,
        }
    }

    /// Pipeline settings for the experiment runner.
    #[must_use]
    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            render: self.render_settings(),
            binary_bits: self.binary_bits,
            default_primary_value: self.default_primary_value.clone(),
            geo_latitude: self.geo_latitude,
        }
    }
}
