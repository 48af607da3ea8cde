//! Runtime configuration.

use crate::channel::{ChannelResult, DEFAULT_MAX_PAYLOAD_BYTES, FileChannel, MemoryChannel};
use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::outline::OutlineOptions;
use crate::stroke::StrokeColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default channel key shared by the authoring and mirror surfaces.
pub const DEFAULT_CHANNEL_KEY: &str = "whiteboard-data";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Authoring surface dimensions, in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl SurfaceConfig {
    /// Surface size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    pub channel_key: String,
    /// Quiet period before a change is written.
    pub debounce_ms: u64,
    pub max_payload_bytes: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            channel_key: DEFAULT_CHANNEL_KEY.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ReplicationConfig {
    /// Debounce window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// In-process channel with this key and size limit.
    pub fn memory_channel(&self) -> MemoryChannel {
        MemoryChannel::new(self.channel_key.clone()).with_max_payload_bytes(self.max_payload_bytes)
    }

    /// File channel in the default location with this key and size limit.
    pub fn file_channel(&self) -> ChannelResult<FileChannel> {
        Ok(FileChannel::default_location(self.channel_key.clone())?
            .with_max_payload_bytes(self.max_payload_bytes))
    }
}

/// Pen defaults for new strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub color: StrokeColor,
    pub size: f64,
    /// Outline template; `size` above replaces its size per stroke.
    pub outline: OutlineOptions,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: StrokeColor::BLACK,
            size: 3.0,
            outline: OutlineOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    pub surface: SurfaceConfig,
    pub replication: ReplicationConfig,
    pub brush: BrushConfig,
}

impl InkConfig {
    /// Parse and validate JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that sizes are positive and the channel settings usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a positive number, got {}", value),
                })
            }
        };
        positive("surface.width", self.surface.width)?;
        positive("surface.height", self.surface.height)?;
        positive("brush.size", self.brush.size)?;
        positive("brush.outline.size", self.brush.outline.size)?;

        if self.replication.channel_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "replication.channel_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.replication.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "replication.max_payload_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
