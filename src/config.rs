//! Configuration file support for the annotation editor.
//!
//! Settings are stored as JSON. Every field has a default, so partial files
//! (or an empty `{}`) load cleanly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CATEGORY, MAX_HISTORY_SNAPSHOTS, MIN_RECTANGLE_SIZE, POINT_HIT_RADIUS, style,
};
use crate::keybindings::KeyBindings;
use crate::render::Palette;
use crate::viewport::ZoomLimits;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Parse a level name, case-insensitively.
    pub fn from_name(name: &str) -> Option<LogLevel> {
        LogLevel::all()
            .iter()
            .copied()
            .find(|level| level.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Log verbosity level
    pub log_level: LogLevel,

    /// Tool hotkeys
    pub keybindings: KeyBindings,

    /// Maximum number of retained undo snapshots
    pub history_limit: usize,

    /// Rectangles must be strictly larger than this in both dimensions
    pub min_rectangle_size: f32,

    /// Click tolerance for points and keypoints, canvas units
    pub point_hit_radius: f32,

    /// Category used when the host has not chosen one
    pub default_category: String,

    /// Colour of annotations whose category is unknown
    pub fallback_annotation_color: String,

    /// Colour of the in-progress shape when no category colour matches
    pub fallback_drawing_color: String,

    /// Zoom clamp range and wheel step
    pub zoom: ZoomLimits,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            keybindings: KeyBindings::default(),
            history_limit: MAX_HISTORY_SNAPSHOTS,
            min_rectangle_size: MIN_RECTANGLE_SIZE,
            point_hit_radius: POINT_HIT_RADIUS,
            default_category: DEFAULT_CATEGORY.to_string(),
            fallback_annotation_color: style::FALLBACK_ANNOTATION_COLOR.to_string(),
            fallback_drawing_color: style::FALLBACK_DRAWING_COLOR.to_string(),
            zoom: ZoomLimits::default(),
        }
    }
}

impl EditorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;

        if config.keybindings.has_conflicts() {
            log::warn!("Configuration has conflicting tool hotkeys");
        }

        Ok(config)
    }

    /// Check that numeric limits are usable by the viewport and tools.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom = &self.zoom;
        if !zoom.min.is_finite() || zoom.min <= 0.0 {
            return Err(invalid(
                "zoom.min",
                format!("must be a positive number, got {}", zoom.min),
            ));
        }
        if !zoom.max.is_finite() || zoom.max < zoom.min {
            return Err(invalid(
                "zoom.max",
                format!("must be at least zoom.min ({}), got {}", zoom.min, zoom.max),
            ));
        }
        if !zoom.step.is_finite() {
            return Err(invalid(
                "zoom.step",
                format!("must be finite, got {}", zoom.step),
            ));
        }
        if !self.min_rectangle_size.is_finite() || self.min_rectangle_size < 0.0 {
            return Err(invalid(
                "min_rectangle_size",
                format!("must be zero or positive, got {}", self.min_rectangle_size),
            ));
        }
        if !self.point_hit_radius.is_finite() || self.point_hit_radius < 0.0 {
            return Err(invalid(
                "point_hit_radius",
                format!("must be zero or positive, got {}", self.point_hit_radius),
            ));
        }
        Ok(())
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "annotator-config.json"
    }

    /// Load configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Fallback colours for the render pipeline.
    pub fn palette(&self) -> Palette {
        Palette {
            annotation_fallback: self.fallback_annotation_color.clone(),
            drawing_fallback: self.fallback_drawing_color.clone(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionMismatch {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A setting is out of its usable range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}
