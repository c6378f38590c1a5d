//! socialqr runtime configuration handling

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration structure read from disk and environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialQrConfig {
    /// Capture loop timing
    pub scan: ScanOptions,
    /// PNG export settings
    pub export: ExportOptions,
    /// Camera capture overrides
    pub camera: CameraOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl SocialQrConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No socialqr.toml / socialqr.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["socialqr.toml", "socialqr.yaml", "socialqr.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("socialqr");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.scan.apply_env_overrides();
        self.export.apply_env_overrides();
        self.camera.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Produce a fully resolved camera configuration ready to open the V4L2 device.
    #[cfg(feature = "camera")]
    pub fn camera_config(&self) -> Result<crate::camera::CameraConfig> {
        self.camera.to_camera_config()
    }
}

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera pointing away from the user
    #[default]
    Environment,
    /// Front camera pointing at the user
    User,
}

impl Facing {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "environment" | "rear" | "back" => Some(Self::Environment),
            "user" | "front" => Some(Self::User),
            _ => None,
        }
    }
}

/// Timing of the capture loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Camera to request
    pub facing: Facing,
    /// Delay between frame attempts in milliseconds
    pub frame_interval_ms: u64,
    /// Pause between a successful decode and publishing it, in milliseconds
    pub settle_delay_ms: u64,
    /// Pause before a still-image scan reports its result, in milliseconds
    pub feedback_delay_ms: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            frame_interval_ms: 100,
            settle_delay_ms: 2000,
            feedback_delay_ms: 2000,
        }
    }
}

impl ScanOptions {
    /// Frame interval as a duration (never zero)
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Still-image feedback delay as a duration
    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }

    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(facing) = env::var("SOCIALQR_SCAN_FACING") {
            if let Some(parsed) = Facing::parse(&facing) {
                self.facing = parsed;
            }
        }
        if let Ok(interval) = env::var("SOCIALQR_SCAN_INTERVAL_MS") {
            if let Ok(value) = interval.parse::<u64>() {
                self.frame_interval_ms = value.max(1);
            }
        }
        if let Ok(delay) = env::var("SOCIALQR_SCAN_SETTLE_MS") {
            if let Ok(value) = delay.parse::<u64>() {
                self.settle_delay_ms = value;
            }
        }
        if let Ok(delay) = env::var("SOCIALQR_SCAN_FEEDBACK_MS") {
            if let Ok(value) = delay.parse::<u64>() {
                self.feedback_delay_ms = value;
            }
        }
    }
}

/// PNG export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// File name of the exported image
    pub file_name: String,
    /// Grow the canvas below the QR code so captions are not clipped
    pub expand_canvas: bool,
    /// Font family used for captions
    pub font_family: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: "qr-code.png".to_string(),
            expand_canvas: true,
            font_family: "Arial, sans-serif".to_string(),
        }
    }
}

impl ExportOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("SOCIALQR_EXPORT_FILE") {
            if !name.trim().is_empty() {
                self.file_name = name;
            }
        }
        if let Ok(expand) = env::var("SOCIALQR_EXPORT_EXPAND") {
            match expand.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.expand_canvas = false,
                "1" | "true" | "on" => self.expand_canvas = true,
                _ => {}
            }
        }
    }
}

/// User-friendly camera overrides merged on top of the camera defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Override for the numeric camera index (e.g. `/dev/video2`).
    pub device_index: Option<usize>,
    /// Override for the camera name substring match.
    pub device_name: Option<String>,
    /// Override for desired frame width in pixels.
    pub width: Option<u32>,
    /// Override for desired frame height in pixels.
    pub height: Option<u32>,
    /// Override for desired frames per second.
    pub fps: Option<u32>,
    /// Override for pixel format string (mjpeg/yuyv/rgb24).
    pub format: Option<String>,
}

impl CameraOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("SOCIALQR_CAMERA_DEVICE") {
            self.device_name = Some(name);
            self.device_index = None;
        }
        if let Ok(index) = env::var("SOCIALQR_CAMERA_INDEX") {
            if let Ok(parsed) = index.parse::<usize>() {
                self.device_index = Some(parsed);
                self.device_name = None;
            }
        }
        if let Ok(width) = env::var("SOCIALQR_CAMERA_WIDTH") {
            self.width = width.parse::<u32>().ok();
        }
        if let Ok(height) = env::var("SOCIALQR_CAMERA_HEIGHT") {
            self.height = height.parse::<u32>().ok();
        }
        if let Ok(fps) = env::var("SOCIALQR_CAMERA_FPS") {
            self.fps = fps.parse::<u32>().ok();
        }
        if let Ok(format) = env::var("SOCIALQR_CAMERA_FORMAT") {
            self.format = Some(format);
        }
    }

    /// Merge overrides onto the default camera configuration.
    #[cfg(feature = "camera")]
    pub fn to_camera_config(&self) -> Result<crate::camera::CameraConfig> {
        use crate::camera::{CameraConfig, DeviceSelector, PixelFormat};

        let mut config = CameraConfig::default();

        config.device = match (&self.device_name, self.device_index) {
            (Some(name), _) => DeviceSelector::Name(name.clone()),
            (None, Some(index)) => DeviceSelector::Index(index),
            (None, None) => DeviceSelector::First,
        };

        if let Some(width) = self.width {
            config.width = width;
        }

        if let Some(height) = self.height {
            config.height = height;
        }

        if let Some(fps) = self.fps {
            config.fps = fps.max(1);
        }

        if let Some(format) = &self.format {
            config.format = PixelFormat::parse(format).ok_or_else(|| {
                Error::Config(format!(
                    "Unknown pixel format '{}'. Use mjpeg, yuyv, or rgb24",
                    format
                ))
            })?;
        }

        Ok(config)
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `SOCIALQR_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("SOCIALQR_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("SOCIALQR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("SOCIALQR_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("SOCIALQR_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SocialQrConfig::default();
        assert_eq!(config.scan.facing, Facing::Environment);
        assert_eq!(config.scan.frame_interval(), Duration::from_millis(100));
        assert_eq!(config.scan.settle_delay(), Duration::from_millis(2000));
        assert_eq!(config.export.file_name, "qr-code.png");
        assert!(config.export.expand_canvas);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SocialQrConfig = toml::from_str(
            r#"
            [scan]
            settle_delay_ms = 500

            [export]
            expand_canvas = false
            "#,
        )
        .unwrap();
        assert_eq!(config.scan.settle_delay_ms, 500);
        assert_eq!(config.scan.frame_interval_ms, 100);
        assert!(!config.export.expand_canvas);
        assert_eq!(config.export.file_name, "qr-code.png");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_yaml_facing() {
        let config: SocialQrConfig = serde_yaml::from_str("scan:\n  facing: user\n").unwrap();
        assert_eq!(config.scan.facing, Facing::User);
    }

    #[test]
    fn test_unsupported_extension() {
        let path = std::env::temp_dir().join("socialqr-config-test.ini");
        fs::write(&path, "x=1").unwrap();
        let result = SocialQrConfig::from_file(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_facing_parse() {
        assert_eq!(Facing::parse("Rear"), Some(Facing::Environment));
        assert_eq!(Facing::parse("front"), Some(Facing::User));
        assert_eq!(Facing::parse("sideways"), None);
    }

    #[cfg(feature = "camera")]
    #[test]
    fn test_camera_name_wins_over_index() {
        use crate::camera::DeviceSelector;

        let options = CameraOptions {
            device_index: Some(2),
            device_name: Some("facecam".to_string()),
            format: Some("yuyv".to_string()),
            ..CameraOptions::default()
        };
        let config = options.to_camera_config().unwrap();
        assert_eq!(config.device, DeviceSelector::Name("facecam".to_string()));

        let bad = CameraOptions {
            format: Some("h264".to_string()),
            ..CameraOptions::default()
        };
        assert!(matches!(bad.to_camera_config(), Err(Error::Config(_))));
    }
}
