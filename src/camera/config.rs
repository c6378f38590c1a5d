//! Capture settings for the V4L2 backend

use serde::{Deserialize, Serialize};

/// Which capture device a scan opens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSelector {
    /// First capture device found under `/dev/video*`
    #[default]
    First,
    /// `/dev/video<N>`
    Index(usize),
    /// First device whose card name contains this text, ignoring case
    Name(String),
}

impl DeviceSelector {
    /// Whether `index`/`name` identify a device this selector accepts
    pub fn accepts(&self, index: usize, name: &str) -> bool {
        match self {
            Self::First => true,
            Self::Index(wanted) => *wanted == index,
            Self::Name(wanted) => name.to_lowercase().contains(&wanted.to_lowercase()),
        }
    }
}

/// Requested capture format. The driver may adjust width and height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Device to open
    pub device: DeviceSelector,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Driver frame rate; matches the 10 fps sampling of the scan loop
    pub fps: u32,
    /// Pixel format negotiated with the driver
    pub format: PixelFormat,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: DeviceSelector::First,
            width: 1280,
            height: 720,
            fps: 10,
            format: PixelFormat::Mjpeg,
        }
    }
}

/// Frame encodings understood by the frame decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Motion JPEG
    Mjpeg,
    /// YUYV 4:2:2
    Yuyv,
    /// Packed RGB, 8 bits per channel
    Rgb24,
}

impl PixelFormat {
    pub(crate) fn fourcc(self) -> v4l::FourCC {
        v4l::FourCC::new(match self {
            Self::Mjpeg => b"MJPG",
            Self::Yuyv => b"YUYV",
            Self::Rgb24 => b"RGB3",
        })
    }

    /// Parse `mjpeg`, `yuyv` or `rgb24`, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mjpeg" | "mjpg" => Some(Self::Mjpeg),
            "yuyv" => Some(Self::Yuyv),
            "rgb" | "rgb24" => Some(Self::Rgb24),
            _ => None,
        }
    }
}
