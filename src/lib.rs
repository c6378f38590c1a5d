//! socialqr - QR codes for social-media profile links
//!
//! This library builds profile links for a fixed set of social platforms,
//! renders them as QR codes, exports them as PNG images with optional
//! captions, and scans QR codes back from still images or a live camera.
//!
//! # Features
//!
//! - **Wizard**: three-step generate flow ending in a rendered QR code
//! - **Export**: PNG output with white or transparent background and captions
//! - **Scanning**: single-shot still-image decode and a cancellable camera loop
//! - **Camera Integration**: V4L2 backend behind the `camera` feature
//!
//! # Example
//!
//! ```no_run
//! use socialqr::{ExportOptions, Wizard};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut wizard = Wizard::new();
//!     wizard.select_platform("Instagram")?;
//!     wizard.set_username("alice");
//!     wizard.submit()?; // step 2: captions
//!     wizard.submit()?; // step 3: appearance
//!     wizard.submit()?; // generated
//!
//!     let exported = wizard.export(&ExportOptions::default())?;
//!     exported.save_in(std::path::Path::new("."))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod export;
pub mod link;
pub mod logging;
pub mod platform;
pub mod qr;
pub mod raster;
pub mod scan;
pub mod wizard;

#[cfg(feature = "camera")]
#[cfg_attr(docsrs, doc(cfg(feature = "camera")))]
pub mod camera;

// Re-exports for convenience
pub use error::{Error, Result};

#[cfg(feature = "camera")]
pub use camera::{CameraConfig, V4l2Camera};

pub use config::{ExportOptions, Facing, LogRotation, LoggingOptions, ScanOptions, SocialQrConfig};
pub use export::{ExportRequest, ExportedImage};
pub use platform::PlatformEntry;
pub use qr::{Background, FrameDecoder, QrDecoder, QrEncoder, VectorImage};
pub use scan::{CameraSource, CapturedFrame, ScanHandle, ScanOutcome, ScanSession, VideoStream};
pub use wizard::{GeneratedQr, Stage, Wizard, WizardForm};
