//! Three-step wizard collecting everything needed to generate a QR code
//!
//! ```text
//! Profile --submit--> Caption --submit--> Appearance --submit--> Generated
//!    ^                                                               |
//!    +---------------------------- reset ----------------------------+
//! ```
//!
//! The generated payload only exists in [`Stage::Generated`], so a wizard
//! can never hold a QR value while it is still collecting input.

use crate::config::ExportOptions;
use crate::error::{Error, Result};
use crate::export::{self, ExportRequest, ExportedImage};
use crate::link;
use crate::platform::{self, CUSTOM_LINK, PlatformEntry};
use crate::qr::{Background, FrameDecoder, QrEncoder, VectorImage};
use crate::scan::{self, ScanOutcome};
use std::time::Duration;

/// Smallest selectable QR size in pixels
pub const MIN_SIZE: u32 = 100;
/// Largest selectable QR size in pixels
pub const MAX_SIZE: u32 = 1000;
/// Size slider granularity
pub const SIZE_STEP: u32 = 10;
/// Initial QR size
pub const DEFAULT_SIZE: u32 = 200;

/// User input gathered across the steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardForm {
    /// Selected platform name, empty until chosen
    pub platform: String,
    /// Profile username
    pub username: String,
    /// Full URL used with the custom-link platform
    pub custom_link: String,
    /// Optional caption title
    pub title: String,
    /// Optional caption description
    pub description: String,
    /// QR side in pixels, within [`MIN_SIZE`]..=[`MAX_SIZE`]
    pub size: u32,
    /// Render without a white background
    pub transparent: bool,
}

impl Default for WizardForm {
    fn default() -> Self {
        Self {
            platform: String::new(),
            username: String::new(),
            custom_link: String::new(),
            title: String::new(),
            description: String::new(),
            size: DEFAULT_SIZE,
            transparent: false,
        }
    }
}

/// A QR code produced by the final step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQr {
    /// Encoded link
    pub payload: String,
    /// Rendered code
    pub image: VectorImage,
    /// Caption title, if any
    pub title: Option<String>,
    /// Caption description, if any
    pub description: Option<String>,
}

impl GeneratedQr {
    /// Export request for this code
    pub fn export_request(&self) -> ExportRequest<'_> {
        ExportRequest {
            image: &self.image,
            size: self.image.size(),
            transparent: self.image.background().is_transparent(),
            title: self.title.as_deref(),
            description: self.description.as_deref(),
        }
    }
}

/// Where the wizard currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Step 1: platform and username or custom link
    Profile,
    /// Step 2: optional title and description
    Caption,
    /// Step 3: size and transparency
    Appearance,
    /// Terminal: the QR code has been generated
    Generated(GeneratedQr),
}

impl Stage {
    /// 1-based step number, `None` once generated
    pub fn step(&self) -> Option<u8> {
        match self {
            Self::Profile => Some(1),
            Self::Caption => Some(2),
            Self::Appearance => Some(3),
            Self::Generated(_) => None,
        }
    }
}

/// The generate flow
pub struct Wizard {
    form: WizardForm,
    stage: Stage,
    encoder: QrEncoder,
}

impl Wizard {
    /// Fresh wizard at step 1 with default fields
    pub fn new() -> Self {
        Self::with_encoder(QrEncoder::new())
    }

    /// Fresh wizard rendering through `encoder`
    pub fn with_encoder(encoder: QrEncoder) -> Self {
        Self {
            form: WizardForm::default(),
            stage: Stage::Profile,
            encoder,
        }
    }

    /// Current stage
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Current field values
    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    /// Generated code, once the wizard has finished
    pub fn generated(&self) -> Option<&GeneratedQr> {
        match &self.stage {
            Stage::Generated(qr) => Some(qr),
            _ => None,
        }
    }

    /// Pick a platform from the registry
    pub fn select_platform(&mut self, name: &str) -> Result<&'static PlatformEntry> {
        let entry =
            platform::lookup(name).ok_or_else(|| Error::UnknownPlatform(name.to_string()))?;
        self.form.platform = entry.name.to_string();
        Ok(entry)
    }

    /// Set the profile username
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.form.username = username.into();
    }

    /// Set the custom link
    pub fn set_custom_link(&mut self, link: impl Into<String>) {
        self.form.custom_link = link.into();
    }

    /// Set the caption title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.form.title = title.into();
    }

    /// Set the caption description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.form.description = description.into();
    }

    /// Set the QR size, clamped to the allowed range and snapped to the slider step
    pub fn set_size(&mut self, size: u32) -> u32 {
        let clamped = size.clamp(MIN_SIZE, MAX_SIZE);
        let snapped = (clamped + SIZE_STEP / 2) / SIZE_STEP * SIZE_STEP;
        self.form.size = snapped.min(MAX_SIZE);
        self.form.size
    }

    /// Toggle the transparent background
    pub fn set_transparent(&mut self, transparent: bool) {
        self.form.transparent = transparent;
    }

    /// Advance one step. The last step builds the link and renders the code.
    pub fn submit(&mut self) -> Result<&Stage> {
        if self.generated().is_some() {
            return Ok(&self.stage);
        }

        let next = match self.stage {
            Stage::Profile => {
                self.validate_profile()?;
                Stage::Caption
            }
            Stage::Caption => Stage::Appearance,
            Stage::Appearance | Stage::Generated(_) => Stage::Generated(self.generate()?),
        };

        tracing::debug!(from = ?self.stage.step(), to = ?next.step(), "Wizard advanced");
        self.stage = next;
        Ok(&self.stage)
    }

    /// Back to step 1 with every field at its default
    pub fn reset(&mut self) {
        self.form = WizardForm::default();
        self.stage = Stage::Profile;
    }

    /// Export the generated code
    pub fn export(&self, options: &ExportOptions) -> Result<ExportedImage> {
        let qr = self.require_generated()?;
        export::export(&qr.export_request(), options)
    }

    /// Scan the generated code once, reporting after `feedback_delay`
    pub async fn scan_generated(
        &self,
        decoder: &dyn FrameDecoder,
        feedback_delay: Duration,
    ) -> Result<ScanOutcome> {
        let qr = self.require_generated()?;
        scan::scan_image_paced(&qr.image, decoder, feedback_delay).await
    }

    fn require_generated(&self) -> Result<&GeneratedQr> {
        self.generated()
            .ok_or_else(|| Error::Validation("no QR code has been generated yet".to_string()))
    }

    fn validate_profile(&self) -> Result<()> {
        let entry = platform::lookup(&self.form.platform)
            .ok_or_else(|| Error::Validation("select a platform".to_string()))?;

        let (field, value) = if entry.name == CUSTOM_LINK {
            ("custom link", &self.form.custom_link)
        } else {
            ("username", &self.form.username)
        };

        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{field} is required")));
        }
        Ok(())
    }

    fn generate(&self) -> Result<GeneratedQr> {
        let form = &self.form;
        let payload = link::build(&form.platform, &form.username, &form.custom_link)
            .ok_or_else(|| Error::UnknownPlatform(form.platform.clone()))?;

        let image = self.encoder.render(
            &payload,
            form.size,
            Background::from_transparent(form.transparent),
        )?;

        tracing::info!(platform = %form.platform, %payload, size = form.size, "Generated QR code");

        Ok(GeneratedQr {
            payload,
            image,
            title: non_empty(&form.title),
            description: non_empty(&form.description),
        })
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::QrDecoder;

    fn run_to_result(wizard: &mut Wizard) -> Vec<Option<u8>> {
        let mut steps = vec![wizard.stage().step()];
        for _ in 0..3 {
            steps.push(wizard.submit().unwrap().step());
        }
        steps
    }

    #[test]
    fn test_starts_at_step_one_with_defaults() {
        let wizard = Wizard::new();
        assert_eq!(wizard.stage(), &Stage::Profile);
        assert_eq!(wizard.form(), &WizardForm::default());
        assert_eq!(wizard.form().size, 200);
        assert!(!wizard.form().transparent);
        assert!(wizard.generated().is_none());
    }

    #[test]
    fn test_step_sequence_and_payload() {
        let mut wizard = Wizard::new();
        wizard.select_platform("Instagram").unwrap();
        wizard.set_username("alice");

        let steps = run_to_result(&mut wizard);
        assert_eq!(steps, vec![Some(1), Some(2), Some(3), None]);

        let qr = wizard.generated().unwrap();
        assert_eq!(qr.payload, "https://www.instagram.com/alice/");
        assert_eq!(qr.image.size(), 200);
        assert!(qr.title.is_none());
    }

    #[test]
    fn test_custom_link_payload_unchanged() {
        let mut wizard = Wizard::new();
        wizard.select_platform(CUSTOM_LINK).unwrap();
        wizard.set_custom_link("https://example.com/x");
        run_to_result(&mut wizard);
        assert_eq!(wizard.generated().unwrap().payload, "https://example.com/x");
    }

    #[test]
    fn test_step_one_requires_fields() {
        let mut wizard = Wizard::new();
        assert!(matches!(wizard.submit(), Err(Error::Validation(_))));

        wizard.select_platform("TikTok").unwrap();
        wizard.set_username("   ");
        assert!(matches!(wizard.submit(), Err(Error::Validation(_))));
        assert_eq!(wizard.stage(), &Stage::Profile);

        // Custom link mode checks the link, not the username
        wizard.select_platform(CUSTOM_LINK).unwrap();
        wizard.set_username("alice");
        assert!(matches!(wizard.submit(), Err(Error::Validation(_))));
        wizard.set_custom_link("https://example.com");
        assert_eq!(wizard.submit().unwrap(), &Stage::Caption);
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.select_platform("Myspace"),
            Err(Error::UnknownPlatform(_))
        ));
        assert!(wizard.form().platform.is_empty());
    }

    #[test]
    fn test_submit_after_result_is_noop() {
        let mut wizard = Wizard::new();
        wizard.select_platform("Twitter").unwrap();
        wizard.set_username("bob");
        run_to_result(&mut wizard);
        let before = wizard.generated().cloned();
        assert!(wizard.submit().unwrap().step().is_none());
        assert_eq!(wizard.generated().cloned(), before);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut wizard = Wizard::new();
        wizard.select_platform("LinkedIn").unwrap();
        wizard.set_username("carol");
        wizard.submit().unwrap();
        wizard.set_title("Carol");
        wizard.set_description("Engineer");
        wizard.submit().unwrap();
        wizard.set_size(640);
        wizard.set_transparent(true);
        wizard.submit().unwrap();
        assert!(wizard.generated().is_some());

        wizard.reset();
        assert_eq!(wizard.stage(), &Stage::Profile);
        assert_eq!(wizard.form(), &WizardForm::default());
        assert!(wizard.generated().is_none());
    }

    #[test]
    fn test_size_is_clamped_and_snapped() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.set_size(5), 100);
        assert_eq!(wizard.set_size(5000), 1000);
        assert_eq!(wizard.set_size(254), 250);
        assert_eq!(wizard.set_size(255), 260);
        assert_eq!(wizard.set_size(999), 1000);
    }

    #[test]
    fn test_captions_and_appearance_flow_into_result() {
        let mut wizard = Wizard::new();
        wizard.select_platform("YouTube").unwrap();
        wizard.set_username("dave");
        wizard.submit().unwrap();
        wizard.set_title("Dave");
        wizard.set_description("  \t ");
        wizard.submit().unwrap();
        wizard.set_size(300);
        wizard.set_transparent(true);
        wizard.submit().unwrap();

        let qr = wizard.generated().unwrap();
        assert_eq!(qr.title.as_deref(), Some("Dave"));
        assert!(qr.description.is_none());
        let request = qr.export_request();
        assert_eq!(request.size, 300);
        assert!(request.transparent);
    }

    #[test]
    fn test_export_requires_result() {
        let wizard = Wizard::new();
        assert!(matches!(
            wizard.export(&ExportOptions::default()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_export_from_result() {
        let mut wizard = Wizard::new();
        wizard.select_platform("Facebook").unwrap();
        wizard.set_username("erin");
        wizard.submit().unwrap();
        wizard.set_title("Erin");
        wizard.submit().unwrap();
        wizard.submit().unwrap();

        let exported = wizard.export(&ExportOptions::default()).unwrap();
        assert_eq!(exported.file_name(), "qr-code.png");
        assert_eq!(exported.image().dimensions(), (200, 230));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_generated_code() {
        let mut wizard = Wizard::new();
        wizard.select_platform("Instagram").unwrap();
        wizard.set_username("alice");
        run_to_result(&mut wizard);

        let outcome = wizard
            .scan_generated(&QrDecoder::new(), Duration::from_millis(2000))
            .await
            .unwrap();
        assert_eq!(outcome.text(), Some("https://www.instagram.com/alice/"));
        assert_eq!(outcome.platform().map(|p| p.name), Some("Instagram"));
    }
}
