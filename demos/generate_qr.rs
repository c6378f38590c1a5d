//! Generate a profile QR code with captions and save it as PNG
//!
//! Usage: cargo run --example generate_qr

use socialqr::{ExportOptions, QrDecoder, Wizard};
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut wizard = Wizard::new();

    wizard.select_platform("Instagram")?;
    wizard.set_username("alice");
    wizard.submit()?;

    wizard.set_title("Follow me");
    wizard.set_description("New posts every week");
    wizard.submit()?;

    wizard.set_size(300);
    wizard.submit()?;

    let exported = wizard.export(&ExportOptions::default())?;
    let path = exported.save_in(Path::new("."))?;
    println!(
        "QR code saved to {} ({}x{})",
        path.display(),
        exported.image().width(),
        exported.image().height()
    );

    // Transparent variant without captions
    wizard.reset();
    wizard.select_platform("TikTok")?;
    wizard.set_username("alice");
    wizard.submit()?;
    wizard.submit()?;
    wizard.set_transparent(true);
    wizard.submit()?;

    let exported = wizard.export(&ExportOptions {
        file_name: "qr-code-transparent.png".to_string(),
        ..ExportOptions::default()
    })?;
    exported.save_in(Path::new("."))?;

    let outcome = wizard
        .scan_generated(&QrDecoder::new(), Duration::ZERO)
        .await?;
    println!("Scanned back: {:?}", outcome.text());

    Ok(())
}
