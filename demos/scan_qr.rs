//! Scan a profile QR code from a webcam
//!
//! Usage: cargo run --example scan_qr --features camera

use socialqr::{CameraConfig, QrDecoder, ScanOptions, ScanOutcome, ScanSession, V4l2Camera};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Available cameras:");
    match socialqr::camera::list_devices() {
        Ok(devices) => {
            for dev in &devices {
                println!("  [{}] {} ({})", dev.index, dev.name, dev.path);
            }
        }
        Err(e) => {
            eprintln!("Error listing cameras: {}", e);
            return Ok(());
        }
    }

    println!("\nScanning for a QR code (Ctrl+C to stop)...\n");

    let mut handle = ScanSession::new(
        Arc::new(V4l2Camera::new(CameraConfig::default())),
        Arc::new(QrDecoder::new()),
    )
    .with_options(ScanOptions::default())
    .on_decoded(|text| println!("Decoded: {text}"))
    .start();

    let finished = tokio::select! {
        result = handle.wait() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(result) => result?,
        None => handle.stop().await?,
    };

    match &outcome {
        ScanOutcome::Decoded { text } => match outcome.platform() {
            Some(entry) => println!("Visit {} profile: {}", entry.name, text),
            None => println!("Link: {}", text),
        },
        other => {
            if let Some(alert) = other.alert() {
                eprintln!("{alert}");
            }
        }
    }

    Ok(())
}
