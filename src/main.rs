//! socialqr command-line entrypoint

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use socialqr::config::SocialQrConfig;
use socialqr::platform::{self, CUSTOM_LINK};
use socialqr::{Error, QrDecoder, Result, ScanOutcome, Stage, Wizard, logging, scan};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "socialqr",
    version,
    about = "Generate and scan QR codes for social-media profile links"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to socialqr.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported platforms
    Platforms,

    /// Generate a QR code; prompts step by step when --platform is omitted
    Generate(GenerateArgs),

    /// Decode a QR code from an image file
    ScanImage {
        /// PNG/JPEG file to decode
        path: PathBuf,
    },

    /// Scan a live camera until a QR code is decoded (Ctrl+C to stop)
    #[cfg(feature = "camera")]
    Scan {
        /// Override camera by name (takes precedence over config file)
        #[arg(long, value_name = "NAME")]
        device: Option<String>,

        /// Override camera by index (/dev/videoN)
        #[arg(long, value_name = "INDEX")]
        device_index: Option<usize>,
    },

    /// List detected cameras
    #[cfg(feature = "camera")]
    ListCameras,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Platform name (see `socialqr platforms`)
    #[arg(long)]
    platform: Option<String>,

    /// Profile username
    #[arg(long)]
    username: Option<String>,

    /// Full link, used with the "Custom Link" platform
    #[arg(long)]
    link: Option<String>,

    /// Caption title drawn below the code
    #[arg(long)]
    title: Option<String>,

    /// Caption description drawn below the title
    #[arg(long)]
    description: Option<String>,

    /// Side of the QR code in pixels (100-1000)
    #[arg(long, default_value_t = socialqr::wizard::DEFAULT_SIZE)]
    size: u32,

    /// Leave the background transparent
    #[arg(long)]
    transparent: bool,

    /// Where to write the PNG (defaults to the configured file name in cwd)
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also write the SVG rendering to this path
    #[arg(long, value_name = "PATH")]
    svg: Option<PathBuf>,

    /// Scan the generated code back and report the result
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SocialQrConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    let result = match cli.command {
        Command::Platforms => {
            list_platforms(cli.json);
            Ok(())
        }
        Command::Generate(ref args) => handle_generate(args, &config, cli.json).await,
        Command::ScanImage { ref path } => handle_scan_image(path, cli.json),
        #[cfg(feature = "camera")]
        Command::Scan {
            ref device,
            device_index,
        } => handle_camera_scan(device.clone(), device_index, &config, cli.json).await,
        #[cfg(feature = "camera")]
        Command::ListCameras => list_cameras(),
    };

    if let Err(err) = result {
        emit_error(cli.json, &err.to_string())?;
        std::process::exit(1);
    }
    Ok(())
}

fn list_platforms(json: bool) {
    if json {
        println!("{}", json!(platform::all()));
        return;
    }
    for entry in platform::all() {
        if entry.is_custom() {
            println!("  {:<12} (any URL)", entry.name);
        } else {
            println!("  {:<12} {}<username>{}", entry.name, entry.url_prefix, entry.url_suffix);
        }
    }
}

async fn handle_generate(args: &GenerateArgs, config: &SocialQrConfig, json: bool) -> Result<()> {
    let mut wizard = Wizard::new();

    if args.platform.is_some() {
        fill_from_args(&mut wizard, args)?;
    } else {
        run_interactive(&mut wizard, &mut io::stdin().lock())?;
    }

    let Stage::Generated(qr) = wizard.stage() else {
        return Err(Error::Validation("wizard did not finish".to_string()));
    };
    info!(payload = %qr.payload, "QR code ready");

    let exported = wizard.export(&config.export)?;
    let png_path = match &args.output {
        Some(path) => {
            exported.save_as(path)?;
            path.clone()
        }
        None => exported.save_in(Path::new("."))?,
    };

    if let Some(svg_path) = &args.svg {
        std::fs::write(svg_path, qr.image.as_svg())?;
    }

    let verified = if args.verify {
        if !json {
            println!("Scanning...");
        }
        Some(
            wizard
                .scan_generated(&QrDecoder::new(), config.scan.feedback_delay())
                .await?,
        )
    } else {
        None
    };

    if json {
        let mut root = json!({
            "payload": qr.payload,
            "file": png_path.display().to_string(),
            "width": exported.image().width(),
            "height": exported.image().height(),
            "transparent": qr.image.background().is_transparent(),
        });
        if let (Some(outcome), Some(obj)) = (&verified, root.as_object_mut()) {
            obj.insert("scan".to_string(), serde_json::to_value(outcome)?);
        }
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("Link: {}", qr.payload);
        println!(
            "Saved {} ({}x{})",
            png_path.display(),
            exported.image().width(),
            exported.image().height()
        );
        if let Some(outcome) = &verified {
            print_outcome(outcome);
        }
    }

    Ok(())
}

fn fill_from_args(wizard: &mut Wizard, args: &GenerateArgs) -> Result<()> {
    let requested = args.platform.as_deref().unwrap_or_default();
    let entry = platform::lookup_ignore_case(requested)
        .ok_or_else(|| Error::UnknownPlatform(requested.to_string()))?;

    wizard.select_platform(entry.name)?;
    if let Some(username) = &args.username {
        wizard.set_username(username.as_str());
    }
    if let Some(link) = &args.link {
        wizard.set_custom_link(link.as_str());
    }
    wizard.submit()?;

    if let Some(title) = &args.title {
        wizard.set_title(title.as_str());
    }
    if let Some(description) = &args.description {
        wizard.set_description(description.as_str());
    }
    wizard.submit()?;

    wizard.set_size(args.size);
    wizard.set_transparent(args.transparent);
    wizard.submit()?;
    Ok(())
}

/// Walk the three steps on a terminal, re-asking a step when validation fails
fn run_interactive(wizard: &mut Wizard, input: &mut impl BufRead) -> Result<()> {
    while let Some(step) = wizard.stage().step() {
        match step {
            1 => {
                println!("Step 1 of 3: profile");
                for (i, entry) in platform::all().iter().enumerate() {
                    println!("  {}. {}", i + 1, entry.name);
                }
                let choice = prompt(input, "Platform (name or number)")?;
                let entry = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| platform::all().get(n.wrapping_sub(1)))
                    .or_else(|| platform::lookup_ignore_case(&choice));
                let Some(entry) = entry else {
                    println!("Unknown platform '{choice}'");
                    continue;
                };
                wizard.select_platform(entry.name)?;
                if entry.name == CUSTOM_LINK {
                    let link = prompt(input, "Custom link")?;
                    wizard.set_custom_link(link);
                } else {
                    let username = prompt(input, "Username")?;
                    wizard.set_username(username);
                }
            }
            2 => {
                println!("Step 2 of 3: captions");
                let title = prompt(input, "Title (optional)")?;
                wizard.set_title(title);
                let description = prompt(input, "Description (optional)")?;
                wizard.set_description(description);
            }
            _ => {
                println!("Step 3 of 3: appearance");
                let size = prompt(input, "Size in pixels [200]")?;
                if let Ok(size) = size.parse::<u32>() {
                    let applied = wizard.set_size(size);
                    println!("Size: {applied}x{applied}");
                }
                let transparent = prompt(input, "Transparent background? [y/N]")?;
                wizard.set_transparent(matches!(
                    transparent.to_ascii_lowercase().as_str(),
                    "y" | "yes"
                ));
            }
        }

        if let Err(err) = wizard.submit() {
            match err {
                Error::Validation(message) => println!("{message}"),
                other => return Err(other),
            }
        }
    }
    Ok(())
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(Error::Validation("input closed before the wizard finished".to_string()));
    }
    Ok(line.trim().to_string())
}

fn handle_scan_image(path: &Path, json: bool) -> Result<()> {
    let outcome = scan::scan_file(path, &QrDecoder::new())?;
    emit_outcome(&outcome, json)
}

#[cfg(feature = "camera")]
async fn handle_camera_scan(
    device: Option<String>,
    device_index: Option<usize>,
    config: &SocialQrConfig,
    json: bool,
) -> Result<()> {
    use socialqr::camera::DeviceSelector;
    use socialqr::{ScanSession, V4l2Camera};
    use std::sync::Arc;

    let mut camera_config = config.camera_config()?;
    if let Some(name) = device {
        camera_config.device = DeviceSelector::Name(name);
    } else if let Some(index) = device_index {
        camera_config.device = DeviceSelector::Index(index);
    }
    info!(?camera_config, "Starting camera scan");

    if !json {
        println!("Point the camera at a QR code (Ctrl+C to stop)...");
    }

    let mut handle = ScanSession::new(
        Arc::new(V4l2Camera::new(camera_config)),
        Arc::new(QrDecoder::new()),
    )
    .with_options(config.scan.clone())
    .start();

    let finished = tokio::select! {
        result = handle.wait() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(result) => result?,
        None => handle.stop().await?,
    };

    emit_outcome(&outcome, json)
}

#[cfg(feature = "camera")]
fn list_cameras() -> Result<()> {
    let devices = socialqr::camera::list_devices()?;
    println!("Discovered cameras:");
    for dev in devices {
        println!("  [{}] {} ({})", dev.index, dev.name, dev.path);
    }
    Ok(())
}

fn emit_outcome(outcome: &ScanOutcome, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(outcome)?;
        if let (Some(entry), Some(obj)) = (outcome.platform(), value.as_object_mut()) {
            obj.insert("platform".to_string(), Value::from(entry.name));
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_outcome(outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Decoded { text } => {
            println!("Success: scanned QR code");
            println!("  {text}");
            if let Some(entry) = outcome.platform() {
                println!("  Visit {} profile: {text}", entry.name);
            }
        }
        ScanOutcome::Cancelled => println!("Scan stopped"),
        other => {
            if let Some(alert) = other.alert() {
                println!("Error: {alert}");
            }
        }
    }
}

fn emit_error(json: bool, message: &str) -> Result<()> {
    if json {
        let payload = json!({ "error": message });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        eprintln!("Error: {message}");
    }
    Ok(())
}
