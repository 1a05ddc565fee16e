//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ScannerOptions, SinkKind};
use tracing::info;

use crate::cli::InfoArgs;

const REDACTED: &str = "********";

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let options = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let options = redacted(options);

    if args.json {
        let json = ConfigLoader::to_json(&options).context("Failed to serialize config info")?;
        println!("{}", json);
    } else if args.toml {
        let toml = ConfigLoader::to_toml(&options).context("Failed to serialize config info")?;
        println!("{}", toml);
    } else {
        print_config_info(&options);
    }

    Ok(())
}

/// Effective options with the token and stream credentials masked
fn redacted(mut options: ScannerOptions) -> ScannerOptions {
    if options.home_assistant_token.is_some() {
        options.home_assistant_token = Some(REDACTED.to_string());
    }
    options.camera_rtsp_stream = contracts::redact_userinfo(&options.camera_rtsp_stream);
    options
}

fn print_config_info(options: &ScannerOptions) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Tag Scanner Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📷 Stream");
    println!("   ├─ URI: {}", options.camera_rtsp_stream);
    println!(
        "   ├─ Decode size: {}x{}",
        options.frame_width, options.frame_height
    );
    println!("   ├─ ffmpeg: {}", options.ffmpeg_path);
    println!("   ├─ Read timeout: {}s", options.stream_read_timeout);
    println!("   └─ Reconnect delay: {}s", options.stream_reconnect_delay);

    println!("\n🔍 Detection");
    println!("   ├─ Detector: {}", options.detector_type);
    println!("   ├─ Sample interval: {}s", options.frame_sample_interval);
    println!("   └─ Device id: {}", options.tag_event_device_id);

    println!("\n📤 Sink");
    match options.sink {
        SinkKind::HomeAssistant => {
            println!("   ├─ Type: {}", options.sink);
            println!("   ├─ API: {}", options.home_assistant_api_url);
            let token = match options.home_assistant_token {
                Some(_) => "configured".to_string(),
                None => format!("from {}", contracts::SUPERVISOR_TOKEN_ENV),
            };
            println!("   ├─ Token: {}", token);
            println!("   └─ HTTP timeout: {}s", options.http_timeout);
        }
        SinkKind::Log => println!("   └─ Type: {}", options.sink),
    }

    println!();
}
