//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::ScannerOptions;
use ingestion::UriSource;
use orchestrator::Pipeline;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_scanner(args: &RunArgs) -> Result<()> {
    let options = load_options(args)?;

    info!(
        detector = %options.detector_type,
        device_id = %options.tag_event_device_id,
        stream = %contracts::redact_userinfo(&options.camera_rtsp_stream),
        sink = %options.sink,
        sample_interval_secs = options.frame_sample_interval,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&options);
        return Ok(());
    }

    // Initialize Metrics (optional)
    if args.metrics_port != 0 {
        observability::start_metrics_exporter(args.metrics_port)?;
    }

    let token = ConfigLoader::resolve_token(&options);
    let sink = dispatcher::create_sink(&options, token).context("Failed to create event sink")?;
    let sink_metrics = sink.metrics();
    let source = UriSource::from_options(&options);
    let detector = detection::build_detector(options.detector_type);

    let pipeline = Pipeline::new(options.to_pipeline_config(), source, detector, sink);
    let grace = Duration::try_from_secs_f64(args.grace_period)
        .context("--grace-period must be a non-negative number of seconds")?;
    let timeout = (args.timeout != 0).then(|| Duration::from_secs(args.timeout));

    info!("Starting scanner...");
    let stats = pipeline.run_until(shutdown_signal(timeout), grace).await;

    info!(
        frames_processed = stats.consumer.frames_processed,
        events_delivered = stats.consumer.events_delivered,
        sink_delivered = sink_metrics.delivered(),
        sink_failures = sink_metrics.failures(),
        reconnects = stats.producer.reconnects(),
        duration_secs = stats.duration.as_secs_f64(),
        "Scanner stopped"
    );
    stats.print_summary();

    if !stats.clean_shutdown() {
        warn!(aborted = ?stats.aborted_tasks, "Some tasks did not stop within the grace period");
    }

    info!("Tag Scanner finished");
    Ok(())
}

/// Load the config file, apply CLI overrides, validate the result
///
/// Without a config file, `--stream` and `--device-id` are enough to run
/// with defaults.
fn load_options(args: &RunArgs) -> Result<ScannerOptions> {
    let mut options = if args.config.exists() {
        info!(config = %args.config.display(), "Loading configuration");
        ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else if let (Some(stream), Some(device_id)) = (&args.stream, &args.device_id) {
        info!("No configuration file, using command line options");
        ScannerOptions::new(device_id.clone(), stream.clone())
    } else {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    };

    apply_overrides(&mut options, args);
    ConfigLoader::validate(&options).context("Invalid configuration after CLI overrides")?;
    Ok(options)
}

fn apply_overrides(options: &mut ScannerOptions, args: &RunArgs) {
    if let Some(ref stream) = args.stream {
        info!(stream = %contracts::redact_userinfo(stream), "Overriding stream from CLI");
        options.camera_rtsp_stream = stream.clone();
    }
    if let Some(ref device_id) = args.device_id {
        info!(device_id = %device_id, "Overriding device id from CLI");
        options.tag_event_device_id = device_id.clone();
    }
    if let Some(sink) = args.sink {
        info!(sink = ?sink, "Overriding sink from CLI");
        options.sink = sink.into();
    }
}

/// Resolves on Ctrl+C, SIGTERM, or after `timeout`
async fn shutdown_signal(timeout: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, stopping scanner..."),
        _ = terminate => warn!("Received SIGTERM, stopping scanner..."),
        _ = deadline => info!("Run timeout reached, stopping scanner..."),
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(options: &ScannerOptions) {
    println!("\n=== Configuration Summary ===\n");
    println!("Stream:");
    println!("  URI: {}", contracts::redact_userinfo(&options.camera_rtsp_stream));
    println!("  Decode size: {}x{}", options.frame_width, options.frame_height);
    println!("  Sample interval: {}s", options.frame_sample_interval);
    println!("  Reconnect delay: {}s", options.stream_reconnect_delay);
    println!("\nDetector: {}", options.detector_type);
    println!("Device id: {}", options.tag_event_device_id);
    println!("\nSink: {}", options.sink);
    if options.sink == contracts::SinkKind::HomeAssistant {
        println!("  API: {}", options.home_assistant_api_url);
        let token = if ConfigLoader::resolve_token(options).is_some() {
            "present"
        } else {
            "MISSING"
        };
        println!("  Token: {}", token);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SinkArg;
    use contracts::SinkKind;
    use std::io::Write;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> RunArgs {
        RunArgs {
            config,
            stream: None,
            device_id: None,
            sink: None,
            timeout: 0,
            dry_run: true,
            metrics_port: 0,
            grace_period: 5.0,
        }
    }

    #[test]
    fn test_overrides_applied_to_file_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"tag_event_device_id": "front_door", "camera_rtsp_stream": "rtsp://cam/1"}}"#
        )
        .unwrap();

        let mut args = args(file.path().to_path_buf());
        args.stream = Some("stub://camera".into());
        args.sink = Some(SinkArg::Log);

        let options = load_options(&args).unwrap();
        assert_eq!(options.camera_rtsp_stream, "stub://camera");
        assert_eq!(options.tag_event_device_id, "front_door");
        assert_eq!(options.sink, SinkKind::Log);
    }

    #[test]
    fn test_runs_without_config_file() {
        let mut args = args(PathBuf::from("/nonexistent/options.json"));
        assert!(load_options(&args).is_err());

        args.stream = Some("stub://camera".into());
        args.device_id = Some("desk".into());
        let options = load_options(&args).unwrap();
        assert_eq!(options.tag_event_device_id, "desk");
        assert_eq!(options.frame_sample_interval, 0.5);
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut args = args(PathBuf::from("/nonexistent/options.json"));
        args.stream = Some("stub://camera".into());
        args.device_id = Some("  ".into());
        assert!(load_options(&args).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_timeout() {
        tokio::time::timeout(
            Duration::from_secs(10),
            shutdown_signal(Some(Duration::from_secs(3))),
        )
        .await
        .expect("timeout did not fire");
    }
}
