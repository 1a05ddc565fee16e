//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ContractError, ScannerOptions, SinkKind};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::ValidateArgs;

/// Outcome of checking one options file
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Report {
    Valid {
        config_path: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<Warning>,
        effective: EffectiveOptions,
    },
    Invalid {
        config_path: String,
        stage: FailedStage,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        message: String,
    },
}

/// Where loading stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum FailedStage {
    Missing,
    Read,
    Parse,
    Validation,
}

/// Non-fatal finding, keyed by option name
#[derive(Debug, Serialize)]
struct Warning {
    field: &'static str,
    message: String,
}

/// What `run` would use; credentials in the stream URI are masked
#[derive(Debug, Serialize)]
struct EffectiveOptions {
    detector: String,
    device_id: String,
    stream: String,
    decode_size: String,
    sink: String,
    frame_sample_interval: f64,
    stream_reconnect_delay: f64,
}

impl Report {
    fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    fn invalid(path: &Path, error: ContractError) -> Self {
        let (stage, field, message) = match error {
            ContractError::ConfigValidation { field, message } => {
                (FailedStage::Validation, Some(field), message)
            }
            ContractError::Io(e) => (FailedStage::Read, None, e.to_string()),
            other => (FailedStage::Parse, None, other.to_string()),
        };
        Self::Invalid {
            config_path: path.display().to_string(),
            stage,
            field,
            message,
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let report = check(&args.config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize validation report")?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    if !report.is_valid() {
        anyhow::bail!("Configuration validation failed");
    }
    Ok(())
}

fn check(path: &Path) -> Report {
    if !path.exists() {
        return Report::Invalid {
            config_path: path.display().to_string(),
            stage: FailedStage::Missing,
            field: None,
            message: "file not found".to_string(),
        };
    }

    match ConfigLoader::load_from_path(path) {
        Ok(options) => Report::Valid {
            config_path: path.display().to_string(),
            warnings: warnings(&options),
            effective: EffectiveOptions {
                detector: options.detector_type.to_string(),
                device_id: options.tag_event_device_id.clone(),
                stream: contracts::redact_userinfo(&options.camera_rtsp_stream),
                decode_size: format!("{}x{}", options.frame_width, options.frame_height),
                sink: options.sink.to_string(),
                frame_sample_interval: options.frame_sample_interval,
                stream_reconnect_delay: options.stream_reconnect_delay,
            },
        },
        Err(e) => Report::invalid(path, e),
    }
}

fn warnings(options: &ScannerOptions) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if options.sink == SinkKind::HomeAssistant && ConfigLoader::resolve_token(options).is_none() {
        warnings.push(Warning {
            field: "home_assistant_token",
            message: format!(
                "not set and {} is empty; `run` will refuse to start",
                contracts::SUPERVISOR_TOKEN_ENV
            ),
        });
    }
    if options.frame_sample_interval == 0.0 {
        warnings.push(Warning {
            field: "frame_sample_interval",
            message: "0 sends every frame to the detector".to_string(),
        });
    }
    if options.camera_rtsp_stream.starts_with(ingestion::STUB_SCHEME) {
        warnings.push(Warning {
            field: "camera_rtsp_stream",
            message: "stub:// yields synthetic frames, no camera is read".to_string(),
        });
    }

    warnings
}

fn print_report(report: &Report) {
    match report {
        Report::Valid {
            config_path,
            warnings,
            effective,
        } => {
            println!("✓ Configuration is valid: {config_path}");
            println!("\n  Detector: {}", effective.detector);
            println!("  Device id: {}", effective.device_id);
            println!("  Stream: {} ({})", effective.stream, effective.decode_size);
            println!("  Sink: {}", effective.sink);
            println!("  Sample interval: {}s", effective.frame_sample_interval);
            println!("  Reconnect delay: {}s", effective.stream_reconnect_delay);

            if !warnings.is_empty() {
                println!("\n⚠ Warnings:");
                for warning in warnings {
                    println!("  - {}: {}", warning.field, warning.message);
                }
            }
        }
        Report::Invalid {
            config_path,
            stage,
            field,
            message,
        } => {
            println!("✗ Configuration is invalid: {config_path}");
            match field {
                Some(field) => println!("\n  {stage:?} error in '{field}': {message}"),
                None => println!("\n  {stage:?} error: {message}"),
            }
        }
    }
}
