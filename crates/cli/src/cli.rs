//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::SinkKind;
use std::path::PathBuf;

/// Tag Scanner - turns QR codes seen by a camera into Home Assistant events
#[derive(Parser, Debug)]
#[command(
    name = "tag-scanner",
    author,
    version,
    about = "Camera tag scanner for Home Assistant",
    long_about = "Watches a camera stream, samples frames, decodes machine-readable tags \n\
                  (QR codes) and fires a `tag_scanned` event in Home Assistant for every \n\
                  tag it recognizes."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TAG_SCANNER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TAG_SCANNER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scanner until Ctrl+C / SIGTERM
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (JSON or TOML)
    #[arg(
        short,
        long,
        default_value = config_loader::DEFAULT_CONFIG_PATH,
        env = "TAG_SCANNER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the camera stream URI
    #[arg(long, env = "TAG_SCANNER_STREAM")]
    pub stream: Option<String>,

    /// Override the device id reported with events
    #[arg(long, env = "TAG_SCANNER_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Override the event sink
    #[arg(long, value_enum, env = "TAG_SCANNER_SINK")]
    pub sink: Option<SinkArg>,

    /// Stop after this many seconds (0 = run until signalled)
    #[arg(long, default_value = "0", env = "TAG_SCANNER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running the scanner
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TAG_SCANNER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Seconds to wait for both loops after stop before aborting them
    #[arg(long, default_value = "5", env = "TAG_SCANNER_GRACE_PERIOD")]
    pub grace_period: f64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = config_loader::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = config_loader::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Output the effective configuration as JSON
    #[arg(long, conflicts_with = "toml")]
    pub json: bool,

    /// Output the effective configuration as TOML
    #[arg(long)]
    pub toml: bool,
}

/// Event sink selection on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkArg {
    /// POST events to Home Assistant
    #[value(name = "home_assistant")]
    HomeAssistant,
    /// Log events only
    Log,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::HomeAssistant => SinkKind::HomeAssistant,
            SinkArg::Log => SinkKind::Log,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["tag-scanner", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("/data/options.json"));
        assert_eq!(args.metrics_port, 0);
        assert_eq!(args.grace_period, 5.0);
        assert!(args.sink.is_none());
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "tag-scanner",
            "-v",
            "run",
            "--stream",
            "stub://camera",
            "--device-id",
            "front_door",
            "--sink",
            "log",
            "--timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.stream.as_deref(), Some("stub://camera"));
        assert_eq!(args.sink.map(SinkKind::from), Some(SinkKind::Log));
        assert_eq!(args.timeout, 30);
    }

    #[test]
    fn test_home_assistant_sink_value() {
        let cli =
            Cli::try_parse_from(["tag-scanner", "run", "--sink", "home_assistant"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.sink, Some(SinkArg::HomeAssistant));
    }
}
