//! # Tag Scanner CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 管道编排与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::{ObservabilityConfig, Verbosity};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_scanner, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Tag Scanner starting");

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_scanner(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// Metrics are started separately by `run` so `validate` / `info` never bind
/// a port.
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init(&ObservabilityConfig {
        log_format: cli.log_format.into(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.verbose),
        metrics_port: None,
    })
}
