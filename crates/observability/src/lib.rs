//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - 流状态、采样、检测、投递指标
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{ObservabilityConfig, Verbosity};
//!
//! observability::init(&ObservabilityConfig { verbosity: Verbosity::Debug, ..Default::default() })?;
//! observability::record_frame_read(true);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    describe_metrics, record_detection, record_event_delivery, record_frame_read,
    record_open_failure, record_stream_failure, record_stream_state, DetectionOutcome,
    LatencySummary, LatencyTracker,
};

/// 可观测性配置
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 日志详细程度
    pub verbosity: Verbosity,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 日志详细程度
///
/// `Quiet` ignores `RUST_LOG`; the other levels are only defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Debug,
    Trace,
}

impl Verbosity {
    /// From `-q` / repeated `-v`
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Debug,
            (false, _) => Self::Trace,
        }
    }

    /// EnvFilter directives; the HTTP client stack stays one level quieter
    pub fn directives(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info,ureq=warn,rustls=warn",
            Self::Debug => "debug,ureq=info,rustls=info",
            Self::Trace => "trace",
        }
    }
}

fn env_filter(verbosity: Verbosity) -> EnvFilter {
    if verbosity == Verbosity::Quiet {
        return EnvFilter::new(verbosity.directives());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directives()))
}

/// 初始化 Tracing，并按需启动 Prometheus 导出
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter(config.verbosity))
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        start_metrics_exporter(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        verbosity = ?config.verbosity,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// 启动 Prometheus 导出器并注册指标说明
///
/// Tracing 需已初始化；只能调用一次。
pub fn start_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to start Prometheus exporter on port {port}"))?;
    describe_metrics();

    tracing::info!(port, "Prometheus metrics endpoint listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Trace);
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Debug,
            Verbosity::Trace,
        ] {
            assert!(EnvFilter::try_new(verbosity.directives()).is_ok());
        }
    }
}
