//! # Dispatcher
//!
//! 事件投递模块。
//!
//! 负责：
//! - 按配置选择 EventSink (Home Assistant / Log)
//! - 投递 `TagEvent`，至多一次，失败只记录不重试
//! - 统计每个 sink 的投递结果

pub mod metrics;
pub mod sinks;

use std::sync::Arc;

pub use contracts::{EventSink, TagEvent};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{HomeAssistantConfig, HomeAssistantSink, LogSink, TAG_SCANNED_EVENT};

use contracts::{ContractError, DeliveryError, ScannerOptions, SinkKind};
use tracing::info;

/// Sink chosen at startup from `ScannerOptions::sink`
pub enum AnySink {
    HomeAssistant(HomeAssistantSink),
    Log(LogSink),
}

impl AnySink {
    /// Delivery counters of the wrapped sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        match self {
            Self::HomeAssistant(sink) => sink.metrics(),
            Self::Log(sink) => sink.metrics(),
        }
    }
}

// Sinks hold credentials; only the kind and name are shown
impl std::fmt::Debug for AnySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::HomeAssistant(_) => "HomeAssistant",
            Self::Log(_) => "Log",
        };
        f.debug_struct("AnySink")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

impl EventSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::HomeAssistant(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    async fn emit(&mut self, event: &TagEvent) -> Result<(), DeliveryError> {
        match self {
            Self::HomeAssistant(sink) => sink.emit(event).await,
            Self::Log(sink) => sink.emit(event).await,
        }
    }
}

/// Create the configured sink
///
/// `token` is the already-resolved Home Assistant token (option or
/// `SUPERVISOR_TOKEN`).
///
/// # Errors
/// `ConfigValidation` when the Home Assistant sink is selected without a token.
pub fn create_sink(
    options: &ScannerOptions,
    token: Option<String>,
) -> Result<AnySink, ContractError> {
    let sink = match options.sink {
        SinkKind::Log => AnySink::Log(LogSink::new("log")),
        SinkKind::HomeAssistant => {
            let token = token.ok_or_else(|| {
                ContractError::config_validation(
                    "home_assistant_token",
                    format!(
                        "required for the home_assistant sink (or set {})",
                        contracts::SUPERVISOR_TOKEN_ENV
                    ),
                )
            })?;
            AnySink::HomeAssistant(HomeAssistantSink::new(HomeAssistantConfig {
                api_url: options.home_assistant_api_url.clone(),
                token,
                timeout: options.http_timeout(),
            }))
        }
    };
    info!(sink = %sink.name(), "event sink created");
    Ok(sink)
}
