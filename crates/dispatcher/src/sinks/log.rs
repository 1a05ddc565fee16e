//! LogSink - writes each tag event to the log instead of delivering it

use std::sync::Arc;

use contracts::{DeliveryError, EventSink, TagEvent};
use tracing::{info, instrument};

use crate::metrics::SinkMetrics;

/// Sink for dry runs: logs the exact body the Home Assistant sink would POST
pub struct LogSink {
    name: String,
    metrics: Arc<SinkMetrics>,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<SinkMetrics> {
        self.metrics.clone()
    }

    fn body(event: &TagEvent) -> Result<String, DeliveryError> {
        serde_json::to_string(event)
            .map_err(|e| DeliveryError::transport("log", format!("cannot encode event: {e}")))
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_emit", skip_all, fields(sink = %self.name))]
    async fn emit(&mut self, event: &TagEvent) -> Result<(), DeliveryError> {
        let result = Self::body(event).map(|body| {
            info!(device_id = %event.device_id, %body, "tag_scanned");
        });
        self.metrics.record(&result);
        result
    }
}
