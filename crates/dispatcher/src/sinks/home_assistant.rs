//! HomeAssistantSink - fires `tag_scanned` through the Home Assistant REST API
//!
//! `POST {api_url}events/tag_scanned` with a bearer token and the event as
//! JSON. Anything but `200 OK` is a delivery error; there is no retry.

use std::sync::Arc;
use std::time::Duration;

use contracts::{DeliveryError, EventSink, TagEvent};
use tracing::{debug, instrument};

use crate::metrics::SinkMetrics;

/// Home Assistant event type fired for every scan
pub const TAG_SCANNED_EVENT: &str = "tag_scanned";

const SINK_NAME: &str = "home_assistant";

/// Configuration for HomeAssistantSink
#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    /// REST API base, e.g. `http://supervisor/core/api/`
    pub api_url: String,
    /// Long-lived or supervisor token
    pub token: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl HomeAssistantConfig {
    /// Full URL of the `tag_scanned` event endpoint
    pub fn endpoint(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        format!("{base}/events/{TAG_SCANNED_EVENT}")
    }
}

/// Sink posting events to Home Assistant
pub struct HomeAssistantSink {
    endpoint: String,
    authorization: String,
    agent: ureq::Agent,
    metrics: Arc<SinkMetrics>,
}

impl HomeAssistantSink {
    /// Create a new HomeAssistantSink
    pub fn new(config: HomeAssistantConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            endpoint: config.endpoint(),
            authorization: format!("Bearer {}", config.token),
            agent,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn metrics(&self) -> Arc<SinkMetrics> {
        self.metrics.clone()
    }
}

/// Blocking POST; runs on the blocking pool
fn post_event(
    agent: &ureq::Agent,
    endpoint: &str,
    authorization: &str,
    event: &TagEvent,
) -> Result<(), DeliveryError> {
    let response = agent
        .post(endpoint)
        .set("Authorization", authorization)
        .send_json(event);

    match response {
        Ok(response) if response.status() == 200 => Ok(()),
        Ok(response) => {
            let status = response.status();
            Err(DeliveryError::Status {
                sink: SINK_NAME.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            })
        }
        Err(ureq::Error::Status(status, response)) => Err(DeliveryError::Status {
            sink: SINK_NAME.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        }),
        Err(e) => Err(DeliveryError::transport(SINK_NAME, e.to_string())),
    }
}

impl EventSink for HomeAssistantSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    #[instrument(
        name = "home_assistant_emit",
        skip(self, event),
        fields(endpoint = %self.endpoint, tag_id = %event.tag_id)
    )]
    async fn emit(&mut self, event: &TagEvent) -> Result<(), DeliveryError> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let authorization = self.authorization.clone();
        let event = event.clone();

        let result = tokio::task::spawn_blocking(move || {
            post_event(&agent, &endpoint, &authorization, &event)
        })
        .await
        .unwrap_or_else(|e| Err(DeliveryError::transport(SINK_NAME, e.to_string())));

        self.metrics.record(&result);
        if result.is_ok() {
            debug!("event accepted");
        }
        result
    }
}
