//! Pipeline orchestrator - wires and supervises both loops.
//!
//! Source → StreamProducer → FrameRelay → DetectionConsumer → sink, with one
//! tokio task per loop and a shared `Lifecycle` for stop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Detector, EventSink, PipelineConfig, StreamSource};
use detection::{DetectionConsumer, DetectionMetrics};
use ingestion::{frame_relay, IngestionMetrics, ProducerConfig, StreamProducer};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::{Lifecycle, PipelineStats};

const PRODUCER_TASK: &str = "stream_producer";
const CONSUMER_TASK: &str = "detection_consumer";

/// Assembled, not yet running pipeline
pub struct Pipeline<Src, Snk> {
    config: PipelineConfig,
    source: Src,
    detector: Box<dyn Detector>,
    sink: Snk,
}

impl<Src, Snk> Pipeline<Src, Snk>
where
    Src: StreamSource + 'static,
    Snk: EventSink + 'static,
{
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig, source: Src, detector: Box<dyn Detector>, sink: Snk) -> Self {
        Self {
            config,
            source,
            detector,
            sink,
        }
    }

    /// Spawn the producer and consumer tasks
    pub fn start(self, lifecycle: &Lifecycle) -> RunningPipeline {
        let (publisher, subscriber) = frame_relay();

        let producer = StreamProducer::new(self.source, ProducerConfig::from(&self.config));
        let consumer = DetectionConsumer::new(self.detector, self.sink, self.config.device_id.clone());
        let producer_metrics = producer.metrics();
        let consumer_metrics = consumer.metrics();

        info!(
            detector = %self.config.detector_kind,
            device_id = %self.config.device_id,
            stream = %contracts::redact_userinfo(&self.config.stream_uri),
            sample_interval_ms = self.config.sample_interval.as_millis() as u64,
            "pipeline starting"
        );

        let producer = tokio::spawn(producer.run(publisher, lifecycle.cancel_token()));
        let consumer = tokio::spawn(consumer.run(subscriber, lifecycle.cancel_token()));

        RunningPipeline {
            lifecycle: lifecycle.clone(),
            producer,
            consumer,
            producer_metrics,
            consumer_metrics,
            started_at: Instant::now(),
        }
    }

    /// Run until `signal` resolves, then stop and join within `grace`
    pub async fn run_until<F>(self, signal: F, grace: Duration) -> PipelineStats
    where
        F: Future<Output = ()>,
    {
        let lifecycle = Lifecycle::new();
        let running = self.start(&lifecycle);
        signal.await;
        running.stop(grace).await
    }
}

/// Handle to a started pipeline
pub struct RunningPipeline {
    lifecycle: Lifecycle,
    producer: JoinHandle<ingestion::ProducerStats>,
    consumer: JoinHandle<detection::ConsumerStats>,
    producer_metrics: Arc<IngestionMetrics>,
    consumer_metrics: Arc<DetectionMetrics>,
    started_at: Instant,
}

impl RunningPipeline {
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Request stop, then join
    pub async fn stop(self, grace: Duration) -> PipelineStats {
        self.lifecycle.request_stop();
        self.join(grace).await
    }

    /// Wait for both loops to finish
    ///
    /// The loops only exit after a stop request. A loop still running once
    /// `grace` has elapsed is aborted; its stats then come from the live
    /// counters.
    pub async fn join(self, grace: Duration) -> PipelineStats {
        let deadline = Instant::now() + grace;
        let mut aborted_tasks = Vec::new();

        let producer = match join_task(PRODUCER_TASK, self.producer, deadline).await {
            Some(stats) => stats,
            None => {
                aborted_tasks.push(PRODUCER_TASK);
                self.producer_metrics.snapshot()
            }
        };
        let consumer = match join_task(CONSUMER_TASK, self.consumer, deadline).await {
            Some(stats) => stats,
            None => {
                aborted_tasks.push(CONSUMER_TASK);
                self.consumer_metrics.snapshot()
            }
        };

        let stats = PipelineStats {
            producer,
            consumer,
            duration: self.started_at.elapsed(),
            aborted_tasks,
        };
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            clean = stats.clean_shutdown(),
            "pipeline stopped"
        );
        stats
    }
}

async fn join_task<T>(name: &'static str, mut handle: JoinHandle<T>, deadline: Instant) -> Option<T> {
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(stats)) => Some(stats),
        Ok(Err(e)) => {
            error!(task = name, error = %e, "pipeline task failed");
            None
        }
        Err(_) => {
            warn!(task = name, "grace period exceeded, aborting task");
            handle.abort();
            None
        }
    }
}
