//! Detection consumer loop
//!
//! Waits for the newest frame on the relay, runs the detector on the
//! blocking pool and hands decoded payloads to the event sink. A failing
//! frame is logged and skipped; the loop only ends on stop or when the
//! relay closes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use contracts::{DetectionError, Detector, EventSink, Frame, TagEvent};
use ingestion::FrameSubscriber;
use observability::{DetectionOutcome, LatencySummary, LatencyTracker};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Consumer metrics, shared through `Arc` while the loop runs
#[derive(Debug, Default)]
pub struct DetectionMetrics {
    pub frames_processed: AtomicU64,
    pub detections: AtomicU64,
    pub detection_errors: AtomicU64,
    pub events_delivered: AtomicU64,
    pub delivery_failures: AtomicU64,
}

impl DetectionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot (latency not included)
    pub fn snapshot(&self) -> ConsumerStats {
        ConsumerStats {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            detection_errors: self.detection_errors.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            latency_ms: LatencySummary::default(),
        }
    }
}

/// Consumer summary returned by `run`
#[derive(Debug, Clone, Default)]
pub struct ConsumerStats {
    pub frames_processed: u64,
    pub detections: u64,
    pub detection_errors: u64,
    pub events_delivered: u64,
    pub delivery_failures: u64,
    /// Detection latency per frame
    pub latency_ms: LatencySummary,
}

/// Detection consumer
pub struct DetectionConsumer<S> {
    detector: Arc<Mutex<Box<dyn Detector>>>,
    detector_name: String,
    sink: S,
    device_id: String,
    latency: LatencyTracker,
    metrics: Arc<DetectionMetrics>,
}

impl<S: EventSink> DetectionConsumer<S> {
    /// Create a consumer reporting events as `device_id`
    pub fn new(detector: Box<dyn Detector>, sink: S, device_id: impl Into<String>) -> Self {
        let detector_name = detector.name().to_string();
        Self {
            detector: Arc::new(Mutex::new(detector)),
            detector_name,
            sink,
            device_id: device_id.into(),
            latency: LatencyTracker::default(),
            metrics: Arc::new(DetectionMetrics::new()),
        }
    }

    /// Shared metrics, readable while the consumer runs
    pub fn metrics(&self) -> Arc<DetectionMetrics> {
        self.metrics.clone()
    }

    /// Run until `cancel` fires or the relay closes
    ///
    /// Stop is checked between frames: a frame already being handled when
    /// stop is requested is detected and, on a hit, delivered before the
    /// loop exits.
    #[instrument(
        name = "detection_consumer",
        skip_all,
        fields(detector = %self.detector_name, sink = %self.sink.name())
    )]
    pub async fn run(mut self, mut subscriber: FrameSubscriber, cancel: CancellationToken) -> ConsumerStats {
        info!(device_id = %self.device_id, "detection consumer started");

        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = subscriber.await_next() => match next {
                    Some(frame) => frame,
                    None => {
                        debug!("frame relay closed");
                        break;
                    }
                },
            };

            let sequence = frame.sequence;
            let started = Instant::now();
            let result = run_detector(self.detector.clone(), &self.detector_name, frame).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            self.latency.push(latency_ms);
            DetectionMetrics::bump(&self.metrics.frames_processed);

            match result {
                Ok(None) => {
                    observability::record_detection(&self.detector_name, DetectionOutcome::Miss, latency_ms);
                }
                Ok(Some(payload)) => {
                    observability::record_detection(&self.detector_name, DetectionOutcome::Hit, latency_ms);
                    DetectionMetrics::bump(&self.metrics.detections);
                    info!(sequence, raw_data = %payload, "tag detected");
                    self.deliver(TagEvent::scanned(&self.device_id, payload)).await;
                }
                Err(e) => {
                    observability::record_detection(&self.detector_name, DetectionOutcome::Error, latency_ms);
                    DetectionMetrics::bump(&self.metrics.detection_errors);
                    warn!(sequence, error = %e, "detection failed");
                }
            }
        }

        let mut stats = self.metrics.snapshot();
        stats.latency_ms = self.latency.summary();
        info!(
            frames_processed = stats.frames_processed,
            detections = stats.detections,
            events_delivered = stats.events_delivered,
            "detection consumer stopped"
        );
        stats
    }

    async fn deliver(&mut self, event: TagEvent) {
        let sink_name = self.sink.name().to_string();
        match self.sink.emit(&event).await {
            Ok(()) => {
                DetectionMetrics::bump(&self.metrics.events_delivered);
                observability::record_event_delivery(&sink_name, true);
                info!(tag_id = %event.tag_id, device_id = %event.device_id, "tag event delivered");
            }
            Err(e) => {
                DetectionMetrics::bump(&self.metrics.delivery_failures);
                observability::record_event_delivery(&sink_name, false);
                warn!(error = %e, "failed to deliver tag event");
            }
        }
    }
}

/// Run the detector on the blocking pool
async fn run_detector(
    detector: Arc<Mutex<Box<dyn Detector>>>,
    name: &str,
    frame: Arc<Frame>,
) -> Result<Option<String>, DetectionError> {
    let task = tokio::task::spawn_blocking(move || {
        // A previous panic poisons the lock; the detector itself is still usable
        let mut detector = detector.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        detector.detect(&frame)
    });

    match task.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(DetectionError::Panicked {
            detector: name.to_string(),
        }),
        Err(e) => Err(DetectionError::backend(name, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeliveryError, PixelFormat};
    use ingestion::frame_relay;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    /// Payload = frame bytes as UTF-8; "FAIL" errors, "PANIC" panics, "" misses
    struct ScriptedDetector;

    impl Detector for ScriptedDetector {
        fn name(&self) -> &str {
            "scripted"
        }

        fn detect(&mut self, frame: &Frame) -> Result<Option<String>, DetectionError> {
            match std::str::from_utf8(&frame.data) {
                Ok("FAIL") => Err(DetectionError::backend("scripted", "scripted failure")),
                Ok("PANIC") => panic!("scripted panic"),
                Ok("SLOW") => {
                    std::thread::sleep(Duration::from_millis(200));
                    Ok(Some("SLOW".to_string()))
                }
                Ok("") => Ok(None),
                Ok(text) => Ok(Some(text.to_string())),
                Err(_) => Ok(None),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<TagEvent>>>,
        fail: bool,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<TagEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn emit(&mut self, event: &TagEvent) -> Result<(), DeliveryError> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(DeliveryError::transport("recording", "scripted failure"));
            }
            Ok(())
        }
    }

    fn frame(sequence: u64, payload: &str) -> Frame {
        let mut frame = Frame::new(
            payload.len() as u32,
            1,
            PixelFormat::Luma8,
            payload.as_bytes().to_vec(),
        );
        frame.sequence = sequence;
        frame
    }

    /// Publish one frame and wait until the consumer has processed it
    async fn feed(publisher: &ingestion::FramePublisher, metrics: &DetectionMetrics, frame: Frame) {
        let before = metrics.frames_processed.load(Ordering::Relaxed);
        publisher.publish(frame);
        timeout(Duration::from_secs(5), async {
            while metrics.frames_processed.load(Ordering::Relaxed) == before {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("frame not processed");
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_next_frame() {
        let sink = RecordingSink::default();
        let consumer = DetectionConsumer::new(Box::new(ScriptedDetector), sink.clone(), "door");
        let metrics = consumer.metrics();
        let (publisher, subscriber) = frame_relay();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(consumer.run(subscriber, cancel.clone()));

        feed(&publisher, &metrics, frame(1, "FAIL")).await;
        feed(&publisher, &metrics, frame(2, "PANIC")).await;
        feed(&publisher, &metrics, frame(3, "ABC123")).await;

        cancel.cancel();
        let stats = handle.await.unwrap();

        assert_eq!(stats.frames_processed, 3);
        assert_eq!(stats.detection_errors, 2);
        assert_eq!(stats.events_delivered, 1);
        assert_eq!(stats.latency_ms.count, 3);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].raw_data, "ABC123");
        assert_eq!(events[0].device_id, "door");
        assert_eq!(events[0].tag_id, "door");
    }

    #[tokio::test]
    async fn test_delivery_failure_counted() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let consumer = DetectionConsumer::new(Box::new(ScriptedDetector), sink.clone(), "door");
        let metrics = consumer.metrics();
        let (publisher, subscriber) = frame_relay();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(consumer.run(subscriber, cancel.clone()));

        feed(&publisher, &metrics, frame(1, "X")).await;
        feed(&publisher, &metrics, frame(2, "Y")).await;

        cancel.cancel();
        let stats = handle.await.unwrap();
        assert_eq!(stats.delivery_failures, 2);
        assert_eq!(stats.events_delivered, 0);
        assert_eq!(sink.events().len(), 2);
    }

    #[tokio::test]
    async fn test_relay_close_stops_consumer() {
        let consumer =
            DetectionConsumer::new(Box::new(ScriptedDetector), RecordingSink::default(), "door");
        let (publisher, subscriber) = frame_relay();
        let handle = tokio::spawn(consumer.run(subscriber, CancellationToken::new()));

        publisher.close();
        let stats = timeout(Duration::from_secs(1), handle)
            .await
            .expect("consumer did not stop")
            .unwrap();
        assert_eq!(stats.frames_processed, 0);
    }

    #[tokio::test]
    async fn test_in_flight_hit_delivered_on_stop() {
        let sink = RecordingSink::default();
        let consumer = DetectionConsumer::new(Box::new(ScriptedDetector), sink.clone(), "door");
        let (publisher, subscriber) = frame_relay();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(consumer.run(subscriber, cancel.clone()));

        // Stop lands while the slow detection is in flight
        publisher.publish(frame(1, "SLOW"));
        sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let stats = timeout(Duration::from_secs(2), handle)
            .await
            .expect("consumer did not stop")
            .unwrap();
        assert_eq!(stats.detections, 1);
        assert_eq!(stats.events_delivered, 1);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].raw_data, "SLOW");

        // Nothing after the in-flight frame
        publisher.publish(frame(2, "ABC123"));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.events().len(), 1);
    }
}
