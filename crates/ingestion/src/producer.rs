//! Stream producer loop
//!
//! Owns the stream source, drives it through `StreamState`, rate limits
//! reads into the relay, and reopens the stream forever until cancelled.

use std::sync::Arc;

use contracts::{SourceError, StreamSource, StreamState};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{IngestionMetrics, ProducerConfig, ProducerStats};
use crate::rate_limit::RateLimiter;
use crate::relay::FramePublisher;

/// How a stream session ended
enum SessionEnd {
    Cancelled,
    Failed(SourceError),
}

/// Stream producer
pub struct StreamProducer<S> {
    source: S,
    config: ProducerConfig,
    state: StreamState,
    limiter: RateLimiter,
    next_sequence: u64,
    metrics: Arc<IngestionMetrics>,
}

impl<S: StreamSource> StreamProducer<S> {
    /// Create a producer over `source`
    pub fn new(source: S, config: ProducerConfig) -> Self {
        let limiter = RateLimiter::new(config.sample_interval);
        Self {
            source,
            config,
            state: StreamState::Closed,
            limiter,
            next_sequence: 1,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Shared metrics, readable while the producer runs
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Current state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Run until `cancel` fires
    ///
    /// Never returns on stream errors: every failure leads to a reconnect
    /// after `reconnect_delay`. The source is closed before returning and the
    /// publisher is dropped, which wakes the subscriber with `None`.
    #[instrument(
        name = "stream_producer",
        skip_all,
        fields(source = %self.source.name(), uri = %contracts::redact_userinfo(&self.config.stream_uri))
    )]
    pub async fn run(mut self, publisher: FramePublisher, cancel: CancellationToken) -> ProducerStats {
        info!(
            sample_interval_ms = self.config.sample_interval.as_millis() as u64,
            reconnect_delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "stream producer started"
        );

        while !cancel.is_cancelled() {
            self.transition(StreamState::Opening);
            self.metrics.record_open_attempt();

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.source.open(&self.config.stream_uri) => Some(result),
            };

            let failure = match opened {
                None => {
                    self.release(StreamState::Closed).await;
                    break;
                }
                Some(Err(e)) => {
                    self.metrics.record_open_failure();
                    observability::record_open_failure();
                    warn!(error = %e, "failed to open stream");
                    e
                }
                Some(Ok(())) => {
                    self.transition(StreamState::Open);
                    info!("stream opened");
                    match self.pump(&publisher, &cancel).await {
                        SessionEnd::Cancelled => {
                            self.release(StreamState::Closed).await;
                            break;
                        }
                        SessionEnd::Failed(e) => {
                            self.metrics.record_stream_failure();
                            observability::record_stream_failure(e.is_end_of_stream());
                            if e.is_end_of_stream() {
                                info!("stream ended");
                            } else {
                                warn!(error = %e, "stream read failed");
                            }
                            e
                        }
                    }
                }
            };

            self.transition(StreamState::Failed);
            self.release(StreamState::Closed).await;

            debug!(
                reason = %failure,
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "waiting before reconnect"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(self.config.reconnect_delay) => {}
            }
        }

        publisher.close();
        let stats = self.metrics.snapshot();
        info!(
            frames_read = stats.frames_read,
            frames_published = stats.frames_published,
            open_attempts = stats.open_attempts,
            "stream producer stopped"
        );
        stats
    }

    /// Read frames until the session fails or the token fires
    async fn pump(&mut self, publisher: &FramePublisher, cancel: &CancellationToken) -> SessionEnd {
        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                result = self.source.read() => result,
            };

            let mut frame = match read {
                Ok(frame) => frame,
                Err(e) => return SessionEnd::Failed(e),
            };

            let publish = self.limiter.admit(Instant::now());
            self.metrics.record_frame(publish);
            observability::record_frame_read(publish);

            if publish {
                frame.sequence = self.next_sequence;
                self.next_sequence += 1;
                publisher.publish(frame);
            }
        }
    }

    /// Close the source and move to `next`
    async fn release(&mut self, next: StreamState) {
        self.source.close().await;
        self.transition(next);
    }

    fn transition(&mut self, next: StreamState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal stream transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "stream state transition");
        self.state = next;
        observability::record_stream_state(next);
    }
}
