//! Producer configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::PipelineConfig;

/// Producer configuration
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Stream URI handed to the source on every open
    pub stream_uri: String,

    /// Minimum time between two published frames
    pub sample_interval: Duration,

    /// Wait between a failed session and the next open
    pub reconnect_delay: Duration,
}

impl ProducerConfig {
    /// Create new producer configuration
    pub fn new(
        stream_uri: impl Into<String>,
        sample_interval: Duration,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            stream_uri: stream_uri.into(),
            sample_interval,
            reconnect_delay,
        }
    }
}

impl From<&PipelineConfig> for ProducerConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self::new(
            config.stream_uri.clone(),
            config.sample_interval,
            config.reconnect_delay,
        )
    }
}

/// Ingestion metrics
///
/// Shared with observers through `Arc` while the producer runs.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames returned by the source
    pub frames_read: AtomicU64,

    /// Frames handed to the relay
    pub frames_published: AtomicU64,

    /// Frames dropped by the rate limiter
    pub frames_skipped: AtomicU64,

    /// Open attempts
    pub open_attempts: AtomicU64,

    /// Failed open attempts
    pub open_failures: AtomicU64,

    /// Sessions ended by read error or end of stream
    pub stream_failures: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame read and whether it was published
    pub fn record_frame(&self, published: bool) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
        if published {
            self.frames_published.fetch_add(1, Ordering::Relaxed);
        } else {
            self.frames_skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record open attempt
    pub fn record_open_attempt(&self) {
        self.open_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record open failure
    pub fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record session failure
    pub fn record_stream_failure(&self) {
        self.stream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> ProducerStats {
        ProducerStats {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            open_attempts: self.open_attempts.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
            stream_failures: self.stream_failures.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub frames_read: u64,
    pub frames_published: u64,
    pub frames_skipped: u64,
    pub open_attempts: u64,
    pub open_failures: u64,
    pub stream_failures: u64,
}

impl ProducerStats {
    /// Successful opens after the first one
    pub fn reconnects(&self) -> u64 {
        self.open_attempts
            .saturating_sub(self.open_failures)
            .saturating_sub(1)
    }
}
