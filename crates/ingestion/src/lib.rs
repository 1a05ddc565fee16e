//! # Ingestion
//!
//! Stream side of the scanner.
//!
//! Responsibilities:
//! - Open the camera stream through a `StreamSource` and reopen it forever
//! - Rate limit frames before they reach the detector
//! - Hand the newest frame to the consumer through a single-slot relay
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{frame_relay, ProducerConfig, StreamProducer, UriSource};
//! use tokio_util::sync::CancellationToken;
//!
//! let (publisher, mut subscriber) = frame_relay();
//! let producer = StreamProducer::new(UriSource::from_options(&options), ProducerConfig::from(&config));
//! let cancel = CancellationToken::new();
//! tokio::spawn(producer.run(publisher, cancel.clone()));
//!
//! while let Some(frame) = subscriber.await_next().await {
//!     // detect
//! }
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockStreamConfig, MockStreamSource};
//!
//! let source = MockStreamSource::new(MockStreamConfig { open_failures: 3, ..Default::default() });
//! let tracker = source.tracker();
//! ```

mod config;
mod mock;
mod producer;
mod rate_limit;
mod relay;
mod sources;

// Re-exports
pub use config::{IngestionMetrics, ProducerConfig, ProducerStats};
pub use contracts::{Frame, StreamSource, StreamState};
pub use mock::{payload_frame, MockStreamConfig, MockStreamTracker, MockStreamSource, SessionEndKind};
pub use producer::StreamProducer;
pub use rate_limit::RateLimiter;
pub use relay::{frame_relay, FramePublisher, FrameSubscriber};
pub use sources::{FfmpegConfig, FfmpegSource, SyntheticSource, UriSource, STUB_SCHEME};
