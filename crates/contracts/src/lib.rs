//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the scanner workspace:
//! the frame and event data model, the error taxonomy, the configuration
//! schema, and the traits at the three pipeline seams (stream source,
//! detector, event sink).
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frames carry a wall-clock capture timestamp (`SystemTime`) for diagnostics
//! - Rate limiting and reconnect timing use the monotonic tokio clock

mod detector;
mod error;
mod event;
mod frame;
mod options;
mod pipeline_config;
mod sink;
mod stream_source;
mod stream_state;
mod uri;

pub use detector::{Detector, DetectorKind};
pub use error::*;
pub use event::TagEvent;
pub use frame::{Frame, PixelFormat};
pub use options::*;
pub use pipeline_config::PipelineConfig;
pub use sink::{EventSink, LocalEventSink};
pub use stream_source::{LocalStreamSource, StreamSource};
pub use stream_state::StreamState;
pub use uri::{redact_userinfo, userinfo};
