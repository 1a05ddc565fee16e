//! PipelineConfig - runtime configuration shared read-only by both loops

use std::time::Duration;

use crate::DetectorKind;

/// Pipeline configuration
///
/// Built once from validated `ScannerOptions`; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Detector to instantiate
    pub detector_kind: DetectorKind,

    /// Device id reported with tag events
    pub device_id: String,

    /// Stream URI
    pub stream_uri: String,

    /// Minimum time between two published frames
    pub sample_interval: Duration,

    /// Wait before reopening a failed stream
    pub reconnect_delay: Duration,
}
