//! ScannerOptions - Config Loader output
//!
//! Mirrors the add-on `options.json` schema. Durations are plain seconds
//! (`f64`) on the wire and converted once by `to_pipeline_config`.

use serde::{Deserialize, Serialize};

use crate::{DetectorKind, PipelineConfig};

/// Environment variable holding the Home Assistant supervisor token
pub const SUPERVISOR_TOKEN_ENV: &str = "SUPERVISOR_TOKEN";

/// Scanner configuration as loaded from disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerOptions {
    /// Detector to run against sampled frames
    #[serde(default)]
    pub detector_type: DetectorKind,

    /// Device id reported with every tag event
    pub tag_event_device_id: String,

    /// Stream URI (rtsp://, http(s)://, file path, or stub:// for testing)
    pub camera_rtsp_stream: String,

    /// Minimum seconds between two frames handed to the detector (0 = no limit)
    #[serde(default = "default_frame_sample_interval")]
    pub frame_sample_interval: f64,

    /// Seconds to wait before reopening a failed stream
    #[serde(default = "default_stream_reconnect_delay")]
    pub stream_reconnect_delay: f64,

    /// Seconds without a frame before the stream is considered stalled
    #[serde(default = "default_stream_read_timeout")]
    pub stream_read_timeout: f64,

    /// Decode width requested from the stream backend
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    /// Decode height requested from the stream backend
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Where tag events go
    #[serde(default)]
    pub sink: SinkKind,

    /// Home Assistant REST API base URL (with trailing slash)
    #[serde(default = "default_home_assistant_api_url")]
    pub home_assistant_api_url: String,

    /// Bearer token; falls back to `SUPERVISOR_TOKEN` when absent
    #[serde(default)]
    pub home_assistant_token: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout: f64,
}

/// Event sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// POST `tag_scanned` events to the Home Assistant API
    #[default]
    HomeAssistant,
    /// Log events only
    Log,
}

impl SinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HomeAssistant => "home_assistant",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_frame_sample_interval() -> f64 {
    0.5
}

fn default_stream_reconnect_delay() -> f64 {
    5.0
}

fn default_stream_read_timeout() -> f64 {
    10.0
}

fn default_frame_width() -> u32 {
    1280
}

fn default_frame_height() -> u32 {
    720
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_home_assistant_api_url() -> String {
    "http://supervisor/core/api/".to_string()
}

fn default_http_timeout() -> f64 {
    10.0
}

impl ScannerOptions {
    /// Minimal options with every tunable at its default
    pub fn new(device_id: impl Into<String>, stream_uri: impl Into<String>) -> Self {
        Self {
            detector_type: DetectorKind::default(),
            tag_event_device_id: device_id.into(),
            camera_rtsp_stream: stream_uri.into(),
            frame_sample_interval: default_frame_sample_interval(),
            stream_reconnect_delay: default_stream_reconnect_delay(),
            stream_read_timeout: default_stream_read_timeout(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            ffmpeg_path: default_ffmpeg_path(),
            sink: SinkKind::default(),
            home_assistant_api_url: default_home_assistant_api_url(),
            home_assistant_token: None,
            http_timeout: default_http_timeout(),
        }
    }

    /// Convert to the pipeline's runtime configuration
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            detector_kind: self.detector_type,
            device_id: self.tag_event_device_id.clone(),
            stream_uri: self.camera_rtsp_stream.clone(),
            sample_interval: seconds(self.frame_sample_interval, default_frame_sample_interval()),
            reconnect_delay: seconds(
                self.stream_reconnect_delay,
                default_stream_reconnect_delay(),
            ),
        }
    }

    /// Stream read timeout as a `Duration`
    pub fn read_timeout(&self) -> std::time::Duration {
        seconds(self.stream_read_timeout, default_stream_read_timeout())
    }

    /// HTTP timeout as a `Duration`
    pub fn http_timeout(&self) -> std::time::Duration {
        seconds(self.http_timeout, default_http_timeout())
    }
}

/// Seconds to `Duration`, falling back when the value is negative or not finite
fn seconds(value: f64, fallback: f64) -> std::time::Duration {
    std::time::Duration::try_from_secs_f64(value)
        .unwrap_or_else(|_| std::time::Duration::from_secs_f64(fallback))
}
