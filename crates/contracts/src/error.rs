//! Layered error definitions
//!
//! Categorized by origin: config / source / detection / delivery.
//! Only configuration errors are fatal; the rest are recovered where they occur.

use thiserror::Error;

/// Stream source errors (open / read)
#[derive(Debug, Error)]
pub enum SourceError {
    /// Stream could not be opened (bad URI, unreachable host, spawn failure)
    #[error("failed to open stream '{uri}': {message}")]
    Open { uri: String, message: String },

    /// Read failed while the stream was open
    #[error("stream read error: {message}")]
    Read { message: String },

    /// The source reported end of stream
    #[error("end of stream")]
    EndOfStream,

    /// No frame arrived within the read timeout
    #[error("no frame received within {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    /// `read` called without a successful `open`
    #[error("stream is not open")]
    NotOpen,
}

impl SourceError {
    /// Create open error; credentials in `uri` are masked
    pub fn open(uri: &str, message: impl Into<String>) -> Self {
        Self::Open {
            uri: crate::redact_userinfo(uri),
            message: message.into(),
        }
    }

    /// Create read error
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// True for a clean end-of-stream (as opposed to a failure)
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// Detection errors; a failed frame is skipped, never fatal
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Frame buffer does not match its declared geometry
    #[error("malformed frame {sequence}: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        sequence: u64,
        expected: usize,
        actual: usize,
    },

    /// Detector backend failure
    #[error("detector '{detector}' failed: {message}")]
    Backend { detector: String, message: String },

    /// Detector panicked while processing a frame
    #[error("detector '{detector}' panicked")]
    Panicked { detector: String },
}

impl DetectionError {
    /// Create backend error
    pub fn backend(detector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            detector: detector.into(),
            message: message.into(),
        }
    }
}

/// Event delivery errors; logged and dropped, never retried
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Connection / timeout / serialization failure
    #[error("sink '{sink}' transport error: {message}")]
    Transport { sink: String, message: String },

    /// Remote endpoint answered with an unexpected status
    #[error("sink '{sink}' rejected event: status {status}, body {body:?}")]
    Status {
        sink: String,
        status: u16,
        body: String,
    },
}

impl DeliveryError {
    /// Create transport error
    pub fn transport(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            sink: sink.into(),
            message: message.into(),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Pipeline Errors =====
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True when the error is a configuration problem (fatal at startup)
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. }
        )
    }
}
