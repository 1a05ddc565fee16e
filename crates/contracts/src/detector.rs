//! Detector trait - Detection capability interface

use serde::{Deserialize, Serialize};

use crate::{DetectionError, Frame};

/// Detector kinds selectable from configuration
///
/// Unknown kinds fail deserialization, so they surface as configuration
/// errors at startup rather than at detection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// QR code decoding
    #[default]
    QrCode,
}

impl DetectorKind {
    /// Configuration name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QrCode => "qr_code",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag detection capability
///
/// Detection is CPU bound and runs on the blocking pool, one call at a time.
pub trait Detector: Send {
    /// Detector name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Decode at most one tag payload from the frame.
    ///
    /// `Ok(None)` means the frame holds nothing decodable.
    fn detect(&mut self, frame: &Frame) -> Result<Option<String>, DetectionError>;
}
