//! QR 码检测器
//!
//! 基于 `rqrr` 的纯 Rust 解码：灰度化 → 定位 grid → 解码，
//! 返回第一个成功解码的内容。

use contracts::{DetectionError, Detector, DetectorKind, Frame};
use rqrr::PreparedImage;
use tracing::{debug, trace};

/// QR code detector
#[derive(Debug, Default)]
pub struct QrCodeDetector;

impl QrCodeDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for QrCodeDetector {
    fn name(&self) -> &str {
        DetectorKind::QrCode.as_str()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<String>, DetectionError> {
        if !frame.is_well_formed() {
            return Err(DetectionError::MalformedFrame {
                sequence: frame.sequence,
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }
        if frame.width == 0 || frame.height == 0 {
            return Ok(None);
        }

        let mut image = PreparedImage::prepare_from_greyscale(
            frame.width as usize,
            frame.height as usize,
            |x, y| frame.luma(x, y),
        );

        let grids = image.detect_grids();
        trace!(sequence = frame.sequence, grids = grids.len(), "qr grids located");

        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => return Ok(Some(content)),
                // 定位到但无法解码（模糊、遮挡），继续尝试下一个
                Err(e) => debug!(sequence = frame.sequence, error = ?e, "qr grid not decodable"),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::qr_frame;
    use contracts::PixelFormat;

    #[test]
    fn test_decodes_payload() {
        let mut detector = QrCodeDetector::new();
        let result = detector.detect(&qr_frame(b"ABC123").unwrap()).unwrap();
        assert_eq!(result.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_decodes_rgb_frame() {
        let gray = qr_frame(b"door-42").unwrap();
        let rgb: Vec<u8> = gray.data.iter().flat_map(|&v| [v, v, v]).collect();
        let frame = Frame::new(gray.width, gray.height, PixelFormat::Rgb8, rgb);

        let result = QrCodeDetector::new().detect(&frame).unwrap();
        assert_eq!(result.as_deref(), Some("door-42"));
    }

    #[test]
    fn test_blank_frame_has_no_payload() {
        let frame = Frame::new(64, 64, PixelFormat::Luma8, vec![200u8; 64 * 64]);
        assert_eq!(QrCodeDetector::new().detect(&frame).unwrap(), None);
    }

    #[test]
    fn test_malformed_frame_rejected() {
        let frame = Frame::new(64, 64, PixelFormat::Luma8, vec![0u8; 10]);
        let err = QrCodeDetector::new().detect(&frame).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::MalformedFrame {
                expected: 4096,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::new(0, 0, PixelFormat::Luma8, Vec::new());
        assert_eq!(QrCodeDetector::new().detect(&frame).unwrap(), None);
    }
}
