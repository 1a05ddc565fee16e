//! # Detection
//!
//! 检测模块。
//!
//! 负责：
//! - 按 `DetectorKind` 构建检测器
//! - 从 FrameRelay 取最新帧，在阻塞线程池上检测
//! - 检测到内容时生成 `TagEvent` 并交给 EventSink

mod consumer;
mod qr;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use consumer::{ConsumerStats, DetectionConsumer, DetectionMetrics};
pub use contracts::{Detector, DetectorKind};
pub use qr::QrCodeDetector;

/// Build the detector for `kind`
pub fn build_detector(kind: DetectorKind) -> Box<dyn Detector> {
    match kind {
        DetectorKind::QrCode => Box::new(QrCodeDetector::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_detector() {
        let detector = build_detector(DetectorKind::QrCode);
        assert_eq!(detector.name(), "qr_code");
    }
}
