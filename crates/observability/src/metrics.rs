//! Scanner 指标收集模块
//!
//! 通过 `metrics` facade 记录流状态、采样、检测与事件投递指标；
//! 未安装 recorder 时所有调用均为空操作。

use contracts::StreamState;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// 记录流状态切换
pub fn record_stream_state(state: StreamState) {
    gauge!("tag_scanner_stream_state").set(state.as_gauge());
    counter!(
        "tag_scanner_stream_transitions_total",
        "state" => state.as_str()
    )
    .increment(1);
}

/// 记录打开失败
pub fn record_open_failure() {
    counter!("tag_scanner_stream_open_failures_total").increment(1);
}

/// 记录读取失败 / 流结束
pub fn record_stream_failure(end_of_stream: bool) {
    let reason = if end_of_stream { "end_of_stream" } else { "error" };
    counter!("tag_scanner_stream_failures_total", "reason" => reason).increment(1);
}

/// 记录一次读帧，及其是否被限速器放行
pub fn record_frame_read(published: bool) {
    counter!("tag_scanner_frames_read_total").increment(1);
    if published {
        counter!("tag_scanner_frames_published_total").increment(1);
    } else {
        counter!("tag_scanner_frames_skipped_total").increment(1);
    }
}

/// 记录检测结果
pub fn record_detection(detector: &str, outcome: DetectionOutcome, latency_ms: f64) {
    counter!(
        "tag_scanner_detections_total",
        "detector" => detector.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "tag_scanner_detection_latency_ms",
        "detector" => detector.to_string()
    )
    .record(latency_ms);
}

/// 记录事件投递
pub fn record_event_delivery(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "tag_scanner_events_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 注册指标说明 (HELP 文本)
pub fn describe_metrics() {
    describe_gauge!(
        "tag_scanner_stream_state",
        "Stream state: 0 closed, 1 opening, 2 open, 3 failed"
    );
    describe_counter!(
        "tag_scanner_stream_transitions_total",
        "Stream state transitions by target state"
    );
    describe_counter!(
        "tag_scanner_stream_open_failures_total",
        "Failed attempts to open the stream"
    );
    describe_counter!(
        "tag_scanner_stream_failures_total",
        "Sessions ended by end of stream or read error"
    );
    describe_counter!("tag_scanner_frames_read_total", "Frames read from the stream");
    describe_counter!(
        "tag_scanner_frames_published_total",
        "Frames admitted by the sample interval"
    );
    describe_counter!(
        "tag_scanner_frames_skipped_total",
        "Frames dropped by the sample interval"
    );
    describe_counter!(
        "tag_scanner_detections_total",
        "Detector calls by outcome (hit, miss, error)"
    );
    describe_histogram!(
        "tag_scanner_detection_latency_ms",
        Unit::Milliseconds,
        "Detector call duration"
    );
    describe_counter!("tag_scanner_events_total", "Tag events by sink and status");
}

/// 检测结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// 解码到内容
    Hit,
    /// 无内容
    Miss,
    /// 检测失败
    Error,
}

impl DetectionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

/// Log2 buckets: `< 1ms`, `< 2ms`, `< 4ms`, ... the last one is open ended
const LATENCY_BUCKETS: usize = 16;

/// 检测耗时统计
///
/// Count, mean and max are exact; percentiles are bucket upper bounds.
#[derive(Debug, Clone, Default)]
pub struct LatencyTracker {
    count: u64,
    total_ms: f64,
    max_ms: f64,
    buckets: [u64; LATENCY_BUCKETS],
}

impl LatencyTracker {
    pub fn push(&mut self, latency_ms: f64) {
        let latency_ms = latency_ms.max(0.0);
        self.count += 1;
        self.total_ms += latency_ms;
        self.max_ms = self.max_ms.max(latency_ms);
        self.buckets[Self::bucket(latency_ms)] += 1;
    }

    fn bucket(latency_ms: f64) -> usize {
        if latency_ms < 1.0 {
            return 0;
        }
        // floor(log2) + 1, clamped to the open-ended bucket
        let index = latency_ms.log2().floor() as usize + 1;
        index.min(LATENCY_BUCKETS - 1)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }

    /// Upper bound of the bucket holding quantile `q` (0..=1), capped at max
    pub fn percentile_ms(&self, q: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let rank = ((q.clamp(0.0, 1.0) * self.count as f64).ceil() as u64).max(1);
        let mut seen = 0u64;
        for (index, n) in self.buckets.iter().enumerate() {
            seen += *n;
            if seen >= rank {
                return f64::from(1u32 << index).min(self.max_ms);
            }
        }
        self.max_ms
    }

    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            count: self.count,
            mean_ms: self.mean_ms(),
            p50_ms: self.percentile_ms(0.50),
            p95_ms: self.percentile_ms(0.95),
            max_ms: self.max_ms,
        }
    }
}

/// 耗时摘要
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl std::fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "mean={:.1} p50<={:.0} p95<={:.0} max={:.1} (n={})",
            self.mean_ms, self.p50_ms, self.p95_ms, self.max_ms, self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_tracker() {
        let mut latency = LatencyTracker::default();
        for ms in [0.5, 3.0, 3.5, 12.0] {
            latency.push(ms);
        }

        let summary = latency.summary();
        assert_eq!(summary.count, 4);
        assert!((summary.mean_ms - 4.75).abs() < 1e-9);
        assert_eq!(summary.p50_ms, 4.0);
        assert_eq!(summary.p95_ms, 12.0);
        assert_eq!(summary.max_ms, 12.0);
    }

    #[test]
    fn test_slow_outlier_lands_in_last_bucket() {
        let mut latency = LatencyTracker::default();
        latency.push(120_000.0);
        assert_eq!(LatencyTracker::bucket(120_000.0), LATENCY_BUCKETS - 1);
        assert_eq!(latency.percentile_ms(0.5), f64::from(1u32 << (LATENCY_BUCKETS - 1)));
    }

    #[test]
    fn test_empty_summary_display() {
        assert_eq!(LatencyTracker::default().summary().to_string(), "N/A");
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls must be no-ops
        record_stream_state(StreamState::Open);
        record_frame_read(true);
        record_detection("qr_code", DetectionOutcome::Miss, 1.5);
        record_event_delivery("log", false);
    }
}
