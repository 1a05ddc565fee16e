//! Mock 流源
//!
//! 用于无摄像头环境的测试：按脚本失败打开、按固定间隔出帧、
//! 以 EndOfStream / 读错误 / 挂起结束会话。

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use contracts::{Frame, PixelFormat, SourceError, StreamSource};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// How each session ends after `frames_per_session` frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionEndKind {
    /// Clean end of stream
    #[default]
    EndOfStream,
    /// Read error
    ReadError,
    /// Read never returns
    Hang,
}

/// Mock 流源配置
#[derive(Debug, Clone)]
pub struct MockStreamConfig {
    /// Number of initial `open` calls that fail
    pub open_failures: usize,

    /// Frames per session (None = endless)
    pub frames_per_session: Option<usize>,

    /// Delay before every read result
    pub frame_interval: Duration,

    /// What happens once a session runs out of frames
    pub session_end: SessionEndKind,

    /// Frames, cycled across the whole run; empty = blank 8x8 frames
    pub frames: Vec<Frame>,
}

impl Default for MockStreamConfig {
    fn default() -> Self {
        Self {
            open_failures: 0,
            frames_per_session: None,
            frame_interval: Duration::from_millis(10),
            session_end: SessionEndKind::default(),
            frames: Vec::new(),
        }
    }
}

/// Observation handle shared with the test
#[derive(Debug, Clone, Default)]
pub struct MockStreamTracker {
    inner: Arc<Mutex<TrackerState>>,
}

#[derive(Debug, Default)]
struct TrackerState {
    open_times: Vec<Instant>,
    closes: usize,
    frames: usize,
}

impl MockStreamTracker {
    fn with<R>(&self, f: impl FnOnce(&mut TrackerState) -> R) -> R {
        let mut state = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Number of `open` calls (successful or not)
    pub fn opens(&self) -> usize {
        self.with(|s| s.open_times.len())
    }

    /// Time of every `open` call
    pub fn open_times(&self) -> Vec<Instant> {
        self.with(|s| s.open_times.clone())
    }

    /// Number of `close` calls
    pub fn closes(&self) -> usize {
        self.with(|s| s.closes)
    }

    /// Frames returned across all sessions
    pub fn frames(&self) -> usize {
        self.with(|s| s.frames)
    }
}

/// Mock 流源
pub struct MockStreamSource {
    config: MockStreamConfig,
    tracker: MockStreamTracker,
    open: bool,
    session_frames: usize,
    cursor: usize,
}

impl MockStreamSource {
    /// 创建新的 Mock 流源
    pub fn new(config: MockStreamConfig) -> Self {
        Self {
            config,
            tracker: MockStreamTracker::default(),
            open: false,
            session_frames: 0,
            cursor: 0,
        }
    }

    /// Source yielding `frames` once per session, then end of stream
    pub fn with_frames(frames: Vec<Frame>) -> Self {
        Self::new(MockStreamConfig {
            frames_per_session: Some(frames.len()),
            frames,
            ..Default::default()
        })
    }

    /// Same as `with_frames`, one `payload_frame` per payload
    pub fn with_payloads<B: Into<Bytes>>(payloads: impl IntoIterator<Item = B>) -> Self {
        Self::with_frames(payloads.into_iter().map(payload_frame).collect())
    }

    /// Shared tracker for assertions
    pub fn tracker(&self) -> MockStreamTracker {
        self.tracker.clone()
    }

    fn next_frame(&mut self) -> Frame {
        let frame = if self.config.frames.is_empty() {
            Frame::new(8, 8, PixelFormat::Luma8, vec![0u8; 64])
        } else {
            let mut frame = self.config.frames[self.cursor % self.config.frames.len()].clone();
            frame.captured_at = SystemTime::now();
            frame
        };
        self.cursor += 1;
        frame
    }
}

impl StreamSource for MockStreamSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&mut self, uri: &str) -> Result<(), SourceError> {
        let attempt = self.tracker.with(|s| {
            s.open_times.push(Instant::now());
            s.open_times.len()
        });

        if attempt <= self.config.open_failures {
            debug!(uri, attempt, "mock open failure");
            return Err(SourceError::open(uri, "mock open failure"));
        }

        self.open = true;
        self.session_frames = 0;
        Ok(())
    }

    async fn read(&mut self) -> Result<Frame, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }

        let exhausted = self
            .config
            .frames_per_session
            .is_some_and(|limit| self.session_frames >= limit);

        if exhausted && self.config.session_end == SessionEndKind::Hang {
            std::future::pending::<()>().await;
        }

        sleep(self.config.frame_interval).await;

        if exhausted {
            return match self.config.session_end {
                SessionEndKind::ReadError => Err(SourceError::read("mock read failure")),
                _ => Err(SourceError::EndOfStream),
            };
        }

        self.session_frames += 1;
        self.tracker.with(|s| s.frames += 1);
        trace!(frame = self.session_frames, "mock frame");
        Ok(self.next_frame())
    }

    async fn close(&mut self) {
        self.open = false;
        self.tracker.with(|s| s.closes += 1);
    }
}

/// `Luma8` frame of `payload.len() x 1` pixels carrying `payload` verbatim
pub fn payload_frame(payload: impl Into<Bytes>) -> Frame {
    let data = payload.into();
    Frame::new(data.len() as u32, 1, PixelFormat::Luma8, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scripted_session() {
        let mut source = MockStreamSource::new(MockStreamConfig {
            open_failures: 1,
            frames_per_session: Some(2),
            ..Default::default()
        });

        assert!(source.open("mock://").await.is_err());
        assert!(source.open("mock://").await.is_ok());
        assert!(source.read().await.is_ok());
        assert!(source.read().await.is_ok());
        assert!(source.read().await.unwrap_err().is_end_of_stream());

        source.close().await;
        assert!(matches!(source.read().await, Err(SourceError::NotOpen)));
        assert_eq!(source.tracker().opens(), 2);
        assert_eq!(source.tracker().frames(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_frames_cycle() {
        let mut source = MockStreamSource::new(MockStreamConfig {
            frames: vec![payload_frame("A"), payload_frame("BC")],
            ..Default::default()
        });
        source.open("mock://").await.unwrap();

        let first = source.read().await.unwrap();
        let second = source.read().await.unwrap();
        let third = source.read().await.unwrap();
        assert_eq!(&first.data[..], b"A");
        assert_eq!(second.width, 2);
        assert_eq!(&third.data[..], b"A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_payloads_ends_each_session() {
        let mut source = MockStreamSource::with_payloads(["X", "Y"]);
        source.open("mock://").await.unwrap();
        assert_eq!(&source.read().await.unwrap().data[..], b"X");
        assert_eq!(&source.read().await.unwrap().data[..], b"Y");
        assert!(source.read().await.unwrap_err().is_end_of_stream());
    }
}
