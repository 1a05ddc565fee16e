//! Synthetic `stub://` source
//!
//! Blank grayscale frames at a fixed rate. Lets the whole pipeline run
//! without a camera (smoke tests, config checks on a dev box).

use std::time::Duration;

use bytes::Bytes;
use contracts::{Frame, PixelFormat, SourceError, StreamSource};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::info;

/// URI scheme handled by `SyntheticSource`
pub const STUB_SCHEME: &str = "stub://";

/// Synthetic frame source
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_interval: Duration,
    blank: Bytes,
    ticker: Option<Interval>,
}

impl SyntheticSource {
    /// 25 fps source of `width x height` blank frames
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_interval(width, height, Duration::from_millis(40))
    }

    pub fn with_interval(width: u32, height: u32, frame_interval: Duration) -> Self {
        let blank = Bytes::from(vec![0u8; width as usize * height as usize]);
        Self {
            width,
            height,
            frame_interval,
            blank,
            ticker: None,
        }
    }
}

impl StreamSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn open(&mut self, uri: &str) -> Result<(), SourceError> {
        if !uri.starts_with(STUB_SCHEME) {
            return Err(SourceError::open(uri, "synthetic source only accepts stub:// URIs"));
        }
        let mut ticker = interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        info!(uri, width = self.width, height = self.height, "synthetic stream opened");
        Ok(())
    }

    async fn read(&mut self) -> Result<Frame, SourceError> {
        let ticker = self.ticker.as_mut().ok_or(SourceError::NotOpen)?;
        ticker.tick().await;
        // Bytes clone is a refcount bump
        Ok(Frame::new(
            self.width,
            self.height,
            PixelFormat::Luma8,
            self.blank.clone(),
        ))
    }

    async fn close(&mut self) {
        self.ticker = None;
    }
}
