//! Concrete stream sources
//!
//! `UriSource` picks a backend from the stream URI at runtime:
//! `stub://` goes to the synthetic source, everything else to ffmpeg.

mod ffmpeg;
mod synthetic;

pub use ffmpeg::{FfmpegConfig, FfmpegSource};
pub use synthetic::{SyntheticSource, STUB_SCHEME};

use contracts::{Frame, ScannerOptions, SourceError, StreamSource};

/// Stream source selected by URI scheme
pub enum UriSource {
    Synthetic(SyntheticSource),
    Ffmpeg(FfmpegSource),
}

impl UriSource {
    /// Build the source matching `options.camera_rtsp_stream`
    pub fn from_options(options: &ScannerOptions) -> Self {
        if options.camera_rtsp_stream.starts_with(STUB_SCHEME) {
            Self::Synthetic(SyntheticSource::new(
                options.frame_width,
                options.frame_height,
            ))
        } else {
            Self::Ffmpeg(FfmpegSource::new(FfmpegConfig {
                ffmpeg_path: options.ffmpeg_path.clone(),
                width: options.frame_width,
                height: options.frame_height,
                read_timeout: options.read_timeout(),
            }))
        }
    }
}

impl StreamSource for UriSource {
    fn name(&self) -> &str {
        match self {
            Self::Synthetic(s) => s.name(),
            Self::Ffmpeg(s) => s.name(),
        }
    }

    async fn open(&mut self, uri: &str) -> Result<(), SourceError> {
        match self {
            Self::Synthetic(s) => s.open(uri).await,
            Self::Ffmpeg(s) => s.open(uri).await,
        }
    }

    async fn read(&mut self) -> Result<Frame, SourceError> {
        match self {
            Self::Synthetic(s) => s.read().await,
            Self::Ffmpeg(s) => s.read().await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Synthetic(s) => s.close().await,
            Self::Ffmpeg(s) => s.close().await,
        }
    }
}
