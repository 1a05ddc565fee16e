//! ffmpeg-backed stream source
//!
//! Spawns `ffmpeg` as a child process that decodes the stream (RTSP, HTTP,
//! local file) and writes fixed-size grayscale frames to stdout. Each read
//! pulls exactly `width * height` bytes.
//!
//! `open` waits for the first frame, so an unreachable camera or a bad URL
//! fails while opening instead of on the first read. The child is killed on
//! close and on drop, so a failed session never leaks a decoder process.

use std::process::Stdio;
use std::time::Duration;

use contracts::{Frame, PixelFormat, SourceError, StreamSource};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for an ffmpeg source
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    /// ffmpeg executable
    pub ffmpeg_path: String,
    /// Output frame width
    pub width: u32,
    /// Output frame height
    pub height: u32,
    /// Max wait for one frame before the stream counts as stalled
    pub read_timeout: Duration,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            width: 1280,
            height: 720,
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl FfmpegConfig {
    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// ffmpeg arguments for `uri`
    pub fn args(&self, uri: &str) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
        if uri.starts_with("rtsp://") || uri.starts_with("rtsps://") {
            args.extend(["-rtsp_transport".into(), "tcp".into()]);
        }
        args.extend([
            "-i".into(),
            uri.to_string(),
            "-an".into(),
            "-vf".into(),
            format!("scale={}:{}", self.width, self.height),
            "-pix_fmt".into(),
            "gray".into(),
            "-f".into(),
            "rawvideo".into(),
            "pipe:1".into(),
        ]);
        args
    }
}

struct Session {
    child: Child,
    stdout: ChildStdout,
    /// Frame read during `open`, handed out by the first `read`
    pending: Option<Frame>,
}

/// Read one raw frame from the decoder
async fn read_frame(config: &FfmpegConfig, stdout: &mut ChildStdout) -> Result<Frame, SourceError> {
    let mut buf = vec![0u8; config.frame_len()];
    match timeout(config.read_timeout, stdout.read_exact(&mut buf)).await {
        Ok(Ok(_)) => Ok(Frame::new(config.width, config.height, PixelFormat::Luma8, buf)),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(SourceError::EndOfStream),
        Ok(Err(e)) => Err(SourceError::read(e.to_string())),
        Err(_) => Err(SourceError::Timeout {
            waited_ms: config.read_timeout.as_millis() as u64,
        }),
    }
}

/// ffmpeg stream source
pub struct FfmpegSource {
    config: FfmpegConfig,
    session: Option<Session>,
}

impl FfmpegSource {
    pub fn new(config: FfmpegConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Forward ffmpeg's stderr to the log until the pipe closes
    ///
    /// ffmpeg echoes the input URL in its errors, so `secret` is masked.
    fn spawn_stderr_logger(child: &mut Child, secret: Option<String>) {
        let Some(stderr) = child.stderr.take() else {
            return;
        };
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match secret.as_deref() {
                    Some(secret) => warn!(target: "ffmpeg", "{}", line.replace(secret, "***")),
                    None => warn!(target: "ffmpeg", "{}", line),
                }
            }
        });
    }
}

impl StreamSource for FfmpegSource {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn open(&mut self, uri: &str) -> Result<(), SourceError> {
        self.close().await;

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(self.config.args(uri))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SourceError::open(uri, format!("failed to spawn {}: {e}", self.config.ffmpeg_path))
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::open(uri, "ffmpeg stdout not captured"))?;
        Self::spawn_stderr_logger(&mut child, contracts::userinfo(uri).map(str::to_string));

        let first = match read_frame(&self.config, &mut stdout).await {
            Ok(frame) => frame,
            Err(e) => {
                let reason = match e {
                    SourceError::EndOfStream => "ffmpeg exited before the first frame".to_string(),
                    other => format!("no first frame: {other}"),
                };
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "ffmpeg already exited");
                }
                let _ = child.wait().await;
                return Err(SourceError::open(uri, reason));
            }
        };

        info!(
            uri = %contracts::redact_userinfo(uri),
            pid = child.id(),
            width = self.config.width,
            height = self.config.height,
            "ffmpeg decoder started"
        );
        self.session = Some(Session {
            child,
            stdout,
            pending: Some(first),
        });
        Ok(())
    }

    async fn read(&mut self) -> Result<Frame, SourceError> {
        let session = self.session.as_mut().ok_or(SourceError::NotOpen)?;
        if let Some(frame) = session.pending.take() {
            return Ok(frame);
        }
        read_frame(&self.config, &mut session.stdout).await
    }

    async fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(e) = session.child.start_kill() {
            debug!(error = %e, "ffmpeg already exited");
        }
        match session.child.wait().await {
            Ok(status) => debug!(%status, "ffmpeg decoder stopped"),
            Err(e) => warn!(error = %e, "failed to reap ffmpeg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtsp_args_force_tcp() {
        let config = FfmpegConfig {
            width: 640,
            height: 480,
            ..Default::default()
        };
        let args = config.args("rtsp://cam/stream");
        assert!(args.windows(2).any(|w| w[0] == "-rtsp_transport" && w[1] == "tcp"));
        assert!(args.contains(&"scale=640:480".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_file_args_skip_rtsp_flags() {
        let args = FfmpegConfig::default().args("/videos/door.mp4");
        assert!(!args.contains(&"-rtsp_transport".to_string()));
        assert!(args.contains(&"/videos/door.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_open_error() {
        let mut source = FfmpegSource::new(FfmpegConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".into(),
            ..Default::default()
        });
        let err = source.open("rtsp://cam").await.unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
        assert!(matches!(source.read().await, Err(SourceError::NotOpen)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_decoder_exiting_early_fails_open() {
        // `true` ignores the arguments and exits without writing a frame
        let mut source = FfmpegSource::new(FfmpegConfig {
            ffmpeg_path: "true".into(),
            read_timeout: Duration::from_secs(5),
            ..Default::default()
        });
        let err = source.open("rtsp://user:pw@cam/stream").await.unwrap_err();
        match &err {
            SourceError::Open { uri, .. } => assert!(!uri.contains("pw")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(source.read().await, Err(SourceError::NotOpen)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_first_frame_is_buffered_by_open() {
        // `yes` repeats its arguments forever, standing in for a live decoder
        let mut source = FfmpegSource::new(FfmpegConfig {
            ffmpeg_path: "yes".into(),
            width: 4,
            height: 2,
            read_timeout: Duration::from_secs(5),
        });
        source.open("/videos/door.mp4").await.unwrap();

        let first = source.read().await.unwrap();
        assert_eq!(first.data.len(), 8);
        assert_eq!(&first.data[..], b"-hide_ba");
        assert!(source.read().await.is_ok());
        source.close().await;
        assert!(matches!(source.read().await, Err(SourceError::NotOpen)));
    }
}
