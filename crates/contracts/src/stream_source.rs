//! StreamSource trait - Video stream abstraction
//!
//! Decouples the producer loop from concrete stream backends (ffmpeg child
//! process, synthetic stub, scripted mock).

use crate::{Frame, SourceError};

/// Video stream source
///
/// A source is stateful: `open` establishes a session, `read` pulls frames
/// from it until it fails, `close` releases whatever the session holds.
/// The producer always calls `close` after a failed session and before
/// reopening, so implementations may assume at most one live session.
#[trait_variant::make(StreamSource: Send)]
pub trait LocalStreamSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Open a stream session for `uri`
    ///
    /// # Errors
    /// `SourceError::Open` when the stream cannot be established
    async fn open(&mut self, uri: &str) -> Result<(), SourceError>;

    /// Read the next frame
    ///
    /// # Errors
    /// `SourceError::EndOfStream` on clean closure, any other variant on failure
    async fn read(&mut self) -> Result<Frame, SourceError>;

    /// Release the current session (idempotent)
    async fn close(&mut self);
}
