//! FrameRelay - single-slot latest-wins hand-off
//!
//! One producer, one consumer, no queue. A publish overwrites whatever the
//! consumer has not looked at yet, so detection always works on the freshest
//! frame and memory stays bounded no matter how slow detection is.

use std::sync::Arc;

use contracts::Frame;
use tokio::sync::watch;

/// Create a connected publisher / subscriber pair
pub fn frame_relay() -> (FramePublisher, FrameSubscriber) {
    let (tx, rx) = watch::channel(None);
    (FramePublisher { tx }, FrameSubscriber { rx })
}

/// Producer half of the relay
#[derive(Debug)]
pub struct FramePublisher {
    tx: watch::Sender<Option<Arc<Frame>>>,
}

impl FramePublisher {
    /// Replace the current frame and wake the subscriber
    ///
    /// Never blocks; the frame is held even if nobody is waiting.
    pub fn publish(&self, frame: Frame) {
        self.tx.send_replace(Some(Arc::new(frame)));
    }

    /// Close the relay; a waiting subscriber wakes with `None`
    pub fn close(self) {
        drop(self);
    }

    /// Whether the subscriber is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of the relay
#[derive(Debug)]
pub struct FrameSubscriber {
    rx: watch::Receiver<Option<Arc<Frame>>>,
}

impl FrameSubscriber {
    /// Wait for a frame published since the last call
    ///
    /// Returns the most recent frame; frames overwritten in between are never
    /// observed. Returns `None` once the publisher is closed and nothing unseen
    /// remains.
    pub async fn await_next(&mut self) -> Option<Arc<Frame>> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(frame) = self.rx.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }

    /// Whether a publish happened since the last observation
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
