//! Sink implementations
//!
//! Contains LogSink and HomeAssistantSink.

mod home_assistant;
mod log;

pub use self::home_assistant::{HomeAssistantConfig, HomeAssistantSink, TAG_SCANNED_EVENT};
pub use self::log::LogSink;
