//! EventSink trait - Event delivery interface
//!
//! Defines the abstract interface for tag event sinks.

use crate::{DeliveryError, TagEvent};

/// Tag event output trait
///
/// All sink implementations must implement this trait.
/// Delivery is at-most-once: callers log failures and move on.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver a tag event
    ///
    /// # Errors
    /// Returns delivery error (should include context)
    async fn emit(&mut self, event: &TagEvent) -> Result<(), DeliveryError>;
}
