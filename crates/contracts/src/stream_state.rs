//! StreamState - producer connection state

use serde::{Deserialize, Serialize};

/// Connection state of the stream producer
///
/// ```text
/// Closed -> Opening -> Open -> Failed -> Closed -> (reconnect delay) -> Opening
///              \------------------^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    #[default]
    Closed,
    Opening,
    Open,
    Failed,
}

impl StreamState {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: StreamState) -> bool {
        matches!(
            (self, next),
            (Self::Closed, Self::Opening)
                | (Self::Opening, Self::Open)
                | (Self::Opening, Self::Failed)
                | (Self::Open, Self::Failed)
                | (Self::Failed, Self::Closed)
                // shutdown releases the stream from any live state
                | (Self::Opening, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }

    /// Numeric code used for the state gauge
    pub fn as_gauge(self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::Opening => 1.0,
            Self::Open => 2.0,
            Self::Failed => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
