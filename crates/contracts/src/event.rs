//! TagEvent - Detection output

use serde::{Deserialize, Serialize};

/// A recognized tag, ready for delivery
///
/// Serializes to the `tag_scanned` event body Home Assistant expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEvent {
    pub tag_id: String,
    pub device_id: String,
    pub raw_data: String,
}

impl TagEvent {
    /// Build an event for a payload decoded on `device_id`'s stream.
    ///
    /// The configured device id doubles as the tag id; the scanner has no
    /// separate tag identity.
    pub fn scanned(device_id: &str, raw_data: impl Into<String>) -> Self {
        Self {
            tag_id: device_id.to_string(),
            device_id: device_id.to_string(),
            raw_data: raw_data.into(),
        }
    }
}
