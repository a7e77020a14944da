use serde::{Deserialize, Serialize};

use crate::metadata::EntityType;

/// A fetch recorded in history. `serialized_payload` holds the full
/// [`MetadataResult`](crate::metadata::MetadataResult) as JSON so it can be
/// reloaded without hitting the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub entity_type: EntityType,
    pub display_name: String,
    pub summary_info: String,
    pub thumbnail_url: String,
    pub serialized_payload: String,
    pub timestamp_secs: i64,
}

impl HistoryEntry {
    /// Builds an entry with a fresh id, stamped with the current time.
    pub fn new(
        url: impl Into<String>,
        entity_type: EntityType,
        display_name: impl Into<String>,
        summary_info: impl Into<String>,
        thumbnail_url: impl Into<String>,
        serialized_payload: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            entity_type,
            display_name: display_name.into(),
            summary_info: summary_info.into(),
            thumbnail_url: thumbnail_url.into(),
            serialized_payload: serialized_payload.into(),
            timestamp_secs: chrono::Utc::now().timestamp(),
        }
    }
}
