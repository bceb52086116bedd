//! Note model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::{render_date, unix_timestamp_millis};

/// A note in the system.
///
/// The wire format is camelCase JSON; `is_synced` is purely local
/// bookkeeping and never crosses the wire. The `id` is provisional
/// (client-generated) until the server acknowledges an upsert and echoes
/// back the authoritative identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier; server-assigned once synced
    pub id: String,
    pub title: String,
    /// Body text, may be empty
    pub content: String,
    /// Human-readable rendering of `date_millis`
    pub date: String,
    /// Authoritative time, epoch milliseconds
    pub date_millis: i64,
    /// Owner identifiers; always contains at least the creator
    pub owners: Vec<String>,
    /// Hex color string
    pub color: String,
    /// Creation timestamp (Unix ms), set once
    pub created_at: i64,
    /// Last edit timestamp (Unix ms)
    pub updated_at: i64,
    /// True only after the server has acknowledged this exact state
    #[serde(skip)]
    pub is_synced: bool,
}

impl Note {
    /// Create a new unsynced note with a provisional client-generated id.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        owner: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        let now = unix_timestamp_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            date: render_date(now),
            date_millis: now,
            owners: vec![owner.into()],
            color: color.into(),
            created_at: now,
            updated_at: now,
            is_synced: false,
        }
    }

    /// Apply an edit: new title/content, bumped timestamps, sync flag cleared.
    #[must_use]
    pub fn edited(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = unix_timestamp_millis();
        self.title = title.into();
        self.content = content.into();
        self.date = render_date(now);
        self.date_millis = now;
        self.updated_at = now;
        self.is_synced = false;
        self
    }

    /// Mark this note as acknowledged by the server.
    #[must_use]
    pub fn synced(mut self) -> Self {
        self.is_synced = true;
        self
    }
}
