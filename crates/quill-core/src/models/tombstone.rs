//! Tombstone model

use serde::{Deserialize, Serialize};

/// Marker recording "this id must still be deleted on the server".
///
/// Created when a delete is issued while the remote call fails or the
/// network is unreachable; removed once the server confirms the delete.
/// After a successful reconciliation pass a tombstone never coexists with
/// a live note of the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// Id of the note deleted locally while offline
    pub deleted_note_id: String,
}

impl Tombstone {
    pub fn new(deleted_note_id: impl Into<String>) -> Self {
        Self {
            deleted_note_id: deleted_note_id.into(),
        }
    }
}
