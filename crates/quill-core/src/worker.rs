//! Background note saver.
//!
//! Editors hand finished notes to the worker and move on; the worker runs
//! the cached upsert off the caller's task so a slow or dead network never
//! blocks the UI thread. The queue is bounded and submission never waits:
//! a full queue is reported to the caller instead.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::NotesApi;
use crate::error::{Error, Result};
use crate::models::Note;
use crate::net::Connectivity;
use crate::sync::SyncEngine;

/// Handle to the background save task.
pub struct SaveWorker {
    sender: mpsc::Sender<Note>,
    handle: JoinHandle<()>,
}

impl SaveWorker {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// Saves are processed strictly in submission order. Failures are
    /// logged and dropped here because the cached upsert already persisted
    /// the note locally as unsynced; nothing is lost.
    pub fn spawn<A, C>(engine: SyncEngine<A, C>, capacity: usize) -> Self
    where
        A: NotesApi + Clone + Send + Sync + 'static,
        C: Connectivity + Clone + Send + Sync + 'static,
    {
        let (sender, mut receiver) = mpsc::channel::<Note>(capacity);
        let handle = tokio::spawn(async move {
            while let Some(note) = receiver.recv().await {
                let note_id = note.id.clone();
                if let Err(error) = engine.upsert_note_cached(note).await {
                    tracing::warn!("Background save of note {note_id} failed: {error}");
                }
            }
        });

        Self { sender, handle }
    }

    /// Queue a note for saving without waiting.
    pub fn try_submit(&self, note: Note) -> Result<()> {
        self.sender.try_send(note).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => {
                Error::Worker("save queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                Error::Worker("save worker has shut down".to_string())
            }
        })
    }

    /// Stop accepting work and wait for queued saves to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(error) = self.handle.await {
            tracing::warn!("Save worker task panicked: {error}");
        }
    }
}
