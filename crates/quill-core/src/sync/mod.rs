//! Offline-first synchronization engine.
//!
//! Owns all writes to the local notes and tombstone tables and reconciles
//! them with the remote service. Single-note operations fall back to local
//! persistence when the network is down; `sync_all_notes_cached` runs the
//! full bidirectional pass (flush tombstones, flush unsynced notes, then
//! replace the local set with the server's list). Reads are served through
//! the bound-resource combinator so callers always get stale data before,
//! during, and after a refresh attempt.

use std::sync::Arc;

use futures::stream::{BoxStream, Stream};
use tokio::sync::Mutex;

use crate::api::{parse_error_message, ApiResponse, NotesApi, ResponseEnvelope};
use crate::db::{LibSqlNoteStore, NoteStore};
use crate::error::{Error, Result};
use crate::models::Note;
use crate::net::Connectivity;
use crate::resource::{bound_resource, BoundResource, Resource};

/// The note synchronization engine.
///
/// Mutating operations are serialized through one engine-wide mutex so a
/// racing edit and delete for the same note id cannot interleave their
/// store writes. Reads and live streams bypass the lock.
#[derive(Clone)]
pub struct SyncEngine<A, C> {
    store: LibSqlNoteStore,
    api: A,
    connectivity: C,
    write_lock: Arc<Mutex<()>>,
}

impl<A, C> SyncEngine<A, C>
where
    A: NotesApi + Clone + Send + Sync + 'static,
    C: Connectivity + Clone + Send + Sync + 'static,
{
    pub fn new(store: LibSqlNoteStore, api: A, connectivity: C) -> Self {
        Self {
            store,
            api,
            connectivity,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying local store.
    pub const fn store(&self) -> &LibSqlNoteStore {
        &self.store
    }

    /// The underlying API client.
    pub const fn api(&self) -> &A {
        &self.api
    }

    //// CACHED = remote API with local-store fallback ////

    /// Upsert a note remotely, then persist the authoritative result
    /// locally; on any remote failure the note is persisted as-is with
    /// `is_synced = false`. The user's latest edit is never dropped.
    pub async fn upsert_note_cached(&self, note: Note) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.upsert_note_locked(note).await
    }

    /// Upsert a batch of notes, one at a time.
    pub async fn upsert_notes_cached(&self, notes: Vec<Note>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        for note in notes {
            self.upsert_note_locked(note).await?;
        }
        Ok(())
    }

    /// Delete a note: remotely when possible, locally always. A failed
    /// remote delete leaves a tombstone so the intent survives until the
    /// next reconciliation.
    pub async fn delete_note_id_cached(&self, note_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.delete_note_id_locked(note_id).await
    }

    /// Full bidirectional reconciliation with the server.
    pub async fn sync_all_notes_cached(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.sync_all_notes_locked().await
    }

    /// The public read API: an ordered stream of
    /// `loading -> (success | error over local data)` resources, live
    /// against the local store.
    pub fn get_all_notes_cached(&self) -> impl Stream<Item = Resource<Vec<Note>>> + Send {
        let store = self.store.clone();
        let engine = self.clone();
        let connectivity = self.connectivity.clone();

        bound_resource(BoundResource {
            query_local: move || store.watch_all_notes(),
            fetch_remote: move || async move { engine.sync_all_notes_cached().await },
            // Reconciliation commits its own writes; nothing left to persist.
            persist: |()| async { Ok::<(), Error>(()) },
            should_fetch: move |_: &Vec<Note>| connectivity.is_connected(),
            on_fetch_failed: |error: &Error| tracing::warn!("Note refresh failed: {error}"),
        })
    }

    async fn upsert_note_locked(&self, note: Note) -> Result<()> {
        match self.api.add_note(&note).await {
            Ok(response) if response.is_app_success() => {
                if let Some(server_note) = response.into_data() {
                    // The server id is authoritative; migrate the
                    // provisional row before persisting the echo.
                    if server_note.id != note.id {
                        self.store.delete_note_by_id(&note.id).await?;
                    }
                    return self.store.upsert_note(&server_note.synced()).await;
                }
                tracing::warn!("saveNote succeeded without an echoed note");
            }
            Ok(response) => {
                tracing::debug!("saveNote rejected (HTTP {})", response.http_status);
            }
            Err(error) => {
                tracing::debug!("saveNote unreachable: {error}");
            }
        }

        // Remote failed in some form; local truth is kept, flagged unsynced.
        self.store
            .upsert_note(&Note {
                is_synced: false,
                ..note
            })
            .await
    }

    async fn delete_note_id_locked(&self, note_id: &str) -> Result<()> {
        let response = self.api.delete_note(note_id).await;

        // Local deletion is immediate and unconditional: the user's intent
        // must never be blocked by connectivity.
        self.store.delete_note_by_id(note_id).await?;

        match response {
            Ok(response) if response.is_app_success() => {
                self.store.delete_tombstone(note_id).await
            }
            Ok(response) => {
                tracing::debug!("deleteNote rejected (HTTP {})", response.http_status);
                self.store.insert_tombstone(note_id).await
            }
            Err(error) => {
                tracing::debug!("deleteNote unreachable: {error}");
                self.store.insert_tombstone(note_id).await
            }
        }
    }

    async fn sync_all_notes_locked(&self) -> Result<()> {
        // Phase 1: retry delete intents recorded while offline. A remote
        // failure simply re-leaves the tombstone for the next pass.
        for tombstone in self.store.get_all_tombstones().await? {
            self.delete_note_id_locked(&tombstone.deleted_note_id).await?;
        }

        // Phase 2: push notes created or edited while offline.
        for note in self.store.get_all_unsynced_notes().await? {
            self.upsert_note_locked(note).await?;
        }

        // Phase 3: one full fetch; failure leaves local state untouched.
        let response = self.api.get_notes().await?;
        let http_status = response.http_status;
        if !response.is_app_success() {
            let message = match &response.envelope {
                Some(envelope) => envelope.message.clone(),
                None => parse_error_message(http_status, &response.error_body),
            };
            return Err(Error::api(http_status, message));
        }
        let fresh = response.into_data().unwrap_or_default();

        // Phase 4: the server's list is truth, now that pending local
        // changes have had their chance to reach it.
        self.store.delete_all_notes().await?;
        for note in fresh {
            self.store.upsert_note(&note.synced()).await?;
        }

        tracing::debug!("Full note reconciliation completed");
        Ok(())
    }

    //// LOCAL = local store only ////

    /// Fetch a single note by id.
    pub async fn get_note_by_id(&self, note_id: &str) -> Result<Option<Note>> {
        self.store.get_note_by_id(note_id).await
    }

    /// Live stream of a single note, for detail views.
    pub fn observe_note_by_id(&self, note_id: &str) -> BoxStream<'static, Option<Note>> {
        self.store.watch_note_by_id(note_id)
    }

    /// Drop every server-acknowledged note, e.g. on logout. Unsynced
    /// notes are kept so nothing the user wrote is lost.
    pub async fn delete_all_synced_notes(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.delete_all_synced_notes().await
    }

    //// REMOTE = API only, no offline fallback ////

    /// Create an account.
    pub async fn register(&self, email: &str, password: &str) -> Resource<ResponseEnvelope<()>> {
        resource_from_response(self.api.register(email, password).await)
    }

    /// Authenticate an account.
    pub async fn login(&self, email: &str, password: &str) -> Resource<ResponseEnvelope<()>> {
        resource_from_response(self.api.login(email, password).await)
    }

    /// Resolve an owner id from an email address.
    pub async fn get_owner_id_for_email(&self, email: &str) -> Option<String> {
        let email = email.trim();
        if email.is_empty() {
            return None;
        }

        let resource = resource_from_response(self.api.get_owner_id_for_email(email).await);
        if !resource.is_success() {
            return None;
        }
        resource.data.and_then(|envelope| envelope.data)
    }

    /// Resolve an email address from an owner id.
    pub async fn get_email_for_owner_id(&self, owner_id: &str) -> Option<String> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return None;
        }

        let resource = resource_from_response(self.api.get_email_for_owner_id(owner_id).await);
        if !resource.is_success() {
            return None;
        }
        resource.data.and_then(|envelope| envelope.data)
    }

    /// Share a note with another account by email. Purely online: sharing
    /// is meaningless without connectivity, so there is no local fallback.
    pub async fn add_owner_by_email_to_note_id(
        &self,
        email: &str,
        note_id: &str,
    ) -> Resource<ResponseEnvelope<Note>> {
        if note_id.trim().is_empty() {
            return Resource::error("noteId is blank", None, None);
        }
        if email.trim().is_empty() {
            return Resource::error("Owner email can't be blank", None, None);
        }

        let Some(owner_id) = self.get_owner_id_for_email(email).await else {
            return Resource::error(format!("No owner found for email: {email}"), None, None);
        };

        resource_from_response(self.api.add_owner_to_note(note_id, &owner_id).await)
    }
}

/// Build the uniform `Resource` for a single API operation.
///
/// Application-level rejection carries the server's message and envelope;
/// a non-2xx answer carries a message parsed from the error body; a
/// transport error carries the error's own message.
fn resource_from_response<T>(result: Result<ApiResponse<T>>) -> Resource<ResponseEnvelope<T>> {
    match result {
        Ok(response) => {
            let http_status = response.http_status;
            match response.envelope {
                Some(envelope) if envelope.successful => {
                    let message = envelope.message.clone();
                    Resource::success_with_status(Some(message), Some(envelope), http_status)
                }
                Some(envelope) => {
                    let message = envelope.message.clone();
                    Resource::error(message, Some(http_status), Some(envelope))
                }
                None => Resource::error(
                    parse_error_message(http_status, &response.error_body),
                    Some(http_status),
                    None,
                ),
            }
        }
        Err(error) => Resource::error(error.to_string(), Some(500), None),
    }
}
