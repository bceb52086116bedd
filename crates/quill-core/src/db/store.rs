//! Note store implementation
//!
//! The sync engine is the only writer of the notes and tombstone tables.
//! Live queries are implemented as a revision counter on a watch channel:
//! every mutation bumps the revision, and each watch stream re-runs its
//! query whenever the revision moves, so subscribers always observe the
//! store's current state.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use libsql::{params, Connection};
use tokio::sync::watch;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Note, Tombstone};

/// Contract for persisted notes and delete-intent tombstones.
///
/// All mutations are idempotent and have at most the stated effect.
pub trait NoteStore {
    /// Insert or replace a note by id.
    fn upsert_note(&self, note: &Note) -> impl Future<Output = Result<()>> + Send;

    /// Delete a note by id; no-op when absent.
    fn delete_note_by_id(&self, note_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete every note the server has acknowledged.
    fn delete_all_synced_notes(&self) -> impl Future<Output = Result<()>> + Send;

    /// Delete every note.
    fn delete_all_notes(&self) -> impl Future<Output = Result<()>> + Send;

    /// One-shot read of the full note set, `date_millis` descending.
    fn get_all_notes(&self) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Fetch a single note by id.
    fn get_note_by_id(&self, note_id: &str) -> impl Future<Output = Result<Option<Note>>> + Send;

    /// Notes not yet acknowledged by the server.
    fn get_all_unsynced_notes(&self) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Record a delete intent awaiting server confirmation.
    fn insert_tombstone(&self, note_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Clear a confirmed delete intent; no-op when absent.
    fn delete_tombstone(&self, note_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// All pending delete intents.
    fn get_all_tombstones(&self) -> impl Future<Output = Result<Vec<Tombstone>>> + Send;

    /// Live stream of the full note set; emits the current result
    /// immediately and re-emits after every store mutation.
    fn watch_all_notes(&self) -> BoxStream<'static, Vec<Note>>;

    /// Live stream of a single note (for a detail view).
    fn watch_note_by_id(&self, note_id: &str) -> BoxStream<'static, Option<Note>>;
}

const NOTE_COLUMNS: &str =
    "id, title, content, date, date_millis, owners, color, created_at, updated_at, is_synced";

/// libSQL implementation of [`NoteStore`]
#[derive(Clone)]
pub struct LibSqlNoteStore {
    database: Arc<Database>,
    revision: Arc<watch::Sender<u64>>,
}

impl LibSqlNoteStore {
    /// Create a store owning the given database.
    pub fn new(database: Database) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            database: Arc::new(database),
            revision: Arc::new(revision),
        }
    }

    fn conn(&self) -> &Connection {
        self.database.connection()
    }

    /// Signal watchers that the note set changed.
    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Parse a note from a database row
    fn parse_note(row: &libsql::Row) -> Result<Note> {
        let owners_json: String = row.get(5)?;
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            date: row.get(3)?,
            date_millis: row.get(4)?,
            owners: serde_json::from_str(&owners_json)?,
            color: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            is_synced: row.get::<i32>(9)? != 0,
        })
    }

    async fn query_notes(&self, sql: &str) -> Result<Vec<Note>> {
        let mut rows = self.conn().query(sql, ()).await?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(Self::parse_note(&row)?);
        }
        Ok(notes)
    }
}

impl NoteStore for LibSqlNoteStore {
    async fn upsert_note(&self, note: &Note) -> Result<()> {
        let owners_json = serde_json::to_string(&note.owners)?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO notes
                 (id, title, content, date, date_millis, owners, color, created_at, updated_at, is_synced)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    note.id.as_str(),
                    note.title.as_str(),
                    note.content.as_str(),
                    note.date.as_str(),
                    note.date_millis,
                    owners_json,
                    note.color.as_str(),
                    note.created_at,
                    note.updated_at,
                    i32::from(note.is_synced)
                ],
            )
            .await?;

        self.bump_revision();
        Ok(())
    }

    async fn delete_note_by_id(&self, note_id: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM notes WHERE id = ?1", params![note_id])
            .await?;
        self.bump_revision();
        Ok(())
    }

    async fn delete_all_synced_notes(&self) -> Result<()> {
        self.conn()
            .execute("DELETE FROM notes WHERE is_synced = 1", ())
            .await?;
        self.bump_revision();
        Ok(())
    }

    async fn delete_all_notes(&self) -> Result<()> {
        self.conn().execute("DELETE FROM notes", ()).await?;
        self.bump_revision();
        Ok(())
    }

    async fn get_all_notes(&self) -> Result<Vec<Note>> {
        self.query_notes(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY date_millis DESC"
        ))
        .await
    }

    async fn get_note_by_id(&self, note_id: &str) -> Result<Option<Note>> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
                params![note_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_note(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_all_unsynced_notes(&self) -> Result<Vec<Note>> {
        self.query_notes(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE is_synced = 0"
        ))
        .await
    }

    async fn insert_tombstone(&self, note_id: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO locally_deleted_note_ids (deleted_note_id) VALUES (?1)",
                params![note_id],
            )
            .await?;
        Ok(())
    }

    async fn delete_tombstone(&self, note_id: &str) -> Result<()> {
        self.conn()
            .execute(
                "DELETE FROM locally_deleted_note_ids WHERE deleted_note_id = ?1",
                params![note_id],
            )
            .await?;
        Ok(())
    }

    async fn get_all_tombstones(&self) -> Result<Vec<Tombstone>> {
        let mut rows = self
            .conn()
            .query("SELECT deleted_note_id FROM locally_deleted_note_ids", ())
            .await?;

        let mut tombstones = Vec::new();
        while let Some(row) = rows.next().await? {
            tombstones.push(Tombstone::new(row.get::<String>(0)?));
        }
        Ok(tombstones)
    }

    fn watch_all_notes(&self) -> BoxStream<'static, Vec<Note>> {
        let store = self.clone();
        let receiver = self.revision.subscribe();

        stream::unfold(
            (store, receiver, true),
            |(store, mut receiver, mut first)| async move {
                loop {
                    if !first && receiver.changed().await.is_err() {
                        return None;
                    }
                    first = false;
                    match store.get_all_notes().await {
                        Ok(notes) => return Some((notes, (store, receiver, false))),
                        Err(error) => {
                            // Skip this emission; retry on the next bump.
                            tracing::warn!("Live note query failed: {error}");
                        }
                    }
                }
            },
        )
        .boxed()
    }

    fn watch_note_by_id(&self, note_id: &str) -> BoxStream<'static, Option<Note>> {
        let store = self.clone();
        let note_id = note_id.to_string();
        let receiver = self.revision.subscribe();

        stream::unfold(
            (store, note_id, receiver, true),
            |(store, note_id, mut receiver, mut first)| async move {
                loop {
                    if !first && receiver.changed().await.is_err() {
                        return None;
                    }
                    first = false;
                    match store.get_note_by_id(&note_id).await {
                        Ok(note) => return Some((note, (store, note_id, receiver, false))),
                        Err(error) => {
                            // Skip this emission; retry on the next bump.
                            tracing::warn!("Live note query failed: {error}");
                        }
                    }
                }
            },
        )
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn setup() -> LibSqlNoteStore {
        LibSqlNoteStore::new(Database::open_in_memory().await.unwrap())
    }

    fn note(id: &str, date_millis: i64) -> Note {
        let mut note = Note::new("title", "content", "owner-1", "#CCFFCC");
        note.id = id.to_string();
        note.date_millis = date_millis;
        note
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_and_get_roundtrip() {
        let store = setup().await;
        let mut original = note("n-1", 100);
        original.owners = vec!["owner-1".to_string(), "owner-2".to_string()];
        original.is_synced = true;

        store.upsert_note(&original).await.unwrap();

        let fetched = store.get_note_by_id("n-1").await.unwrap().unwrap();
        assert_eq!(fetched, original);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_replaces_existing_row() {
        let store = setup().await;
        store.upsert_note(&note("n-1", 100)).await.unwrap();

        let mut updated = note("n-1", 100);
        updated.title = "renamed".to_string();
        store.upsert_note(&updated).await.unwrap();

        let all = store.get_all_notes().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "renamed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_all_notes_orders_by_date_descending() {
        let store = setup().await;
        store.upsert_note(&note("old", 100)).await.unwrap();
        store.upsert_note(&note("new", 300)).await.unwrap();
        store.upsert_note(&note("mid", 200)).await.unwrap();

        let all = store.get_all_notes().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_note_by_id_is_idempotent() {
        let store = setup().await;
        store.upsert_note(&note("n-1", 100)).await.unwrap();

        store.delete_note_by_id("n-1").await.unwrap();
        store.delete_note_by_id("n-1").await.unwrap();

        assert!(store.get_note_by_id("n-1").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_all_synced_notes_keeps_unsynced() {
        let store = setup().await;
        let mut synced = note("synced", 100);
        synced.is_synced = true;
        store.upsert_note(&synced).await.unwrap();
        store.upsert_note(&note("unsynced", 200)).await.unwrap();

        store.delete_all_synced_notes().await.unwrap();

        let remaining = store.get_all_notes().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "unsynced");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unsynced_filter_matches_flag() {
        let store = setup().await;
        let mut synced = note("synced", 100);
        synced.is_synced = true;
        store.upsert_note(&synced).await.unwrap();
        store.upsert_note(&note("pending", 200)).await.unwrap();

        let unsynced = store.get_all_unsynced_notes().await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].id, "pending");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tombstone_lifecycle() {
        let store = setup().await;

        store.insert_tombstone("a").await.unwrap();
        store.insert_tombstone("b").await.unwrap();
        store.insert_tombstone("a").await.unwrap();

        let mut tombstones = store.get_all_tombstones().await.unwrap();
        tombstones.sort_by(|a, b| a.deleted_note_id.cmp(&b.deleted_note_id));
        assert_eq!(tombstones, vec![Tombstone::new("a"), Tombstone::new("b")]);

        store.delete_tombstone("a").await.unwrap();
        assert_eq!(
            store.get_all_tombstones().await.unwrap(),
            vec![Tombstone::new("b")]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn watch_all_notes_emits_current_then_reacts_to_mutations() {
        let store = setup().await;
        store.upsert_note(&note("n-1", 100)).await.unwrap();

        let mut live = store.watch_all_notes();

        let first = timeout(Duration::from_secs(5), live.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.len(), 1);

        store.upsert_note(&note("n-2", 200)).await.unwrap();

        let second = timeout(Duration::from_secs(5), live.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn watch_all_notes_survives_a_failing_query() {
        let store = setup().await;

        // Row with malformed owners JSON makes the live query fail.
        store
            .conn()
            .execute(
                "INSERT INTO notes
                 (id, title, content, date, date_millis, owners, color, created_at, updated_at, is_synced)
                 VALUES ('bad', 't', 'c', 'd', 100, 'not-json', '#CCFFCC', 1, 1, 0)",
                (),
            )
            .await
            .unwrap();

        let mut live = store.watch_all_notes();

        // The failed query is skipped; the stream stays pending, not ended.
        assert!(timeout(Duration::from_millis(200), live.next())
            .await
            .is_err());

        store
            .conn()
            .execute("UPDATE notes SET owners = '[\"owner-1\"]' WHERE id = 'bad'", ())
            .await
            .unwrap();
        store.upsert_note(&note("n-2", 200)).await.unwrap();

        let recovered = timeout(Duration::from_secs(5), live.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recovered.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn watch_note_by_id_sees_note_appear() {
        let store = setup().await;
        let mut live = store.watch_note_by_id("n-1");

        let first = timeout(Duration::from_secs(5), live.next())
            .await
            .unwrap()
            .unwrap();
        assert!(first.is_none());

        store.upsert_note(&note("n-1", 100)).await.unwrap();

        let second = timeout(Duration::from_secs(5), live.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.unwrap().id, "n-1");
    }
}
