//! Recording repository.
//!
//! Every operation is one unit of work: it opens a transaction on the
//! [`Database`], performs its reads and writes, and commits exactly once.
//! Any error returned before the commit drops the transaction, which rolls
//! it back.
//!
//! Not-found handling is uniform: reads and mutations alike fail with
//! [`Error::RecordingNotFound`] for an unknown id. `Ended` is terminal apart
//! from re-ending, which overwrites the audio path and transcription.
//! Concurrent mutations of the same recording are last-committer-wins.

use log::{debug, info};
use sqlx::SqliteConnection;

use crate::constants::{generate_row_id, DEFAULT_LLM_PROVIDER};
use crate::db::{Database, SyncDb};
use crate::error::{Error, Result};
use crate::models::{
    millis_to_datetime, next_updated_at, now_millis, ChunkRow, Recording, RecordingChunk,
    RecordingRow, RecordingStatus,
};
use crate::queries::{chunks, recordings, users};

#[derive(Clone, Debug)]
pub struct RecordingRepository {
    db: Database,
    llm_provider: String,
}

impl RecordingRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            llm_provider: DEFAULT_LLM_PROVIDER.to_string(),
        }
    }

    /// Tag new recordings with a different transcription backend
    pub fn with_llm_provider(mut self, llm_provider: impl Into<String>) -> Self {
        self.llm_provider = llm_provider.into();
        self
    }

    /// Start a new recording for `user_id` in the `Active` state.
    ///
    /// The returned record is built from the values just written rather than
    /// read back from storage.
    pub async fn create_recording(&self, user_id: &str) -> Result<Recording> {
        let mut tx = self.db.begin_write().await?;

        let sql = users::exists(user_id);
        if sqlx::query(&sql).fetch_optional(&mut *tx).await?.is_none() {
            return Err(Error::UserNotFound(user_id.to_string()));
        }

        let now = now_millis();
        let row = RecordingRow {
            id: generate_row_id(),
            user_id: user_id.to_string(),
            status: RecordingStatus::Active.as_str().to_string(),
            created_at_ms: now,
            updated_at_ms: now,
            audio_file_path: None,
            transcription_text: None,
            llm_provider: self.llm_provider.clone(),
        };
        sqlx::query(&recordings::insert(&row))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Created recording {} for user {}", row.id, user_id);
        Recording::try_from(row)
    }

    pub async fn get_recording(&self, recording_id: &str) -> Result<Recording> {
        let mut conn = self.db.pool().acquire().await?;
        let row = fetch_recording_row(&mut conn, recording_id).await?;
        Recording::try_from(row)
    }

    /// All recordings owned by `user_id`, oldest first
    pub async fn list_recordings(&self, user_id: &str) -> Result<Vec<Recording>> {
        let sql = recordings::select_by_user_id(user_id);
        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;

        rows.iter()
            .map(|row| RecordingRow::from_row(row).and_then(Recording::try_from))
            .collect()
    }

    /// Append an audio chunk at position `index`.
    ///
    /// Accepted while the recording is `Active` or `Paused`; a chunk index can
    /// only be used once per recording.
    pub async fn add_chunk(&self, recording_id: &str, chunk_path: &str, index: u32) -> Result<()> {
        let mut tx = self.db.begin_write().await?;

        let current = fetch_recording_row(&mut tx, recording_id).await?;
        let status = current.status.parse::<RecordingStatus>()?;
        if status == RecordingStatus::Ended {
            return Err(Error::RecordingEnded(recording_id.to_string()));
        }

        let sql = chunks::exists_at_index(recording_id, i64::from(index));
        if sqlx::query(&sql).fetch_optional(&mut *tx).await?.is_some() {
            return Err(Error::IntegrityViolation(format!(
                "recording {} already has a chunk at index {}",
                recording_id, index
            )));
        }

        let chunk = RecordingChunk {
            id: generate_row_id(),
            recording_id: recording_id.to_string(),
            chunk_index: index,
            audio_blob_path: chunk_path.to_string(),
            duration_seconds: None,
            uploaded_at: millis_to_datetime(now_millis())?,
        };
        sqlx::query(&chunks::insert(&ChunkRow::from(&chunk)))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(
            "Added chunk {} (index {}) to recording {}",
            chunk.id, index, recording_id
        );
        Ok(())
    }

    /// Chunks of a recording ordered by chunk index
    pub async fn list_chunks(&self, recording_id: &str) -> Result<Vec<RecordingChunk>> {
        let mut tx = self.db.begin().await?;
        fetch_recording_row(&mut tx, recording_id).await?;

        let sql = chunks::select_by_recording_id(recording_id);
        let rows = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        rows.iter()
            .map(|row| ChunkRow::from_row(row).and_then(RecordingChunk::try_from))
            .collect()
    }

    /// Active or Paused -> Paused
    pub async fn mark_paused(&self, recording_id: &str) -> Result<()> {
        self.transition(recording_id, RecordingStatus::Paused).await
    }

    /// Paused or Active -> Active
    pub async fn mark_resumed(&self, recording_id: &str) -> Result<()> {
        self.transition(recording_id, RecordingStatus::Active).await
    }

    /// Any state -> Ended, storing the assembled audio path and transcription.
    /// Re-ending an ended recording overwrites both fields.
    pub async fn mark_ended(
        &self,
        recording_id: &str,
        full_audio_path: &str,
        transcription: &str,
    ) -> Result<()> {
        let mut tx = self.db.begin_write().await?;

        let current = fetch_recording_row(&mut tx, recording_id).await?;
        // Validates the stored status even though every state may end.
        current.status.parse::<RecordingStatus>()?;

        let sql = recordings::update_ended(
            recording_id,
            RecordingStatus::Ended.as_str(),
            full_audio_path,
            transcription,
            next_updated_at(current.updated_at_ms),
        );
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;

        info!("Recording {} ended with audio {}", recording_id, full_audio_path);
        Ok(())
    }

    async fn transition(&self, recording_id: &str, to: RecordingStatus) -> Result<()> {
        let mut tx = self.db.begin_write().await?;

        let current = fetch_recording_row(&mut tx, recording_id).await?;
        let from = current.status.parse::<RecordingStatus>()?;
        if from == RecordingStatus::Ended {
            return Err(Error::InvalidTransition {
                recording_id: recording_id.to_string(),
                from,
                to,
            });
        }

        let sql = recordings::update_status(
            recording_id,
            to.as_str(),
            next_updated_at(current.updated_at_ms),
        );
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;

        info!("Recording {} {} -> {}", recording_id, from, to);
        Ok(())
    }
}

async fn fetch_recording_row(
    conn: &mut SqliteConnection,
    recording_id: &str,
) -> Result<RecordingRow> {
    let sql = recordings::select_by_id(recording_id);
    match sqlx::query(&sql).fetch_optional(&mut *conn).await? {
        Some(row) => RecordingRow::from_row(&row),
        None => Err(Error::RecordingNotFound(recording_id.to_string())),
    }
}

// ============================================================================
// Sync wrapper functions for use in blocking code
// These use SyncDb's embedded runtime to block on async operations
// ============================================================================

fn sync_repository(db: &SyncDb) -> RecordingRepository {
    RecordingRepository::new(db.database().clone())
}

/// Sync wrapper: create a recording
pub fn create_recording_sync(db: &SyncDb, user_id: &str) -> Result<Recording> {
    db.block_on(sync_repository(db).create_recording(user_id))
}

/// Sync wrapper: get a recording
pub fn get_recording_sync(db: &SyncDb, recording_id: &str) -> Result<Recording> {
    db.block_on(sync_repository(db).get_recording(recording_id))
}

/// Sync wrapper: list a user's recordings
pub fn list_recordings_sync(db: &SyncDb, user_id: &str) -> Result<Vec<Recording>> {
    db.block_on(sync_repository(db).list_recordings(user_id))
}

/// Sync wrapper: append a chunk
pub fn add_chunk_sync(db: &SyncDb, recording_id: &str, chunk_path: &str, index: u32) -> Result<()> {
    db.block_on(sync_repository(db).add_chunk(recording_id, chunk_path, index))
}

/// Sync wrapper: pause a recording
pub fn mark_paused_sync(db: &SyncDb, recording_id: &str) -> Result<()> {
    db.block_on(sync_repository(db).mark_paused(recording_id))
}

/// Sync wrapper: list a recording's chunks
pub fn list_chunks_sync(db: &SyncDb, recording_id: &str) -> Result<Vec<RecordingChunk>> {
    db.block_on(sync_repository(db).list_chunks(recording_id))
}

/// Sync wrapper: resume a paused recording
pub fn mark_resumed_sync(db: &SyncDb, recording_id: &str) -> Result<()> {
    db.block_on(sync_repository(db).mark_resumed(recording_id))
}

/// Sync wrapper: end a recording
pub fn mark_ended_sync(
    db: &SyncDb,
    recording_id: &str,
    full_audio_path: &str,
    transcription: &str,
) -> Result<()> {
    db.block_on(sync_repository(db).mark_ended(recording_id, full_audio_path, transcription))
}
