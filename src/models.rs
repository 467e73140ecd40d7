//! Storage rows and application records.
//!
//! Each entity has two shapes: a `*Row` that mirrors the table columns
//! (string status, millisecond timestamps, signed integers) and an
//! application record with typed fields. The conversions between the two
//! are explicit and total; a stored value that cannot be represented in the
//! record fails with [`Error::DataCorruption`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{Error, Result};

/// Lifecycle state of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    /// Accepting chunks
    Active,
    /// Temporarily stopped, may be resumed or ended
    Paused,
    /// Terminal; full audio and transcription are set
    Ended,
}

impl RecordingStatus {
    /// The value stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingStatus::Active => "active",
            RecordingStatus::Paused => "paused",
            RecordingStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(RecordingStatus::Active),
            "paused" => Ok(RecordingStatus::Paused),
            "ended" => Ok(RecordingStatus::Ended),
            other => Err(Error::DataCorruption(format!(
                "unknown recording status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Subject identifier issued by the identity provider
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    pub user_id: String,
    pub status: RecordingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Location of the assembled audio, set once ended
    pub audio_file_path: Option<String>,
    /// Transcription of the assembled audio, set once ended
    pub transcription_text: Option<String>,
    pub llm_provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingChunk {
    pub id: String,
    pub recording_id: String,
    pub chunk_index: u32,
    pub audio_blob_path: String,
    pub duration_seconds: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRow {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub audio_file_path: Option<String>,
    pub transcription_text: Option<String>,
    pub llm_provider: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRow {
    pub id: String,
    pub recording_id: String,
    pub chunk_index: i64,
    pub audio_blob_path: String,
    pub duration_seconds: Option<f64>,
    pub uploaded_at_ms: i64,
}

impl UserRow {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            avatar_url: row.try_get("avatar_url")?,
            created_at_ms: row.try_get("created_at_ms")?,
            updated_at_ms: row.try_get("updated_at_ms")?,
        })
    }
}

impl RecordingRow {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            status: row.try_get("status")?,
            created_at_ms: row.try_get("created_at_ms")?,
            updated_at_ms: row.try_get("updated_at_ms")?,
            audio_file_path: row.try_get("audio_file_path")?,
            transcription_text: row.try_get("transcription_text")?,
            llm_provider: row.try_get("llm_provider")?,
        })
    }
}

impl ChunkRow {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            recording_id: row.try_get("recording_id")?,
            chunk_index: row.try_get("chunk_index")?,
            audio_blob_path: row.try_get("audio_blob_path")?,
            duration_seconds: row.try_get("duration_seconds")?,
            uploaded_at_ms: row.try_get("uploaded_at_ms")?,
        })
    }
}

/// Convert a stored millisecond timestamp into a UTC datetime
pub fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::DataCorruption(format!("timestamp {} out of range", ms)))
}

/// Current wall-clock time truncated to the stored precision
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Next `updated_at` value for a row last touched at `previous_ms`.
/// Always strictly greater than `previous_ms`, even if the clock has not moved.
pub fn next_updated_at(previous_ms: i64) -> i64 {
    now_millis().max(previous_ms + 1)
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            created_at: millis_to_datetime(row.created_at_ms)?,
            updated_at: millis_to_datetime(row.updated_at_ms)?,
            id: row.id,
            external_id: row.external_id,
            email: row.email,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
        })
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            id: user.id.clone(),
            external_id: user.external_id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at_ms: user.created_at.timestamp_millis(),
            updated_at_ms: user.updated_at.timestamp_millis(),
        }
    }
}

impl TryFrom<RecordingRow> for Recording {
    type Error = Error;

    fn try_from(row: RecordingRow) -> Result<Self> {
        let status = row.status.parse::<RecordingStatus>().map_err(|e| match e {
            Error::DataCorruption(msg) => {
                Error::DataCorruption(format!("recording {}: {}", row.id, msg))
            }
            other => other,
        })?;
        Ok(Recording {
            status,
            created_at: millis_to_datetime(row.created_at_ms)?,
            updated_at: millis_to_datetime(row.updated_at_ms)?,
            id: row.id,
            user_id: row.user_id,
            audio_file_path: row.audio_file_path,
            transcription_text: row.transcription_text,
            llm_provider: row.llm_provider,
        })
    }
}

impl From<&Recording> for RecordingRow {
    fn from(recording: &Recording) -> Self {
        RecordingRow {
            id: recording.id.clone(),
            user_id: recording.user_id.clone(),
            status: recording.status.as_str().to_string(),
            created_at_ms: recording.created_at.timestamp_millis(),
            updated_at_ms: recording.updated_at.timestamp_millis(),
            audio_file_path: recording.audio_file_path.clone(),
            transcription_text: recording.transcription_text.clone(),
            llm_provider: recording.llm_provider.clone(),
        }
    }
}

impl TryFrom<ChunkRow> for RecordingChunk {
    type Error = Error;

    fn try_from(row: ChunkRow) -> Result<Self> {
        let chunk_index = u32::try_from(row.chunk_index).map_err(|_| {
            Error::DataCorruption(format!(
                "chunk {} has invalid index {}",
                row.id, row.chunk_index
            ))
        })?;
        Ok(RecordingChunk {
            chunk_index,
            uploaded_at: millis_to_datetime(row.uploaded_at_ms)?,
            id: row.id,
            recording_id: row.recording_id,
            audio_blob_path: row.audio_blob_path,
            duration_seconds: row.duration_seconds,
        })
    }
}

impl From<&RecordingChunk> for ChunkRow {
    fn from(chunk: &RecordingChunk) -> Self {
        ChunkRow {
            id: chunk.id.clone(),
            recording_id: chunk.recording_id.clone(),
            chunk_index: i64::from(chunk.chunk_index),
            audio_blob_path: chunk.audio_blob_path.clone(),
            duration_seconds: chunk.duration_seconds,
            uploaded_at_ms: chunk.uploaded_at.timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recording_row() -> RecordingRow {
        RecordingRow {
            id: "r-1".to_string(),
            user_id: "u-1".to_string(),
            status: "paused".to_string(),
            created_at_ms: 1_730_000_000_000,
            updated_at_ms: 1_730_000_000_500,
            audio_file_path: None,
            transcription_text: None,
            llm_provider: "requestyai".to_string(),
        }
    }

    #[test]
    fn test_status_parses_stored_values() {
        for status in [
            RecordingStatus::Active,
            RecordingStatus::Paused,
            RecordingStatus::Ended,
        ] {
            assert_eq!(status.as_str().parse::<RecordingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_data_corruption() {
        let err = "ACTIVE".parse::<RecordingStatus>().unwrap_err();
        assert!(matches!(err, Error::DataCorruption(_)));
    }

    #[test]
    fn test_recording_row_maps_both_ways() {
        let row = sample_recording_row();
        let recording = Recording::try_from(row.clone()).unwrap();
        assert_eq!(recording.status, RecordingStatus::Paused);
        assert_eq!(recording.updated_at.timestamp_millis(), 1_730_000_000_500);
        assert_eq!(RecordingRow::from(&recording), row);
    }

    #[test]
    fn test_corrupt_row_names_the_recording() {
        let mut row = sample_recording_row();
        row.status = "archived".to_string();
        match Recording::try_from(row) {
            Err(Error::DataCorruption(msg)) => {
                assert!(msg.contains("r-1"));
                assert!(msg.contains("archived"));
            }
            other => panic!("expected DataCorruption, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_chunk_index_is_rejected() {
        let row = ChunkRow {
            id: "c-1".to_string(),
            recording_id: "r-1".to_string(),
            chunk_index: -1,
            audio_blob_path: "blob/x".to_string(),
            duration_seconds: Some(1.5),
            uploaded_at_ms: 0,
        };
        assert!(matches!(
            RecordingChunk::try_from(row),
            Err(Error::DataCorruption(_))
        ));
    }

    #[test]
    fn test_next_updated_at_is_strictly_increasing() {
        let far_future = now_millis() + 60_000;
        assert_eq!(next_updated_at(far_future), far_future + 1);
        let past = 1_000;
        assert!(next_updated_at(past) > past);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&RecordingStatus::Ended).unwrap();
        assert_eq!(json, "\"ended\"");
    }
}
