use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, SqliteQueryBuilder, Table};

use crate::schema::{Metadata, RecordingChunks, Recordings, Users};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS users (
///     id CHAR(36) PRIMARY KEY,
///     external_id VARCHAR(255) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     display_name VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(512),
///     created_at_ms INTEGER NOT NULL,
///     updated_at_ms INTEGER NOT NULL
/// )
pub fn create_users_table() -> String {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).char_len(36).primary_key())
        .col(
            ColumnDef::new(Users::ExternalId)
                .string_len(255)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(Users::Email)
                .string_len(255)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Users::DisplayName).string_len(255).not_null())
        .col(ColumnDef::new(Users::AvatarUrl).string_len(512).null())
        .col(ColumnDef::new(Users::CreatedAtMs).big_integer().not_null())
        .col(ColumnDef::new(Users::UpdatedAtMs).big_integer().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS recordings (
///     id CHAR(36) PRIMARY KEY,
///     user_id CHAR(36) NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     status VARCHAR(16) NOT NULL,
///     created_at_ms INTEGER NOT NULL,
///     updated_at_ms INTEGER NOT NULL,
///     audio_file_path VARCHAR(512),
///     transcription_text TEXT,
///     llm_provider VARCHAR(255) NOT NULL DEFAULT 'requestyai'
/// )
///
/// `status` is a plain string column; the enumeration is validated on read.
pub fn create_recordings_table() -> String {
    Table::create()
        .table(Recordings::Table)
        .if_not_exists()
        .col(ColumnDef::new(Recordings::Id).char_len(36).primary_key())
        .col(ColumnDef::new(Recordings::UserId).char_len(36).not_null())
        .col(ColumnDef::new(Recordings::Status).string_len(16).not_null())
        .col(
            ColumnDef::new(Recordings::CreatedAtMs)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(Recordings::UpdatedAtMs)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Recordings::AudioFilePath).string_len(512).null())
        .col(ColumnDef::new(Recordings::TranscriptionText).text().null())
        .col(
            ColumnDef::new(Recordings::LlmProvider)
                .string_len(255)
                .not_null()
                .default(crate::constants::DEFAULT_LLM_PROVIDER),
        )
        .foreign_key(
            ForeignKey::create()
                .from(Recordings::Table, Recordings::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS recording_chunks (
///     id CHAR(36) PRIMARY KEY,
///     recording_id CHAR(36) NOT NULL REFERENCES recordings(id) ON DELETE CASCADE,
///     chunk_index INTEGER NOT NULL,
///     audio_blob_path VARCHAR(512) NOT NULL,
///     duration_seconds REAL,
///     uploaded_at_ms INTEGER NOT NULL
/// )
pub fn create_recording_chunks_table() -> String {
    Table::create()
        .table(RecordingChunks::Table)
        .if_not_exists()
        .col(ColumnDef::new(RecordingChunks::Id).char_len(36).primary_key())
        .col(
            ColumnDef::new(RecordingChunks::RecordingId)
                .char_len(36)
                .not_null(),
        )
        .col(
            ColumnDef::new(RecordingChunks::ChunkIndex)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(RecordingChunks::AudioBlobPath)
                .string_len(512)
                .not_null(),
        )
        .col(ColumnDef::new(RecordingChunks::DurationSeconds).double().null())
        .col(
            ColumnDef::new(RecordingChunks::UploadedAtMs)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(RecordingChunks::Table, RecordingChunks::RecordingId)
                .to(Recordings::Table, Recordings::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_recordings_user_id ON recordings(user_id, created_at_ms)
pub fn create_recordings_user_id_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_recordings_user_id")
        .table(Recordings::Table)
        .col(Recordings::UserId)
        .col(Recordings::CreatedAtMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE UNIQUE INDEX IF NOT EXISTS idx_recording_chunks_position
/// ON recording_chunks(recording_id, chunk_index)
pub fn create_recording_chunks_position_index() -> String {
    Index::create()
        .if_not_exists()
        .unique()
        .name("idx_recording_chunks_position")
        .table(RecordingChunks::Table)
        .col(RecordingChunks::RecordingId)
        .col(RecordingChunks::ChunkIndex)
        .to_string(SqliteQueryBuilder)
}

/// All schema statements in dependency order.
pub fn all_statements() -> Vec<String> {
    vec![
        create_metadata_table(),
        create_users_table(),
        create_recordings_table(),
        create_recording_chunks_table(),
        create_recordings_user_id_index(),
        create_recording_chunks_position_index(),
    ]
}
