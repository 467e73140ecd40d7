use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::models::ChunkRow;
use crate::schema::RecordingChunks;

const CHUNK_COLUMNS: [RecordingChunks; 6] = [
    RecordingChunks::Id,
    RecordingChunks::RecordingId,
    RecordingChunks::ChunkIndex,
    RecordingChunks::AudioBlobPath,
    RecordingChunks::DurationSeconds,
    RecordingChunks::UploadedAtMs,
];

/// INSERT INTO recording_chunks (id, recording_id, chunk_index, audio_blob_path,
///     duration_seconds, uploaded_at_ms)
/// VALUES (?, ?, ?, ?, ?, ?)
pub fn insert(row: &ChunkRow) -> String {
    Query::insert()
        .into_table(RecordingChunks::Table)
        .columns(CHUNK_COLUMNS)
        .values_panic([
            row.id.clone().into(),
            row.recording_id.clone().into(),
            row.chunk_index.into(),
            row.audio_blob_path.clone().into(),
            row.duration_seconds.into(),
            row.uploaded_at_ms.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <chunk columns> FROM recording_chunks WHERE recording_id = ? ORDER BY chunk_index
pub fn select_by_recording_id(recording_id: &str) -> String {
    Query::select()
        .columns(CHUNK_COLUMNS)
        .from(RecordingChunks::Table)
        .and_where(Expr::col(RecordingChunks::RecordingId).eq(recording_id))
        .order_by(RecordingChunks::ChunkIndex, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT 1 FROM recording_chunks WHERE recording_id = ? AND chunk_index = ?
pub fn exists_at_index(recording_id: &str, chunk_index: i64) -> String {
    Query::select()
        .expr(Expr::val(1))
        .from(RecordingChunks::Table)
        .and_where(Expr::col(RecordingChunks::RecordingId).eq(recording_id))
        .and_where(Expr::col(RecordingChunks::ChunkIndex).eq(chunk_index))
        .to_string(SqliteQueryBuilder)
}
