use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::models::RecordingRow;
use crate::schema::Recordings;

const RECORDING_COLUMNS: [Recordings; 8] = [
    Recordings::Id,
    Recordings::UserId,
    Recordings::Status,
    Recordings::CreatedAtMs,
    Recordings::UpdatedAtMs,
    Recordings::AudioFilePath,
    Recordings::TranscriptionText,
    Recordings::LlmProvider,
];

/// INSERT INTO recordings (id, user_id, status, created_at_ms, updated_at_ms,
///     audio_file_path, transcription_text, llm_provider)
/// VALUES (?, ?, ?, ?, ?, ?, ?, ?)
pub fn insert(row: &RecordingRow) -> String {
    Query::insert()
        .into_table(Recordings::Table)
        .columns(RECORDING_COLUMNS)
        .values_panic([
            row.id.clone().into(),
            row.user_id.clone().into(),
            row.status.clone().into(),
            row.created_at_ms.into(),
            row.updated_at_ms.into(),
            row.audio_file_path.clone().into(),
            row.transcription_text.clone().into(),
            row.llm_provider.clone().into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <recording columns> FROM recordings WHERE id = ?
pub fn select_by_id(id: &str) -> String {
    Query::select()
        .columns(RECORDING_COLUMNS)
        .from(Recordings::Table)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <recording columns> FROM recordings WHERE user_id = ?
/// ORDER BY created_at_ms, id
pub fn select_by_user_id(user_id: &str) -> String {
    Query::select()
        .columns(RECORDING_COLUMNS)
        .from(Recordings::Table)
        .and_where(Expr::col(Recordings::UserId).eq(user_id))
        .order_by(Recordings::CreatedAtMs, Order::Asc)
        .order_by(Recordings::Id, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// UPDATE recordings SET status = ?, updated_at_ms = ? WHERE id = ?
pub fn update_status(id: &str, status: &str, updated_at_ms: i64) -> String {
    Query::update()
        .table(Recordings::Table)
        .value(Recordings::Status, status)
        .value(Recordings::UpdatedAtMs, updated_at_ms)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE recordings SET status = 'ended', audio_file_path = ?, transcription_text = ?,
///     updated_at_ms = ? WHERE id = ?
pub fn update_ended(
    id: &str,
    status: &str,
    audio_file_path: &str,
    transcription_text: &str,
    updated_at_ms: i64,
) -> String {
    Query::update()
        .table(Recordings::Table)
        .value(Recordings::Status, status)
        .value(Recordings::AudioFilePath, audio_file_path)
        .value(Recordings::TranscriptionText, transcription_text)
        .value(Recordings::UpdatedAtMs, updated_at_ms)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_user_id_is_ordered_by_creation() {
        let sql = select_by_user_id("u-1");
        assert!(sql.contains(r#"WHERE "user_id" = 'u-1'"#));
        assert!(sql.ends_with(r#"ORDER BY "created_at_ms" ASC, "id" ASC"#));
    }

    #[test]
    fn test_update_status_only_touches_status_and_timestamp() {
        assert_eq!(
            update_status("r-1", "paused", 42),
            r#"UPDATE "recordings" SET "status" = 'paused', "updated_at_ms" = 42 WHERE "id" = 'r-1'"#
        );
    }
}
