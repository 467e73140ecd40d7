use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Users table - one row per identity-provider account
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    ExternalId,
    Email,
    DisplayName,
    AvatarUrl,
    CreatedAtMs,
    UpdatedAtMs,
}

/// Recordings table - one row per recording session
#[derive(Iden)]
pub enum Recordings {
    Table,
    Id,
    UserId,
    Status,
    CreatedAtMs,
    UpdatedAtMs,
    AudioFilePath,
    TranscriptionText,
    LlmProvider,
}

/// Recording chunks table - uploaded audio segments, append-only
#[derive(Iden)]
pub enum RecordingChunks {
    Table,
    Id,
    RecordingId,
    ChunkIndex,
    AudioBlobPath,
    DurationSeconds,
    UploadedAtMs,
}
