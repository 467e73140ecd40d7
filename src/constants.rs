use rand::Rng;

/// Expected database schema version
/// Databases created with a different version are refused on open
pub const EXPECTED_DB_VERSION: &str = "1";

/// Transcription backend tag stamped on new recordings
pub const DEFAULT_LLM_PROVIDER: &str = "requestyai";

/// Generate a fresh opaque identifier for a stored row
pub fn generate_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a random OAuth login state value
pub fn generate_login_state() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
