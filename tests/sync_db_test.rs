//! Blocking access to the repository through `SyncDb`.
//!
//! These are plain `#[test]` functions: `SyncDb` owns its own runtime and
//! must not be driven from inside another one.

use transcribe_backend::auth::VerifiedIdentity;
use transcribe_backend::db::SyncDb;
use transcribe_backend::models::RecordingStatus;
use transcribe_backend::repository::{
    add_chunk_sync, create_recording_sync, get_recording_sync, list_chunks_sync,
    list_recordings_sync, mark_ended_sync, mark_paused_sync, mark_resumed_sync,
};
use transcribe_backend::users::UserRepository;
use transcribe_backend::Error;

fn create_sync_db() -> (SyncDb, String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = SyncDb::connect(dir.path().join("sync.sqlite")).unwrap();
    let identity = VerifiedIdentity {
        external_id: "g-sync".to_string(),
        email: "sync@example.com".to_string(),
        display_name: "Sync".to_string(),
        avatar_url: None,
    };
    let user = db
        .block_on(UserRepository::new(db.database().clone()).upsert_user(&identity))
        .unwrap();
    (db, user.id, dir)
}

#[test]
fn test_blocking_lifecycle() {
    let (db, user_id, _guard) = create_sync_db();

    let recording = create_recording_sync(&db, &user_id).unwrap();
    add_chunk_sync(&db, &recording.id, "blob/0", 0).unwrap();
    mark_paused_sync(&db, &recording.id).unwrap();
    assert_eq!(
        get_recording_sync(&db, &recording.id).unwrap().status,
        RecordingStatus::Paused
    );
    mark_resumed_sync(&db, &recording.id).unwrap();
    assert_eq!(
        get_recording_sync(&db, &recording.id).unwrap().status,
        RecordingStatus::Active
    );
    add_chunk_sync(&db, &recording.id, "blob/1", 1).unwrap();

    mark_ended_sync(&db, &recording.id, "full.wav", "hello world").unwrap();
    let ended = get_recording_sync(&db, &recording.id).unwrap();
    assert_eq!(ended.status, RecordingStatus::Ended);
    assert_eq!(ended.transcription_text.as_deref(), Some("hello world"));

    let listed = list_recordings_sync(&db, &user_id).unwrap();
    assert_eq!(listed, vec![ended]);

    let chunks = list_chunks_sync(&db, &recording.id).unwrap();
    let indexes: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
    assert_eq!(indexes, vec![0, 1]);
}

#[test]
fn test_blocking_errors_surface_unchanged() {
    let (db, _user_id, _guard) = create_sync_db();

    assert!(matches!(
        get_recording_sync(&db, "missing"),
        Err(Error::RecordingNotFound(_))
    ));
    assert!(matches!(
        mark_paused_sync(&db, "missing"),
        Err(Error::RecordingNotFound(_))
    ));
    assert!(matches!(
        mark_resumed_sync(&db, "missing"),
        Err(Error::RecordingNotFound(_))
    ));
    assert!(matches!(
        list_chunks_sync(&db, "missing"),
        Err(Error::RecordingNotFound(_))
    ));
    assert!(matches!(
        create_recording_sync(&db, "ghost"),
        Err(Error::UserNotFound(_))
    ));
}
