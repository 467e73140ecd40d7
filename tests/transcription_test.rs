use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use transcribe_backend::auth::VerifiedIdentity;
use transcribe_backend::db::create_test_connection_in_temporary_file;
use transcribe_backend::models::RecordingStatus;
use transcribe_backend::repository::RecordingRepository;
use transcribe_backend::transcription::{finish_recording, TranscriptionProvider};
use transcribe_backend::users::UserRepository;
use transcribe_backend::{Error, Result};

/// Provider that echoes the audio path back as the transcription
struct EchoProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl TranscriptionProvider for EchoProvider {
    fn name(&self) -> &str {
        "requestyai"
    }

    async fn transcribe_audio(&self, audio_path: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("transcript of {}", audio_path))
    }
}

struct FailingProvider;

#[async_trait]
impl TranscriptionProvider for FailingProvider {
    fn name(&self) -> &str {
        "requestyai"
    }

    async fn transcribe_audio(&self, _audio_path: &str) -> Result<String> {
        Err(Error::Transcription("backend unavailable".to_string()))
    }
}

async fn setup() -> (RecordingRepository, String, tempfile::TempDir) {
    let (db, guard) = create_test_connection_in_temporary_file().await.unwrap();
    let user = UserRepository::new(db.clone())
        .upsert_user(&VerifiedIdentity {
            external_id: "g-1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada".to_string(),
            avatar_url: None,
        })
        .await
        .unwrap();
    let repo = RecordingRepository::new(db);
    let recording = repo.create_recording(&user.id).await.unwrap();
    (repo, recording.id, guard)
}

#[tokio::test]
async fn test_finish_recording_stores_provider_output() {
    let (repo, recording_id, _guard) = setup().await;
    let provider = EchoProvider {
        calls: AtomicUsize::new(0),
    };

    let finished = finish_recording(&repo, &provider, &recording_id, "audio/full.wav")
        .await
        .unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(finished.status, RecordingStatus::Ended);
    assert_eq!(finished.audio_file_path.as_deref(), Some("audio/full.wav"));
    assert_eq!(
        finished.transcription_text.as_deref(),
        Some("transcript of audio/full.wav")
    );
}

#[tokio::test]
async fn test_provider_failure_leaves_recording_untouched() {
    let (repo, recording_id, _guard) = setup().await;
    let before = repo.get_recording(&recording_id).await.unwrap();

    let err = finish_recording(&repo, &FailingProvider, &recording_id, "audio/full.wav")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transcription(_)));
    assert_eq!(repo.get_recording(&recording_id).await.unwrap(), before);
}

#[tokio::test]
async fn test_unknown_recording_is_not_transcribed() {
    let (repo, _recording_id, _guard) = setup().await;
    let provider = EchoProvider {
        calls: AtomicUsize::new(0),
    };

    let err = finish_recording(&repo, &provider, "missing", "audio/full.wav")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RecordingNotFound(_)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

/// Provider registered under a different backend tag
struct OtherBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl TranscriptionProvider for OtherBackend {
    fn name(&self) -> &str {
        "whisper-local"
    }

    async fn transcribe_audio(&self, _audio_path: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("should never be stored".to_string())
    }
}

#[tokio::test]
async fn test_provider_other_than_tagged_backend_is_refused() {
    let (repo, recording_id, _guard) = setup().await;
    let before = repo.get_recording(&recording_id).await.unwrap();
    let provider = OtherBackend {
        calls: AtomicUsize::new(0),
    };

    let err = finish_recording(&repo, &provider, &recording_id, "audio/full.wav")
        .await
        .unwrap_err();

    match err {
        Error::ProviderMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, "requestyai");
            assert_eq!(actual, "whisper-local");
        }
        other => panic!("expected ProviderMismatch, got {:?}", other),
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(repo.get_recording(&recording_id).await.unwrap(), before);
}
