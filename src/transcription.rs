//! Transcription backends and the flow that closes a recording.

use async_trait::async_trait;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::models::Recording;
use crate::repository::RecordingRepository;

/// A backend able to turn an audio file into text
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Tag stored in `Recording::llm_provider`
    fn name(&self) -> &str;

    /// Transcribe the audio stored at `audio_path`
    async fn transcribe_audio(&self, audio_path: &str) -> Result<String>;
}

/// Transcribe the assembled audio of a recording and mark it ended.
///
/// The provider must be the one the recording was tagged with at creation;
/// otherwise [`Error::ProviderMismatch`] is returned before any audio is
/// sent. The recording is left untouched if the provider fails.
pub async fn finish_recording(
    repository: &RecordingRepository,
    provider: &dyn TranscriptionProvider,
    recording_id: &str,
    full_audio_path: &str,
) -> Result<Recording> {
    let recording = repository.get_recording(recording_id).await?;
    if recording.llm_provider != provider.name() {
        warn!(
            "Refusing to transcribe recording {} with {}; it is tagged for {}",
            recording_id,
            provider.name(),
            recording.llm_provider
        );
        return Err(Error::ProviderMismatch {
            recording_id: recording_id.to_string(),
            expected: recording.llm_provider,
            actual: provider.name().to_string(),
        });
    }

    let transcription = provider.transcribe_audio(full_audio_path).await?;
    info!(
        "Transcribed {} for recording {} ({} chars)",
        full_audio_path,
        recording_id,
        transcription.len()
    );

    repository
        .mark_ended(recording_id, full_audio_path, &transcription)
        .await?;
    repository.get_recording(recording_id).await
}
