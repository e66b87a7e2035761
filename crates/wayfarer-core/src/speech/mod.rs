//! The speech-to-text collaborator.
//!
//! Raw audio bytes go in; transcribed text comes back. Audio arrives as the
//! request body and is never written to disk, so there is no temporary file
//! to clean up on either path.

mod baidu;

pub use baidu::BaiduTranscriber;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Adapter interface for speech recognition backends.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Human-readable name for this backend (e.g. "baidu").
    fn name(&self) -> &str;

    /// Transcribe PCM audio.
    ///
    /// `language` is a hint ("zh" or "en"); unknown hints fall back to
    /// Mandarin. Fails with [`crate::Error::Collaborator`] when the backend
    /// errors or rejects the audio.
    async fn transcribe(&self, audio: &[u8], sample_rate: u32, language: &str) -> Result<String>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn SpeechTranscriber) {}
};

/// Placeholder used when no speech backend is configured. Every call fails
/// with a collaborator error so the endpoint degrades cleanly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTranscriber;

#[async_trait]
impl SpeechTranscriber for UnconfiguredTranscriber {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn transcribe(
        &self,
        _audio: &[u8],
        _sample_rate: u32,
        _language: &str,
    ) -> Result<String> {
        Err(Error::collaborator("speech recognition is not configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_transcriber_fails_cleanly() {
        let t = UnconfiguredTranscriber;
        let result = t.transcribe(&[0u8; 16], 16000, "zh").await;
        assert!(matches!(result, Err(Error::Collaborator(_))));
    }
}
