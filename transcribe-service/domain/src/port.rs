use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::{AudioBuffer, DomainError, Segment, TranscriptionError};

#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Transcribes one WAV-encoded chunk.
    async fn transcribe_chunk(&self, wav_bytes: Vec<u8>) -> Result<String, TranscriptionError>;
}

#[async_trait]
pub trait AudioCodecPort: Send + Sync {
    /// Decodes an audio container on disk into mono PCM.
    async fn decode(&self, path: &Path) -> Result<AudioBuffer, DomainError>;

    /// Encodes one segment as a single-channel 16-bit WAV file image.
    async fn encode_wav(&self, segment: &Segment) -> Result<Vec<u8>, DomainError>;
}

#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
