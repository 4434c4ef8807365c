use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use transcribe_domain::{
    assemble_transcript, segment, AudioCodecPort, DomainError, TranscriptionPort,
    TranscriptionResult, DEFAULT_CHUNK_MS,
};

use crate::{ApplicationError, TranscribeUploadRequest, TranscribeUploadResponse, UploadPolicy};

#[async_trait]
pub trait TranscribeUseCase: Send + Sync {
    async fn transcribe(
        &self,
        request: TranscribeUploadRequest,
    ) -> Result<TranscribeUploadResponse, ApplicationError>;
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub upload_dir: PathBuf,
    pub chunk_ms: u32,
    pub upload_policy: UploadPolicy,
    pub request_timeout: Option<Duration>,
}

impl PipelineSettings {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            chunk_ms: DEFAULT_CHUNK_MS,
            upload_policy: UploadPolicy::default(),
            request_timeout: None,
        }
    }
}

pub struct TranscribeUseCaseImpl {
    codec: Arc<dyn AudioCodecPort>,
    transcription: Arc<dyn TranscriptionPort>,
    settings: PipelineSettings,
}

impl TranscribeUseCaseImpl {
    pub fn new(
        codec: Arc<dyn AudioCodecPort>,
        transcription: Arc<dyn TranscriptionPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            codec,
            transcription,
            settings,
        }
    }

    async fn run_pipeline(
        &self,
        request: TranscribeUploadRequest,
        extension: &str,
    ) -> Result<(usize, String), ApplicationError> {
        let started_at = Instant::now();
        // Dropping the guard deletes the file, on the error path as well.
        let upload = persist_upload(&self.settings.upload_dir, extension, request.content).await?;

        let audio = self.codec.decode(upload.path()).await?;
        tracing::debug!(
            sample_rate_hz = audio.sample_rate_hz,
            frame_count = audio.frame_count(),
            duration_ms = audio.duration_ms(),
            "decoded upload"
        );

        let segments = segment(&audio, self.settings.chunk_ms)?;
        drop(audio);
        let total = segments.len();

        let mut results = Vec::with_capacity(total);
        for chunk in segments {
            self.check_deadline(started_at, chunk.index, total)?;

            let wav_bytes = self.codec.encode_wav(&chunk).await?;
            tracing::debug!(
                chunk = chunk.index,
                total,
                start_ms = chunk.start_ms,
                duration_ms = chunk.duration_ms,
                wav_bytes = wav_bytes.len(),
                "transcribing chunk"
            );
            let text = self
                .transcription
                .transcribe_chunk(wav_bytes)
                .await
                .map_err(DomainError::from)?;
            results.push(TranscriptionResult {
                index: chunk.index,
                text,
            });
        }

        let transcript = assemble_transcript(results)?;
        Ok((transcript.segment_count, transcript.text))
    }

    fn check_deadline(
        &self,
        started_at: Instant,
        chunk: usize,
        total: usize,
    ) -> Result<(), ApplicationError> {
        let Some(timeout) = self.settings.request_timeout else {
            return Ok(());
        };
        if started_at.elapsed() >= timeout {
            return Err(ApplicationError::Processing(format!(
                "request timed out after {} ms ({chunk} of {total} chunks transcribed)",
                timeout.as_millis()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TranscribeUseCase for TranscribeUseCaseImpl {
    async fn transcribe(
        &self,
        request: TranscribeUploadRequest,
    ) -> Result<TranscribeUploadResponse, ApplicationError> {
        if let Err(errors) = request.validate() {
            return Err(ApplicationError::InvalidInput(
                TranscribeUploadRequest::validation_message(&errors),
            ));
        }
        let extension = self
            .settings
            .upload_policy
            .allowed_extension(&request.filename)
            .ok_or(ApplicationError::UnsupportedFormat)?;

        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("transcribe", request_id = %request_id);
        async move {
            tracing::info!(
                filename = %request.filename,
                upload_bytes = request.content.len(),
                chunk_ms = self.settings.chunk_ms,
                "starting transcription pipeline"
            );

            let (segment_count, text) = self.run_pipeline(request, &extension).await?;

            tracing::info!(
                segment_count,
                text_chars = text.chars().count(),
                "transcription pipeline completed"
            );
            Ok::<_, ApplicationError>(TranscribeUploadResponse {
                request_id,
                text,
                segment_count,
            })
        }
        .instrument(span)
        .await
    }
}

async fn persist_upload(
    upload_dir: &Path,
    extension: &str,
    content: Vec<u8>,
) -> Result<NamedTempFile, DomainError> {
    let file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(upload_dir)?;
    tokio::fs::write(file.path(), content).await?;
    Ok(file)
}
