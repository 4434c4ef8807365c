use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error};
use axum::Router;
use transcribe_application::{
    PipelineSettings, TranscribeUseCase, TranscribeUseCaseImpl, UploadPolicy,
};
use transcribe_configuration::{AppConfig, ServiceConfig};
use transcribe_domain::{AudioCodecPort, RetryPolicy, TranscriptionPort};
use transcribe_http_server::{build_router, create_app_routes, AppState};
use transcribe_infra_audio::{resolve_ffmpeg, AudioCodecAdapter};
use transcribe_infra_inference::{
    InferenceClientConfig, InferenceTranscriptionClient, TokioDelay,
};

pub async fn build_and_run(config: AppConfig) -> Result<(), Error> {
    let app = Application::new(config).await?;
    app.run().await
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        let service = &config.service;
        tracing::info!(
            endpoint = %service.inference.endpoint,
            max_retries = service.inference.max_retries,
            initial_wait_secs = service.inference.initial_wait_secs,
            chunk_ms = service.audio.chunk_ms,
            upload_dir = %service.upload.dir,
            "initializing transcription application"
        );

        tokio::fs::create_dir_all(&service.upload.dir)
            .await
            .with_context(|| format!("failed to create upload dir `{}`", service.upload.dir))?;

        let codec = build_codec(service);
        let transcription = build_transcription_client(service)?;
        let settings = PipelineSettings {
            upload_dir: service.upload.dir.clone().into(),
            chunk_ms: service.audio.chunk_ms,
            upload_policy: UploadPolicy::new(&service.upload.allowed_extensions),
            request_timeout: service.pipeline.request_timeout_ms.map(Duration::from_millis),
        };
        let usecase: Arc<dyn TranscribeUseCase> =
            Arc::new(TranscribeUseCaseImpl::new(codec, transcription, settings));
        let state = AppState::new(usecase, service.static_dir.as_str());

        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.config.service.upload.max_upload_bytes)
    }

    pub async fn run(self) -> Result<(), Error> {
        let server_config = self.config.server.clone();
        tracing::info!(
            host = %server_config.host,
            port = server_config.port,
            "starting transcription HTTP routes"
        );

        create_app_routes(
            self.state,
            server_config,
            self.config.service.upload.max_upload_bytes,
        )
        .await
        .map_err(|err| anyhow::anyhow!("server startup failed: {err}"))
    }
}

fn build_codec(service: &ServiceConfig) -> Arc<dyn AudioCodecPort> {
    let ffmpeg = resolve_ffmpeg(
        service.audio.ffmpeg_path.as_deref(),
        Path::new(&service.audio.ffmpeg_search_dir),
    );
    match &ffmpeg {
        Some(path) => tracing::info!(ffmpeg = %path.display(), "resolved ffmpeg"),
        None => tracing::warn!("ffmpeg not found; only WAV uploads can be decoded"),
    }
    Arc::new(AudioCodecAdapter::new(
        ffmpeg,
        service.audio.decode_sample_rate_hz,
    ))
}

fn build_transcription_client(service: &ServiceConfig) -> Result<Arc<dyn TranscriptionPort>, Error> {
    let inference = &service.inference;
    if inference.api_key.is_empty() {
        tracing::warn!("inference api key is empty; remote calls will likely be rejected");
    }
    let config = InferenceClientConfig {
        endpoint: inference.endpoint.clone(),
        api_key: inference.api_key.clone(),
        retry: RetryPolicy::new(
            inference.max_retries,
            Duration::from_secs(inference.initial_wait_secs),
        ),
        http_timeout: (inference.http_timeout_ms > 0)
            .then(|| Duration::from_millis(inference.http_timeout_ms)),
    };
    let client = InferenceTranscriptionClient::new(config, Arc::new(TokioDelay))
        .context("failed to build inference client")?;
    Ok(Arc::new(client))
}
