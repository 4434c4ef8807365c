use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use transcribe_domain::{
    Delay, DomainError, RetryDecision, RetryPolicy, RetryState, TranscriptionError,
    TranscriptionPort,
};

const WAV_CONTENT_TYPE: &str = "audio/wav";

#[derive(Debug, Clone)]
pub struct InferenceClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub retry: RetryPolicy,
    pub http_timeout: Option<Duration>,
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

enum AttemptOutcome {
    Success(String),
    ModelLoading { estimated_time_secs: Option<f64> },
}

/// Client for a hosted speech-to-text inference endpoint that answers 503
/// while the model is being loaded.
pub struct InferenceTranscriptionClient {
    http: Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl InferenceTranscriptionClient {
    pub fn new(config: InferenceClientConfig, delay: Arc<dyn Delay>) -> Result<Self, DomainError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| {
            DomainError::internal_error(&format!("failed to build inference http client: {err}"))
        })?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
            api_key: config.api_key,
            retry: config.retry,
            delay,
        })
    }

    async fn attempt(&self, wav_bytes: &[u8]) -> Result<AttemptOutcome, TranscriptionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, WAV_CONTENT_TYPE)
            .body(wav_bytes.to_vec())
            .send()
            .await
            .map_err(|err| TranscriptionError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| TranscriptionError::Transport(err.to_string()))?;

        match status {
            StatusCode::OK => Ok(AttemptOutcome::Success(extract_text(&body))),
            StatusCode::SERVICE_UNAVAILABLE => Ok(AttemptOutcome::ModelLoading {
                estimated_time_secs: estimated_time(&body),
            }),
            other => Err(TranscriptionError::Remote {
                status: other.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

#[async_trait]
impl TranscriptionPort for InferenceTranscriptionClient {
    async fn transcribe_chunk(&self, wav_bytes: Vec<u8>) -> Result<String, TranscriptionError> {
        let mut state = RetryState::new(self.retry);
        loop {
            let attempt = state.attempt();
            let estimated_time_secs = match self.attempt(&wav_bytes).await {
                Ok(AttemptOutcome::Success(text)) => {
                    tracing::debug!(attempt, text_chars = text.chars().count(), "chunk transcribed");
                    return Ok(text);
                }
                Ok(AttemptOutcome::ModelLoading {
                    estimated_time_secs,
                }) => estimated_time_secs,
                Err(error) => {
                    tracing::warn!(attempt, error = %error, "inference request failed");
                    return Err(error);
                }
            };

            match state.on_model_loading(estimated_time_secs) {
                RetryDecision::Wait(wait) => {
                    tracing::info!(
                        attempt,
                        estimated_time_secs,
                        wait_secs = wait.as_secs(),
                        "model is loading, waiting before retry"
                    );
                    self.delay.sleep(wait).await;
                }
                RetryDecision::GiveUp(error) => {
                    tracing::warn!(attempt, error = %error, "model still loading, giving up");
                    return Err(error);
                }
            }
        }
    }
}

/// Pulls the transcript out of a successful response body.
///
/// Accepts `[{"text": ..}, ..]` and `{"text": ..}`; anything else is
/// returned stringified.
pub fn extract_text(body: &[u8]) -> String {
    let value = match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(_) => return String::from_utf8_lossy(body).into_owned(),
    };
    match value {
        Value::Array(items) if !items.is_empty() => text_field(&items[0]),
        Value::Object(_) => text_field(&value),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn text_field(value: &Value) -> String {
    match value.get("text") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Reads the `estimated_time` hint from a 503 body.
pub fn estimated_time(body: &[u8]) -> Option<f64> {
    let value = serde_json::from_slice::<Value>(body).ok()?;
    match value.get("estimated_time")? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::Router;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Default)]
    struct RecordingDelay {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingDelay {
        fn waits(&self) -> Vec<u64> {
            self.waits
                .lock()
                .expect("lock")
                .iter()
                .map(Duration::as_secs)
                .collect()
        }
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().expect("lock").push(duration);
        }
    }

    struct RecordedRequest {
        authorization: Option<String>,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    #[derive(Default)]
    struct MockRemote {
        replies: Mutex<VecDeque<(u16, String)>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    async fn mock_inference(
        State(remote): State<Arc<MockRemote>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> (AxumStatus, String) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        remote.requests.lock().expect("lock").push(RecordedRequest {
            authorization: header("authorization"),
            content_type: header("content-type"),
            body: body.to_vec(),
        });
        let (status, reply) = remote
            .replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or((503, "{}".to_string()));
        (
            AxumStatus::from_u16(status).expect("valid status"),
            reply,
        )
    }

    async fn start_remote(replies: Vec<(u16, &str)>) -> (String, Arc<MockRemote>) {
        let remote = Arc::new(MockRemote {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/models/whisper", post(mock_inference))
            .with_state(remote.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock remote runs");
        });
        (format!("http://{addr}/models/whisper"), remote)
    }

    fn client(endpoint: String, delay: Arc<RecordingDelay>) -> InferenceTranscriptionClient {
        InferenceTranscriptionClient::new(
            InferenceClientConfig {
                endpoint,
                api_key: "hf_secret".to_string(),
                retry: RetryPolicy::default(),
                http_timeout: Some(Duration::from_secs(5)),
            },
            delay,
        )
        .expect("client builds")
    }

    #[test]
    fn extract_text_handles_response_shapes() {
        assert_eq!(extract_text(br#"{"text":" hello"}"#), " hello");
        assert_eq!(extract_text(br#"[{"text":"first"},{"text":"second"}]"#), "first");
        assert_eq!(extract_text(br#"{"chunks":[]}"#), "");
        assert_eq!(extract_text(br#"[{"label":"x"}]"#), "");
        assert_eq!(extract_text(b"[]"), "[]");
        assert_eq!(extract_text(b"42"), "42");
        assert_eq!(extract_text(br#""plain""#), "plain");
        assert_eq!(extract_text(b"not json"), "not json");
    }

    #[test]
    fn estimated_time_reads_numeric_hints() {
        assert_eq!(estimated_time(br#"{"estimated_time": 12.5}"#), Some(12.5));
        assert_eq!(estimated_time(br#"{"estimated_time": "8"}"#), Some(8.0));
        assert_eq!(estimated_time(br#"{"error": "loading"}"#), None);
        assert_eq!(estimated_time(b"<html>busy</html>"), None);
    }

    #[tokio::test]
    async fn success_sends_wav_with_bearer_token() {
        let (endpoint, remote) = start_remote(vec![(200, r#"{"text":"hello"}"#)]).await;
        let delay = Arc::new(RecordingDelay::default());

        let text = client(endpoint, delay.clone())
            .transcribe_chunk(b"RIFF....WAVE".to_vec())
            .await
            .expect("chunk transcribed");

        assert_eq!(text, "hello");
        assert!(delay.waits().is_empty());
        let requests = remote.requests.lock().expect("lock");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer hf_secret"));
        assert_eq!(requests[0].content_type.as_deref(), Some("audio/wav"));
        assert_eq!(requests[0].body, b"RIFF....WAVE".to_vec());
    }

    #[tokio::test]
    async fn model_loading_hint_respects_wait_floor() {
        let (endpoint, remote) = start_remote(vec![
            (503, r#"{"error":"Model is loading","estimated_time":10.0}"#),
            (200, r#"[{"text":"warm now"}]"#),
        ])
        .await;
        let delay = Arc::new(RecordingDelay::default());

        let text = client(endpoint, delay.clone())
            .transcribe_chunk(vec![1, 2, 3])
            .await
            .expect("second attempt succeeds");

        assert_eq!(text, "warm now");
        assert_eq!(delay.waits(), vec![20]);
        assert_eq!(remote.requests.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn long_estimated_time_extends_the_wait() {
        let (endpoint, _remote) = start_remote(vec![
            (503, r#"{"estimated_time":57.3}"#),
            (200, r#"{"text":"ok"}"#),
        ])
        .await;
        let delay = Arc::new(RecordingDelay::default());

        client(endpoint, delay.clone())
            .transcribe_chunk(vec![0])
            .await
            .expect("retry succeeds");

        assert_eq!(delay.waits(), vec![62]);
    }

    #[tokio::test]
    async fn persistent_model_loading_exhausts_retries() {
        let replies = vec![(503, "Service Unavailable"); 6];
        let (endpoint, remote) = start_remote(replies).await;
        let delay = Arc::new(RecordingDelay::default());

        let error = client(endpoint, delay.clone())
            .transcribe_chunk(vec![0])
            .await
            .expect_err("retries are exhausted");

        assert_eq!(error, TranscriptionError::RetriesExhausted { attempts: 5 });
        assert!(error.to_string().contains("max retries exceeded"));
        assert_eq!(remote.requests.lock().expect("lock").len(), 5);
        assert_eq!(delay.waits(), vec![20, 40, 60, 80]);
    }

    #[tokio::test]
    async fn other_statuses_fail_without_retry() {
        let (endpoint, remote) = start_remote(vec![(401, "Invalid credentials")]).await;
        let delay = Arc::new(RecordingDelay::default());

        let error = client(endpoint, delay.clone())
            .transcribe_chunk(vec![0])
            .await
            .expect_err("401 is a hard failure");

        assert_eq!(
            error,
            TranscriptionError::Remote {
                status: 401,
                body: "Invalid credentials".to_string(),
            }
        );
        assert_eq!(error.to_string(), "API错误: 401 - Invalid credentials");
        assert_eq!(remote.requests.lock().expect("lock").len(), 1);
        assert!(delay.waits().is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let delay = Arc::new(RecordingDelay::default());

        let error = client(format!("http://{addr}/models/whisper"), delay.clone())
            .transcribe_chunk(vec![0])
            .await
            .expect_err("connection refused");

        assert!(matches!(error, TranscriptionError::Transport(_)));
        assert!(delay.waits().is_empty());
    }
}
