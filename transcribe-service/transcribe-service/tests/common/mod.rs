use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use hound::{SampleFormat, WavSpec, WavWriter};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use transcribe_configuration::AppConfig;
use transcribe_setup::Application;

/// Scripted stand-in for the hosted inference API. Replies are served in
/// order; the last one repeats once the script runs out.
pub struct MockRemote {
    replies: Vec<(u16, Value)>,
    next: AtomicUsize,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl MockRemote {
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

async fn answer(
    State(remote): State<Arc<MockRemote>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
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

    let index = remote.next.fetch_add(1, Ordering::SeqCst);
    let (status, reply) = remote
        .replies
        .get(index)
        .or_else(|| remote.replies.last())
        .cloned()
        .expect("scripted reply");
    (
        StatusCode::from_u16(status).expect("valid status"),
        Json(reply),
    )
}

async fn serve_on_free_port(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

pub async fn spawn_mock_remote(replies: Vec<(u16, Value)>) -> (String, Arc<MockRemote>) {
    let remote = Arc::new(MockRemote {
        replies,
        next: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });
    let router = Router::new()
        .route("/models/whisper", post(answer))
        .with_state(remote.clone());
    let addr = serve_on_free_port(router).await;
    (format!("http://{addr}/models/whisper"), remote)
}

pub struct TestService {
    pub base_url: String,
    pub client: reqwest::Client,
    pub upload_dir: PathBuf,
    _scratch: TempDir,
}

impl TestService {
    pub fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(&self.upload_dir)
            .expect("upload dir exists")
            .next()
            .is_none()
    }

    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> (u16, Value) {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
        );
        let response = self
            .client
            .post(format!("{}/api/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("upload request");
        let status = response.status().as_u16();
        (status, response.json().await.expect("json body"))
    }
}

pub async fn setup_test_service(endpoint: &str) -> TestService {
    let scratch = tempfile::tempdir().expect("temp dir");
    let upload_dir = scratch.path().join("uploads");

    let mut config = AppConfig::default();
    config.service.inference.endpoint = endpoint.to_string();
    config.service.inference.api_key = "hf_test".to_string();
    config.service.inference.initial_wait_secs = 0;
    config.service.upload.dir = upload_dir.to_string_lossy().into_owned();
    config.service.static_dir = scratch.path().join("static").to_string_lossy().into_owned();

    let app = Application::new(config).await.expect("application builds");
    let addr = serve_on_free_port(app.router()).await;

    TestService {
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
        upload_dir,
        _scratch: scratch,
    }
}

/// Renders a mono 16-bit WAV of the given length as an in-memory file.
pub fn wav_fixture(dir: &Path, seconds: u32, sample_rate: u32) -> Vec<u8> {
    let path = dir.join("fixture.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).expect("create wav");
    for frame in 0..seconds * sample_rate {
        let sample = ((frame % 200) as i16 - 100) * 50;
        writer.write_sample(sample).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    std::fs::read(&path).expect("read wav")
}
