use std::path::{Component, Path, PathBuf};

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::error::HttpError;
use crate::state::AppState;

const INDEX_FILE: &str = "index.html";

/// Serves the bundled single-page frontend. Unknown paths fall back to
/// `index.html` so client-side routes resolve.
pub async fn serve_frontend(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return HttpError::NotFound.into_response();
    }
    let Some(relative) = sanitize(uri.path()) else {
        tracing::warn!(path = uri.path(), "rejected static path");
        return HttpError::NotFound.into_response();
    };

    let static_dir = state.static_dir.as_path();
    let requested = static_dir.join(&relative);
    let target = if !relative.as_os_str().is_empty() && is_file(&requested).await {
        requested
    } else {
        static_dir.join(INDEX_FILE)
    };

    match tokio::fs::read(&target).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&target))],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::debug!(path = %target.display(), error = %err, "static file unavailable");
            HttpError::NotFound.into_response()
        }
    }
}

fn sanitize(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
