use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use transcribe_application::{ApplicationError, TranscribeUploadRequest};

use crate::error::{error_mapper, HttpError};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

pub async fn transcribe_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), HttpError> {
    // A body that is not multipart/form-data cannot carry a file part.
    let multipart = multipart.map_err(|rejection| {
        tracing::warn!(error = %rejection, "transcribe request is not multipart");
        error_mapper(ApplicationError::missing_file())
    })?;
    let request = match read_upload(multipart).await? {
        Some(request) => request,
        None => {
            tracing::warn!("transcribe request without a file part");
            return Err(error_mapper(ApplicationError::missing_file()));
        }
    };

    tracing::info!(
        filename = %request.filename,
        upload_bytes = request.content.len(),
        "received transcribe request"
    );

    match state.usecase.transcribe(request).await {
        Ok(result) => {
            tracing::info!(
                request_id = %result.request_id,
                segment_count = result.segment_count,
                "transcribe request completed"
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "text": result.text,
                })),
            ))
        }
        Err(error) => {
            if error.is_client_error() {
                tracing::warn!(error = %error, "transcribe request rejected");
            } else {
                tracing::error!(error = %error, "transcribe request failed");
            }
            Err(error_mapper(error))
        }
    }
}

/// Pulls the first file part named `file`. Parts without a filename are plain
/// form fields and do not count as an upload.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<Option<TranscribeUploadRequest>, HttpError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(TranscribeUploadRequest::new(filename, content.to_vec())));
    }
    Ok(None)
}

fn multipart_error(error: MultipartError) -> HttpError {
    tracing::warn!(error = %error, "malformed multipart body");
    HttpError::Rejected {
        status: error.status(),
        message: error.body_text(),
    }
}
