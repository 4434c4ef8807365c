use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use transcribe_application::ApplicationError;

#[derive(Debug)]
pub enum HttpError {
    BadRequest { message: String },
    Rejected { status: StatusCode, message: String },
    NotFound,
    Internal { message: String },
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::Rejected { status, .. } => *status,
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            HttpError::BadRequest { message }
            | HttpError::Rejected { message, .. }
            | HttpError::Internal { message } => message,
            HttpError::NotFound => "Not found".to_string(),
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}

pub fn error_mapper(error: ApplicationError) -> HttpError {
    if error.is_client_error() {
        HttpError::BadRequest {
            message: error.to_string(),
        }
    } else {
        HttpError::Internal {
            message: error.to_string(),
        }
    }
}
