use serde::Serialize;
use validator::Validate;

use crate::error::EMPTY_FILENAME_MESSAGE;

#[derive(Debug, Clone, Validate)]
pub struct TranscribeUploadRequest {
    #[validate(length(min = 1, message = "没有选择文件"))]
    pub filename: String,
    pub content: Vec<u8>,
}

impl TranscribeUploadRequest {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
        errors
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|error| error.message.as_ref().map(|message| message.to_string()))
            .unwrap_or_else(|| EMPTY_FILENAME_MESSAGE.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscribeUploadResponse {
    pub request_id: String,
    pub text: String,
    pub segment_count: usize,
}
