use thiserror::Error;

/// Failure of one chunk call against the remote inference service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("API错误: {status} - {body}")]
    Remote { status: u16, body: String },

    #[error("达到最大重试次数，模型仍未加载完成 (max retries exceeded after {attempts} attempts)")]
    RetriesExhausted { attempts: u32 },

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(message: &str) -> Self {
        Self::InvalidInput(message.to_string())
    }

    pub fn codec_error(message: &str) -> Self {
        Self::Codec(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        Self::Internal(message.to_string())
    }
}
