use thiserror::Error;
use transcribe_domain::DomainError;

pub const MISSING_FILE_MESSAGE: &str = "没有文件";
pub const EMPTY_FILENAME_MESSAGE: &str = "没有选择文件";
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "不支持的文件格式";

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("不支持的文件格式")]
    UnsupportedFormat,

    #[error("处理请求时出错: {0}")]
    Processing(String),
}

impl ApplicationError {
    pub fn missing_file() -> Self {
        Self::InvalidInput(MISSING_FILE_MESSAGE.to_string())
    }

    pub fn empty_filename() -> Self {
        Self::InvalidInput(EMPTY_FILENAME_MESSAGE.to_string())
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::UnsupportedFormat)
    }
}

impl From<DomainError> for ApplicationError {
    fn from(error: DomainError) -> Self {
        Self::Processing(error.to_string())
    }
}
