mod transcribe;

pub use transcribe::{TranscribeUploadRequest, TranscribeUploadResponse};
