mod transcribe;

pub use transcribe::{PipelineSettings, TranscribeUseCase, TranscribeUseCaseImpl};
