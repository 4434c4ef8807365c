use std::path::PathBuf;
use std::sync::Arc;

use transcribe_application::TranscribeUseCase;

#[derive(Clone)]
pub struct AppState {
    pub usecase: Arc<dyn TranscribeUseCase>,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(usecase: Arc<dyn TranscribeUseCase>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            usecase,
            static_dir: Arc::new(static_dir.into()),
        }
    }
}
