mod frontend;
mod health;
mod transcribe;

pub use frontend::serve_frontend;
pub use health::health_check;
pub use transcribe::transcribe_audio;
