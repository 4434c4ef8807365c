use std::path::{Path, PathBuf};

/// Locates the ffmpeg executable once at startup.
///
/// Order: explicitly configured path (or command name), `PATH`, then
/// `<search_dir>/ffmpeg`.
pub fn resolve_ffmpeg(configured: Option<&str>, search_dir: &Path) -> Option<PathBuf> {
    if let Some(configured) = configured.map(str::trim).filter(|value| !value.is_empty()) {
        let candidate = PathBuf::from(configured);
        if candidate.is_file() {
            return Some(candidate);
        }
        match which::which(configured) {
            Ok(found) => return Some(found),
            Err(err) => {
                tracing::warn!(configured, error = %err, "configured ffmpeg not found");
            }
        }
    }

    if let Ok(found) = which::which("ffmpeg") {
        return Some(found);
    }

    let bundled = search_dir.join(format!("ffmpeg{}", std::env::consts::EXE_SUFFIX));
    bundled.is_file().then_some(bundled)
}
