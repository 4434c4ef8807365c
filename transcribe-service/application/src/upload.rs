use std::collections::BTreeSet;

/// Extension allow-list for uploaded audio files.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_extensions: BTreeSet<String>,
}

impl UploadPolicy {
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Returns the lower-cased extension when it is allowed.
    pub fn allowed_extension(&self, filename: &str) -> Option<String> {
        let (_, extension) = filename.rsplit_once('.')?;
        let extension = extension.to_ascii_lowercase();
        self.allowed_extensions
            .contains(&extension)
            .then_some(extension)
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        self.allowed_extension(filename).is_some()
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(["mp3", "wav", "m4a", "ogg", "mp4"])
    }
}
