use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use transcribe_domain::{AudioBuffer, AudioCodecPort, DomainError, Segment};

use crate::wav::{decode_wav_file, encode_wav_bytes, pcm16le_bytes_to_i16};

/// Decodes uploads with hound when they are RIFF/WAVE and with an external
/// ffmpeg executable otherwise, or when hound cannot read the WAV payload.
pub struct AudioCodecAdapter {
    ffmpeg: Option<PathBuf>,
    decode_sample_rate_hz: u32,
}

impl AudioCodecAdapter {
    pub fn new(ffmpeg: Option<PathBuf>, decode_sample_rate_hz: u32) -> Self {
        Self {
            ffmpeg,
            decode_sample_rate_hz,
        }
    }

    async fn decode_with_ffmpeg(&self, path: &Path) -> Result<AudioBuffer, DomainError> {
        let ffmpeg = self.ffmpeg.as_ref().ok_or_else(|| {
            DomainError::codec_error("ffmpeg is required to decode non-WAV uploads but was not found")
        })?;
        let output = Command::new(ffmpeg)
            .arg("-nostdin")
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-f", "s16le", "-acodec", "pcm_s16le", "-ac", "1", "-ar"])
            .arg(self.decode_sample_rate_hz.to_string())
            .arg("pipe:1")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                DomainError::codec_error(&format!(
                    "failed to run `{}`: {err}",
                    ffmpeg.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::codec_error(&format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(
            ffmpeg = %ffmpeg.display(),
            pcm_bytes = output.stdout.len(),
            "ffmpeg decode finished"
        );
        Ok(AudioBuffer::new(
            self.decode_sample_rate_hz,
            pcm16le_bytes_to_i16(&output.stdout),
        ))
    }
}

#[async_trait]
impl AudioCodecPort for AudioCodecAdapter {
    async fn decode(&self, path: &Path) -> Result<AudioBuffer, DomainError> {
        if !is_riff_wave(path).await? {
            return self.decode_with_ffmpeg(path).await;
        }

        let wav_path = path.to_path_buf();
        let native = tokio::task::spawn_blocking(move || decode_wav_file(&wav_path))
            .await
            .map_err(|err| DomainError::internal_error(&format!("decode task failed: {err}")))?;
        match native {
            // hound reads PCM and float payloads only.
            Err(DomainError::Codec(reason)) if self.ffmpeg.is_some() => {
                tracing::debug!(reason = %reason, "native WAV decode failed, retrying with ffmpeg");
                self.decode_with_ffmpeg(path).await
            }
            other => other,
        }
    }

    async fn encode_wav(&self, segment: &Segment) -> Result<Vec<u8>, DomainError> {
        let sample_rate_hz = segment.sample_rate_hz;
        let samples = segment.samples.clone();
        tokio::task::spawn_blocking(move || encode_wav_bytes(sample_rate_hz, &samples))
            .await
            .map_err(|err| DomainError::internal_error(&format!("encode task failed: {err}")))?
    }
}

async fn is_riff_wave(path: &Path) -> Result<bool, DomainError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut header = [0u8; 12];
    let mut filled = 0;
    while filled < header.len() {
        let read = file.read(&mut header[filled..]).await?;
        if read == 0 {
            return Ok(false);
        }
        filled += read;
    }
    Ok(&header[0..4] == b"RIFF" && &header[8..12] == b"WAVE")
}
