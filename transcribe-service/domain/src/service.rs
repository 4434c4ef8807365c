use crate::entity::frames_to_ms;
use crate::{AudioBuffer, DomainError, FinalTranscript, Segment, TranscriptionResult};

pub const DEFAULT_CHUNK_MS: u32 = 30_000;

/// Splits `audio` into consecutive chunks of `chunk_duration_ms`; only the
/// last chunk may be shorter.
pub fn segment(audio: &AudioBuffer, chunk_duration_ms: u32) -> Result<Vec<Segment>, DomainError> {
    if chunk_duration_ms == 0 {
        return Err(DomainError::invalid_input(
            "chunk duration must be greater than zero",
        ));
    }
    if audio.sample_rate_hz == 0 {
        return Err(DomainError::codec_error("decoded audio has no sample rate"));
    }

    let chunk_frames =
        ((u64::from(chunk_duration_ms) * u64::from(audio.sample_rate_hz)) / 1_000).max(1) as usize;

    let segments = audio
        .samples
        .chunks(chunk_frames)
        .enumerate()
        .map(|(index, frames)| {
            let start_frame = index * chunk_frames;
            Segment {
                index,
                start_ms: frames_to_ms(start_frame, audio.sample_rate_hz),
                duration_ms: frames_to_ms(start_frame + frames.len(), audio.sample_rate_hz)
                    - frames_to_ms(start_frame, audio.sample_rate_hz),
                sample_rate_hz: audio.sample_rate_hz,
                samples: frames.to_vec(),
            }
        })
        .collect();
    Ok(segments)
}

/// Joins chunk texts in ordinal order. Ordinals must be exactly `0..n`.
pub fn assemble_transcript(
    mut results: Vec<TranscriptionResult>,
) -> Result<FinalTranscript, DomainError> {
    results.sort_by_key(|result| result.index);
    for (expected, result) in results.iter().enumerate() {
        if result.index != expected {
            return Err(DomainError::internal_error(&format!(
                "transcription results are not contiguous: expected chunk {expected}, got {}",
                result.index
            )));
        }
    }

    let text = results
        .iter()
        .map(|result| result.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(FinalTranscript {
        text,
        segment_count: results.len(),
    })
}
