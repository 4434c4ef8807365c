/// Decoded mono 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    pub sample_rate_hz: u32,
    pub samples: Vec<i16>,
}

impl AudioBuffer {
    pub fn new(sample_rate_hz: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate_hz,
            samples,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.samples.len(), self.sample_rate_hz)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub sample_rate_hz: u32,
    pub samples: Vec<i16>,
}

impl Segment {
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalTranscript {
    pub text: String,
    pub segment_count: usize,
}

pub(crate) fn frames_to_ms(frames: usize, sample_rate_hz: u32) -> u64 {
    if sample_rate_hz == 0 {
        return 0;
    }
    (frames as u64 * 1_000) / u64::from(sample_rate_hz)
}
