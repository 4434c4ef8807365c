use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use transcribe_domain::{AudioBuffer, DomainError};

/// Reads a WAV file of any common PCM/float layout and downmixes it to mono i16.
pub fn decode_wav_file(path: &Path) -> Result<AudioBuffer, DomainError> {
    let mut reader = WavReader::open(path)
        .map_err(|err| DomainError::codec_error(&format!("failed to parse WAV file: {err}")))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(DomainError::codec_error("WAV file declares zero channels"));
    }

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => read_samples::<i8, _>(&mut reader, |s| i16::from(s) << 8)?,
        (SampleFormat::Int, 16) => read_samples::<i16, _>(&mut reader, |s| s)?,
        (SampleFormat::Int, bits @ 17..=32) => {
            let shift = u32::from(bits - 16);
            read_samples::<i32, _>(&mut reader, |s| (s >> shift) as i16)?
        }
        (SampleFormat::Float, 32) => read_samples::<f32, _>(&mut reader, |s| {
            (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
        })?,
        (format, bits) => {
            return Err(DomainError::codec_error(&format!(
                "unsupported WAV layout: {format:?} {bits}-bit"
            )));
        }
    };

    Ok(AudioBuffer::new(
        spec.sample_rate,
        downmix(&interleaved, spec.channels),
    ))
}

fn read_samples<S, F>(
    reader: &mut WavReader<std::io::BufReader<std::fs::File>>,
    convert: F,
) -> Result<Vec<i16>, DomainError>
where
    S: hound::Sample,
    F: Fn(S) -> i16,
{
    reader
        .samples::<S>()
        .map(|sample| sample.map(&convert))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| DomainError::codec_error(&format!("failed to read WAV samples: {err}")))
}

fn downmix(interleaved: &[i16], channels: u16) -> Vec<i16> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(usize::from(channels))
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&sample| i32::from(sample)).sum();
            (sum / i32::from(channels)) as i16
        })
        .collect()
}

/// Encodes mono samples as a 16-bit PCM WAV file image.
pub fn encode_wav_bytes(sample_rate_hz: u32, samples: &[i16]) -> Result<Vec<u8>, DomainError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let encode_error =
        |err: hound::Error| DomainError::codec_error(&format!("failed to encode WAV: {err}"));

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_error)?;
        for &sample in samples {
            writer.write_sample(sample).map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;
    }
    Ok(cursor.into_inner())
}

pub fn pcm16le_bytes_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}
