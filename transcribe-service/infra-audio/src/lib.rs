mod codec;
mod tool;
mod wav;

pub use codec::AudioCodecAdapter;
pub use tool::resolve_ffmpeg;
pub use wav::{decode_wav_file, encode_wav_bytes, pcm16le_bytes_to_i16};
