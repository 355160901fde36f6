//! Silent telephony WAV prompts for the loopback adapters

use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

const HEADER_LEN: usize = 44;
const SAMPLE_RATE: u32 = 8000;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_FRAME: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
const BYTE_RATE: u32 = SAMPLE_RATE * BYTES_PER_FRAME as u32;

/// `seconds` of 8 kHz mono 16-bit silence with a canonical header
pub fn silence(seconds: f64) -> Bytes {
    let frames = (seconds.max(0.0) * SAMPLE_RATE as f64).round() as usize;
    let data_len = frames * BYTES_PER_FRAME as usize;
    let mut buf = BytesMut::with_capacity(HEADER_LEN + data_len);

    buf.put_slice(b"RIFF");
    buf.put_u32_le((HEADER_LEN - 8 + data_len) as u32);
    buf.put_slice(b"WAVE");

    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1);
    buf.put_u16_le(CHANNELS);
    buf.put_u32_le(SAMPLE_RATE);
    buf.put_u32_le(BYTE_RATE);
    buf.put_u16_le(BYTES_PER_FRAME);
    buf.put_u16_le(BITS_PER_SAMPLE);

    buf.put_slice(b"data");
    buf.put_u32_le(data_len as u32);
    buf.put_bytes(0, data_len);

    buf.freeze()
}

/// Play length of a file written by [`silence`], from its size alone.
/// `None` when the image does not start with a RIFF/WAVE header.
pub fn duration(image: &[u8]) -> Option<Duration> {
    if image.len() < HEADER_LEN || &image[0..4] != b"RIFF" || &image[8..12] != b"WAVE" {
        return None;
    }
    let data_len = (image.len() - HEADER_LEN) as f64;
    Some(Duration::from_secs_f64(data_len / BYTE_RATE as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length_matches_duration() {
        let image = silence(0.5);
        assert_eq!(image.len(), HEADER_LEN + 8000);
        assert_eq!(&image[36..40], b"data");
        assert_eq!(duration(&image), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_rejects_non_wav() {
        assert_eq!(duration(b"ID3\x03not a wav file, padded out to header size"), None);
        assert_eq!(duration(b"RIFF"), None);
    }
}
