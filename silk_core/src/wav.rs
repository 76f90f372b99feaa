use std::io::{self, Write};

use crate::error::FormatError;

/// Fixed size of the RIFF/WAVE header in bytes.
///   "RIFF" + riff_len:u32 + "WAVE"
///   + "fmt " + 16:u32 + format:u16 + channels:u16 + sample_rate:u32
///   + byte_rate:u32 + block_align:u16 + bits:u16
///   + "data" + data_len:u32
///   = 12 + 24 + 8 = 44
pub const WAV_HEADER_SIZE: usize = 44;

/// Bits per sample; the decode path only produces 16-bit PCM.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Block align written into every header: `2 * 16 / 8`.
///
/// This is the two-channel value and is written unchanged for any channel
/// count, so files stay byte-identical with existing converters.
pub const BLOCK_ALIGN: u16 = 2 * BITS_PER_SAMPLE / 8;

const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// Decoded representation of the 44-byte WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    /// Length of the sample payload following the header.
    pub data_len: u32,
}

impl WavHeader {
    pub fn new(channels: u16, sample_rate: u32, data_len: usize) -> Self {
        Self {
            channels,
            sample_rate,
            // Length fields are 32-bit; larger payloads wrap.
            data_len: data_len as u32,
        }
    }

    /// `16 * sample_rate * channels / 8`
    pub fn byte_rate(&self) -> u32 {
        u32::from(BITS_PER_SAMPLE)
            .wrapping_mul(self.sample_rate)
            .wrapping_mul(u32::from(self.channels))
            / 8
    }

    /// Value of the RIFF chunk size field: payload plus the 36 header bytes
    /// that follow it.
    pub fn riff_len(&self) -> u32 {
        self.data_len.wrapping_add(36)
    }

    /// Serialize to exactly `WAV_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut buf = [0u8; WAV_HEADER_SIZE];
        buf[0..4].copy_from_slice(b"RIFF");
        buf[4..8].copy_from_slice(&self.riff_len().to_le_bytes());
        buf[8..12].copy_from_slice(b"WAVE");
        buf[12..16].copy_from_slice(b"fmt ");
        buf[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        buf[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        buf[22..24].copy_from_slice(&self.channels.to_le_bytes());
        buf[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        buf[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        buf[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
        buf[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        buf[36..40].copy_from_slice(b"data");
        buf[40..44].copy_from_slice(&self.data_len.to_le_bytes());
        buf
    }

    /// Deserialize from `WAV_HEADER_SIZE` bytes, checking the chunk tags and
    /// the PCM format tag.
    pub fn from_bytes(buf: &[u8; WAV_HEADER_SIZE]) -> Result<Self, FormatError> {
        if &buf[0..4] != b"RIFF" {
            return Err(FormatError::NotWav { what: "missing RIFF tag" });
        }
        if &buf[8..12] != b"WAVE" {
            return Err(FormatError::NotWav { what: "missing WAVE tag" });
        }
        if &buf[12..16] != b"fmt " {
            return Err(FormatError::NotWav { what: "missing fmt chunk" });
        }
        if u16::from_le_bytes([buf[20], buf[21]]) != FORMAT_PCM {
            return Err(FormatError::NotWav { what: "format tag is not PCM" });
        }
        if &buf[36..40] != b"data" {
            return Err(FormatError::NotWav { what: "missing data chunk" });
        }
        Ok(Self {
            channels: u16::from_le_bytes([buf[22], buf[23]]),
            sample_rate: u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]),
            data_len: u32::from_le_bytes([buf[40], buf[41], buf[42], buf[43]]),
        })
    }
}

/// Prepend a WAV header to `samples` (little-endian 16-bit PCM).
///
/// The result is always `WAV_HEADER_SIZE + samples.len()` bytes.
pub fn wrap(samples: &[u8], channels: u16, sample_rate: u32) -> Vec<u8> {
    let header = WavHeader::new(channels, sample_rate, samples.len());
    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + samples.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(samples);
    out
}

/// Stream the same bytes as [`wrap`] into `out`.
pub fn write_wav<W: Write>(
    mut out: W,
    samples: &[u8],
    channels: u16,
    sample_rate: u32,
) -> io::Result<()> {
    let header = WavHeader::new(channels, sample_rate, samples.len());
    out.write_all(&header.to_bytes())?;
    out.write_all(samples)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_bit_exact() {
        let wav = wrap(&[0u8; 20], 2, 16_000);
        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 56, 0, 0, 0, b'W', b'A', b'V', b'E', // riff
            b'f', b'm', b't', b' ', 16, 0, 0, 0, 1, 0, 2, 0, // fmt, pcm, 2ch
            0x80, 0x3e, 0, 0, // 16000
            0x00, 0xfa, 0, 0, // 64000
            4, 0, 16, 0, // align, bits
            b'd', b'a', b't', b'a', 20, 0, 0, 0,
        ];
        assert_eq!(&wav[..44], &expected);
        assert_eq!(wav.len(), 64);
    }

    #[test]
    fn sizes_follow_payload() {
        let samples = vec![0x11u8; 1234];
        let wav = wrap(&samples, 2, 16_000);
        assert_eq!(wav.len(), 44 + 1234);
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 1234 + 36);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 1234);
        assert_eq!(&wav[44..], samples.as_slice());
    }

    #[test]
    fn empty_payload() {
        let wav = wrap(&[], 1, 8_000);
        assert_eq!(wav.len(), 44);
        let header = WavHeader::from_bytes(wav[..44].try_into().unwrap()).unwrap();
        assert_eq!(header.data_len, 0);
        assert_eq!(header.riff_len(), 36);
    }

    #[test]
    fn mono_keeps_fixed_block_align() {
        let wav = wrap(&[0u8; 4], 1, 16_000);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 32_000);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 4);
    }

    #[test]
    fn header_parses_back() {
        let header = WavHeader::new(2, 24_000, 960);
        let parsed = WavHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.byte_rate(), 96_000);
    }

    #[test]
    fn from_bytes_rejects_non_wav() {
        let mut bytes = WavHeader::new(2, 16_000, 0).to_bytes();
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(
            WavHeader::from_bytes(&bytes),
            Err(FormatError::NotWav { .. })
        ));
    }

    #[test]
    fn write_wav_matches_wrap() {
        let samples = [1u8, 2, 3, 4, 5, 6];
        let mut out = Vec::new();
        write_wav(&mut out, &samples, 2, 16_000).unwrap();
        assert_eq!(out, wrap(&samples, 2, 16_000));
    }
}
