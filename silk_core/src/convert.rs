use std::io::{BufReader, Read};

use tracing::info;

use crate::decode::{DecodeConfig, DecodeOrchestrator};
use crate::decoder::FrameDecoder;
use crate::error::Result;
use crate::format::{DEFAULT_CHANNELS, DEFAULT_FRAMES_PER_PACKET, DEFAULT_SAMPLE_RATE};
use crate::wav;

/// Settings for a full SILK → WAV conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Rate the decoder is configured with, and the rate written to the header.
    pub sample_rate: u32,
    pub frames_per_packet: u32,
    /// Channel count written to the header. The container carries none.
    pub channels: u16,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frames_per_packet: DEFAULT_FRAMES_PER_PACKET,
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl ConvertConfig {
    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig {
            sample_rate: self.sample_rate,
            frames_per_packet: self.frames_per_packet,
        }
    }
}

/// Convert a SILK v3 stream into a complete WAV file in memory.
///
/// Decodes at 16 kHz with one frame per packet and labels the output as
/// 2-channel 16 kHz PCM. Nothing is returned unless every block decodes.
pub fn convert<R: Read>(input: R, decoder: &dyn FrameDecoder) -> Result<Vec<u8>> {
    convert_with(input, decoder, &ConvertConfig::default())
}

/// [`convert`] with explicit settings.
pub fn convert_with<R: Read>(
    input: R,
    decoder: &dyn FrameDecoder,
    config: &ConvertConfig,
) -> Result<Vec<u8>> {
    let pcm = DecodeOrchestrator::with_config(decoder, config.decode_config())
        .decode(BufReader::new(input))?;
    info!(
        decoder = decoder.name(),
        pcm_bytes = pcm.len(),
        channels = config.channels,
        sample_rate = config.sample_rate,
        "converted to wav"
    );
    Ok(wav::wrap(&pcm, config.channels, config.sample_rate))
}
