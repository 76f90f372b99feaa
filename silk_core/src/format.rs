/// Magic bytes opening every SILK v3 stream.
pub const MAGIC: &[u8; 9] = b"#!SILK_V3";

/// Length of [`MAGIC`] in bytes.
pub const HEADER_LEN: usize = MAGIC.len();

/// Optional leading byte some producers (WeChat, QQ) write before [`MAGIC`].
/// It carries no information and is discarded.
pub const STX: u8 = 0x02;

/// Size of the signed little-endian length prefix in front of each block.
pub const BLOCK_LEN_SIZE: usize = 2;

/// Initial capacity of the reusable block buffer.
pub const INITIAL_BLOCK_CAPACITY: usize = 1024;

// ── Decoder limits ─────────────────────────────────────────────────────────

/// Frame duration in milliseconds.
pub const FRAME_LENGTH_MS: usize = 20;

/// Highest API sample rate the decoder can emit, in kHz.
pub const MAX_API_FS_KHZ: usize = 48;

/// Upper bound on packed frames per packet.
pub const MAX_INPUT_FRAMES: u32 = 5;

/// Worst-case 16-bit samples a single block can decode into.
///   (20 ms × 48 kHz) << 1 = 1920
pub const MAX_FRAME_SAMPLES: usize = (FRAME_LENGTH_MS * MAX_API_FS_KHZ) << 1;

/// Byte capacity of the per-block output buffer (two bytes per sample).
pub const MAX_FRAME_BYTES: usize = MAX_FRAME_SAMPLES * 2;

/// Output sample rate the decode loop configures.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Frames per packet the decode loop configures.
pub const DEFAULT_FRAMES_PER_PACKET: u32 = 1;

/// Channel count written into the WAV header by `convert`.
pub const DEFAULT_CHANNELS: u16 = 2;

/// What [`ContainerReader::validate`](crate::ContainerReader::validate) found
/// at the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Whether a leading [`STX`] byte was present and consumed.
    pub has_marker: bool,
}

impl ContainerHeader {
    /// Bytes the header occupied in the stream.
    pub fn byte_len(&self) -> usize {
        HEADER_LEN + usize::from(self.has_marker)
    }
}
