use std::fmt;

use crate::format::{HEADER_LEN, MAGIC, STX};

/// The stream does not start like a SILK v3 container (or, for
/// [`WavHeader::from_bytes`](crate::WavHeader::from_bytes), like a WAV file).
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The stream ended before the full magic string was read.
    #[error("truncated header: read {read} of {} bytes", HEADER_LEN)]
    TruncatedHeader { read: usize },

    /// The magic string did not match `#!SILK_V3`.
    #[error(
        "invalid file header \"{}\", expected \"{}\"",
        .found.escape_ascii(),
        MAGIC.escape_ascii()
    )]
    BadMagic { found: Vec<u8> },

    /// The first byte was peeked as the marker but read back as something else.
    #[error("invalid first byte 0x{found:02x}, expected 0x{:02x}", STX)]
    UnexpectedMarker { found: u8 },

    /// `validate` was called on a reader that already consumed the header.
    #[error("container header already validated")]
    AlreadyValidated,

    /// A WAV header failed a tag check.
    #[error("not a PCM WAV header: {what}")]
    NotWav { what: &'static str },
}

/// The decode step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Create,
    SampleRate,
    FramesPerPacket,
    Frame { block: u64 },
    Close,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStage::Create => f.write_str("creating decoder session"),
            DecodeStage::SampleRate => f.write_str("setting sample rate"),
            DecodeStage::FramesPerPacket => f.write_str("setting frames per packet"),
            DecodeStage::Frame { block } => write!(f, "decoding block {block}"),
            DecodeStage::Close => f.write_str("closing decoder session"),
        }
    }
}

/// Errors produced while reading, decoding, or converting a SILK stream.
///
/// Every variant is fatal to the enclosing call; nothing is retried or skipped.
#[derive(Debug, thiserror::Error)]
pub enum SilkError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A block declared more payload bytes than the stream holds.
    #[error(
        "stream corrupted at block {block} (offset {offset}): \
         declared {declared} bytes, only {available} available"
    )]
    StreamCorruption {
        block: u64,
        offset: u64,
        declared: usize,
        available: usize,
    },

    /// The frame decoder failed; `source` is the backend's own error.
    #[error("decoder failed while {stage}")]
    Decode {
        stage: DecodeStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other read failure.
    #[error("I/O error at offset {offset}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl SilkError {
    pub(crate) fn decode(stage: DecodeStage, err: anyhow::Error) -> Self {
        SilkError::Decode {
            stage,
            source: err.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SilkError>;
