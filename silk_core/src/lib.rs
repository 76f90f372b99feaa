pub mod convert;
pub mod decode;
pub mod decoder;
pub mod error;
pub mod format;
pub mod reader;
pub mod wav;

pub use convert::{convert, convert_with, ConvertConfig};
pub use decode::{decode, DecodeConfig, DecodeOrchestrator};
pub use decoder::{DecoderSession, FrameDecoder};
pub use error::{DecodeStage, FormatError, Result, SilkError};
pub use format::{ContainerHeader, HEADER_LEN, MAGIC, MAX_FRAME_BYTES, STX};
pub use reader::{Block, ContainerReader};
pub use wav::{wrap, write_wav, WavHeader, WAV_HEADER_SIZE};
