use std::io::BufRead;

use tracing::{debug, warn};

use crate::decoder::{DecoderSession, FrameDecoder};
use crate::error::{DecodeStage, Result, SilkError};
use crate::format::{DEFAULT_FRAMES_PER_PACKET, DEFAULT_SAMPLE_RATE, MAX_FRAME_BYTES};
use crate::reader::ContainerReader;

/// Session settings applied before the first block is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    pub sample_rate: u32,
    pub frames_per_packet: u32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frames_per_packet: DEFAULT_FRAMES_PER_PACKET,
        }
    }
}

/// Drives one [`FrameDecoder`] session across every block of a container.
///
/// # Decode sequence
/// 1. Validate the container header.
/// 2. Create a session and configure sample rate and frames per packet.
/// 3. Decode blocks in stream order, appending each block's samples.
/// 4. Close the session and hand back the accumulated PCM bytes.
///
/// The first error of any kind aborts the pass; the session is still closed.
pub struct DecodeOrchestrator<'d> {
    decoder: &'d dyn FrameDecoder,
    config: DecodeConfig,
}

impl<'d> DecodeOrchestrator<'d> {
    pub fn new(decoder: &'d dyn FrameDecoder) -> Self {
        Self::with_config(decoder, DecodeConfig::default())
    }

    pub fn with_config(decoder: &'d dyn FrameDecoder, config: DecodeConfig) -> Self {
        Self { decoder, config }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode a whole container into little-endian 16-bit PCM bytes.
    pub fn decode<R: BufRead>(&self, input: R) -> Result<Vec<u8>> {
        let mut reader = ContainerReader::new(input);
        reader.validate()?;

        let mut session = self
            .decoder
            .create()
            .map_err(|err| SilkError::decode(DecodeStage::Create, err))?;

        let result = self.run(&mut reader, session.as_mut());
        let closed = session
            .close()
            .map_err(|err| SilkError::decode(DecodeStage::Close, err));

        match (result, closed) {
            (Ok(pcm), Ok(())) => Ok(pcm),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(decoder = self.decoder.name(), "{close_err} after failed decode");
                Err(err)
            }
        }
    }

    fn run<R: BufRead>(
        &self,
        reader: &mut ContainerReader<R>,
        session: &mut dyn DecoderSession,
    ) -> Result<Vec<u8>> {
        session
            .set_sample_rate(self.config.sample_rate)
            .map_err(|err| SilkError::decode(DecodeStage::SampleRate, err))?;
        session
            .set_frames_per_packet(self.config.frames_per_packet)
            .map_err(|err| SilkError::decode(DecodeStage::FramesPerPacket, err))?;

        let mut pcm = Vec::new();
        let mut frame = vec![0u8; MAX_FRAME_BYTES];

        while let Some(block) = reader.next_block()? {
            let stage = DecodeStage::Frame { block: block.index };
            let samples = session
                .decode(block.payload, &mut frame)
                .map_err(|err| SilkError::decode(stage, err))?;

            let len = usize::from(samples) * 2;
            if len > frame.len() {
                return Err(SilkError::decode(
                    stage,
                    anyhow::anyhow!(
                        "decoder reported {samples} samples, buffer holds {}",
                        frame.len() / 2
                    ),
                ));
            }
            pcm.extend_from_slice(&frame[..len]);
        }

        debug!(
            decoder = self.decoder.name(),
            blocks = reader.blocks_read(),
            samples = pcm.len() / 2,
            bytes = pcm.len(),
            "decode complete"
        );
        Ok(pcm)
    }
}

/// Decode `input` with `decoder` at the default 16 kHz, one frame per packet.
pub fn decode<R: BufRead>(input: R, decoder: &dyn FrameDecoder) -> Result<Vec<u8>> {
    DecodeOrchestrator::new(decoder).decode(input)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use super::*;
    use crate::format::{MAGIC, STX};

    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
    }

    /// Logs every call; each block decodes to `samples` samples whose bytes
    /// all equal the block length.
    struct StubDecoder {
        log: Rc<RefCell<Log>>,
        samples: u16,
        fail_on_block: Option<usize>,
        fail_close: bool,
    }

    impl StubDecoder {
        fn new(samples: u16) -> Self {
            Self {
                log: Rc::default(),
                samples,
                fail_on_block: None,
                fail_close: false,
            }
        }
    }

    struct StubSession {
        log: Rc<RefCell<Log>>,
        samples: u16,
        fail_on_block: Option<usize>,
        fail_close: bool,
        decoded: usize,
    }

    impl FrameDecoder for StubDecoder {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn create(&self) -> anyhow::Result<Box<dyn DecoderSession>> {
            self.log.borrow_mut().calls.push("create".into());
            Ok(Box::new(StubSession {
                log: self.log.clone(),
                samples: self.samples,
                fail_on_block: self.fail_on_block,
                fail_close: self.fail_close,
                decoded: 0,
            }))
        }
    }

    impl DecoderSession for StubSession {
        fn set_sample_rate(&mut self, hz: u32) -> anyhow::Result<()> {
            self.log.borrow_mut().calls.push(format!("rate {hz}"));
            Ok(())
        }

        fn set_frames_per_packet(&mut self, frames: u32) -> anyhow::Result<()> {
            self.log.borrow_mut().calls.push(format!("fpp {frames}"));
            Ok(())
        }

        fn decode(&mut self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<u16> {
            if self.fail_on_block == Some(self.decoded) {
                anyhow::bail!("bitstream error");
            }
            self.decoded += 1;
            self.log
                .borrow_mut()
                .calls
                .push(format!("decode {}", payload.len()));
            let fill = payload.len() as u8;
            for b in &mut out[..usize::from(self.samples) * 2] {
                *b = fill;
            }
            Ok(self.samples)
        }

        fn close(&mut self) -> anyhow::Result<()> {
            self.log.borrow_mut().calls.push("close".into());
            if self.fail_close {
                anyhow::bail!("close failed");
            }
            Ok(())
        }
    }

    fn container(blocks: &[&[u8]]) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        for block in blocks {
            out.extend_from_slice(&(block.len() as i16).to_le_bytes());
            out.extend_from_slice(block);
        }
        out.extend_from_slice(&(-1i16).to_le_bytes());
        out
    }

    #[test]
    fn configures_session_then_decodes_in_order() {
        let stub = StubDecoder::new(3);
        let pcm = decode(Cursor::new(container(&[b"a", b"bcd"])), &stub).unwrap();

        assert_eq!(pcm, [1, 1, 1, 1, 1, 1, 3, 3, 3, 3, 3, 3]);
        assert_eq!(
            stub.log.borrow().calls,
            ["create", "rate 16000", "fpp 1", "decode 1", "decode 3", "close"]
        );
    }

    #[test]
    fn custom_config_reaches_session() {
        let stub = StubDecoder::new(0);
        let config = DecodeConfig {
            sample_rate: 24_000,
            frames_per_packet: 2,
        };
        DecodeOrchestrator::with_config(&stub, config)
            .decode(Cursor::new(container(&[])))
            .unwrap();
        assert_eq!(
            stub.log.borrow().calls,
            ["create", "rate 24000", "fpp 2", "close"]
        );
    }

    #[test]
    fn empty_stream_yields_no_samples() {
        let stub = StubDecoder::new(10);
        let pcm = decode(Cursor::new(container(&[])), &stub).unwrap();
        assert!(pcm.is_empty());
    }

    #[test]
    fn bad_header_never_opens_a_session() {
        let stub = StubDecoder::new(10);
        let err = decode(Cursor::new(b"RIFF....WAVE".to_vec()), &stub).unwrap_err();
        assert!(matches!(err, SilkError::Format(_)));
        assert!(stub.log.borrow().calls.is_empty());
    }

    #[test]
    fn block_failure_aborts_and_closes() {
        let mut stub = StubDecoder::new(10);
        stub.fail_on_block = Some(1);
        let err = decode(Cursor::new(container(&[b"ok", b"bad", b"never"])), &stub).unwrap_err();

        match &err {
            SilkError::Decode { stage, source } => {
                assert_eq!(*stage, DecodeStage::Frame { block: 1 });
                assert_eq!(source.to_string(), "bitstream error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stub.log.borrow().calls.last().unwrap(), "close");
        assert!(!stub.log.borrow().calls.contains(&"decode 5".to_string()));
    }

    #[test]
    fn truncated_block_closes_session() {
        let stub = StubDecoder::new(1);
        let mut bytes = vec![STX];
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&10i16.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);

        let err = decode(Cursor::new(bytes), &stub).unwrap_err();
        assert!(matches!(err, SilkError::StreamCorruption { .. }));
        assert_eq!(stub.log.borrow().calls.last().unwrap(), "close");
    }

    #[test]
    fn close_failure_after_success_is_reported() {
        let mut stub = StubDecoder::new(1);
        stub.fail_close = true;
        let err = decode(Cursor::new(container(&[b"x"])), &stub).unwrap_err();
        assert!(matches!(
            err,
            SilkError::Decode {
                stage: DecodeStage::Close,
                ..
            }
        ));
    }

    #[test]
    fn close_failure_does_not_mask_decode_failure() {
        let mut stub = StubDecoder::new(1);
        stub.fail_close = true;
        stub.fail_on_block = Some(0);
        let err = decode(Cursor::new(container(&[b"x"])), &stub).unwrap_err();
        assert!(matches!(
            err,
            SilkError::Decode {
                stage: DecodeStage::Frame { block: 0 },
                ..
            }
        ));
    }

    #[test]
    fn oversized_sample_count_is_rejected() {
        struct Liar;
        struct LiarSession;
        impl FrameDecoder for Liar {
            fn name(&self) -> &'static str {
                "liar"
            }
            fn create(&self) -> anyhow::Result<Box<dyn DecoderSession>> {
                Ok(Box::new(LiarSession))
            }
        }
        impl DecoderSession for LiarSession {
            fn set_sample_rate(&mut self, _hz: u32) -> anyhow::Result<()> {
                Ok(())
            }
            fn set_frames_per_packet(&mut self, _frames: u32) -> anyhow::Result<()> {
                Ok(())
            }
            fn decode(&mut self, _payload: &[u8], _out: &mut [u8]) -> anyhow::Result<u16> {
                Ok(u16::MAX)
            }
        }

        let err = decode(Cursor::new(container(&[b"x"])), &Liar).unwrap_err();
        assert!(matches!(
            err,
            SilkError::Decode {
                stage: DecodeStage::Frame { block: 0 },
                ..
            }
        ));
    }
}
