use silk_core::format::MAX_INPUT_FRAMES;
use silk_core::{DecoderSession, FrameDecoder};

/// In-process decoder for containers whose blocks already hold PCM.
///
/// Each payload is taken as little-endian 16-bit samples and copied through
/// unchanged. Useful for:
/// - Exercising the container and WAV paths without a native library.
/// - Re-wrapping streams produced by tools that store raw PCM in SILK framing.
pub struct PassThroughDecoder;

impl FrameDecoder for PassThroughDecoder {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn create(&self) -> anyhow::Result<Box<dyn DecoderSession>> {
        Ok(Box::new(PassThroughSession::default()))
    }
}

#[derive(Debug, Default)]
struct PassThroughSession {
    sample_rate: u32,
}

impl DecoderSession for PassThroughSession {
    fn set_sample_rate(&mut self, hz: u32) -> anyhow::Result<()> {
        if hz == 0 {
            anyhow::bail!("sample rate must be non-zero");
        }
        self.sample_rate = hz;
        Ok(())
    }

    fn set_frames_per_packet(&mut self, frames: u32) -> anyhow::Result<()> {
        if !(1..=MAX_INPUT_FRAMES).contains(&frames) {
            anyhow::bail!("frames per packet {frames} outside 1..={MAX_INPUT_FRAMES}");
        }
        Ok(())
    }

    fn decode(&mut self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<u16> {
        if self.sample_rate == 0 {
            anyhow::bail!("session used before sample rate was set");
        }
        if payload.len() % 2 != 0 {
            anyhow::bail!("payload of {} bytes is not whole 16-bit samples", payload.len());
        }
        if payload.len() > out.len() {
            anyhow::bail!(
                "payload of {} bytes exceeds the {}-byte frame buffer",
                payload.len(),
                out.len()
            );
        }
        out[..payload.len()].copy_from_slice(payload);
        Ok((payload.len() / 2) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silk_core::MAX_FRAME_BYTES;

    fn session() -> Box<dyn DecoderSession> {
        let mut s = PassThroughDecoder.create().unwrap();
        s.set_sample_rate(16_000).unwrap();
        s.set_frames_per_packet(1).unwrap();
        s
    }

    #[test]
    fn copies_samples_through() {
        let mut out = vec![0u8; MAX_FRAME_BYTES];
        let n = session().decode(&[1, 2, 3, 4], &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn rejects_odd_payload() {
        let mut out = vec![0u8; MAX_FRAME_BYTES];
        assert!(session().decode(&[1, 2, 3], &mut out).is_err());
    }

    #[test]
    fn rejects_payload_larger_than_frame() {
        let mut out = vec![0u8; 8];
        assert!(session().decode(&[0u8; 10], &mut out).is_err());
    }

    #[test]
    fn rejects_bad_configuration() {
        let mut s = PassThroughDecoder.create().unwrap();
        assert!(s.set_sample_rate(0).is_err());
        assert!(s.set_frames_per_packet(0).is_err());
        assert!(s.set_frames_per_packet(MAX_INPUT_FRAMES + 1).is_err());
        let mut out = vec![0u8; 4];
        assert!(s.decode(&[0, 0], &mut out).is_err(), "unconfigured session");
    }
}
