/// A source of decoder sessions.
///
/// Each implementation is one backend (a linked native library, an
/// in-process implementation, a test stub). Callers only see this trait;
/// how the backend is loaded stays behind `create`.
pub trait FrameDecoder {
    /// Human-readable backend name for logs and CLI display.
    fn name(&self) -> &'static str;

    /// Open a fresh, unconfigured session.
    fn create(&self) -> anyhow::Result<Box<dyn DecoderSession>>;
}

/// One stateful decoder handle, valid for a single decode pass.
///
/// Sessions carry inter-frame state, so blocks must be fed in stream order
/// and a session must never be shared between two decode passes.
pub trait DecoderSession {
    /// Output sample rate in Hz.
    fn set_sample_rate(&mut self, hz: u32) -> anyhow::Result<()>;

    /// Number of frames packed into each block.
    fn set_frames_per_packet(&mut self, frames: u32) -> anyhow::Result<()>;

    /// Decode one compressed block into `out` as little-endian 16-bit samples.
    ///
    /// `out` holds [`MAX_FRAME_BYTES`](crate::format::MAX_FRAME_BYTES) bytes.
    /// Returns the number of samples written; the caller keeps exactly
    /// `samples * 2` bytes.
    fn decode(&mut self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<u16>;

    /// Release backend resources. Called once when the pass completes or fails.
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
