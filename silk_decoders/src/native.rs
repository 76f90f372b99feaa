//! Decoder backed by a native SILK library linked at build time.
//!
//! The library must export the C entry points below (the same ones the
//! widely shipped `silk.dll` / `libsilk.so` wrappers expose). Every call goes
//! through [`NativeSession`], which owns the handle and checks buffer sizes
//! before anything crosses the boundary.

use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

use silk_core::{DecoderSession, FrameDecoder};
use tracing::{debug, warn};

use crate::samples::{copy_samples, frame_capacity};

mod ffi {
    use std::os::raw::{c_int, c_void};

    #[allow(non_snake_case)]
    #[link(name = "silk")]
    extern "C" {
        pub fn CreateDecoder() -> *mut c_void;
        pub fn CloseDecoder(handle: *mut c_void) -> c_int;
        pub fn setSampleRate(handle: *mut c_void, sample_rate: c_int) -> c_int;
        pub fn setFramesPerPacket(handle: *mut c_void, frames: c_int) -> c_int;
        /// `out_len` holds the capacity of `output` in samples on entry and
        /// the number of samples written on return.
        pub fn Decode(
            handle: *mut c_void,
            input: *const u8,
            input_len: c_int,
            output: *mut i16,
            out_len: *mut i16,
        ) -> c_int;
    }
}

/// Frame decoder using the linked native SILK library.
pub struct NativeDecoder;

impl FrameDecoder for NativeDecoder {
    fn name(&self) -> &'static str {
        "native"
    }

    fn create(&self) -> anyhow::Result<Box<dyn DecoderSession>> {
        // SAFETY: CreateDecoder takes no arguments and returns an owned handle
        // or null.
        let raw = unsafe { ffi::CreateDecoder() };
        let handle = NonNull::new(raw)
            .ok_or_else(|| anyhow::anyhow!("CreateDecoder returned a null handle"))?;
        debug!("native decoder session created");
        Ok(Box::new(NativeSession {
            handle: Some(handle),
            scratch: Vec::new(),
        }))
    }
}

/// One native decoder handle. Closed by [`DecoderSession::close`] or on drop.
struct NativeSession {
    handle: Option<NonNull<c_void>>,
    /// Native-endian sample buffer the library writes into.
    scratch: Vec<i16>,
}

impl NativeSession {
    fn handle(&self) -> anyhow::Result<*mut c_void> {
        self.handle
            .map(NonNull::as_ptr)
            .ok_or_else(|| anyhow::anyhow!("native decoder session already closed"))
    }
}

fn check(status: c_int, call: &str) -> anyhow::Result<()> {
    if status != 0 {
        anyhow::bail!("{call} failed with status {status}");
    }
    Ok(())
}

impl DecoderSession for NativeSession {
    fn set_sample_rate(&mut self, hz: u32) -> anyhow::Result<()> {
        let hz = c_int::try_from(hz)?;
        let handle = self.handle()?;
        // SAFETY: handle is live until close/drop.
        check(unsafe { ffi::setSampleRate(handle, hz) }, "setSampleRate")
    }

    fn set_frames_per_packet(&mut self, frames: u32) -> anyhow::Result<()> {
        let frames = c_int::try_from(frames)?;
        let handle = self.handle()?;
        // SAFETY: handle is live until close/drop.
        check(
            unsafe { ffi::setFramesPerPacket(handle, frames) },
            "setFramesPerPacket",
        )
    }

    fn decode(&mut self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<u16> {
        let handle = self.handle()?;
        let input_len = c_int::try_from(payload.len())?;
        let capacity = frame_capacity(out.len())?;

        self.scratch.resize(capacity as usize, 0);
        let mut written = capacity;
        // SAFETY: input points at `input_len` readable bytes, scratch holds
        // `capacity` writable samples, and the library writes at most
        // `*out_len` samples.
        let status = unsafe {
            ffi::Decode(
                handle,
                payload.as_ptr(),
                input_len,
                self.scratch.as_mut_ptr(),
                &mut written,
            )
        };
        check(status, "Decode")?;
        copy_samples(&self.scratch, written, out)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if let Some(handle) = self.handle.take() {
            // SAFETY: handle came from CreateDecoder and is closed exactly once.
            check(unsafe { ffi::CloseDecoder(handle.as_ptr()) }, "CloseDecoder")?;
            debug!("native decoder session closed");
        }
        Ok(())
    }
}

impl Drop for NativeSession {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("{err}");
        }
    }
}
