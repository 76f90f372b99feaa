//! Bounds checks and sample conversion around a native decode call.

/// Sample capacity of an output byte buffer, as the native `i16` count.
pub(crate) fn frame_capacity(out_len: usize) -> anyhow::Result<i16> {
    i16::try_from(out_len / 2)
        .map_err(|_| anyhow::anyhow!("frame buffer of {out_len} bytes is too large"))
}

/// Copy the first `written` native-endian samples of `scratch` into `out` as
/// little-endian bytes. `written` comes from the library and is checked
/// against both buffers before anything is copied.
pub(crate) fn copy_samples(
    scratch: &[i16],
    written: i16,
    out: &mut [u8],
) -> anyhow::Result<u16> {
    let capacity = scratch.len().min(out.len() / 2);
    let samples = usize::try_from(written)
        .ok()
        .filter(|&n| n <= capacity)
        .ok_or_else(|| {
            anyhow::anyhow!("Decode reported {written} samples for a {capacity}-sample buffer")
        })?;
    for (dst, sample) in out.chunks_exact_mut(2).zip(&scratch[..samples]) {
        dst.copy_from_slice(&sample.to_le_bytes());
    }
    Ok(samples as u16)
}
