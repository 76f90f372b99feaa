#[cfg(feature = "native")]
mod native;
mod passthrough;
#[cfg_attr(not(feature = "native"), allow(dead_code))]
mod samples;

#[cfg(feature = "native")]
pub use native::NativeDecoder;
pub use passthrough::PassThroughDecoder;

use silk_core::FrameDecoder;

/// Backend names accepted by [`decoder_by_name`], for CLI help and errors.
pub const DECODER_NAMES: &[&str] = &["native", "passthrough"];

/// Resolve a frame decoder backend from its name or alias.
///
/// `native` only resolves when the crate is built with the `native` feature.
pub fn decoder_by_name(name: &str) -> anyhow::Result<Box<dyn FrameDecoder>> {
    match name {
        "passthrough" | "pcm" | "raw" => Ok(Box::new(PassThroughDecoder)),
        #[cfg(feature = "native")]
        "native" | "silk" => Ok(Box::new(NativeDecoder)),
        #[cfg(not(feature = "native"))]
        "native" | "silk" => anyhow::bail!(
            "decoder '{}' needs the `native` feature (rebuild with --features native)",
            name
        ),
        other => anyhow::bail!(
            "unknown decoder '{}'. Valid options: {}",
            other,
            DECODER_NAMES.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_passthrough_aliases() {
        for name in ["passthrough", "pcm", "raw"] {
            assert_eq!(decoder_by_name(name).unwrap().name(), "passthrough");
        }
    }

    #[test]
    fn unknown_name_lists_options() {
        let err = decoder_by_name("opus").err().unwrap().to_string();
        assert!(err.contains("unknown decoder 'opus'"), "got: {err}");
        assert!(err.contains("passthrough"), "got: {err}");
    }

    #[cfg(not(feature = "native"))]
    #[test]
    fn native_requires_feature() {
        let err = decoder_by_name("native").err().unwrap().to_string();
        assert!(err.contains("`native` feature"), "got: {err}");
    }
}
