//! Plugin descriptor for the Symphonia backend.
//!
//! The claimed extensions and MIME types track the codec features the
//! crate was built with, so a registry filter list never advertises a
//! format the binary cannot actually decode.

use crate::backend::SymphoniaBackend;
use core_decode::{DecoderBackend, DecoderPlugin, SharedByteSource};

/// Decoder plugin backed by Symphonia.
///
/// One registration covers every container/codec family enabled via
/// the crate's `decoder-*` features.
#[derive(Debug, Default)]
pub struct SymphoniaPlugin;

impl SymphoniaPlugin {
    /// Create the plugin.
    pub fn new() -> Self {
        Self
    }
}

impl DecoderPlugin for SymphoniaPlugin {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<&str> = Vec::new();

        #[cfg(feature = "decoder-wav")]
        extensions.extend(["wav", "wave"]);
        #[cfg(feature = "decoder-flac")]
        extensions.push("flac");
        #[cfg(feature = "decoder-vorbis")]
        extensions.extend(["ogg", "oga"]);
        #[cfg(feature = "decoder-mp3")]
        extensions.extend(["mp3", "mpga"]);
        #[cfg(feature = "decoder-aac")]
        extensions.extend(["aac", "adts", "m4a", "mp4"]);

        extensions.into_iter().map(String::from).collect()
    }

    fn supported_mime_types(&self) -> Vec<String> {
        let mut mime_types: Vec<&str> = Vec::new();

        #[cfg(feature = "decoder-wav")]
        mime_types.extend(["audio/wav", "audio/x-wav", "audio/wave"]);
        #[cfg(feature = "decoder-flac")]
        mime_types.extend(["audio/flac", "audio/x-flac"]);
        #[cfg(feature = "decoder-vorbis")]
        mime_types.extend(["audio/ogg", "application/ogg"]);
        #[cfg(feature = "decoder-mp3")]
        mime_types.extend(["audio/mpeg", "audio/mp3"]);
        #[cfg(feature = "decoder-aac")]
        mime_types.extend(["audio/aac", "audio/mp4", "audio/x-m4a"]);

        mime_types.into_iter().map(String::from).collect()
    }

    fn create_decoder(&self, source: SharedByteSource) -> Box<dyn DecoderBackend> {
        Box::new(SymphoniaBackend::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "decoder-wav")]
    fn claims_wav() {
        let plugin = SymphoniaPlugin::new();
        assert!(plugin.handles_extension("wav"));
        assert!(plugin.handles_extension("WAV"));
        assert!(plugin.handles_mime_type("audio/wav"));
    }

    #[test]
    #[cfg(feature = "decoder-flac")]
    fn claims_flac() {
        let plugin = SymphoniaPlugin::new();
        assert!(plugin.handles_extension("flac"));
        assert!(plugin.handles_mime_type("audio/x-flac"));
    }

    #[test]
    fn never_claims_unrelated_formats() {
        let plugin = SymphoniaPlugin::new();
        assert!(!plugin.handles_extension("mid"));
        assert!(!plugin.handles_extension(""));
        assert!(!plugin.handles_mime_type("video/mp2t"));
        assert!(!plugin.handles_mime_type(""));
    }
}
