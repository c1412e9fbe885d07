//! # Decoder Plugin Contract
//!
//! The capability contract every codec family implements. A plugin
//! declares the file extensions and MIME types it handles and
//! constructs decoder backends bound to a byte source; the registry
//! and resolver drive everything else through this trait.

use crate::decoder::DecoderBackend;
use crate::source::SharedByteSource;

/// A decoder implementation for one container/codec family.
///
/// Construction through [`create_decoder`](DecoderPlugin::create_decoder)
/// is infallible: a plugin claims a source based on its extension or
/// MIME type alone, and failures (unreadable stream, wrong codec behind
/// a shared extension) surface when the decoder is opened.
pub trait DecoderPlugin: Send + Sync {
    /// Short name used in log events, e.g. `"symphonia"`.
    fn name(&self) -> &'static str;

    /// File extensions this plugin handles, lowercase, without the dot.
    fn supported_extensions(&self) -> Vec<String>;

    /// MIME types this plugin handles.
    fn supported_mime_types(&self) -> Vec<String>;

    /// Returns `true` if this plugin handles the given extension.
    ///
    /// Matching is ASCII case-insensitive; an empty extension never
    /// matches.
    fn handles_extension(&self, extension: &str) -> bool {
        !extension.is_empty()
            && self
                .supported_extensions()
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    }

    /// Returns `true` if this plugin handles the given MIME type.
    ///
    /// Matching is ASCII case-insensitive; an empty MIME type never
    /// matches.
    fn handles_mime_type(&self, mime_type: &str) -> bool {
        !mime_type.is_empty()
            && self
                .supported_mime_types()
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(mime_type))
    }

    /// Construct a decoder backend bound to the given source.
    fn create_decoder(&self, source: SharedByteSource) -> Box<dyn DecoderBackend>;
}
