//! # Decoder Resolution
//!
//! Maps a byte source (plus an optional explicit MIME type) to a
//! constructed decoder, consulting the registry in registration order.
//!
//! An explicitly supplied MIME type takes precedence over the
//! locator's file extension: a server- or container-declared type is
//! more authoritative than a filename heuristic. Extensions remain the
//! fallback since many sources carry no reliable type metadata. Note
//! that some extensions are shared by multiple codec families (`.oga`
//! holds Vorbis, FLAC, or Speex); without opening the stream the first
//! registered matching plugin wins even if it is the wrong one, which
//! is why open failures fall through to the next candidate when
//! automatic opening is enabled.

use crate::decoder::Decoder;
use crate::error::{DecodeError, Result};
use crate::plugin::DecoderPlugin;
use crate::registry::DecoderRegistry;
use crate::source::{ByteSource, FileSource, SharedByteSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Open decoders (and their sources) during resolution.
    ///
    /// When enabled, a candidate whose open fails hands its source
    /// back and the scan continues with the next matching plugin. When
    /// disabled, the first matching plugin wins unopened and the
    /// caller drives `open` itself.
    ///
    /// Default: `true`.
    #[serde(default = "default_automatically_open")]
    pub automatically_open: bool,
}

fn default_automatically_open() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            automatically_open: default_automatically_open(),
        }
    }
}

impl ResolverConfig {
    /// Enable or disable automatic opening during resolution.
    pub fn with_automatic_open(mut self, enabled: bool) -> Self {
        self.automatically_open = enabled;
        self
    }
}

/// Outcome of scanning one candidate set (MIME pass or extension pass).
enum PassOutcome {
    /// A plugin claimed the source and (if requested) opened it.
    Resolved(Decoder),
    /// No candidate succeeded; the source is handed back for the next
    /// pass.
    Exhausted(Box<dyn ByteSource>),
}

/// Maps byte sources to decoders using a shared registry.
pub struct DecoderResolver {
    registry: Arc<DecoderRegistry>,
    config: ResolverConfig,
}

impl DecoderResolver {
    /// Create a resolver over the given registry with the default
    /// configuration.
    pub fn new(registry: Arc<DecoderRegistry>) -> Self {
        Self::with_config(registry, ResolverConfig::default())
    }

    /// Create a resolver with an explicit configuration.
    pub fn with_config(registry: Arc<DecoderRegistry>, config: ResolverConfig) -> Self {
        Self { registry, config }
    }

    /// The registry this resolver consults.
    pub fn registry(&self) -> &Arc<DecoderRegistry> {
        &self.registry
    }

    /// Resolve a decoder for `source`.
    ///
    /// `mime_type` overrides both the source's declared content type
    /// and its extension. When no explicit type is given, the source's
    /// own declared type (if any) is tried before falling back to the
    /// locator's extension.
    pub fn resolve(
        &self,
        mut source: Box<dyn ByteSource>,
        mime_type: Option<&str>,
    ) -> Result<Decoder> {
        if self.config.automatically_open && !source.is_open() {
            source.open()?;
        }

        let declared = mime_type
            .map(str::to_owned)
            .or_else(|| source.declared_mime_type());
        let mut last_error: Option<DecodeError> = None;

        // The MIME type takes precedence over the file extension.
        if let Some(mime) = declared.as_deref() {
            match self.scan_plugins(source, |p| p.handles_mime_type(mime), &mut last_error)? {
                PassOutcome::Resolved(decoder) => return Ok(decoder),
                PassOutcome::Exhausted(reclaimed) => {
                    debug!(mime, "no decoder succeeded for the MIME type, trying extensions");
                    source = reclaimed;
                }
            }
        }

        let locator = match source.locator() {
            Some(locator) => locator.clone(),
            None => {
                return Err(DecodeError::UnknownFileType {
                    locator: "<unlocated source>".to_string(),
                })
            }
        };

        let extension = match locator.extension() {
            Some(extension) => extension,
            None => {
                return Err(DecodeError::UnknownFileType {
                    locator: locator.to_string(),
                })
            }
        };

        match self.scan_plugins(source, |p| p.handles_extension(&extension), &mut last_error)? {
            PassOutcome::Resolved(decoder) => Ok(decoder),
            PassOutcome::Exhausted(_) => Err(last_error.unwrap_or_else(|| {
                DecodeError::UnsupportedFormat(format!(
                    "no registered decoder claims \"{}\"",
                    locator
                ))
            })),
        }
    }

    /// Resolve a decoder for a local file path.
    pub fn resolve_path(&self, path: impl Into<PathBuf>) -> Result<Decoder> {
        self.resolve(Box::new(FileSource::new(path)), None)
    }

    /// Resolve a decoder exposing only a sub-region of the stream.
    ///
    /// `frame_count` of `None` means "until end of stream";
    /// `repeat_count` of 0 plays the region exactly once. When
    /// automatic opening is enabled the returned region decoder is
    /// opened, so region bounds have already been validated.
    pub fn resolve_region(
        &self,
        source: Box<dyn ByteSource>,
        mime_type: Option<&str>,
        start_frame: i64,
        frame_count: Option<u32>,
        repeat_count: u32,
    ) -> Result<Decoder> {
        let decoder = self.resolve(source, mime_type)?;

        let mut region = match frame_count {
            Some(count) => decoder.into_looping_region(start_frame, count, repeat_count)?,
            None if repeat_count == 0 => decoder.into_region(start_frame)?,
            None => {
                return Err(DecodeError::InvalidRegion(
                    "a repeated region requires an explicit frame count or a known stream length"
                        .into(),
                ))
            }
        };

        if self.config.automatically_open {
            region.open()?;
        }
        Ok(region)
    }

    /// Scan registered plugins in order, constructing a decoder from
    /// the first one whose predicate matches.
    ///
    /// With automatic opening enabled, a candidate that fails to open
    /// hands the byte source back (it is never closed or dropped) and
    /// the scan continues; its error is kept for the caller.
    fn scan_plugins<F>(
        &self,
        mut source: Box<dyn ByteSource>,
        matches: F,
        last_error: &mut Option<DecodeError>,
    ) -> Result<PassOutcome>
    where
        F: Fn(&dyn DecoderPlugin) -> bool,
    {
        for plugin in self.registry.plugins() {
            if !matches(plugin.as_ref()) {
                continue;
            }

            let shared = SharedByteSource::new(source);
            let backend = plugin.create_decoder(shared.clone());
            let mut decoder = Decoder::new(backend, shared);

            if !self.config.automatically_open {
                return Ok(PassOutcome::Resolved(decoder));
            }

            match decoder.open() {
                Ok(()) => return Ok(PassOutcome::Resolved(decoder)),
                Err(err) => {
                    warn!(
                        plugin = plugin.name(),
                        error = %err,
                        "decoder failed to open, trying the next candidate"
                    );
                    match decoder.into_source() {
                        Some(reclaimed) => {
                            *last_error = Some(err);
                            source = reclaimed;
                        }
                        // The backend leaked its source handle; the
                        // scan cannot continue safely.
                        None => return Err(err),
                    }
                }
            }
        }

        Ok(PassOutcome::Exhausted(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderBackend;
    use crate::format::AudioFormat;
    use crate::source::{MemorySource, SourceLocator};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend whose open outcome is scripted by its plugin.
    struct ScriptedBackend {
        plugin_name: &'static str,
        fail_open: bool,
    }

    impl DecoderBackend for ScriptedBackend {
        fn open(&mut self) -> Result<()> {
            if self.fail_open {
                return Err(DecodeError::OpenFailed(format!(
                    "{} cannot parse this stream",
                    self.plugin_name
                )));
            }
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
        fn read(&mut self, _buf: &mut [f32], _frames: u32) -> u32 {
            0
        }
        fn total_frames(&self) -> i64 {
            0
        }
        fn current_frame(&self) -> i64 {
            0
        }
        fn supports_seeking(&self) -> bool {
            false
        }
        fn seek_to_frame(&mut self, _frame: i64) -> i64 {
            -1
        }
        fn format(&self) -> AudioFormat {
            AudioFormat::new(44100, 2, None, None)
        }
        fn source_format_description(&self) -> String {
            self.plugin_name.to_string()
        }
    }

    struct ScriptedPlugin {
        name: &'static str,
        extensions: Vec<String>,
        mime_types: Vec<String>,
        fail_open: bool,
        created: AtomicU32,
    }

    impl ScriptedPlugin {
        fn new(name: &'static str, extensions: &[&str], mime_types: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                name,
                extensions: extensions.iter().map(|s| s.to_string()).collect(),
                mime_types: mime_types.iter().map(|s| s.to_string()).collect(),
                fail_open: false,
                created: AtomicU32::new(0),
            })
        }

        fn failing(name: &'static str, extensions: &[&str], mime_types: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                name,
                extensions: extensions.iter().map(|s| s.to_string()).collect(),
                mime_types: mime_types.iter().map(|s| s.to_string()).collect(),
                fail_open: true,
                created: AtomicU32::new(0),
            })
        }

        fn created_count(&self) -> u32 {
            self.created.load(Ordering::SeqCst)
        }
    }

    impl DecoderPlugin for ScriptedPlugin {
        fn name(&self) -> &'static str {
            self.name
        }
        fn supported_extensions(&self) -> Vec<String> {
            self.extensions.clone()
        }
        fn supported_mime_types(&self) -> Vec<String> {
            self.mime_types.clone()
        }
        fn create_decoder(&self, _source: SharedByteSource) -> Box<dyn DecoderBackend> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(ScriptedBackend {
                plugin_name: self.name,
                fail_open: self.fail_open,
            })
        }
    }

    fn memory_source(extension: &str) -> Box<dyn ByteSource> {
        Box::new(MemorySource::new(vec![0u8; 64]).with_locator(SourceLocator::Remote {
            url: format!("https://media.example.com/track.{}", extension),
        }))
    }

    #[test]
    fn single_claiming_plugin_resolves() {
        let flac = ScriptedPlugin::new("flac", &["flac"], &["audio/flac"]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(flac.clone()));
        let resolver = DecoderResolver::new(registry);

        let decoder = resolver.resolve(memory_source("flac"), None).unwrap();
        assert!(decoder.is_open());
        assert_eq!(decoder.source_format_description().as_deref(), Some("flac"));
        assert_eq!(flac.created_count(), 1);
    }

    #[test]
    fn mime_type_takes_precedence_over_extension() {
        // Extension claims plugin A, the supplied MIME type claims B.
        let by_ext = ScriptedPlugin::new("by-ext", &["dat"], &[]);
        let by_mime = ScriptedPlugin::new("by-mime", &[], &["audio/special"]);
        let registry = Arc::new(
            DecoderRegistry::new()
                .with_plugin(by_ext.clone())
                .with_plugin(by_mime.clone()),
        );
        let resolver = DecoderResolver::new(registry);

        let decoder = resolver
            .resolve(memory_source("dat"), Some("audio/special"))
            .unwrap();
        assert_eq!(
            decoder.source_format_description().as_deref(),
            Some("by-mime")
        );
        assert_eq!(by_ext.created_count(), 0);

        // Without the MIME type, the extension decides.
        let decoder = resolver.resolve(memory_source("dat"), None).unwrap();
        assert_eq!(
            decoder.source_format_description().as_deref(),
            Some("by-ext")
        );
    }

    #[test]
    fn declared_source_mime_type_is_used_when_none_is_supplied() {
        let by_mime = ScriptedPlugin::new("by-mime", &[], &["audio/declared"]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(by_mime));
        let resolver = DecoderResolver::new(registry);

        let source = Box::new(
            MemorySource::new(vec![0u8; 16]).with_mime_type("audio/declared"),
        );
        let decoder = resolver.resolve(source, None).unwrap();
        assert_eq!(
            decoder.source_format_description().as_deref(),
            Some("by-mime")
        );
    }

    #[test]
    fn failed_open_falls_through_to_next_candidate_with_source_intact() {
        // Both plugins claim the extension; the first fails to open.
        let broken = ScriptedPlugin::failing("broken", &["oga"], &[]);
        let working = ScriptedPlugin::new("working", &["oga"], &[]);
        let registry = Arc::new(
            DecoderRegistry::new()
                .with_plugin(broken.clone())
                .with_plugin(working.clone()),
        );
        let resolver = DecoderResolver::new(registry);

        let decoder = resolver.resolve(memory_source("oga"), None).unwrap();
        assert!(decoder.is_open());
        assert_eq!(
            decoder.source_format_description().as_deref(),
            Some("working")
        );
        assert_eq!(broken.created_count(), 1);
        assert_eq!(working.created_count(), 1);
    }

    #[test]
    fn mime_failures_fall_through_to_extension_pass() {
        let broken_mime = ScriptedPlugin::failing("broken-mime", &[], &["audio/x"]);
        let by_ext = ScriptedPlugin::new("by-ext", &["bin"], &[]);
        let registry = Arc::new(
            DecoderRegistry::new()
                .with_plugin(broken_mime)
                .with_plugin(by_ext),
        );
        let resolver = DecoderResolver::new(registry);

        let decoder = resolver
            .resolve(memory_source("bin"), Some("audio/x"))
            .unwrap();
        assert_eq!(
            decoder.source_format_description().as_deref(),
            Some("by-ext")
        );
    }

    #[test]
    fn all_candidates_failing_propagates_the_last_open_error() {
        let broken = ScriptedPlugin::failing("broken", &["oga"], &[]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(broken));
        let resolver = DecoderResolver::new(registry);

        let err = resolver.resolve(memory_source("oga"), None).unwrap_err();
        assert!(err.is_open_failure());
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn unclaimed_extension_reports_unsupported_format() {
        let flac = ScriptedPlugin::new("flac", &["flac"], &["audio/flac"]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(flac));
        let resolver = DecoderResolver::new(registry);

        let err = resolver.resolve(memory_source("ape"), None).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_extension_reports_unknown_file_type() {
        let flac = ScriptedPlugin::new("flac", &["flac"], &["audio/flac"]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(flac));
        let resolver = DecoderResolver::new(registry);

        let source = Box::new(MemorySource::new(vec![0u8; 16]).with_locator(
            SourceLocator::Remote {
                url: "https://media.example.com/stream".to_string(),
            },
        ));
        let err = resolver.resolve(source, None).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownFileType { .. }));
    }

    #[test]
    fn missing_locator_reports_unknown_file_type() {
        let flac = ScriptedPlugin::new("flac", &["flac"], &["audio/flac"]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(flac));
        let resolver = DecoderResolver::new(registry);

        let err = resolver
            .resolve(Box::new(MemorySource::new(vec![0u8; 16])), None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownFileType { .. }));
    }

    #[test]
    fn disabled_auto_open_returns_the_first_match_unopened() {
        // With auto-open off the first claiming plugin wins outright,
        // even though its open would fail.
        let broken = ScriptedPlugin::failing("broken", &["oga"], &[]);
        let working = ScriptedPlugin::new("working", &["oga"], &[]);
        let registry = Arc::new(
            DecoderRegistry::new()
                .with_plugin(broken.clone())
                .with_plugin(working.clone()),
        );
        let resolver = DecoderResolver::with_config(
            registry,
            ResolverConfig::default().with_automatic_open(false),
        );

        let decoder = resolver.resolve(memory_source("oga"), None).unwrap();
        assert!(!decoder.is_open());
        assert_eq!(broken.created_count(), 1);
        assert_eq!(working.created_count(), 0);
    }

    #[test]
    fn resolve_region_validates_and_opens() {
        let flac = ScriptedPlugin::new("flac", &["flac"], &["audio/flac"]);
        let registry = Arc::new(DecoderRegistry::new().with_plugin(flac));
        let resolver = DecoderResolver::new(registry);

        // ScriptedBackend reports a zero-length stream, so any real
        // region fails validation at open.
        let err = resolver
            .resolve_region(memory_source("flac"), None, 10, Some(5), 0)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRegion(_)));
    }

    #[test]
    fn config_round_trips_defaults() {
        let config = ResolverConfig::default();
        assert!(config.automatically_open);
        let config = config.with_automatic_open(false);
        assert!(!config.automatically_open);
    }
}
