//! # Decoder Registry
//!
//! An ordered list of registered decoder plugins. Registration order
//! is priority order: the first registered plugin that claims an
//! extension or MIME type wins ties. The registry is populated by an
//! explicit initialization step and treated as read-only afterwards;
//! share it across resolvers with an `Arc`.

use crate::plugin::DecoderPlugin;
use std::sync::Arc;
use tracing::debug;

/// Ordered collection of decoder plugins.
#[derive(Default)]
pub struct DecoderRegistry {
    plugins: Vec<Arc<dyn DecoderPlugin>>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. No deduplication is performed; registering the
    /// same plugin twice simply makes it a candidate twice.
    pub fn register(&mut self, plugin: Arc<dyn DecoderPlugin>) {
        debug!(plugin = plugin.name(), "registering decoder plugin");
        self.plugins.push(plugin);
    }

    /// Builder-style registration.
    pub fn with_plugin(mut self, plugin: Arc<dyn DecoderPlugin>) -> Self {
        self.register(plugin);
        self
    }

    /// Registered plugins, in registration order.
    pub fn plugins(&self) -> &[Arc<dyn DecoderPlugin>] {
        &self.plugins
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Every registered plugin's extensions, concatenated in
    /// registration order. Duplicates are preserved; this list is for
    /// building caller-facing file filters, not for matching.
    pub fn supported_extensions(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.supported_extensions())
            .collect()
    }

    /// Every registered plugin's MIME types, concatenated in
    /// registration order, duplicates preserved.
    pub fn supported_mime_types(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.supported_mime_types())
            .collect()
    }

    /// Returns `true` if any registered plugin handles the extension.
    /// False for an empty extension.
    pub fn handles_extension(&self, extension: &str) -> bool {
        !extension.is_empty()
            && self
                .plugins
                .iter()
                .any(|plugin| plugin.handles_extension(extension))
    }

    /// Returns `true` if any registered plugin handles the MIME type.
    /// False for an empty MIME type.
    pub fn handles_mime_type(&self, mime_type: &str) -> bool {
        !mime_type.is_empty()
            && self
                .plugins
                .iter()
                .any(|plugin| plugin.handles_mime_type(mime_type))
    }
}
