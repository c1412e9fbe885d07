//! # Symphonia Decoder Plugin
//!
//! A [`core_decode`] plugin decoding every format Symphonia was built
//! with, behind per-codec feature gates:
//!
//! | Format | Feature flag | License notes |
//! |--------|--------------|---------------|
//! | WAV/PCM | `decoder-wav` | Public domain |
//! | FLAC | `decoder-flac` | BSD-3 |
//! | Vorbis | `decoder-vorbis` | BSD-3 |
//! | MP3 | `decoder-mp3` | Patents expired |
//! | AAC/M4A | `decoder-aac` | Patent-encumbered |
//!
//! ## Usage
//!
//! ```ignore
//! use codec_symphonia::SymphoniaPlugin;
//! use core_decode::{DecoderRegistry, DecoderResolver};
//! use std::sync::Arc;
//!
//! let registry =
//!     Arc::new(DecoderRegistry::new().with_plugin(Arc::new(SymphoniaPlugin::new())));
//! let resolver = DecoderResolver::new(registry);
//! let decoder = resolver.resolve_path("/music/track.flac")?;
//! # Ok::<(), core_decode::DecodeError>(())
//! ```

mod backend;
mod plugin;
mod sample;

pub use backend::SymphoniaBackend;
pub use plugin::SymphoniaPlugin;
