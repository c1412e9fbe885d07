//! # Decoder Resolution & Lifecycle Core
//!
//! An extensible audio-decoding front end: given a locator or an
//! opened byte source, it selects, constructs, and drives one of
//! several pluggable decoder implementations, exposing a uniform
//! frame-oriented read/seek interface regardless of which codec
//! produced the data.
//!
//! ## Overview
//!
//! - [`DecoderRegistry`] holds [`DecoderPlugin`]s in priority order.
//! - [`DecoderResolver`] maps a [`ByteSource`] (plus an optional MIME
//!   type, which overrides the locator's extension) to a constructed
//!   [`Decoder`], falling through to the next candidate when an open
//!   fails.
//! - [`Decoder`] enforces the open/close state machine and the
//!   closed-decoder safety contract once, so codec backends implement
//!   only the unguarded [`DecoderBackend`] hooks.
//! - [`Decoder::into_looping_region`] and friends wrap any decoder to
//!   expose a bounded, optionally repeated sub-range of its frames as
//!   a new decoder, for loop playback and gapless sub-clip extraction.
//!
//! Everything is synchronous and runs on the caller's thread; drive
//! decoding from a dedicated audio-producer thread. A decoder instance
//! is not safe for concurrent use from multiple threads.
//!
//! ## Usage
//!
//! ```ignore
//! use core_decode::{DecoderRegistry, DecoderResolver};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(
//!     DecoderRegistry::new().with_plugin(Arc::new(codec_symphonia::SymphoniaPlugin::new())),
//! );
//! let resolver = DecoderResolver::new(registry);
//!
//! let mut decoder = resolver.resolve_path("/music/track.flac")?;
//! let mut buf = vec![0.0f32; 4096 * 2];
//! loop {
//!     let frames = decoder.read_audio(&mut buf, 4096);
//!     if frames == 0 {
//!         break;
//!     }
//!     // feed interleaved f32 samples downstream
//! }
//! decoder.close()?;
//! # Ok::<(), core_decode::DecodeError>(())
//! ```

pub mod decoder;
pub mod error;
pub mod format;
pub mod logging;
pub mod plugin;
mod region;
pub mod registry;
pub mod resolver;
pub mod source;

pub use decoder::{Decoder, DecoderBackend};
pub use error::{DecodeError, Result};
pub use format::{AudioFormat, ChannelLayout};
pub use plugin::DecoderPlugin;
pub use registry::DecoderRegistry;
pub use resolver::{DecoderResolver, ResolverConfig};
pub use source::{ByteSource, FileSource, MemorySource, SharedByteSource, SourceLocator};
