//! # Decoder Lifecycle
//!
//! The guarded decoder state machine. A [`Decoder`] owns a codec
//! backend and its byte source and enforces the open/close contract in
//! one place, so backends only implement the unguarded hooks of
//! [`DecoderBackend`].
//!
//! ## State machine
//!
//! Closed (initial) → Open → Closed, reopenable. Calling a frame
//! operation on a closed decoder is safe misuse, not an error: it
//! returns a sentinel value (0 frames read, -1 positions, `false`,
//! `None`) without invoking any backend hook, and emits a `debug!`
//! event. `open` on an open decoder and `close` on a closed decoder
//! are no-op successes.

use crate::error::Result;
use crate::format::{AudioFormat, ChannelLayout};
use crate::region::RegionBackend;
use crate::source::{ByteSource, SharedByteSource};
use std::any::Any;
use tracing::{debug, error, warn};

/// The unguarded per-codec hooks.
///
/// Implementations may assume `open` has succeeded before any other
/// hook is invoked; the owning [`Decoder`] enforces that. `read` fills
/// the caller's buffer with interleaved `f32` samples and returns the
/// number of whole frames produced; `seek_to_frame` returns the frame
/// actually landed on (codecs may align to block boundaries), or -1 on
/// failure.
pub trait DecoderBackend: Send {
    /// Open the codec against the byte source.
    fn open(&mut self) -> Result<()>;

    /// Release codec state. The byte source is closed by the owner.
    fn close(&mut self) -> Result<()>;

    /// Decode up to `frames` frames into `buf`, returning frames produced.
    fn read(&mut self, buf: &mut [f32], frames: u32) -> u32;

    /// Total length of the stream in frames, or -1 if unknown.
    fn total_frames(&self) -> i64;

    /// Current position in frames.
    fn current_frame(&self) -> i64;

    /// Returns `true` if `seek_to_frame` is usable.
    fn supports_seeking(&self) -> bool;

    /// Seek to the given frame, returning the resulting frame or -1.
    fn seek_to_frame(&mut self, frame: i64) -> i64;

    /// Format of the decoded PCM output.
    fn format(&self) -> AudioFormat;

    /// Human-readable description of the encoded source format.
    fn source_format_description(&self) -> String;
}

/// A decoder bound to one byte source, with the lifecycle guards of
/// the framework applied uniformly over any [`DecoderBackend`].
pub struct Decoder {
    backend: Box<dyn DecoderBackend>,
    source: SharedByteSource,
    is_open: bool,
    represented_object: Option<Box<dyn Any + Send>>,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("is_open", &self.is_open)
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Bind a backend to its byte source. The decoder starts closed.
    pub fn new(backend: Box<dyn DecoderBackend>, source: SharedByteSource) -> Self {
        Self {
            backend,
            source,
            is_open: false,
            represented_object: None,
        }
    }

    /// Returns `true` if the decoder is open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Open the decoder.
    ///
    /// Ensures the byte source is open first (opening it if needed),
    /// then invokes the backend's open hook. A decoder that is already
    /// open stays open and returns success.
    pub fn open(&mut self) -> Result<()> {
        if self.is_open {
            debug!("open() called on a decoder that is already open");
            return Ok(());
        }

        if !self.source.is_open() {
            self.source.open()?;
        }

        self.backend.open()?;
        self.is_open = true;
        Ok(())
    }

    /// Close the decoder.
    ///
    /// The decoder ends up closed and the byte source is closed even
    /// if the backend's close hook fails; the first failure is
    /// reported. A decoder that is already closed returns success.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open {
            debug!("close() called on a decoder that is not open");
            return Ok(());
        }

        let hook_result = self.backend.close();
        self.is_open = false;

        let source_result = self.source.close();
        hook_result.and(source_result)
    }

    /// Decode up to `frame_count` frames of interleaved `f32` samples
    /// into `buf`, returning the number of frames produced.
    ///
    /// Returns 0 without invoking the backend when the decoder is not
    /// open or the arguments are invalid (empty buffer, zero frame
    /// count). The request is clamped to the number of whole frames
    /// `buf` can hold. A short (possibly zero) return while open
    /// signals end of stream.
    pub fn read_audio(&mut self, buf: &mut [f32], frame_count: u32) -> u32 {
        if !self.is_open {
            debug!("read_audio() called on a decoder that is not open");
            return 0;
        }

        if buf.is_empty() || frame_count == 0 {
            warn!("read_audio() called with invalid parameters");
            return 0;
        }

        let channels = self.backend.format().channels as usize;
        if channels == 0 {
            warn!("read_audio() called on a decoder reporting zero channels");
            return 0;
        }

        let capacity = u32::try_from(buf.len() / channels).unwrap_or(u32::MAX);
        let frames = frame_count.min(capacity);
        if frames == 0 {
            warn!("read_audio() buffer is too small for a single frame");
            return 0;
        }

        self.backend.read(&mut buf[..frames as usize * channels], frames)
    }

    /// Total length of the stream in frames, or -1 if the decoder is
    /// not open (or the backend does not know).
    pub fn total_frames(&self) -> i64 {
        if !self.is_open {
            debug!("total_frames() called on a decoder that is not open");
            return -1;
        }
        self.backend.total_frames()
    }

    /// Current position in frames, or -1 if the decoder is not open.
    pub fn current_frame(&self) -> i64 {
        if !self.is_open {
            debug!("current_frame() called on a decoder that is not open");
            return -1;
        }
        self.backend.current_frame()
    }

    /// Returns `true` if seeking is supported; `false` when not open.
    pub fn supports_seeking(&self) -> bool {
        if !self.is_open {
            debug!("supports_seeking() called on a decoder that is not open");
            return false;
        }
        self.backend.supports_seeking()
    }

    /// Seek to `frame`, returning the frame actually landed on, or -1
    /// if the decoder is not open or `frame` is outside
    /// `[0, total_frames())`.
    pub fn seek_to_frame(&mut self, frame: i64) -> i64 {
        if !self.is_open {
            debug!("seek_to_frame() called on a decoder that is not open");
            return -1;
        }

        if frame < 0 || frame >= self.backend.total_frames() {
            warn!(frame, "seek_to_frame() called with an out-of-range frame");
            return -1;
        }

        self.backend.seek_to_frame(frame)
    }

    /// Format of the decoded PCM output; `None` when not open.
    pub fn format(&self) -> Option<AudioFormat> {
        if !self.is_open {
            debug!("format() called on a decoder that is not open");
            return None;
        }
        Some(self.backend.format())
    }

    /// Description of the decoded PCM output; `None` when not open.
    pub fn format_description(&self) -> Option<String> {
        self.format().map(|format| format.description())
    }

    /// Description of the encoded source format; `None` when not open.
    pub fn source_format_description(&self) -> Option<String> {
        if !self.is_open {
            debug!("source_format_description() called on a decoder that is not open");
            return None;
        }
        Some(self.backend.source_format_description())
    }

    /// Description of the channel layout; `None` when not open.
    pub fn channel_layout_description(&self) -> Option<String> {
        self.format()
            .map(|format| ChannelLayout::from_channel_count(format.channels).description())
    }

    /// Attach an opaque caller tag to this decoder.
    pub fn set_represented_object(&mut self, object: Box<dyn Any + Send>) {
        self.represented_object = Some(object);
    }

    /// The caller tag attached to this decoder, if any.
    pub fn represented_object(&self) -> Option<&(dyn Any + Send)> {
        self.represented_object.as_deref()
    }

    /// Detach and return the caller tag, if any.
    pub fn take_represented_object(&mut self) -> Option<Box<dyn Any + Send>> {
        self.represented_object.take()
    }

    /// A clone of the shared handle to this decoder's byte source.
    pub(crate) fn shared_source(&self) -> SharedByteSource {
        self.source.clone()
    }

    /// Tear down this decoder and recover exclusive ownership of its
    /// byte source.
    ///
    /// This is the hand-back path used after a failed open: the source
    /// is left in whatever open state it was in, ready for another
    /// plugin to try. Returns `None` if the backend leaked a source
    /// handle, which is a backend bug.
    pub fn into_source(self) -> Option<Box<dyn ByteSource>> {
        let Decoder {
            backend, source, ..
        } = self;
        drop(backend);

        match source.try_unwrap() {
            Ok(inner) => Some(inner),
            Err(_) => {
                error!("byte source still shared after decoder teardown");
                None
            }
        }
    }

    /// Expose only the frames from `start_frame` to the end of this
    /// decoder's stream as a new decoder.
    pub fn into_region(self, start_frame: i64) -> Result<Decoder> {
        RegionBackend::wrap(self, start_frame, None, 0)
    }

    /// Expose only `frame_count` frames starting at `start_frame` as a
    /// new decoder.
    pub fn into_bounded_region(self, start_frame: i64, frame_count: u32) -> Result<Decoder> {
        RegionBackend::wrap(self, start_frame, Some(frame_count), 0)
    }

    /// Expose `frame_count` frames starting at `start_frame`, repeated
    /// `repeat_count` additional times (0 = play once), as a new
    /// decoder.
    pub fn into_looping_region(
        self,
        start_frame: i64,
        frame_count: u32,
        repeat_count: u32,
    ) -> Result<Decoder> {
        RegionBackend::wrap(self, start_frame, Some(frame_count), repeat_count)
    }
}
