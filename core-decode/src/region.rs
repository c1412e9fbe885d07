//! # Region Decoding
//!
//! Wraps a decoder so that only a bounded sub-range of its frames is
//! visible, optionally repeated, without the wrapped codec knowing.
//! The wrapper is itself a [`DecoderBackend`], so the result of
//! [`Decoder::into_looping_region`] is an ordinary [`Decoder`] that
//! callers drive exactly like any other.
//!
//! ## Position convention
//!
//! `current_frame` is cumulative across loop passes: it increases
//! monotonically from 0 up to `frame_count * (repeat_count + 1)`,
//! which is also what `total_frames` reports. A region-relative seek
//! addresses a frame within one pass (`[0, frame_count)`) and resets
//! the repeat cycle.

use crate::decoder::{Decoder, DecoderBackend};
use crate::error::{DecodeError, Result};
use crate::format::AudioFormat;
use tracing::warn;

/// Backend exposing frames `[start, start + count)` of an inner
/// decoder, looped `repeat_count` additional times.
pub(crate) struct RegionBackend {
    inner: Decoder,
    start_frame: i64,
    requested_frames: Option<u32>,
    repeat_count: u32,
    /// Resolved at open; -1 while closed.
    frame_count: i64,
    frames_read_in_pass: i64,
    completed_passes: u32,
    total_frames_read: i64,
}

impl RegionBackend {
    /// Wrap `inner` into a new region decoder.
    ///
    /// `start_frame` is validated eagerly; the frame count is resolved
    /// and validated when the region decoder is opened, since the
    /// inner stream's length may be unknown until then.
    pub(crate) fn wrap(
        inner: Decoder,
        start_frame: i64,
        requested_frames: Option<u32>,
        repeat_count: u32,
    ) -> Result<Decoder> {
        if start_frame < 0 {
            return Err(DecodeError::InvalidRegion(format!(
                "start frame must be non-negative, got {}",
                start_frame
            )));
        }

        let source = inner.shared_source();
        let backend = RegionBackend {
            inner,
            start_frame,
            requested_frames,
            repeat_count,
            frame_count: -1,
            frames_read_in_pass: 0,
            completed_passes: 0,
            total_frames_read: 0,
        };
        Ok(Decoder::new(Box::new(backend), source))
    }

    /// Frames left in the current pass.
    fn remaining_in_pass(&self) -> i64 {
        (self.frame_count - self.frames_read_in_pass).max(0)
    }

    /// Rewind the inner decoder for another pass over the region.
    fn rewind_for_next_pass(&mut self) -> bool {
        if self.inner.seek_to_frame(self.start_frame) != self.start_frame {
            warn!(
                start_frame = self.start_frame,
                "failed to rewind for repeat pass"
            );
            return false;
        }
        self.completed_passes += 1;
        self.frames_read_in_pass = 0;
        true
    }
}

impl DecoderBackend for RegionBackend {
    fn open(&mut self) -> Result<()> {
        self.inner.open()?;

        if (self.start_frame > 0 || self.repeat_count > 0) && !self.inner.supports_seeking() {
            return Err(DecodeError::InvalidRegion(
                "the inner decoder does not support seeking".into(),
            ));
        }

        let inner_total = self.inner.total_frames();
        let frame_count = match self.requested_frames {
            Some(count) => {
                let end = self.start_frame + count as i64;
                if inner_total >= 0 && end > inner_total {
                    return Err(DecodeError::InvalidRegion(format!(
                        "region [{}, {}) extends past the end of the stream ({} frames)",
                        self.start_frame, end, inner_total
                    )));
                }
                count as i64
            }
            None => {
                if inner_total < 0 {
                    return Err(DecodeError::InvalidRegion(
                        "the stream length is unknown; an explicit frame count is required".into(),
                    ));
                }
                if self.start_frame >= inner_total {
                    return Err(DecodeError::InvalidRegion(format!(
                        "start frame {} is past the end of the stream ({} frames)",
                        self.start_frame, inner_total
                    )));
                }
                inner_total - self.start_frame
            }
        };

        if self.inner.current_frame() != self.start_frame
            && self.inner.seek_to_frame(self.start_frame) != self.start_frame
        {
            return Err(DecodeError::OpenFailed(format!(
                "failed to position the stream at frame {}",
                self.start_frame
            )));
        }

        self.frame_count = frame_count;
        self.frames_read_in_pass = 0;
        self.completed_passes = 0;
        self.total_frames_read = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.frame_count = -1;
        self.inner.close()
    }

    fn read(&mut self, buf: &mut [f32], frames: u32) -> u32 {
        let channels = match self.inner.format() {
            Some(format) if format.channels > 0 => format.channels as usize,
            _ => return 0,
        };

        let mut produced: u32 = 0;
        while produced < frames {
            if self.remaining_in_pass() == 0 {
                if self.completed_passes < self.repeat_count && self.rewind_for_next_pass() {
                    continue;
                }
                // End of region, or rewind failed.
                break;
            }

            let want = u32::try_from(self.remaining_in_pass())
                .unwrap_or(u32::MAX)
                .min(frames - produced);
            let offset = produced as usize * channels;
            let end = offset + want as usize * channels;

            let read = self.inner.read_audio(&mut buf[offset..end], want);
            if read == 0 {
                // The inner stream ran dry before the region boundary.
                break;
            }

            produced += read;
            self.frames_read_in_pass += read as i64;
            self.total_frames_read += read as i64;
        }

        produced
    }

    fn total_frames(&self) -> i64 {
        self.frame_count * (self.repeat_count as i64 + 1)
    }

    fn current_frame(&self) -> i64 {
        self.total_frames_read
    }

    fn supports_seeking(&self) -> bool {
        self.inner.supports_seeking()
    }

    fn seek_to_frame(&mut self, frame: i64) -> i64 {
        // The seekable range is one pass of the region; positions in
        // later repeat passes are not addressable.
        if frame < 0 || frame >= self.frame_count {
            warn!(frame, "region seek outside [0, frame_count)");
            return -1;
        }

        let result = self.inner.seek_to_frame(self.start_frame + frame);
        if result < 0 {
            return -1;
        }

        let relative = (result - self.start_frame).max(0);
        self.completed_passes = 0;
        self.frames_read_in_pass = relative;
        self.total_frames_read = relative;
        relative
    }

    fn format(&self) -> AudioFormat {
        self.inner.format().unwrap_or_default()
    }

    fn source_format_description(&self) -> String {
        self.inner.source_format_description().unwrap_or_default()
    }
}
