//! Sample format conversion.
//!
//! Symphonia decodes into planar buffers of whatever sample type the
//! codec produced (i16, i24, f32, ...). The framework's read contract
//! is interleaved `f32` in `[-1.0, 1.0]`, so every decoded buffer is
//! normalized here before it reaches the caller.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Convert a decoded buffer of any sample format to interleaved `f32`
/// samples in `[-1.0, 1.0]`.
pub(crate) fn to_interleaved_f32(buffer: &AudioBufferRef<'_>) -> Vec<f32> {
    match buffer {
        AudioBufferRef::U8(buf) => interleave(buf),
        AudioBufferRef::U16(buf) => interleave(buf),
        AudioBufferRef::U24(buf) => interleave(buf),
        AudioBufferRef::U32(buf) => interleave(buf),
        AudioBufferRef::S8(buf) => interleave(buf),
        AudioBufferRef::S16(buf) => interleave(buf),
        AudioBufferRef::S24(buf) => interleave(buf),
        AudioBufferRef::S32(buf) => interleave(buf),
        AudioBufferRef::F32(buf) => interleave(buf),
        AudioBufferRef::F64(buf) => interleave(buf),
    }
}

/// Interleave a planar buffer (LLLL...RRRR...) into LRLRLR... order,
/// converting each sample to `f32`.
fn interleave<T>(buf: &AudioBuffer<T>) -> Vec<f32>
where
    T: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut interleaved = Vec::with_capacity(frames * channels);

    for frame in 0..frames {
        for channel in 0..channels {
            interleaved.push(buf.chan(channel)[frame].into_sample());
        }
    }

    interleaved
}
