//! # Audio Format Descriptors
//!
//! Describes the decoded PCM output of a decoder. Decoders always
//! produce interleaved `f32` samples in `[-1.0, 1.0]`; these types
//! carry the rate, channel, and source-precision metadata alongside.

use serde::{Deserialize, Serialize};

/// Audio format metadata describing decoded PCM output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of audio channels (1 = mono, 2 = stereo, etc.)
    pub channels: u16,
    /// Bits per sample in the source format (e.g., 16, 24)
    pub bits_per_sample: Option<u16>,
    /// Average bitrate in kbps (for lossy codecs)
    pub bitrate: Option<u32>,
}

impl AudioFormat {
    /// Create a new audio format descriptor.
    pub fn new(
        sample_rate: u32,
        channels: u16,
        bits_per_sample: Option<u16>,
        bitrate: Option<u32>,
    ) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            bitrate,
        }
    }

    /// Human-readable description, e.g. `"44100 Hz, stereo, 16-bit"`.
    pub fn description(&self) -> String {
        let layout = ChannelLayout::from_channel_count(self.channels);
        match self.bits_per_sample {
            Some(bits) => format!(
                "{} Hz, {}, {}-bit",
                self.sample_rate,
                layout.description(),
                bits
            ),
            None => format!("{} Hz, {}", self.sample_rate, layout.description()),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 0,
            channels: 0,
            bits_per_sample: None,
            bitrate: None,
        }
    }
}

/// Channel layout of the decoded audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Two channels, left/right
    Stereo,
    /// Any other channel count
    Channels(u16),
}

impl ChannelLayout {
    /// Derive the layout from a plain channel count.
    pub fn from_channel_count(channels: u16) -> Self {
        match channels {
            1 => ChannelLayout::Mono,
            2 => ChannelLayout::Stereo,
            n => ChannelLayout::Channels(n),
        }
    }

    /// Number of channels in this layout.
    pub fn channel_count(&self) -> u16 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
            ChannelLayout::Channels(n) => *n,
        }
    }

    /// Human-readable description, e.g. `"stereo"` or `"6 channels"`.
    pub fn description(&self) -> String {
        match self {
            ChannelLayout::Mono => "mono".to_string(),
            ChannelLayout::Stereo => "stereo".to_string(),
            ChannelLayout::Channels(n) => format!("{} channels", n),
        }
    }
}
