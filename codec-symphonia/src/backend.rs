//! Symphonia-backed decoder backend.
//!
//! Implements the framework's unguarded hooks over Symphonia's
//! probe → demux → decode pipeline: the byte source handle is adapted
//! into a `MediaSource`, the container is probed at open, and packets
//! are decoded on demand with bounded error recovery.

use crate::sample;
use core_decode::{AudioFormat, DecodeError, DecoderBackend, Result, SharedByteSource};
use std::io::{Read, Seek, SeekFrom};
use symphonia::core::codecs::{Decoder as CodecDecoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;
use tracing::{debug, warn};

/// Adapter feeding a shared byte source into Symphonia.
struct SourceAdapter {
    source: SharedByteSource,
}

impl Read for SourceAdapter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.source.read(buf)
    }
}

impl Seek for SourceAdapter {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.source.seek(pos)
    }
}

impl MediaSource for SourceAdapter {
    fn is_seekable(&self) -> bool {
        self.source.supports_seeking()
    }

    fn byte_len(&self) -> Option<u64> {
        self.source.len()
    }
}

/// Codec state that exists only while the backend is open.
struct OpenState {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn CodecDecoder>,
    track_id: u32,
    format: AudioFormat,
    total_frames: i64,
    source_description: String,
}

/// Decoder backend for every format Symphonia was built with.
pub struct SymphoniaBackend {
    source: SharedByteSource,
    state: Option<OpenState>,
    /// Decoded samples not yet handed to the caller.
    pending: Vec<f32>,
    position: i64,
    eof: bool,
}

impl SymphoniaBackend {
    /// Create a backend over the given source handle. Nothing is read
    /// until `open` is invoked.
    pub fn new(source: SharedByteSource) -> Self {
        Self {
            source,
            state: None,
            pending: Vec::new(),
            position: 0,
            eof: false,
        }
    }

    /// Read and decode packets until one yields samples for the
    /// selected track.
    ///
    /// Corrupted packets are skipped with a bounded retry budget so a
    /// few damaged frames do not abort an otherwise playable stream.
    /// Returns `Ok(None)` at end of stream.
    fn decode_next_packet(state: &mut OpenState, eof: &mut bool) -> Result<Option<Vec<f32>>> {
        let mut consecutive_errors = 0usize;
        const MAX_CONSECUTIVE_ERRORS: usize = 10;

        loop {
            let packet = match state.reader.next_packet() {
                Ok(packet) => {
                    consecutive_errors = 0;
                    packet
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("track list changed mid-stream, decoder reset required");
                    return Err(DecodeError::Decoding(
                        "track list changed, reset required".to_string(),
                    ));
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("reached end of stream");
                    *eof = true;
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        attempt = consecutive_errors,
                        error = %e,
                        "I/O error reading packet"
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(DecodeError::Source(format!(
                            "stream I/O failure after {} attempts: {}",
                            MAX_CONSECUTIVE_ERRORS, e
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::Decoding(format!(
                        "failed to read packet: {}",
                        e
                    )));
                }
            };

            // Consume any new metadata revisions read with this packet.
            while !state.reader.metadata().is_latest() {
                state.reader.metadata().pop();
            }

            if packet.track_id() != state.track_id {
                continue;
            }

            match state.decoder.decode(&packet) {
                Ok(decoded) => {
                    let decoded_channels = decoded.spec().channels.count() as u16;
                    if state.format.channels != decoded_channels {
                        debug!(
                            from = state.format.channels,
                            to = decoded_channels,
                            "updating channel count from decoded audio"
                        );
                        state.format.channels = decoded_channels;
                    }

                    return Ok(Some(sample::to_interleaved_f32(&decoded)));
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        attempt = consecutive_errors,
                        error = %e,
                        "skipping packet with I/O error"
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(DecodeError::CorruptedStream(format!(
                            "stream corruption after {} failed packets",
                            MAX_CONSECUTIVE_ERRORS
                        )));
                    }
                    continue;
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        attempt = consecutive_errors,
                        error = e,
                        "skipping undecodable packet"
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(DecodeError::Decoding(format!(
                            "decoder failure after {} failed packets",
                            MAX_CONSECUTIVE_ERRORS
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::Decoding(format!(
                        "failed to decode packet: {}",
                        e
                    )));
                }
            }
        }
    }
}

impl DecoderBackend for SymphoniaBackend {
    fn open(&mut self) -> Result<()> {
        // A previous candidate may have consumed part of the stream;
        // probing must start at the beginning.
        if self.source.supports_seeking() {
            self.source
                .clone()
                .seek(SeekFrom::Start(0))
                .map_err(|e| DecodeError::Source(format!("failed to rewind source: {}", e)))?;
        }

        let mut hint = Hint::new();
        if let Some(locator) = self.source.locator() {
            if let Some(extension) = locator.extension() {
                hint.with_extension(&extension);
            }
        }
        if let Some(mime) = self.source.declared_mime_type() {
            hint.mime_type(&mime);
        }

        let adapter = Box::new(SourceAdapter {
            source: self.source.clone(),
        });
        let mss = MediaSourceStream::new(adapter, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::OpenFailed(format!("failed to probe container: {}", e)))?;

        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::OpenFailed("no decodable audio track".to_string()))?;

        let track_id = track.id;
        let params = &track.codec_params;

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| DecodeError::OpenFailed("missing sample rate".to_string()))?;

        // Channels may be unknown until the first packet decodes
        // (AAC/M4A); assume stereo and correct after the first decode.
        let channels = params.channels.map(|ch| ch.count() as u16).unwrap_or(2);
        let bits_per_sample = params.bits_per_sample.map(|b| b as u16);
        let total_frames = params.n_frames.map(|n| n as i64).unwrap_or(-1);

        let codec_name = symphonia::default::get_codecs()
            .get_codec(params.codec)
            .map(|descriptor| descriptor.short_name)
            .unwrap_or("unknown");

        let format = AudioFormat::new(sample_rate, channels, bits_per_sample, None);
        let source_description = format!("{} [{}]", codec_name, format.description());

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| {
                DecodeError::OpenFailed(format!("failed to create codec decoder: {}", e))
            })?;

        debug!(
            codec = codec_name,
            sample_rate,
            channels,
            total_frames,
            "symphonia decoder opened"
        );

        self.pending.clear();
        self.position = 0;
        self.eof = false;
        self.state = Some(OpenState {
            reader,
            decoder,
            track_id,
            format,
            total_frames,
            source_description,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state = None;
        self.pending.clear();
        self.position = 0;
        self.eof = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [f32], frames: u32) -> u32 {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        let channels = state.format.channels as usize;
        if channels == 0 {
            return 0;
        }

        let want_samples = frames as usize * channels;
        let mut filled = 0usize;

        while filled < want_samples {
            if self.pending.is_empty() {
                if self.eof {
                    break;
                }
                match Self::decode_next_packet(state, &mut self.eof) {
                    Ok(Some(samples)) => self.pending = samples,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "decode failed mid-stream");
                        break;
                    }
                }
            }

            let take = (want_samples - filled).min(self.pending.len());
            buf[filled..filled + take].copy_from_slice(&self.pending[..take]);
            self.pending.drain(..take);
            filled += take;
        }

        let produced = (filled / channels) as u32;
        self.position += produced as i64;
        produced
    }

    fn total_frames(&self) -> i64 {
        match &self.state {
            Some(state) => state.total_frames,
            None => -1,
        }
    }

    fn current_frame(&self) -> i64 {
        self.position
    }

    fn supports_seeking(&self) -> bool {
        self.source.supports_seeking()
    }

    fn seek_to_frame(&mut self, frame: i64) -> i64 {
        let Some(state) = self.state.as_mut() else {
            return -1;
        };
        if frame < 0 {
            return -1;
        }

        let time = Time::from(frame as f64 / state.format.sample_rate as f64);
        match state.reader.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time,
                track_id: None,
            },
        ) {
            Ok(_) => state.decoder.reset(),
            Err(e) => {
                warn!(frame, error = %e, "seek failed");
                return -1;
            }
        }

        // The demuxer repositions to the nearest packet boundary at or
        // before the target; the logical position is the requested
        // frame.
        self.pending.clear();
        self.eof = false;
        self.position = frame;
        frame
    }

    fn format(&self) -> AudioFormat {
        match &self.state {
            Some(state) => state.format.clone(),
            None => AudioFormat::default(),
        }
    }

    fn source_format_description(&self) -> String {
        match &self.state {
            Some(state) => state.source_description.clone(),
            None => String::new(),
        }
    }
}
