//! End-to-end decode tests over real WAV data, generated with hound.

#![cfg(feature = "decoder-wav")]

use codec_symphonia::SymphoniaPlugin;
use core_decode::{Decoder, DecoderRegistry, DecoderResolver, MemorySource};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

const SAMPLE_RATE: u32 = 44100;

fn wav_spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Write a stereo ramp (frame `n` carries samples `(n % 8192,
/// -(n % 8192))`) to a WAV file on disk.
fn write_wav_file(path: &Path, frames: u32) {
    let mut writer = hound::WavWriter::create(path, wav_spec()).unwrap();
    for n in 0..frames {
        let value = (n % 8192) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(-value).unwrap();
    }
    writer.finalize().unwrap();
}

/// The same ramp, rendered into an in-memory WAV.
fn wav_bytes(frames: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec()).unwrap();
        for n in 0..frames {
            let value = (n % 8192) as i16;
            writer.write_sample(value).unwrap();
            writer.write_sample(-value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn resolver() -> DecoderResolver {
    let registry =
        Arc::new(DecoderRegistry::new().with_plugin(Arc::new(SymphoniaPlugin::new())));
    DecoderResolver::new(registry)
}

fn count_remaining_frames(decoder: &mut Decoder) -> u32 {
    let mut buf = vec![0.0f32; 1024 * 2];
    let mut total = 0u32;
    loop {
        let read = decoder.read_audio(&mut buf, 1024);
        if read == 0 {
            break;
        }
        total += read;
    }
    total
}

#[test]
fn resolve_and_decode_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    write_wav_file(&path, 4410);

    let mut decoder = resolver().resolve_path(&path).unwrap();
    assert!(decoder.is_open());

    let format = decoder.format().unwrap();
    assert_eq!(format.sample_rate, SAMPLE_RATE);
    assert_eq!(format.channels, 2);
    assert_eq!(decoder.total_frames(), 4410);
    assert!(decoder.supports_seeking());

    // First frames reproduce the ramp exactly (i16 → f32 is n/32768).
    let mut buf = vec![0.0f32; 8];
    assert_eq!(decoder.read_audio(&mut buf, 4), 4);
    for n in 0..4 {
        assert_eq!((buf[n * 2] * 32768.0).round() as i64, n as i64);
        assert_eq!((buf[n * 2 + 1] * 32768.0).round() as i64, -(n as i64));
    }

    assert_eq!(count_remaining_frames(&mut decoder), 4410 - 4);
    decoder.close().unwrap();
}

#[test]
fn wav_seek_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seek.wav");
    // Two seconds of audio; the seek target of one second maps to an
    // exact timestamp.
    write_wav_file(&path, 2 * SAMPLE_RATE);

    let mut decoder = resolver().resolve_path(&path).unwrap();

    let target = SAMPLE_RATE as i64;
    assert_eq!(decoder.seek_to_frame(target), target);
    assert_eq!(decoder.current_frame(), target);
    assert_eq!(count_remaining_frames(&mut decoder), SAMPLE_RATE);

    // Out-of-range seeks are rejected by the lifecycle layer.
    assert_eq!(decoder.seek_to_frame(2 * SAMPLE_RATE as i64), -1);
    assert_eq!(decoder.seek_to_frame(-1), -1);
}

#[test]
fn looping_region_over_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("region.wav");
    write_wav_file(&path, 4410);

    let resolver = resolver();
    let decoder = resolver.resolve_path(&path).unwrap();
    let mut region = decoder.into_looping_region(100, 50, 2).unwrap();
    region.open().unwrap();

    assert_eq!(region.total_frames(), 150);
    assert_eq!(count_remaining_frames(&mut region), 150);
    region.close().unwrap();
}

#[test]
fn resolve_from_memory_by_declared_mime_type() {
    let source =
        Box::new(MemorySource::new(wav_bytes(2205)).with_mime_type("audio/wav"));

    let mut decoder = resolver().resolve(source, None).unwrap();
    assert!(decoder.is_open());
    assert_eq!(decoder.total_frames(), 2205);
    assert_eq!(count_remaining_frames(&mut decoder), 2205);
}

#[test]
fn explicit_mime_type_overrides_a_wrong_extension() {
    // A WAV payload behind a ".dat" name: extension resolution would
    // fail, but the explicit MIME type selects the decoder anyway.
    let source = Box::new(
        MemorySource::new(wav_bytes(441)).with_locator(core_decode::SourceLocator::Remote {
            url: "https://media.example.com/payload.dat".to_string(),
        }),
    );

    let decoder = resolver().resolve(source, Some("audio/wav")).unwrap();
    assert!(decoder.is_open());
    assert_eq!(decoder.total_frames(), 441);
}

#[test]
fn garbage_payload_with_wav_extension_fails_to_open() {
    let source = Box::new(
        MemorySource::new(vec![0xDEu8; 256]).with_locator(core_decode::SourceLocator::Remote {
            url: "https://media.example.com/fake.wav".to_string(),
        }),
    );

    let err = resolver().resolve(source, None).unwrap_err();
    assert!(err.is_open_failure());
}
