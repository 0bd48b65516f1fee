// wav-stream -- Streaming reader and writer for int16, int32 and float32 wave files.
// Copyright (c) 2016 Kevin Brothaler and the wav-stream project authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::TempDir;

use wav_stream::{HeaderErrorKind, ReadError, SampleFormat, WavFormat, WavReader, WavWriter,
                 WriteError};

macro_rules! assert_matches {
    ($expected:pat $(if $guard:expr)*, $value:expr) => {
        match $value {
            $expected $(if $guard)* => {},
            ref actual => {
                panic!("assertion failed: `(left matches right)` (left: `{}`, right: `{:?}`",
                    stringify!($expected), actual);
            },
        }
    };
}

fn ramp_i16(len: usize) -> Vec<i16> {
    (0..len).map(|n| (n as i32 * 37 - 16000) as i16).collect()
}

fn ramp_i32(len: usize) -> Vec<i32> {
    (0..len).map(|n| (n as i32).wrapping_mul(0x0101_0101)).collect()
}

fn ramp_f32(len: usize) -> Vec<f32> {
    (0..len).map(|n| ((n % 200) as f32 - 100.0) / 100.0).collect()
}

fn write_i16_file(path: &Path, num_channels: u16, samples: &[i16]) {
    let mut writer = WavWriter::create(path, num_channels, 44100, SampleFormat::I16).unwrap();
    assert_eq!(samples.len() / num_channels as usize, writer.write_i16(samples).unwrap());
    writer.close().unwrap();
}

// MARK: Round trips

#[test]
fn test_round_trip_i16() {
    let dir = TempDir::new().unwrap();
    for &channels in &[1u16, 2, 8, 256] {
        let path = dir.path().join(format!("i16_{}.wav", channels));
        let samples = ramp_i16(channels as usize * 300);
        write_i16_file(&path, channels, &samples);

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(channels, reader.num_channels());
        assert_eq!(SampleFormat::I16, reader.sample_format());
        assert_eq!(300, reader.num_samples());

        let mut read = vec![0i16; samples.len()];
        assert_eq!(300, reader.read_i16(&mut read).unwrap());
        assert_eq!(samples, read);
    }
}

#[test]
fn test_round_trip_i32() {
    let dir = TempDir::new().unwrap();
    for &channels in &[1u16, 2, 8, 256] {
        let path = dir.path().join(format!("i32_{}.wav", channels));
        let samples = ramp_i32(channels as usize * 300);
        let mut writer = WavWriter::create(&path, channels, 48000, SampleFormat::I32).unwrap();
        assert_eq!(300, writer.write_i32(&samples).unwrap());
        writer.close().unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(32, reader.bits_per_sample());
        assert_eq!(32, reader.valid_bits_per_sample());
        let mut read = vec![0i32; samples.len()];
        assert_eq!(300, reader.read_i32(&mut read).unwrap());
        assert_eq!(samples, read);
    }
}

#[test]
fn test_round_trip_f32() {
    let dir = TempDir::new().unwrap();
    for &channels in &[1u16, 2, 8, 256] {
        let path = dir.path().join(format!("f32_{}.wav", channels));
        let samples = ramp_f32(channels as usize * 300);
        let mut writer = WavWriter::create(&path, channels, 8000, SampleFormat::F32).unwrap();
        assert_eq!(300, writer.write_f32(&samples).unwrap());
        writer.close().unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(WavFormat::Float, reader.header().format);
        let mut read = vec![0.0f32; samples.len()];
        assert_eq!(300, reader.read_f32(&mut read).unwrap());
        assert_eq!(samples, read);
    }
}

#[test]
fn test_file_size_matches_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("size.wav");
    write_i16_file(&path, 2, &ramp_i16(2 * 1000));

    let len = fs::metadata(&path).unwrap().len();
    assert_eq!(44 + 2 * 2 * 1000, len);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(b"RIFF", &bytes[0..4]);
    assert_eq!(&((len - 8) as u32).to_le_bytes(), &bytes[4..8]);
    assert_eq!(&4000u32.to_le_bytes(), &bytes[40..44]);
}

#[test]
fn test_writes_across_calls_accumulate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calls.wav");
    let samples = ramp_f32(3 * 500);

    let mut writer = WavWriter::create(&path, 3, 22050, SampleFormat::F32).unwrap();
    for chunk in samples.chunks(3 * 7) {
        writer.write_f32(chunk).unwrap();
    }
    assert_eq!(500, writer.num_samples());
    writer.close().unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    let mut read = vec![0.0f32; samples.len()];
    let mut frames = 0;
    while frames < 500 {
        let got = reader.read_f32(&mut read[frames * 3..]).unwrap();
        assert!(got > 0);
        frames += got;
    }
    assert_eq!(samples, read);
}

// MARK: Reading

#[test]
fn test_read_past_end_is_clamped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clamp.wav");
    write_i16_file(&path, 2, &ramp_i16(2 * 250));

    let mut reader = WavReader::open(&path).unwrap();
    let mut buf = vec![0i16; 2 * 350];
    assert_eq!(250, reader.read_i16(&mut buf).unwrap());
    assert_eq!(0, reader.samples_remaining());
    assert_eq!(0, reader.read_i16(&mut buf).unwrap());
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    assert_matches!(Err(ReadError::CannotOpen(_)), WavReader::open(dir.path().join("nope.wav")));
}

#[test]
fn test_zero_data_size_uses_rest_of_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamed.wav");
    let samples = ramp_i16(64);
    write_i16_file(&path, 1, &samples);

    // Zero the data size the way a live encoder leaves it.
    let mut bytes = fs::read(&path).unwrap();
    bytes[40..44].copy_from_slice(&[0, 0, 0, 0]);
    fs::write(&path, &bytes).unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    assert_eq!(64, reader.num_samples());
    let mut read = vec![0i16; 64];
    assert_eq!(64, reader.read_i16(&mut read).unwrap());
    assert_eq!(samples, read);
}

#[test]
fn test_extensible_float_reads_like_plain_float() {
    let dir = TempDir::new().unwrap();
    let samples = ramp_f32(2 * 100);

    let plain = dir.path().join("plain.wav");
    let mut writer = WavWriter::create(&plain, 2, 96000, SampleFormat::F32).unwrap();
    writer.write_f32(&samples).unwrap();
    writer.close().unwrap();

    let mut bytes = Vec::new();
    let data_size = samples.len() as u32 * 4;
    bytes.extend_from_slice(b"RIFF");
    bytes.write_u32::<LittleEndian>(4 + 48 + 8 + data_size).unwrap();
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.write_u32::<LittleEndian>(40).unwrap();
    bytes.write_u16::<LittleEndian>(0xFFFE).unwrap();
    bytes.write_u16::<LittleEndian>(2).unwrap();
    bytes.write_u32::<LittleEndian>(96000).unwrap();
    bytes.write_u32::<LittleEndian>(96000 * 8).unwrap();
    bytes.write_u16::<LittleEndian>(8).unwrap();
    bytes.write_u16::<LittleEndian>(32).unwrap();
    bytes.write_u16::<LittleEndian>(22).unwrap();
    bytes.write_u16::<LittleEndian>(32).unwrap();
    bytes.write_u32::<LittleEndian>(0x3).unwrap();
    // KSDATAFORMAT_SUBTYPE_IEEE_FLOAT
    bytes.write_u32::<LittleEndian>(3).unwrap();
    bytes.extend_from_slice(&[0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B,
                              0x71]);
    bytes.extend_from_slice(b"data");
    bytes.write_u32::<LittleEndian>(data_size).unwrap();
    for &sample in &samples {
        bytes.write_f32::<LittleEndian>(sample).unwrap();
    }
    let extensible = dir.path().join("extensible.wav");
    fs::write(&extensible, &bytes).unwrap();

    let mut plain_reader = WavReader::open(&plain).unwrap();
    let mut ext_reader = WavReader::open(&extensible).unwrap();
    assert_eq!(plain_reader.sample_format(), ext_reader.sample_format());
    assert_eq!(plain_reader.num_channels(), ext_reader.num_channels());
    assert_eq!(plain_reader.sample_rate(), ext_reader.sample_rate());
    assert_eq!(plain_reader.num_samples(), ext_reader.num_samples());
    assert_eq!(68, ext_reader.header().data_offset);

    let mut from_plain = vec![0i16; samples.len()];
    let mut from_ext = vec![0i16; samples.len()];
    assert_eq!(100, plain_reader.read_i16(&mut from_plain).unwrap());
    assert_eq!(100, ext_reader.read_i16(&mut from_ext).unwrap());
    assert_eq!(from_plain, from_ext);
}

// MARK: Writing

#[test]
fn test_invalid_arguments_leave_no_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rejected.wav");

    assert_matches!(Err(WriteError::InvalidArgument(HeaderErrorKind::InvalidNumChannels(0))),
                    WavWriter::create(&path, 0, 44100, SampleFormat::I16));
    assert_matches!(Err(WriteError::InvalidArgument(HeaderErrorKind::InvalidNumChannels(257))),
                    WavWriter::create(&path, 257, 44100, SampleFormat::I16));
    assert_matches!(Err(WriteError::InvalidArgument(HeaderErrorKind::InvalidSampleRate(0))),
                    WavWriter::create(&path, 2, 0, SampleFormat::F32));
    assert_matches!(Err(WriteError::InvalidArgument(HeaderErrorKind::ByteRateTooLarge(_))),
                    WavWriter::create(&path, 256, 48000 * 256, SampleFormat::I32));
    assert!(!path.exists());
}

#[test]
fn test_create_in_missing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("out.wav");
    assert_matches!(Err(WriteError::CannotCreate(_)),
                    WavWriter::create(&path, 1, 44100, SampleFormat::I16));
}

#[test]
fn test_dropped_writer_is_readable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dropped.wav");
    {
        let mut writer = WavWriter::create(&path, 1, 16000, SampleFormat::I32).unwrap();
        writer.write_i32(&[1, 2, 3, 4]).unwrap();
    }

    let mut reader = WavReader::open(&path).unwrap();
    assert_eq!(4, reader.num_samples());
    let mut read = [0i32; 4];
    assert_eq!(4, reader.read_i32(&mut read).unwrap());
    assert_eq!([1, 2, 3, 4], read);
}

// MARK: Conversions end to end

#[test]
fn test_float_file_read_as_i16() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("half.wav");

    let mut writer = WavWriter::create(&path, 2, 16000, SampleFormat::F32).unwrap();
    assert_eq!(800, writer.write_f32(&vec![0.5f32; 1600]).unwrap());
    writer.close().unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    assert_eq!(SampleFormat::F32, reader.sample_format());
    assert_eq!(WavFormat::Float, reader.header().format);
    assert_eq!(2, reader.num_channels());
    assert_eq!(16000, reader.sample_rate());
    assert_eq!(800, reader.num_samples());

    let mut read = vec![0i16; 1600];
    assert_eq!(800, reader.read_i16(&mut read).unwrap());
    assert!(read.iter().all(|&s| s == 16383));
}

#[test]
fn test_i16_file_written_from_float() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("from_float.wav");

    let mut writer = WavWriter::create(&path, 1, 44100, SampleFormat::I16).unwrap();
    writer.write_f32(&[0.0, 1.0, -1.0, 2.0, -2.0]).unwrap();
    writer.close().unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    let mut read = [0i16; 5];
    assert_eq!(5, reader.read_i16(&mut read).unwrap());
    assert_eq!([0, 32767, -32767, 32767, -32768], read);
}

#[test]
fn test_i16_file_read_as_i32_and_f32() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("widen.wav");
    write_i16_file(&path, 1, &[0, 1, -1, 16384, -32768]);

    let mut reader = WavReader::open(&path).unwrap();
    let mut wide = [0i32; 2];
    assert_eq!(2, reader.read_i32(&mut wide).unwrap());
    assert_eq!([0, 1 << 24], wide);

    let mut float = [0.0f32; 3];
    assert_eq!(3, reader.read_f32(&mut float).unwrap());
    assert_eq!([-1.0 / 32768.0, 0.5, -1.0], float);
}
