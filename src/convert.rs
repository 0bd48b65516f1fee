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

//! Conversion between the three sample representations.
//!
//! Integers map onto floats by the full-scale magnitude of their width:
//! `f = i / 2^(w-1)` on the way up and `i = trunc(f * (2^(w-1) - 1))` on
//! the way down. The two integer widths share a scale factor of `2^24`.
//! Nothing in here clamps: callers that need clipping (a gain stage, for
//! example) should clamp in the float domain first.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};

use super::SCRATCH_CAPACITY;

// MARK: Sample formats

/// The in-memory representation of a sample, as requested by a caller or
/// as stored natively in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 32-bit IEEE float, nominally in `[-1.0, 1.0]`.
    F32,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
}

impl SampleFormat {
    /// The container width of one sample, in bytes.
    pub fn bytes_per_sample(&self) -> u16 {
        match *self {
            SampleFormat::F32 => 4,
            SampleFormat::I16 => 2,
            SampleFormat::I32 => 4,
        }
    }

    /// The short name used on command lines: `f32`, `i16` or `i32`.
    pub fn name(&self) -> &'static str {
        match *self {
            SampleFormat::F32 => "f32",
            SampleFormat::I16 => "i16",
            SampleFormat::I32 => "i32",
        }
    }

    /// A longer, human readable name such as `float32`.
    pub fn description(&self) -> &'static str {
        match *self {
            SampleFormat::F32 => "float32",
            SampleFormat::I16 => "int16",
            SampleFormat::I32 => "int32",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returned when a sample format name is not one of `f32`, `i16` or `i32`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sample format {0:?}, expected one of i16, i32, f32")]
pub struct ParseSampleFormatError(String);

impl FromStr for SampleFormat {
    type Err = ParseSampleFormatError;

    fn from_str(s: &str) -> Result<SampleFormat, ParseSampleFormatError> {
        match s {
            "f32" => Ok(SampleFormat::F32),
            "i16" => Ok(SampleFormat::I16),
            "i32" => Ok(SampleFormat::I32),
            _ => Err(ParseSampleFormatError(s.to_owned())),
        }
    }
}

// MARK: Scalar transforms

const I16_FULL_SCALE: f32 = (1u32 << 15) as f32;
const I16_MAX_SCALE: f32 = ((1u32 << 15) - 1) as f32;
const I32_FULL_SCALE: f32 = (1u32 << 31) as f32;
// Rounds to 2^31 in single precision; +1.0 relies on the saturating cast.
const I32_MAX_SCALE: f32 = ((1u32 << 31) - 1) as f32;
const INT_WIDTH_SCALE: i32 = 1 << 24;

#[inline]
fn i16_to_f32_sample(x: i16) -> f32 {
    x as f32 / I16_FULL_SCALE
}

#[inline]
fn f32_to_i16_sample(x: f32) -> i16 {
    (x * I16_MAX_SCALE) as i16
}

#[inline]
fn i32_to_f32_sample(x: i32) -> f32 {
    x as f32 / I32_FULL_SCALE
}

#[inline]
fn f32_to_i32_sample(x: f32) -> i32 {
    (x * I32_MAX_SCALE) as i32
}

#[inline]
fn i16_to_i32_sample(x: i16) -> i32 {
    (x as i32).wrapping_mul(INT_WIDTH_SCALE)
}

#[inline]
fn i32_to_i16_sample(x: i32) -> i16 {
    (x / INT_WIDTH_SCALE) as i16
}

// MARK: Slice transforms

// Each transform converts `min(src.len(), dst.len())` samples.

/// Converts interleaved 16-bit samples to floats.
pub fn i16_to_f32(src: &[i16], dst: &mut [f32]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = i16_to_f32_sample(s);
    }
}

/// Converts interleaved floats to 16-bit samples.
pub fn f32_to_i16(src: &[f32], dst: &mut [i16]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = f32_to_i16_sample(s);
    }
}

/// Converts interleaved 32-bit samples to floats.
pub fn i32_to_f32(src: &[i32], dst: &mut [f32]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = i32_to_f32_sample(s);
    }
}

/// Converts interleaved floats to 32-bit samples.
pub fn f32_to_i32(src: &[f32], dst: &mut [i32]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = f32_to_i32_sample(s);
    }
}

/// Widens 16-bit samples to 32 bits by multiplying with `2^24`. Values
/// that do not fit wrap around.
pub fn i16_to_i32(src: &[i16], dst: &mut [i32]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = i16_to_i32_sample(s);
    }
}

/// Narrows 32-bit samples to 16 bits by dividing by `2^24`.
pub fn i32_to_i16(src: &[i32], dst: &mut [i16]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = i32_to_i16_sample(s);
    }
}

// MARK: Sample trait

/// A sample type that can be read from or written to a wave file.
///
/// Implemented for `i16`, `i32` and `f32`. The `from_*` and `into_*`
/// methods dispatch to the slice transforms above, so a reader or writer can
/// convert between any caller type and any native type without knowing
/// either statically.
pub trait Sample: Copy + Default + 'static {
    /// The format this type represents.
    const FORMAT: SampleFormat;

    /// Decodes little-endian bytes into `dst`. `src` must be exactly
    /// `dst.len()` samples long.
    fn read_le(src: &[u8], dst: &mut [Self]);

    /// Encodes `src` as little-endian bytes. `dst` must be exactly
    /// `src.len()` samples long.
    fn write_le(src: &[Self], dst: &mut [u8]);

    /// Converts 16-bit samples to this type.
    fn from_i16(src: &[i16], dst: &mut [Self]);
    /// Converts 32-bit samples to this type.
    fn from_i32(src: &[i32], dst: &mut [Self]);
    /// Converts float samples to this type.
    fn from_f32(src: &[f32], dst: &mut [Self]);

    /// Converts samples of this type to 16 bits.
    fn into_i16(src: &[Self], dst: &mut [i16]);
    /// Converts samples of this type to 32 bits.
    fn into_i32(src: &[Self], dst: &mut [i32]);
    /// Converts samples of this type to floats.
    fn into_f32(src: &[Self], dst: &mut [f32]);
}

fn copy_samples<S: Copy>(src: &[S], dst: &mut [S]) {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::I16;

    fn read_le(src: &[u8], dst: &mut [i16]) {
        LittleEndian::read_i16_into(src, dst);
    }

    fn write_le(src: &[i16], dst: &mut [u8]) {
        LittleEndian::write_i16_into(src, dst);
    }

    fn from_i16(src: &[i16], dst: &mut [i16]) {
        copy_samples(src, dst);
    }

    fn from_i32(src: &[i32], dst: &mut [i16]) {
        i32_to_i16(src, dst);
    }

    fn from_f32(src: &[f32], dst: &mut [i16]) {
        f32_to_i16(src, dst);
    }

    fn into_i16(src: &[i16], dst: &mut [i16]) {
        copy_samples(src, dst);
    }

    fn into_i32(src: &[i16], dst: &mut [i32]) {
        i16_to_i32(src, dst);
    }

    fn into_f32(src: &[i16], dst: &mut [f32]) {
        i16_to_f32(src, dst);
    }
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::I32;

    fn read_le(src: &[u8], dst: &mut [i32]) {
        LittleEndian::read_i32_into(src, dst);
    }

    fn write_le(src: &[i32], dst: &mut [u8]) {
        LittleEndian::write_i32_into(src, dst);
    }

    fn from_i16(src: &[i16], dst: &mut [i32]) {
        i16_to_i32(src, dst);
    }

    fn from_i32(src: &[i32], dst: &mut [i32]) {
        copy_samples(src, dst);
    }

    fn from_f32(src: &[f32], dst: &mut [i32]) {
        f32_to_i32(src, dst);
    }

    fn into_i16(src: &[i32], dst: &mut [i16]) {
        i32_to_i16(src, dst);
    }

    fn into_i32(src: &[i32], dst: &mut [i32]) {
        copy_samples(src, dst);
    }

    fn into_f32(src: &[i32], dst: &mut [f32]) {
        i32_to_f32(src, dst);
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32;

    fn read_le(src: &[u8], dst: &mut [f32]) {
        LittleEndian::read_f32_into(src, dst);
    }

    fn write_le(src: &[f32], dst: &mut [u8]) {
        LittleEndian::write_f32_into(src, dst);
    }

    fn from_i16(src: &[i16], dst: &mut [f32]) {
        i16_to_f32(src, dst);
    }

    fn from_i32(src: &[i32], dst: &mut [f32]) {
        i32_to_f32(src, dst);
    }

    fn from_f32(src: &[f32], dst: &mut [f32]) {
        copy_samples(src, dst);
    }

    fn into_i16(src: &[f32], dst: &mut [i16]) {
        f32_to_i16(src, dst);
    }

    fn into_i32(src: &[f32], dst: &mut [i32]) {
        f32_to_i32(src, dst);
    }

    fn into_f32(src: &[f32], dst: &mut [f32]) {
        copy_samples(src, dst);
    }
}

// MARK: Interleaving

/// The range of interleaved values covering `count` frames starting at
/// frame `start`, for a stream with `channels` channels.
pub(crate) fn frame_range(channels: usize, start: usize, count: usize) -> Range<usize> {
    start * channels..(start + count) * channels
}

// MARK: Scratch buffer

/// Native samples decoded from, or about to be encoded to, the file.
#[derive(Debug)]
enum NativeSamples {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

/// A fixed-size working buffer owned by a reader or writer.
///
/// Holds at most `SCRATCH_CAPACITY` bytes of file data plus the same data
/// decoded into the file's native sample type, so converting reads and
/// writes use the same memory however large the caller's request is.
#[derive(Debug)]
pub(crate) struct Scratch {
    bytes: Vec<u8>,
    native: NativeSamples,
}

impl Scratch {
    pub(crate) fn new(native: SampleFormat) -> Scratch {
        let len = SCRATCH_CAPACITY / native.bytes_per_sample() as usize;
        let native = match native {
            SampleFormat::I16 => NativeSamples::I16(vec![0; len]),
            SampleFormat::I32 => NativeSamples::I32(vec![0; len]),
            SampleFormat::F32 => NativeSamples::F32(vec![0.0; len]),
        };
        Scratch {
            bytes: vec![0; SCRATCH_CAPACITY],
            native: native,
        }
    }

    /// Whole frames of `frame_size` bytes that fit in one batch.
    pub(crate) fn frames_per_batch(&self, frame_size: usize) -> usize {
        self.bytes.len() / frame_size
    }

    /// The first `len` bytes of the buffer.
    pub(crate) fn bytes_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.bytes[..len]
    }

    /// Decodes the first `dst.len()` native samples held in the byte buffer
    /// straight into `dst`, converting along the way.
    pub(crate) fn decode_into<S: Sample>(&mut self, dst: &mut [S]) {
        let Scratch { ref bytes, ref mut native } = *self;
        let n = dst.len();
        match *native {
            NativeSamples::I16(ref mut buf) => {
                let buf = &mut buf[..n];
                i16::read_le(&bytes[..n * 2], buf);
                S::from_i16(buf, dst);
            }
            NativeSamples::I32(ref mut buf) => {
                let buf = &mut buf[..n];
                i32::read_le(&bytes[..n * 4], buf);
                S::from_i32(buf, dst);
            }
            NativeSamples::F32(ref mut buf) => {
                let buf = &mut buf[..n];
                f32::read_le(&bytes[..n * 4], buf);
                S::from_f32(buf, dst);
            }
        }
    }

    /// Decodes the byte buffer into `dst`, which has the file's own type.
    pub(crate) fn decode_native_into<S: Sample>(&self, dst: &mut [S]) {
        let len = dst.len() * S::FORMAT.bytes_per_sample() as usize;
        S::read_le(&self.bytes[..len], dst);
    }

    /// Converts `src` to the native type and encodes it into the byte
    /// buffer. Returns the encoded bytes.
    pub(crate) fn encode_from<S: Sample>(&mut self, src: &[S]) -> &[u8] {
        let Scratch { ref mut bytes, ref mut native } = *self;
        let n = src.len();
        let len = match *native {
            NativeSamples::I16(ref mut buf) => {
                let buf = &mut buf[..n];
                S::into_i16(src, buf);
                i16::write_le(buf, &mut bytes[..n * 2]);
                n * 2
            }
            NativeSamples::I32(ref mut buf) => {
                let buf = &mut buf[..n];
                S::into_i32(src, buf);
                i32::write_le(buf, &mut bytes[..n * 4]);
                n * 4
            }
            NativeSamples::F32(ref mut buf) => {
                let buf = &mut buf[..n];
                S::into_f32(src, buf);
                f32::write_le(buf, &mut bytes[..n * 4]);
                n * 4
            }
        };
        &bytes[..len]
    }

    /// Encodes `src` into the byte buffer without any conversion.
    pub(crate) fn encode_native<S: Sample>(&mut self, src: &[S]) -> &[u8] {
        let len = src.len() * S::FORMAT.bytes_per_sample() as usize;
        S::write_le(src, &mut self.bytes[..len]);
        &self.bytes[..len]
    }
}

// MARK: Tests

#[cfg(test)]
mod tests {
    use super::{f32_to_i16, f32_to_i32, i16_to_f32, i16_to_i32, i32_to_f32, i32_to_i16};
    use super::{frame_range, ParseSampleFormatError, SampleFormat, Scratch};
    use crate::SCRATCH_CAPACITY;

    #[test]
    fn test_sample_format_names() {
        assert_eq!("f32", SampleFormat::F32.name());
        assert_eq!("int16", SampleFormat::I16.description());
        assert_eq!("i32", SampleFormat::I32.to_string());
        assert_eq!(Ok(SampleFormat::I16), "i16".parse());
        assert_matches!(Err(ParseSampleFormatError(_)), "u8".parse::<SampleFormat>());
    }

    #[test]
    fn test_zero_round_trips_in_every_pairing() {
        let mut f = [1.0f32];
        let mut a = [1i16];
        let mut b = [1i32];

        i16_to_f32(&[0], &mut f);
        assert_eq!(0.0, f[0]);
        f32_to_i16(&[0.0], &mut a);
        assert_eq!(0, a[0]);
        i32_to_f32(&[0], &mut f);
        assert_eq!(0.0, f[0]);
        f32_to_i32(&[0.0], &mut b);
        assert_eq!(0, b[0]);
        i16_to_i32(&[0], &mut b);
        assert_eq!(0, b[0]);
        i32_to_i16(&[0], &mut a);
        assert_eq!(0, a[0]);
    }

    #[test]
    fn test_i16_full_scale_round_trip_within_one_step() {
        let src = [i16::min_value(), -16384, -1, 1, 16383, i16::max_value()];
        let mut floats = [0.0f32; 6];
        let mut back = [0i16; 6];
        i16_to_f32(&src, &mut floats);
        f32_to_i16(&floats, &mut back);

        assert_eq!(-1.0, floats[0]);
        for (&a, &b) in src.iter().zip(back.iter()) {
            assert!((a as i32 - b as i32).abs() <= 1, "{} came back as {}", a, b);
        }
    }

    #[test]
    fn test_i32_full_scale_round_trip_within_float_precision() {
        let src = [i32::min_value(), -(1 << 30), 1 << 24, 1 << 30, i32::max_value()];
        let mut floats = [0.0f32; 5];
        let mut back = [0i32; 5];
        i32_to_f32(&src, &mut floats);
        f32_to_i32(&floats, &mut back);

        assert_eq!(-1.0, floats[0]);
        assert_eq!(0.5, floats[3]);
        for (&a, &b) in src.iter().zip(back.iter()) {
            // One ulp of a full scale f32 is 2^8.
            assert!((a as i64 - b as i64).abs() <= 256, "{} came back as {}", a, b);
        }
    }

    #[test]
    fn test_float_to_int_truncates_toward_zero() {
        let mut out = [0i16; 4];
        f32_to_i16(&[0.5, -0.5, 1.0, -1.0], &mut out);
        assert_eq!([16383, -16383, 32767, -32767], out);
    }

    #[test]
    fn test_float_to_int_does_not_clamp_in_float_domain() {
        let mut out = [0i16; 2];
        f32_to_i16(&[2.0, -2.0], &mut out);
        // Out of range values land on the native saturation bounds.
        assert_eq!([i16::max_value(), i16::min_value()], out);
    }

    #[test]
    fn test_integer_widths_share_a_2_pow_24_scale() {
        let mut wide = [0i32; 3];
        i16_to_i32(&[1, -1, 127], &mut wide);
        assert_eq!([1 << 24, -(1 << 24), 127 << 24], wide);

        let mut narrow = [0i16; 3];
        i32_to_i16(&[(5 << 24) + 0xFF_FFFF, -(3 << 24), 0xFF_FFFF], &mut narrow);
        assert_eq!([5, -3, 0], narrow);
    }

    #[test]
    fn test_frame_range() {
        assert_eq!(0..0, frame_range(2, 0, 0));
        assert_eq!(6..10, frame_range(2, 3, 2));
        assert_eq!(256..512, frame_range(256, 1, 1));
    }

    #[test]
    fn test_scratch_frames_per_batch() {
        let scratch = Scratch::new(SampleFormat::I16);
        assert_eq!(SCRATCH_CAPACITY / 4, scratch.frames_per_batch(4));
        assert_eq!(1024, scratch.frames_per_batch(256));
    }

    #[test]
    fn test_scratch_converts_through_native_type() {
        let mut scratch = Scratch::new(SampleFormat::I16);
        let encoded = scratch.encode_from(&[0.5f32, -0.5]).to_vec();
        assert_eq!(vec![0xFF, 0x3F, 0x01, 0xC0], encoded);

        scratch.bytes_mut(4).copy_from_slice(&encoded);
        let mut floats = [0.0f32; 2];
        scratch.decode_into(&mut floats);
        assert_eq!([16383.0 / 32768.0, -16383.0 / 32768.0], floats);
    }
}
