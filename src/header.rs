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

use super::convert::SampleFormat;
use super::{MAX_DATA_BYTES, MAX_DATA_SIZE, MAX_NUM_CHANNELS, MAX_SAMPLE_RATE};

// MARK: Format codes

pub(crate) const FORMAT_PCM: u16 = 0x0001;
pub(crate) const FORMAT_FLOAT: u16 = 0x0003;
pub(crate) const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

// The three fmt chunk layouts we understand.
pub(crate) const FMT_CHUNK_SIZE_BASIC: u32 = 16;
pub(crate) const FMT_CHUNK_SIZE_WITH_CB: u32 = 18;
pub(crate) const FMT_CHUNK_SIZE_EXTENSIBLE: u32 = 40;

/// The encoding of the samples in the data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Signed integer PCM.
    Pcm,
    /// IEEE floating point.
    Float,
}

impl WavFormat {
    /// Maps a format code to a format. The extensible marker is not a format
    /// by itself and maps to `None`.
    pub fn from_code(code: u32) -> Option<WavFormat> {
        match code {
            c if c == FORMAT_PCM as u32 => Some(WavFormat::Pcm),
            c if c == FORMAT_FLOAT as u32 => Some(WavFormat::Float),
            _ => None,
        }
    }

    /// The format code written to the fmt chunk.
    pub fn code(&self) -> u16 {
        match *self {
            WavFormat::Pcm => FORMAT_PCM,
            WavFormat::Float => FORMAT_FLOAT,
        }
    }
}

// MARK: Validation errors

/// Describes why a header fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderErrorKind {
    /// Between 1 and 256 channels are supported.
    #[error("number of channels {0} is not between 1 and 256")]
    InvalidNumChannels(u16),
    /// The sample rate must be between 1 and 48000 * 256.
    #[error("sample rate {0} is not between 1 and 12288000")]
    InvalidSampleRate(u32),
    /// Only 2 and 4 byte containers are supported.
    #[error("unsupported container of {0} bytes per sample")]
    UnsupportedBytesPerSample(u16),
    /// The valid bits don't fit the container.
    #[error("{valid_bits_per_sample} valid bits don't fit in {bytes_per_sample} bytes")]
    InvalidValidBitsPerSample {
        bytes_per_sample: u16,
        valid_bits_per_sample: u16,
    },
    /// The container width and valid bits don't agree with the format:
    /// 16-bit PCM must use all 16 bits, and floats must be 32 bits wide.
    #[error("{format:?} samples can't be stored as {valid_bits_per_sample} bits in {bytes_per_sample} bytes")]
    FormatMismatch {
        format: WavFormat,
        bytes_per_sample: u16,
        valid_bits_per_sample: u16,
    },
    /// The extensible sub format names neither PCM nor float.
    #[error("unsupported sub format {0:#x}")]
    UnsupportedFormat(u32),
    /// One second of audio would not fit in the size bound.
    #[error("byte rate of {0} bytes per second is too large")]
    ByteRateTooLarge(u64),
    /// The data chunk would not fit in the size bound.
    #[error("{0} bytes of sample data is too large")]
    DataTooLarge(u64),
}

// MARK: Header model

/// The geometry of a wave file, shared by the reader and the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// PCM or float, with the extensible indirection already resolved.
    pub format: WavFormat,
    pub num_channels: u16,
    pub sample_rate: u32,
    /// The width of the sample container, 2 or 4.
    pub bytes_per_sample: u16,
    /// Bytes per frame as stored in the fmt chunk. Not used for any offset
    /// arithmetic; see `frame_size`.
    pub block_align: u16,
    pub valid_bits_per_sample: u16,
    /// Samples per channel, i.e. the number of frames.
    pub num_samples: u64,
    /// Byte offset of the first sample.
    pub data_offset: u64,
}

impl WavHeader {
    /// Builds the header for a new file with the given geometry. The result
    /// still has to pass `validate`.
    pub fn for_writing(num_channels: u16, sample_rate: u32, format: SampleFormat) -> WavHeader {
        let bytes_per_sample = format.bytes_per_sample();
        WavHeader {
            format: match format {
                SampleFormat::F32 => WavFormat::Float,
                SampleFormat::I16 | SampleFormat::I32 => WavFormat::Pcm,
            },
            num_channels: num_channels,
            sample_rate: sample_rate,
            bytes_per_sample: bytes_per_sample,
            block_align: num_channels.saturating_mul(bytes_per_sample),
            valid_bits_per_sample: bytes_per_sample * 8,
            num_samples: 0,
            data_offset: 0,
        }
    }

    /// Checks that the header describes a file we can handle.
    pub fn validate(&self) -> Result<(), HeaderErrorKind> {
        if self.num_channels < 1 || self.num_channels > MAX_NUM_CHANNELS {
            return Err(HeaderErrorKind::InvalidNumChannels(self.num_channels));
        }

        if self.sample_rate < 1 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(HeaderErrorKind::InvalidSampleRate(self.sample_rate));
        }

        if self.bytes_per_sample != 2 && self.bytes_per_sample != 4 {
            return Err(HeaderErrorKind::UnsupportedBytesPerSample(self.bytes_per_sample));
        }

        if self.valid_bits_per_sample < 1 || self.valid_bits_per_sample > self.bytes_per_sample * 8 {
            return Err(HeaderErrorKind::InvalidValidBitsPerSample {
                bytes_per_sample: self.bytes_per_sample,
                valid_bits_per_sample: self.valid_bits_per_sample,
            });
        }

        let format_ok = match self.format {
            WavFormat::Pcm => self.bytes_per_sample != 2 || self.valid_bits_per_sample == 16,
            WavFormat::Float => self.bytes_per_sample == 4 && self.valid_bits_per_sample == 32,
        };
        if !format_ok {
            return Err(HeaderErrorKind::FormatMismatch {
                format: self.format,
                bytes_per_sample: self.bytes_per_sample,
                valid_bits_per_sample: self.valid_bits_per_sample,
            });
        }

        let byte_rate = self.sample_rate as u64 * self.frame_size() as u64;
        if byte_rate > MAX_DATA_SIZE {
            return Err(HeaderErrorKind::ByteRateTooLarge(byte_rate));
        }

        if self.data_size() > MAX_DATA_BYTES {
            return Err(HeaderErrorKind::DataTooLarge(self.data_size()));
        }

        Ok(())
    }

    /// Bytes per frame, derived from the channel count and container width
    /// rather than taken from the stored block align.
    pub fn frame_size(&self) -> usize {
        self.num_channels as usize * self.bytes_per_sample as usize
    }

    /// The size of the sample data in bytes.
    pub fn data_size(&self) -> u64 {
        self.num_samples * self.frame_size() as u64
    }

    /// The container width in bits.
    pub fn bits_per_sample(&self) -> u16 {
        self.bytes_per_sample * 8
    }

    /// The native sample representation of the file.
    pub fn sample_format(&self) -> SampleFormat {
        match self.format {
            WavFormat::Float => SampleFormat::F32,
            WavFormat::Pcm if self.bytes_per_sample == 2 => SampleFormat::I16,
            WavFormat::Pcm => SampleFormat::I32,
        }
    }
}

// MARK: Tests
