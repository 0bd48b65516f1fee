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

//! Streaming reading and writing of 16-bit, 32-bit and float wave files.
//!
//! A [`WavReader`] parses the RIFF/WAVE header of a file and hands out
//! interleaved samples in whichever of `i16`, `i32` or `f32` the caller
//! asks for; a [`WavWriter`] writes a header up front, accepts interleaved
//! samples in any of the three types and patches the size fields when it is
//! closed. Conversions between the sample types go through a fixed-size
//! buffer, so files of any length are processed in constant memory.
//!
//! ```no_run
//! use wav_stream::{SampleFormat, WavReader, WavWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = WavReader::open("in.wav")?;
//! let mut writer = WavWriter::create("out.wav", reader.num_channels(),
//!                                    reader.sample_rate(), SampleFormat::I16)?;
//! let mut buf = vec![0.0f32; 1024 * reader.num_channels() as usize];
//! loop {
//!     let frames = reader.read_f32(&mut buf)?;
//!     if frames == 0 {
//!         break;
//!     }
//!     writer.write_f32(&buf[..frames * reader.num_channels() as usize])?;
//! }
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # The wave file format
//!
//! All fields are little-endian. The file starts with the RIFF header:
//!
//! Offset | Size | Data       |    Description
//! -----: | ---: | ---------- | ----------------------------------------------
//!      0 |    4 | "RIFF"     | Identifies the main chunk.
//!      4 |    4 | chunk size | The size of the rest of the file, i.e. the file size minus 8 bytes.
//!      8 |    4 | "WAVE"     | Indicates that this is a wave file.
//!
//! A sequence of subchunks follows, each an id, a size and a body. Two of
//! them matter here:
//!
//! * The "fmt " subchunk, describing the samples.
//! * The "data" subchunk, holding the samples themselves.
//!
//! Any other subchunk is skipped. Reading stops at the data subchunk, so a
//! "fmt " subchunk must come before it.
//!
//! ## The "fmt " subchunk
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//!      0 |    2 | format          | 1 for integer PCM, 3 for IEEE float, 0xFFFE for extensible.
//!      2 |    2 | num channels    | Between 1 and 256.
//!      4 |    4 | sample rate     | Between 1 and 48000 * 256.
//!      8 |    4 | byte rate       | Sample rate times block align.
//!     12 |    2 | block align     | Bytes per frame, where a frame is one sample for each channel.
//!     14 |    2 | bits per sample | 16 or 32: the width of the sample container.
//!
//! That is the whole subchunk when its size is 16. An 18 byte subchunk adds
//! a 2 byte extension size, and a 40 byte subchunk is the extensible layout:
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//!     16 |    2 | extra info size | 22 for the extensible layout.
//!     18 |    2 | valid bits      | How many of the container bits are used, e.g. 24 of 32.
//!     20 |    4 | channel mask    | Speaker positions. Ignored.
//!     24 |   16 | sub format      | A GUID whose first four bytes hold the real format code.
//!
//! Other subchunk sizes are rejected. Supported combinations are 16-bit
//! PCM, 32-bit PCM (with any number of valid bits) and 32-bit float.
//!
//! ## The "data" subchunk
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//!      0 |    4 | "data"          | Identifies this subchunk.
//!      4 |    4 | subchunk size   | The size of the sample data.
//!      8 |  ... | audio data      | Interleaved frames.
//!
//! Streaming encoders often leave the size at 0, or write one that is larger
//! than the file. Either way the reader uses the bytes actually present.
//!
//! Written files always use the 16 byte "fmt " layout and put the data
//! subchunk straight after it, for a 44 byte header.
//!
//! See also:
//!
//! * [WAVEFORMATEXTENSIBLE structure][1]
//! * [Audio File Format Specifications][2]
//!
//! [1]: https://msdn.microsoft.com/en-us/library/windows/desktop/dd757714(v=vs.85).aspx
//! [2]: http://www-mmsp.ece.mcgill.ca/documents/audioformats/wave/wave.html

// This is a helper macro that helps us validate results in our tests.
// Thank you bluss and durka42!
#[cfg(test)]
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

pub mod convert;
mod header;
mod reader;
mod scanner;
mod writer;

pub use convert::{ParseSampleFormatError, Sample, SampleFormat};
pub use header::{HeaderErrorKind, WavFormat, WavHeader};
pub use reader::WavReader;
pub use scanner::{FmtChunkErrorKind, ReadError, ReadResult, TruncationKind};
pub use writer::{WavWriter, WriteError, WriteResult};

// MARK: Limits

/// The largest supported number of channels.
pub const MAX_NUM_CHANNELS: u16 = 256;

/// The largest supported sample rate.
pub const MAX_SAMPLE_RATE: u32 = 48000 * MAX_NUM_CHANNELS as u32;

/// Upper bound on the size of a wave file, and on its byte rate. Keeps all
/// header arithmetic well inside 32 bits.
pub const MAX_DATA_SIZE: u64 = 1 << 30;

/// The largest amount of sample data a file may hold: `MAX_DATA_SIZE` less
/// the largest header we understand (RIFF and WAVE ids, a 40 byte "fmt "
/// subchunk and the data subchunk header).
pub const MAX_DATA_BYTES: u64 = MAX_DATA_SIZE - 68;

/// Size in bytes of the conversion buffer each reader and writer owns.
pub const SCRATCH_CAPACITY: usize = MAX_NUM_CHANNELS as usize * 1024;
