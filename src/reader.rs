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

use std::cmp;
use std::fs::File;
use std::io;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::convert::{frame_range, Sample, SampleFormat, Scratch};
use super::header::WavHeader;
use super::scanner::{ReadError, ReadResult, ReadWaveExt};

/// Reads into `buf` until it is full, the reader runs dry or an error
/// occurs. Returns the number of bytes read along with the error, if any.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> (usize, Option<io::Error>) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (filled, Some(err)),
        }
    }
    (filled, None)
}

/// Helper struct that takes ownership of a reader and can be used to read
/// interleaved samples from a wave file.
///
/// Samples can be requested as `i16`, `i32` or `f32` whatever the file
/// stores; conversions go through a fixed-size buffer owned by the reader.
/// A `WavReader` is not meant to be shared between threads while reading.
#[derive(Debug)]
pub struct WavReader<T>
    where T: Read + Seek
{
    header: WavHeader,

    // Frames not yet handed out. Only ever decreases.
    samples_remaining: u64,

    scratch: Scratch,

    // The underlying reader that we'll use to read data.
    reader: T,
}

impl WavReader<BufReader<File>> {
    /// Opens the wave file at `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> ReadResult<WavReader<BufReader<File>>> {
        let file = File::open(path).map_err(ReadError::CannotOpen)?;
        WavReader::new(BufReader::new(file))
    }
}

impl<T> WavReader<T>
    where T: Read + Seek
{
    /// Returns a new wave reader for the given reader, which must be
    /// positioned at the start of the RIFF header.
    pub fn new(mut reader: T) -> ReadResult<WavReader<T>> {
        let header = reader.read_wave_header()?;
        reader.seek(SeekFrom::Start(header.data_offset))?;

        Ok(WavReader {
            header: header,
            samples_remaining: header.num_samples,
            scratch: Scratch::new(header.sample_format()),
            reader: reader,
        })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    pub fn num_channels(&self) -> u16 {
        self.header.num_channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    /// The width of the sample container in bits, 16 or 32.
    pub fn bits_per_sample(&self) -> u16 {
        self.header.bits_per_sample()
    }

    /// Bytes per frame as stored in the file.
    pub fn block_align(&self) -> u16 {
        self.header.block_align
    }

    /// Usually equal to `bits_per_sample`; 32-bit integer files sometimes
    /// only use 20 or 24 bits.
    pub fn valid_bits_per_sample(&self) -> u16 {
        self.header.valid_bits_per_sample
    }

    /// The representation the file stores its samples in.
    pub fn sample_format(&self) -> SampleFormat {
        self.header.sample_format()
    }

    /// The number of samples in each channel.
    pub fn num_samples(&self) -> u64 {
        self.header.num_samples
    }

    /// Byte offset of the first sample in the underlying stream.
    pub fn data_offset(&self) -> u64 {
        self.header.data_offset
    }

    /// The number of samples per channel that have not been read yet.
    pub fn samples_remaining(&self) -> u64 {
        self.samples_remaining
    }

    /// Reads up to `buf.len() / num_channels` frames of interleaved samples
    /// into `buf`, converting from the file's format if necessary. Returns
    /// the number of frames read; fewer than requested means the end of
    /// the data was reached, and zero means there is nothing left.
    ///
    /// An io error is only returned if it occurred before any whole frame
    /// was read. Otherwise the frames read so far are returned, and the
    /// reader is left at the first frame not yet handed out.
    pub fn read_samples<S: Sample>(&mut self, buf: &mut [S]) -> io::Result<usize> {
        let channels = self.header.num_channels as usize;
        let frame_size = self.header.frame_size();
        let requested = (buf.len() / channels) as u64;
        let wanted = cmp::min(requested, self.samples_remaining) as usize;
        let batch = self.scratch.frames_per_batch(frame_size);
        let native = S::FORMAT == self.header.sample_format();

        let mut successfully_read = 0;
        while successfully_read < wanted {
            let request = cmp::min(batch, wanted - successfully_read);
            let bytes = self.scratch.bytes_mut(request * frame_size);

            let (read, mut error) = read_full(&mut self.reader, bytes);
            let frames = read / frame_size;
            let partial = read % frame_size;

            if frames > 0 {
                let out = &mut buf[frame_range(channels, successfully_read, frames)];
                if native {
                    self.scratch.decode_native_into(out);
                } else {
                    self.scratch.decode_into(out);
                }

                self.samples_remaining -= frames as u64;
                successfully_read += frames;
            }

            // Step back over a split frame so the next read starts on a
            // frame boundary.
            if partial > 0 {
                if let Err(err) = self.reader.seek(SeekFrom::Current(-(partial as i64))) {
                    error = Some(err);
                }
            }

            if let Some(err) = error {
                if successfully_read == 0 {
                    return Err(err);
                } else {
                    break;
                }
            }

            if frames < request {
                break;
            }
        }

        Ok(successfully_read)
    }

    /// Reads interleaved samples as floats. See `read_samples`.
    pub fn read_f32(&mut self, buf: &mut [f32]) -> io::Result<usize> {
        self.read_samples(buf)
    }

    /// Reads interleaved samples as signed 16-bit values. See `read_samples`.
    pub fn read_i16(&mut self, buf: &mut [i16]) -> io::Result<usize> {
        self.read_samples(buf)
    }

    /// Reads interleaved samples as signed 32-bit values. See `read_samples`.
    pub fn read_i32(&mut self, buf: &mut [i32]) -> io::Result<usize> {
        self.read_samples(buf)
    }

    /// Closes the reader, releasing the underlying handle.
    pub fn close(self) {}

    /// Returns the underlying reader, positioned after the last sample read.
    pub fn into_inner(self) -> T {
        self.reader
    }
}

// MARK: Tests
