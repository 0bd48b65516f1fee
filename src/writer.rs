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
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::result;

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, warn};

use super::convert::{frame_range, Sample, SampleFormat, Scratch};
use super::header::{HeaderErrorKind, WavHeader, FMT_CHUNK_SIZE_BASIC};
use super::MAX_DATA_BYTES;

// MARK: Error types

/// Represents an error that occurred while creating a wave file.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The file could not be created.
    #[error("cannot create file: {0}")]
    CannotCreate(#[source] io::Error),
    /// The requested channel count, sample rate and format don't make a
    /// valid wave file.
    #[error("invalid argument: {0}")]
    InvalidArgument(HeaderErrorKind),
    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Represents a result when writing a wave file.
pub type WriteResult<T> = result::Result<T, WriteError>;

// MARK: Header layout

// "RIFF", size, "WAVE", "fmt ", size, 16 byte fmt chunk, "data", size.
const HEADER_SIZE: usize = 44;
const RIFF_SIZE_POSITION: u64 = 4;
const DATA_SIZE_POSITION: u64 = 40;

fn write_header<W: Write>(writer: &mut W, header: &WavHeader) -> io::Result<()> {
    let mut buffer = [0u8; HEADER_SIZE];

    // Write the header in-memory first.
    {
        let mut cursor = io::Cursor::new(&mut buffer[..]);
        cursor.write_all(b"RIFF")?;
        // Filled in by `finalize`.
        cursor.write_u32::<LittleEndian>(0)?;
        cursor.write_all(b"WAVE")?;

        cursor.write_all(b"fmt ")?;
        cursor.write_u32::<LittleEndian>(FMT_CHUNK_SIZE_BASIC)?;
        cursor.write_u16::<LittleEndian>(header.format.code())?;
        cursor.write_u16::<LittleEndian>(header.num_channels)?;
        cursor.write_u32::<LittleEndian>(header.sample_rate)?;
        cursor.write_u32::<LittleEndian>(header.sample_rate * header.block_align as u32)?;
        cursor.write_u16::<LittleEndian>(header.block_align)?;
        cursor.write_u16::<LittleEndian>(header.bits_per_sample())?;

        cursor.write_all(b"data")?;
        // Filled in by `finalize`.
        cursor.write_u32::<LittleEndian>(0)?;
    }

    writer.write_all(&buffer)
}

/// Writes as much of `buf` as the writer accepts. Returns the number of
/// bytes written along with the error that stopped it, if any.
fn write_full<W: Write>(writer: &mut W, buf: &[u8]) -> (usize, Option<io::Error>) {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => {
                let err = io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer");
                return (written, Some(err));
            }
            Ok(n) => written += n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (written, Some(err)),
        }
    }
    (written, None)
}

// MARK: Writing

/// Helper struct that takes ownership of a writer and can be used to write
/// interleaved samples to a wave file.
///
/// The size fields in the header are only known once all samples have been
/// written, so the file must be finalized by calling `close`. A writer that
/// is dropped without being closed finalizes itself, but any IO error in
/// doing so is only logged.
///
/// A `WavWriter` is not meant to be shared between threads while writing.
#[derive(Debug)]
pub struct WavWriter<T>
    where T: Seek + Write
{
    // `num_samples` grows with every successful write.
    header: WavHeader,

    // Absolute positions of the two size fields patched by `finalize`.
    riff_size_offset: u64,
    data_size_offset: u64,

    scratch: Scratch,

    // The underlying writer that we'll use to write data.
    writer: T,

    finalized: bool,
}

impl WavWriter<BufWriter<File>> {
    /// Creates a wave file at `path`, overwriting any existing file.
    ///
    /// The geometry is validated before the file is touched, so invalid
    /// arguments leave nothing behind.
    pub fn create<P: AsRef<Path>>(path: P,
                                  num_channels: u16,
                                  sample_rate: u32,
                                  format: SampleFormat)
                                  -> WriteResult<WavWriter<BufWriter<File>>> {
        WavHeader::for_writing(num_channels, sample_rate, format)
            .validate()
            .map_err(WriteError::InvalidArgument)?;

        let file = File::create(path).map_err(WriteError::CannotCreate)?;
        WavWriter::new(num_channels, sample_rate, format, BufWriter::new(file))
    }
}

impl<T> WavWriter<T>
    where T: Seek + Write
{
    /// Returns a new wave writer for the given writer and writes the wave
    /// header to it. Samples will be stored in `format`.
    pub fn new(num_channels: u16,
               sample_rate: u32,
               format: SampleFormat,
               mut writer: T)
               -> WriteResult<WavWriter<T>> {
        let mut header = WavHeader::for_writing(num_channels, sample_rate, format);
        header.validate().map_err(WriteError::InvalidArgument)?;

        let start = writer.seek(SeekFrom::Current(0))?;
        write_header(&mut writer, &header)?;
        header.data_offset = start + HEADER_SIZE as u64;
        debug!("wrote header for {} channels at {} Hz as {}", num_channels, sample_rate, format);

        Ok(WavWriter {
            header: header,
            riff_size_offset: start + RIFF_SIZE_POSITION,
            data_size_offset: start + DATA_SIZE_POSITION,
            scratch: Scratch::new(format),
            writer: writer,
            finalized: false,
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

    /// The representation samples are stored in.
    pub fn sample_format(&self) -> SampleFormat {
        self.header.sample_format()
    }

    /// The number of samples per channel written so far.
    pub fn num_samples(&self) -> u64 {
        self.header.num_samples
    }

    /// Writes up to `buf.len() / num_channels` frames of interleaved samples,
    /// converting to the file's format if necessary. Returns the number of
    /// frames written.
    ///
    /// A wave file can hold at most `MAX_DATA_BYTES` of samples. Frames that
    /// would go past that are dropped, in which case the returned count is
    /// less than what was passed in. An io error is only returned if it
    /// occurred before any whole frame was written. Otherwise the frames
    /// written so far are counted and returned, and the next write starts
    /// right after them.
    pub fn write_samples<S: Sample>(&mut self, buf: &[S]) -> io::Result<usize> {
        let channels = self.header.num_channels as usize;
        let frame_size = self.header.frame_size();
        let requested = (buf.len() / channels) as u64;
        let available = MAX_DATA_BYTES / frame_size as u64 - self.header.num_samples;
        let wanted = cmp::min(requested, available) as usize;
        if (wanted as u64) < requested {
            warn!("wave data is full, dropping {} of {} frames", requested - wanted as u64, requested);
        }
        let batch = self.scratch.frames_per_batch(frame_size);
        let native = S::FORMAT == self.header.sample_format();

        let mut successfully_written = 0;
        while successfully_written < wanted {
            let request = cmp::min(batch, wanted - successfully_written);
            let src = &buf[frame_range(channels, successfully_written, request)];
            let bytes = if native {
                self.scratch.encode_native(src)
            } else {
                self.scratch.encode_from(src)
            };

            let (written, mut error) = write_full(&mut self.writer, bytes);
            let frames = written / frame_size;
            let partial = written % frame_size;

            self.header.num_samples += frames as u64;
            successfully_written += frames;

            // Step back over a split frame so the next write overwrites it.
            if partial > 0 {
                if let Err(err) = self.writer.seek(SeekFrom::Current(-(partial as i64))) {
                    error = Some(err);
                }
            }

            if let Some(err) = error {
                if successfully_written == 0 {
                    return Err(err);
                } else {
                    break;
                }
            }
        }

        Ok(successfully_written)
    }

    /// Writes interleaved float samples. See `write_samples`.
    pub fn write_f32(&mut self, buf: &[f32]) -> io::Result<usize> {
        self.write_samples(buf)
    }

    /// Writes interleaved signed 16-bit samples. See `write_samples`.
    pub fn write_i16(&mut self, buf: &[i16]) -> io::Result<usize> {
        self.write_samples(buf)
    }

    /// Writes interleaved signed 32-bit samples. See `write_samples`.
    pub fn write_i32(&mut self, buf: &[i32]) -> io::Result<usize> {
        self.write_samples(buf)
    }

    /// Patches the RIFF and data chunk sizes into the header and flushes.
    fn finalize(&mut self) -> io::Result<()> {
        self.finalized = true;

        let data_size = self.header.data_size();
        // Everything after the 8 byte RIFF chunk header.
        let riff_size = self.header.data_offset - self.riff_size_offset - 4 + data_size;

        self.writer.seek(SeekFrom::Start(self.riff_size_offset))?;
        self.writer.write_u32::<LittleEndian>(riff_size as u32)?;
        self.writer.seek(SeekFrom::Start(self.data_size_offset))?;
        self.writer.write_u32::<LittleEndian>(data_size as u32)?;
        self.writer.seek(SeekFrom::Start(self.header.data_offset + data_size))?;
        self.writer.flush()?;

        debug!("finalized wave file with {} samples per channel", self.header.num_samples);
        Ok(())
    }

    /// Finalizes the file and releases the underlying writer.
    pub fn close(mut self) -> WriteResult<()> {
        self.finalize()?;
        Ok(())
    }
}

impl<T> Drop for WavWriter<T>
    where T: Seek + Write
{
    fn drop(&mut self) {
        // `finalize` must run only once. If the writer was closed this is a
        // no-op; otherwise finalize now, but a failure can't be reported.
        if !self.finalized {
            warn!("wave writer dropped without close, finalizing");
            if let Err(err) = self.finalize() {
                warn!("failed to finalize wave file: {}", err);
            }
        }
    }
}

// MARK: Tests
