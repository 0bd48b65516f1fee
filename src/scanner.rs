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
use std::io;
use std::io::{Read, Seek, SeekFrom};
use std::result;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;

use super::header::{HeaderErrorKind, WavFormat, WavHeader};
use super::header::{FORMAT_EXTENSIBLE, FORMAT_FLOAT, FORMAT_PCM};
use super::header::{FMT_CHUNK_SIZE_BASIC, FMT_CHUNK_SIZE_EXTENSIBLE, FMT_CHUNK_SIZE_WITH_CB};

// MARK: Error types

/// Represents an error that occurred while opening or reading a wave file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The file could not be opened.
    #[error("cannot open file: {0}")]
    CannotOpen(#[source] io::Error),
    /// The fmt chunk was read but describes a file we can't handle.
    #[error("malformed header: {0}")]
    MalformedHeader(HeaderErrorKind),
    /// The file ended, or never started, before a data chunk was found.
    #[error("truncated file: {0}")]
    TruncatedFile(TruncationKind),
    /// The fmt chunk has a layout or format tag we don't support.
    #[error("unsupported fmt chunk: {0}")]
    UnsupportedFormatChunk(FmtChunkErrorKind),
    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Represents a result when reading a wave file.
pub type ReadResult<T> = result::Result<T, ReadError>;

/// Where the file stopped making sense as a RIFF/WAVE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TruncationKind {
    /// The file does not start with a "RIFF" tag and chunk size.
    #[error("not a RIFF file")]
    NotARiffFile,
    /// The file doesn't continue with "WAVE" after the RIFF chunk header.
    #[error("not a WAVE file")]
    NotAWaveFile,
    /// The fmt chunk is shorter than its declared size.
    #[error("fmt chunk ends early")]
    FmtChunkCutShort,
    /// The end of the file was reached before a data chunk.
    #[error("no data chunk")]
    MissingDataChunk,
}

/// Why a fmt chunk was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FmtChunkErrorKind {
    /// Only 16, 18 and 40 byte fmt chunks are supported.
    #[error("unsupported fmt chunk size {0}")]
    UnsupportedSize(u32),
    /// Only PCM, float and extensible format tags are supported.
    #[error("unsupported format tag {0:#06x}")]
    UnsupportedFormatTag(u16),
    /// The extensible format tag was used in a chunk too small to hold the
    /// sub format.
    #[error("extensible format in a {0} byte fmt chunk")]
    MissingExtension(u32),
    /// A data chunk came before any fmt chunk.
    #[error("data chunk before fmt chunk")]
    MissingBeforeData,
}

fn eof_as(err: io::Error, kind: TruncationKind) -> ReadError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ReadError::TruncatedFile(kind)
    } else {
        ReadError::Io(err)
    }
}

// MARK: Parsing

/// Parses a fmt chunk body of one of the three supported sizes. The result
/// has no sample count or data offset yet.
fn parse_fmt_chunk(chunk: &[u8]) -> ReadResult<WavHeader> {
    let size = chunk.len() as u32;
    let format_tag = LittleEndian::read_u16(&chunk[0..2]);
    let num_channels = LittleEndian::read_u16(&chunk[2..4]);
    let sample_rate = LittleEndian::read_u32(&chunk[4..8]);
    // Bytes 8..12 hold the byte rate, which we derive instead.
    let block_align = LittleEndian::read_u16(&chunk[12..14]);
    let bits_per_sample = LittleEndian::read_u16(&chunk[14..16]);
    // Bytes 16..18, if present, hold the extension size. The chunk size
    // already tells us which layout we have.

    let (format, valid_bits_per_sample) = match format_tag {
        FORMAT_PCM => (WavFormat::Pcm, bits_per_sample),
        FORMAT_FLOAT => (WavFormat::Float, bits_per_sample),
        FORMAT_EXTENSIBLE => {
            if size != FMT_CHUNK_SIZE_EXTENSIBLE {
                return Err(ReadError::UnsupportedFormatChunk(
                    FmtChunkErrorKind::MissingExtension(size)));
            }
            // For extensible files the outer bits per sample is only the
            // container width; the real precision and the real format
            // tag (the first field of the sub format GUID) live in the
            // extension. Bytes 20..24 are the channel mask.
            let valid_bits = LittleEndian::read_u16(&chunk[18..20]);
            let sub_format = LittleEndian::read_u32(&chunk[24..28]);
            match WavFormat::from_code(sub_format) {
                Some(format) => (format, valid_bits),
                None => {
                    return Err(ReadError::MalformedHeader(
                        HeaderErrorKind::UnsupportedFormat(sub_format)));
                }
            }
        }
        other => {
            return Err(ReadError::UnsupportedFormatChunk(
                FmtChunkErrorKind::UnsupportedFormatTag(other)));
        }
    };

    Ok(WavHeader {
        format: format,
        num_channels: num_channels,
        sample_rate: sample_rate,
        bytes_per_sample: bits_per_sample / 8,
        block_align: block_align,
        valid_bits_per_sample: valid_bits_per_sample,
        num_samples: 0,
        data_offset: 0,
    })
}

fn is_supported_fmt_size(size: u32) -> bool {
    size == FMT_CHUNK_SIZE_BASIC || size == FMT_CHUNK_SIZE_WITH_CB ||
    size == FMT_CHUNK_SIZE_EXTENSIBLE
}

/// Walks the RIFF structure of a wave stream.
pub(crate) trait ReadWaveExt: Read + Seek {
    /// Reads up to and including the data chunk header and returns the
    /// validated header. The stream is left at the first sample.
    fn read_wave_header(&mut self) -> ReadResult<WavHeader> {
        self.validate_is_riff_file()?;
        self.validate_is_wave_file()?;

        let mut fmt = None;
        loop {
            let (tag, size) = self.read_chunk_header()?;

            match &tag {
                b"fmt " => fmt = Some(self.read_fmt_chunk(size)?),
                b"data" => {
                    let mut header = fmt.ok_or(ReadError::UnsupportedFormatChunk(
                        FmtChunkErrorKind::MissingBeforeData))?;
                    // Check the geometry before sizing the data, which
                    // divides by the frame size.
                    header.validate().map_err(ReadError::MalformedHeader)?;
                    self.locate_data(&mut header, size)?;
                    header.validate().map_err(ReadError::MalformedHeader)?;
                    return Ok(header);
                }
                _ => self.skip_chunk(&tag, size)?,
            }
        }
    }

    fn read_fmt_chunk(&mut self, size: u32) -> ReadResult<WavHeader> {
        if !is_supported_fmt_size(size) {
            return Err(ReadError::UnsupportedFormatChunk(FmtChunkErrorKind::UnsupportedSize(size)));
        }

        let mut chunk = [0u8; FMT_CHUNK_SIZE_EXTENSIBLE as usize];
        let chunk = &mut chunk[..size as usize];
        self.read_exact(chunk).map_err(|err| eof_as(err, TruncationKind::FmtChunkCutShort))?;
        parse_fmt_chunk(chunk)
    }

    /// Records where the samples start and how many there are. A declared
    /// size of zero, or one that runs past the end of the file, is replaced
    /// by the number of bytes actually left.
    fn locate_data(&mut self, header: &mut WavHeader, declared_size: u32) -> ReadResult<()> {
        let data_offset = self.seek(SeekFrom::Current(0))?;
        let file_end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(data_offset))?;

        let left = file_end.saturating_sub(data_offset);
        let data_size = if declared_size == 0 {
            left
        } else {
            cmp::min(declared_size as u64, left)
        };
        if data_size != declared_size as u64 {
            debug!("data chunk declares {} bytes, using the {} bytes present",
                   declared_size, data_size);
        }

        header.data_offset = data_offset;
        // A trailing partial frame is ignored.
        header.num_samples = data_size / header.frame_size() as u64;
        Ok(())
    }

    fn skip_chunk(&mut self, tag: &[u8; 4], size: u32) -> ReadResult<()> {
        // Skip exactly the declared size. Odd sized chunks are often
        // written without the RIFF pad byte.
        debug!("skipping {:?} chunk of {} bytes", String::from_utf8_lossy(tag), size);
        self.seek(SeekFrom::Current(size as i64))?;
        Ok(())
    }

    fn validate_is_riff_file(&mut self) -> ReadResult<()> {
        self.validate_tag(b"RIFF", TruncationKind::NotARiffFile)?;
        // The next four bytes represent the chunk size. We're not going to
        // validate it, so that we can still try to read files that might have
        // an incorrect chunk size, so let's skip over it.
        let _ = self.read_u32::<LittleEndian>()
            .map_err(|err| eof_as(err, TruncationKind::NotARiffFile))?;
        Ok(())
    }

    fn validate_is_wave_file(&mut self) -> ReadResult<()> {
        self.validate_tag(b"WAVE", TruncationKind::NotAWaveFile)
    }

    fn validate_tag(&mut self, expected_tag: &[u8; 4], kind: TruncationKind) -> ReadResult<()> {
        let tag = self.read_tag().map_err(|err| eof_as(err, kind))?;
        if &tag != expected_tag {
            return Err(ReadError::TruncatedFile(kind));
        }
        Ok(())
    }

    fn read_chunk_header(&mut self) -> ReadResult<([u8; 4], u32)> {
        let tag = self.read_tag()
            .map_err(|err| eof_as(err, TruncationKind::MissingDataChunk))?;
        let size = self.read_u32::<LittleEndian>()
            .map_err(|err| eof_as(err, TruncationKind::MissingDataChunk))?;
        Ok((tag, size))
    }

    fn read_tag(&mut self) -> io::Result<[u8; 4]> {
        let mut tag: [u8; 4] = [0; 4];
        self.read_exact(&mut tag)?;
        Ok(tag)
    }
}

impl<T> ReadWaveExt for T where T: Read + Seek {}

// MARK: Tests
