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

//! Wraps headerless little-endian samples in a wave header.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::process;

use byteorder::{ByteOrder, LittleEndian};
use clap::Parser;
use log::info;

use wav_stream::{SampleFormat, WavWriter};

#[derive(Parser, Debug)]
#[command(about = "Convert raw interleaved PCM to a wave file")]
struct Args {
    /// Raw input file
    #[arg(short, long)]
    input: PathBuf,

    /// Output wave file
    #[arg(short, long)]
    output: PathBuf,

    /// Number of interleaved channels
    #[arg(short, long, default_value_t = 1)]
    channels: u16,

    /// Sample rate in Hz
    #[arg(short = 's', long, default_value_t = 16000)]
    sample_rate: u32,

    /// Sample format of the input and output: i16, i32 or f32
    #[arg(short, long, default_value_t = SampleFormat::I16)]
    format: SampleFormat,
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

/// Reads until `buf` is full or the input ends.
fn fill(input: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .unwrap_or_else(|err| fail(format!("Can't open {}: {}", args.input.display(), err)));
    let mut input = BufReader::new(file);
    let mut writer = WavWriter::create(&args.output, args.channels, args.sample_rate, args.format)
        .unwrap_or_else(|err| fail(format!("Can't create {}: {}", args.output.display(), err)));

    let frame_size = args.channels as usize * args.format.bytes_per_sample() as usize;
    let mut bytes = vec![0u8; frame_size * 4096];
    loop {
        let len = fill(&mut input, &mut bytes)
            .unwrap_or_else(|err| fail(format!("Can't read {}: {}", args.input.display(), err)));
        // A trailing partial frame is dropped.
        let len = len - len % frame_size;
        if len == 0 {
            break;
        }

        let bytes = &bytes[..len];
        let written = match args.format {
            SampleFormat::I16 => {
                let mut samples = vec![0i16; len / 2];
                LittleEndian::read_i16_into(bytes, &mut samples);
                writer.write_i16(&samples)
            }
            SampleFormat::I32 => {
                let mut samples = vec![0i32; len / 4];
                LittleEndian::read_i32_into(bytes, &mut samples);
                writer.write_i32(&samples)
            }
            SampleFormat::F32 => {
                let mut samples = vec![0.0f32; len / 4];
                LittleEndian::read_f32_into(bytes, &mut samples);
                writer.write_f32(&samples)
            }
        };
        let written = written
            .unwrap_or_else(|err| fail(format!("Can't write {}: {}", args.output.display(), err)));
        if written < len / frame_size {
            fail(format!("Can't write {}: file is full", args.output.display()));
        }
    }

    info!("wrote {} frames to {}", writer.num_samples(), args.output.display());
    writer.close()
        .unwrap_or_else(|err| fail(format!("Can't close {}: {}", args.output.display(), err)));
}
