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

//! Strips the header from a wave file, leaving raw little-endian samples.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use byteorder::{LittleEndian, WriteBytesExt};
use clap::Parser;
use log::info;

use wav_stream::{SampleFormat, WavReader};

#[derive(Parser, Debug)]
#[command(about = "Convert a wave file to raw interleaved PCM")]
struct Args {
    /// Input wave file
    #[arg(short, long)]
    input: PathBuf,

    /// Raw output file
    #[arg(short, long)]
    output: PathBuf,

    /// Output sample format: i16, i32 or f32. Defaults to the input's format
    #[arg(short, long)]
    format: Option<SampleFormat>,
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn write_failed(path: &Path, err: io::Error) -> ! {
    fail(format!("Can't write {}: {}", path.display(), err))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut reader = WavReader::open(&args.input)
        .unwrap_or_else(|err| fail(format!("Can't read {}: {}", args.input.display(), err)));
    let file = File::create(&args.output)
        .unwrap_or_else(|err| fail(format!("Can't create {}: {}", args.output.display(), err)));
    let mut output = BufWriter::new(file);

    let format = args.format.unwrap_or_else(|| reader.sample_format());
    let channels = reader.num_channels() as usize;
    let len = 4096 * channels;
    let mut i16_buf = vec![0i16; len];
    let mut i32_buf = vec![0i32; len];
    let mut f32_buf = vec![0.0f32; len];

    let mut total = 0;
    loop {
        let frames = match format {
            SampleFormat::I16 => reader.read_i16(&mut i16_buf),
            SampleFormat::I32 => reader.read_i32(&mut i32_buf),
            SampleFormat::F32 => reader.read_f32(&mut f32_buf),
        };
        let frames = frames
            .unwrap_or_else(|err| fail(format!("Can't read {}: {}", args.input.display(), err)));
        if frames == 0 {
            break;
        }

        let samples = frames * channels;
        let written = match format {
            SampleFormat::I16 => i16_buf[..samples].iter()
                .try_for_each(|&s| output.write_i16::<LittleEndian>(s)),
            SampleFormat::I32 => i32_buf[..samples].iter()
                .try_for_each(|&s| output.write_i32::<LittleEndian>(s)),
            SampleFormat::F32 => f32_buf[..samples].iter()
                .try_for_each(|&s| output.write_f32::<LittleEndian>(s)),
        };
        if let Err(err) = written {
            write_failed(&args.output, err);
        }
        total += frames;
    }

    if let Err(err) = output.flush() {
        write_failed(&args.output, err);
    }
    info!("wrote {} frames of {} to {}", total, format, args.output.display());
}
