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

//! Scales every sample of a wave file by a constant gain, keeping its format.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::info;

use wav_stream::{WavReader, WavWriter};

const MAX_GAIN: f32 = 1e6;

#[derive(Parser, Debug)]
#[command(about = "Amplify a wave file")]
struct Args {
    /// Input wave file
    #[arg(short, long)]
    input: PathBuf,

    /// Output wave file, written in the input's sample format
    #[arg(short, long)]
    output: PathBuf,

    /// Linear gain, greater than 0 and at most 1e6
    #[arg(short = 'a', long)]
    gain: f32,
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !(args.gain > 0.0 && args.gain <= MAX_GAIN) {
        fail(format!("Gain must be in (0, {}], got {}", MAX_GAIN, args.gain));
    }

    let mut reader = WavReader::open(&args.input)
        .unwrap_or_else(|err| fail(format!("Can't read {}: {}", args.input.display(), err)));
    let channels = reader.num_channels() as usize;
    let mut writer = WavWriter::create(&args.output,
                                       reader.num_channels(),
                                       reader.sample_rate(),
                                       reader.sample_format())
        .unwrap_or_else(|err| fail(format!("Can't create {}: {}", args.output.display(), err)));

    // A tenth of a second per pass.
    let frames_per_pass = (reader.sample_rate() as usize / 10).max(1);
    let mut buf = vec![0.0f32; frames_per_pass * channels];
    loop {
        let frames = reader.read_f32(&mut buf)
            .unwrap_or_else(|err| fail(format!("Can't read {}: {}", args.input.display(), err)));
        if frames == 0 {
            break;
        }

        let samples = &mut buf[..frames * channels];
        for sample in samples.iter_mut() {
            *sample = (*sample * args.gain).max(-1.0).min(1.0);
        }

        let written = writer.write_f32(samples)
            .unwrap_or_else(|err| fail(format!("Can't write {}: {}", args.output.display(), err)));
        if written < frames {
            fail(format!("Can't write {}: file is full", args.output.display()));
        }
    }

    info!("wrote {} frames to {}", writer.num_samples(), args.output.display());
    writer.close()
        .unwrap_or_else(|err| fail(format!("Can't close {}: {}", args.output.display(), err)));
}
