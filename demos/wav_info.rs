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

//! Prints the header of a wave file.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use wav_stream::WavReader;

#[derive(Parser, Debug)]
#[command(about = "Print the format of a wave file")]
struct Args {
    /// Wave file to inspect
    file: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let reader = match WavReader::open(&args.file) {
        Ok(reader) => reader,
        Err(err) => {
            eprintln!("Can't read {}: {}", args.file.display(), err);
            process::exit(1);
        }
    };

    println!("{}", args.file.display());
    println!("  format:          {}", reader.sample_format().description());
    println!("  channels:        {}", reader.num_channels());
    println!("  sample rate:     {} Hz", reader.sample_rate());
    println!("  bits per sample: {}", reader.bits_per_sample());
    println!("  valid bits:      {}", reader.valid_bits_per_sample());
    println!("  block align:     {}", reader.block_align());
    println!("  samples:         {}", reader.num_samples());
    println!("  duration:        {:.3} s",
             reader.num_samples() as f64 / reader.sample_rate() as f64);
    println!("  data offset:     {}", reader.data_offset());
}
