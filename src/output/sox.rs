// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Easy interface for getting sound to play using a sox subprocess.

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, error};

use crate::wave::SampleBuffer;

/// Where sox sends the audio.
#[derive(Debug, Clone, Copy)]
pub enum SoxTarget<'a> {
    /// The default audio device.
    Play,
    /// Any file format supported by sox, chosen by extension.
    File(&'a Path),
}

fn sox_binaries() -> (PathBuf, PathBuf) {
    // For properly recording the sox dependency on nix:
    if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
        debug!("using sox from nix store {}", sox_bin);
        let play = Path::new(sox_bin).join("play");
        let sox = Path::new(sox_bin).join("sox");
        (play, sox)
    } else {
        ("play".into(), "sox".into())
    }
}

/// The arguments telling sox how to read a mono `f64` stream from stdin.
fn input_args(sample_rate: u32) -> Vec<String> {
    vec![
        "-R".to_string(), // make the output reproducible
        "--channels".to_string(),
        "1".to_string(),
        "--rate".to_string(),
        sample_rate.to_string(),
        "--type".to_string(),
        "f64".to_string(),
        "/dev/stdin".to_string(),
    ]
}

/// Send the whole buffer to sox and wait until it is done.
pub fn write_buffer(buffer: &SampleBuffer, target: SoxTarget) -> io::Result<()> {
    let (play, sox) = sox_binaries();
    let args = input_args(buffer.sample_rate());

    let mut player = match target {
        SoxTarget::Play => Command::new(&play)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?,
        SoxTarget::File(outfile) => Command::new(&sox)
            .args(&args)
            .arg(outfile)
            .stdin(Stdio::piped())
            .spawn()?,
    };

    let mut audio_stream = player
        .stdin
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "sox has no stdin"))?;

    let mut bytes = vec![0u8; buffer.byte_len()];
    buffer.copy_bytes_to(&mut bytes);
    debug!(
        "sending {} samples ({} bytes) to sox",
        buffer.len(),
        bytes.len()
    );

    let written = audio_stream
        .write_all(&bytes)
        .and_then(|_| audio_stream.flush());
    if let Err(err) = &written {
        error!("Failed to write audio to sox stream: {}", err);
    }

    // sox exits once its input is closed
    drop(audio_stream);
    let status = player.wait()?;
    written?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("sox exited with {}", status),
        ));
    }
    Ok(())
}
