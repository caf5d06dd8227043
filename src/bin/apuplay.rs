// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `apuplay` plays melodies and test tones on the four console channels.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{error, info};
use structopt::StructOpt;

use apu_synth::output::{self, SoxTarget};
use apu_synth::render::{self, RenderSettings, Sequencer, Tone};
use apu_synth::wave::{SampleBuffer, DEFAULT_SAMPLE_RATE};
use apu_synth::{melody, mixer, ChannelConfig, Waveform};

#[derive(Debug, StructOpt)]
#[structopt(name = "apuplay", about = "Retro console sounds from the command line")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Output file (any sox-supported format). Audio is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Samples per second.
    #[structopt(long, default_value = "44100")]
    sample_rate: u32,

    /// Dump a description of the channels and notes that are about to be played.
    #[structopt(long)]
    dump_description: Option<Option<PathBuf>>,

    #[structopt(flatten)]
    channels: ChannelOpt,

    #[structopt(subcommand)]
    mode: Mode,
}

#[derive(Debug, StructOpt)]
struct ChannelOpt {
    /// Turn on a channel (1-4).
    #[structopt(long, number_of_values = 1)]
    enable: Vec<usize>,

    /// Turn off a channel (1-4).
    #[structopt(long, number_of_values = 1)]
    disable: Vec<usize>,

    /// Set the amplitude of a channel, e.g. `--amplitude 3=0.8`.
    #[structopt(long, number_of_values = 1)]
    amplitude: Vec<ChannelValue>,

    /// Set the duty cycle of a square channel, e.g. `--duty 1=0.125`.
    #[structopt(long, number_of_values = 1)]
    duty: Vec<ChannelValue>,
}

#[derive(Debug, StructOpt)]
enum Mode {
    /// Play a melody file, or the built-in theme if no file is given.
    Melody {
        /// Melody made of `NOTE:SECONDS` items.
        #[structopt(parse(from_os_str))]
        source: Option<PathBuf>,

        /// Scale the result to full volume.
        #[structopt(long)]
        normalize: bool,
    },
    /// Play every channel at its own frequency at the same time.
    Tone {
        /// Length of the tones in seconds.
        #[structopt(long, default_value = "1.0")]
        duration: f64,

        /// Set the frequency of a channel, e.g. `--frequency 2=880`.
        #[structopt(long, number_of_values = 1)]
        frequency: Vec<ChannelValue>,
    },
    /// Play sine, square, triangle, sawtooth and noise waves one after another.
    Waveforms {
        #[structopt(long, default_value = "440")]
        frequency: f64,

        #[structopt(long, default_value = "0.5")]
        amplitude: f64,

        /// Length of each wave in seconds.
        #[structopt(long, default_value = "1.0")]
        duration: f64,
    },
}

/// A value for one channel, written as `INDEX=VALUE` with a one-based index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ChannelValue {
    index: usize,
    value: f64,
}

impl FromStr for ChannelValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '=');
        let index = parts.next().unwrap_or_default();
        let value = parts
            .next()
            .ok_or_else(|| format!("expected INDEX=VALUE, got {:?}", s))?;
        Ok(ChannelValue {
            index: index
                .trim()
                .parse()
                .map_err(|_| format!("invalid channel index {:?}", index))?,
            value: value
                .trim()
                .parse()
                .map_err(|_| format!("invalid value {:?}", value))?,
        })
    }
}

fn invalid_input(err: apu_synth::Error) -> io::Error {
    error!("{}", err);
    let kind = match err {
        apu_synth::Error::MelodySyntax { .. } => io::ErrorKind::InvalidData,
        _ => io::ErrorKind::InvalidInput,
    };
    io::Error::new(kind, err)
}

/// Zero-based position of a channel given by its one-based index.
fn channel_position(index: usize, count: usize) -> io::Result<usize> {
    if index == 0 || index > count {
        let message = format!("no channel {}, expected 1 to {}", index, count);
        error!("{}", message);
        return Err(io::Error::new(io::ErrorKind::InvalidInput, message));
    }
    Ok(index - 1)
}

impl ChannelOpt {
    fn apply(&self, channels: &mut [ChannelConfig]) -> io::Result<()> {
        let count = channels.len();
        for &index in &self.enable {
            let pos = channel_position(index, count)?;
            channels[pos] = channels[pos].clone().with_active(true);
        }
        for &index in &self.disable {
            let pos = channel_position(index, count)?;
            channels[pos] = channels[pos].clone().with_active(false);
        }
        for setting in &self.amplitude {
            let pos = channel_position(setting.index, count)?;
            channels[pos] = channels[pos]
                .clone()
                .with_amplitude(setting.value)
                .map_err(invalid_input)?;
        }
        for setting in &self.duty {
            let pos = channel_position(setting.index, count)?;
            channels[pos] = channels[pos]
                .clone()
                .with_duty(setting.value)
                .map_err(invalid_input)?;
        }
        Ok(())
    }
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let settings = RenderSettings {
        sample_rate: opt.sample_rate,
    };
    if settings.sample_rate != DEFAULT_SAMPLE_RATE {
        info!("using a sample rate of {} Hz", settings.sample_rate);
    }
    let dump_out = opt
        .dump_description
        .as_ref()
        .map(|path| path.clone().unwrap_or_else(|| "/dev/stdout".into()));

    let buffer = match &opt.mode {
        Mode::Melody { source, normalize } => {
            let melody = match source {
                Some(path) => {
                    let text = std::fs::read_to_string(path)?;
                    melody::parse_melody(&text).map_err(invalid_input)?
                }
                None => melody::tetris(),
            };
            let mut channels = ChannelConfig::console_defaults();
            opt.channels.apply(&mut channels)?;

            let sequencer = Sequencer::standard(settings);
            if let Some(path) = &dump_out {
                let text = sequencer
                    .describe(&melody, &channels)
                    .map_err(invalid_input)?;
                std::fs::write(path, text)?;
            }
            let buffer = sequencer
                .render(&melody, &channels, &mut rand::rng())
                .map_err(invalid_input)?;
            if *normalize {
                mixer::normalize_peak(&buffer)
            } else {
                buffer
            }
        }
        Mode::Tone {
            duration,
            frequency,
        } => {
            let mut channels: Vec<ChannelConfig> =
                render::console_tones().into_iter().map(|t| t.channel).collect();
            opt.channels.apply(&mut channels)?;
            let mut tones: Vec<Tone> = render::console_tones()
                .into_iter()
                .zip(channels)
                .map(|(tone, channel)| Tone { channel, ..tone })
                .collect();
            for setting in frequency {
                let pos = channel_position(setting.index, tones.len())?;
                tones[pos].frequency = setting.value;
            }

            if let Some(path) = &dump_out {
                std::fs::write(path, describe_tones(&tones, *duration))?;
            }
            render::render_tones(&tones, *duration, settings, &mut rand::rng())
                .map_err(invalid_input)?
        }
        Mode::Waveforms {
            frequency,
            amplitude,
            duration,
        } => {
            if let Some(path) = &dump_out {
                let names: Vec<String> = Waveform::ALL.iter().map(|w| w.to_string()).collect();
                let text = format!(
                    "{} at {:.2} Hz, amplitude {:.2}, {} s each\n",
                    names.join(", "),
                    frequency,
                    amplitude,
                    duration
                );
                std::fs::write(path, text)?;
            }
            render::render_waveforms(*frequency, *amplitude, *duration, settings, &mut rand::rng())
                .map_err(invalid_input)?
        }
    };

    play(&buffer, opt.output.as_deref())
}

fn describe_tones(tones: &[Tone], duration: f64) -> String {
    let mut out = format!("tones for {} s:\n", duration);
    for tone in tones {
        out.push_str(&format!("  {} at {:.2} Hz\n", tone.channel, tone.frequency));
    }
    out
}

fn play(buffer: &SampleBuffer, output: Option<&Path>) -> io::Result<()> {
    info!(
        "{:.2} seconds at {} Hz, peak {:.3}",
        buffer.duration(),
        buffer.sample_rate(),
        buffer.peak()
    );
    let target = match output {
        Some(path) => {
            info!("writing to {}", path.display());
            SoxTarget::File(path)
        }
        None => SoxTarget::Play,
    };
    output::write_buffer(buffer, target)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channel_values() {
        assert_eq!(
            "3=0.25".parse::<ChannelValue>(),
            Ok(ChannelValue {
                index: 3,
                value: 0.25
            })
        );
        assert!("3".parse::<ChannelValue>().is_err());
        assert!("x=1".parse::<ChannelValue>().is_err());
        assert!("1=loud".parse::<ChannelValue>().is_err());
    }

    #[test]
    fn channel_options() {
        let opt = ChannelOpt {
            enable: vec![4],
            disable: vec![1],
            amplitude: vec![ChannelValue {
                index: 3,
                value: 0.75,
            }],
            duty: vec![ChannelValue {
                index: 2,
                value: 0.25,
            }],
        };
        let mut channels = ChannelConfig::console_defaults();
        opt.apply(&mut channels).unwrap();
        let active: Vec<_> = channels.iter().map(|c| c.is_active()).collect();
        assert_eq!(active, [false, true, true, true]);
        assert_eq!(channels[2].amplitude(), 0.75);
        assert_eq!(channels[1].duty(), 0.25);

        let out_of_range = ChannelOpt {
            enable: vec![5],
            disable: vec![],
            amplitude: vec![],
            duty: vec![],
        };
        assert!(out_of_range.apply(&mut channels).is_err());
    }
}
