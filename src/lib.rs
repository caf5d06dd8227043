// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A synthesizer modelled after the four sound channels of a handheld retro console:
//! two square channels, a wave channel and a noise channel.

pub mod channel;
pub mod error;
pub mod melody;
pub mod mixer;
pub mod note;
pub mod output;
pub mod render;
pub mod tuning;
pub mod wave;

pub use channel::{generate_channel, generate_waveform, ChannelConfig, ChannelKind, Waveform};
pub use error::{Error, Result};
pub use melody::{parse_melody, Melody, NoteEvent};
pub use mixer::{mix_per_note, mix_sum, normalize_peak};
pub use render::{render_melody, render_tones, render_waveforms, RenderSettings, Sequencer, Tone};
pub use tuning::{frequency_of, NoteTable};
pub use wave::SampleBuffer;
