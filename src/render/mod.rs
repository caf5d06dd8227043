// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The glue responsible for turning melodies and channel settings into actual waveforms.

use std::fmt;

use log::{debug, trace};
use rand::Rng;

use crate::channel::{generate_waveform, ChannelConfig, Waveform};
use crate::error::{in_range, Error, Result};
use crate::melody::NoteEvent;
use crate::mixer::{mix_per_note, mix_sum, normalize_peak};
use crate::tuning::NoteTable;
use crate::wave::{
    checked_sample_count, sample_count, SampleBuffer, DEFAULT_SAMPLE_RATE, MAX_SAMPLES,
};

/// How long each channel plays in [`render_tones`] unless told otherwise, in seconds.
pub const DEFAULT_TONE_DURATION: f64 = 1.0;

/// Information about how audio is sampled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RenderSettings {
    /// Number of samples per second.
    pub sample_rate: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl RenderSettings {
    /// Number of samples covering `duration` seconds.
    pub fn sample_count(&self, duration: f64) -> usize {
        sample_count(duration, self.sample_rate)
    }

    fn checked_sample_rate(&self) -> Result<u32> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidParameter {
                parameter: "sample rate",
                value: 0.0,
            });
        }
        Ok(self.sample_rate)
    }
}

/// A note event after looking up its frequency.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEvent {
    pub note: String,
    /// Zero for a rest.
    pub frequency: f64,
    pub duration: f64,
    pub sample_count: usize,
}

impl ResolvedEvent {
    pub fn is_rest(&self) -> bool {
        self.frequency == 0.0
    }
}

impl fmt::Display for ResolvedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<5} {:>8.2} Hz {:>6.3} s {:>6} samples",
            self.note, self.frequency, self.duration, self.sample_count
        )
    }
}

/// Plays melodies on a set of channels, one note after another.
pub struct Sequencer<'t> {
    table: &'t NoteTable,
    settings: RenderSettings,
}

impl Sequencer<'static> {
    /// A sequencer using the concert tuned note table.
    pub fn standard(settings: RenderSettings) -> Self {
        Self::new(NoteTable::standard(), settings)
    }
}

impl<'t> Sequencer<'t> {
    pub fn new(table: &'t NoteTable, settings: RenderSettings) -> Self {
        Self { table, settings }
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Look up the frequencies and sample counts of all events, keeping their order.
    pub fn resolve(&self, melody: &[NoteEvent]) -> Result<Vec<ResolvedEvent>> {
        melody
            .iter()
            .map(|event| {
                let frequency = self.table.frequency_of(&event.note)?;
                let duration = in_range("duration", event.duration, 0.0, f64::MAX)?;
                let sample_count = checked_sample_count(duration, self.settings.sample_rate)?;
                trace!("{} -> {} Hz, {} samples", event, frequency, sample_count);
                Ok(ResolvedEvent {
                    note: event.note.clone(),
                    frequency,
                    duration,
                    sample_count,
                })
            })
            .collect()
    }

    /// Render the melody on all active channels.
    ///
    /// Each note is rendered on every active channel and the channels are averaged.
    /// Rests are silent regardless of the channels.
    /// Nothing is rendered unless every event can be resolved.
    pub fn render<R: Rng>(
        &self,
        melody: &[NoteEvent],
        channels: &[ChannelConfig],
        rng: &mut R,
    ) -> Result<SampleBuffer> {
        let sample_rate = self.settings.checked_sample_rate()?;
        let active: Vec<&ChannelConfig> = channels.iter().filter(|c| c.is_active()).collect();
        if active.is_empty() {
            return Err(Error::NoActiveChannels {});
        }
        let events = self.resolve(melody)?;

        let total = total_samples(&events)?;
        debug!(
            "rendering {} notes on {} of {} channels, {} samples",
            events.len(),
            active.len(),
            channels.len(),
            total
        );

        let mut samples = Vec::with_capacity(total);
        for event in &events {
            if event.is_rest() {
                samples.resize(samples.len() + event.sample_count, 0.0);
                continue;
            }
            let mut voices = Vec::with_capacity(active.len());
            for channel in &active {
                voices.push(channel.generate(event.frequency, event.duration, sample_rate, rng)?);
            }
            let note = mix_per_note(&voices)?;
            samples.extend_from_slice(note.samples());
        }
        Ok(SampleBuffer::from_samples(sample_rate, samples))
    }

    /// Human readable listing of the channels and the resolved melody.
    pub fn describe(&self, melody: &[NoteEvent], channels: &[ChannelConfig]) -> Result<String> {
        let events = self.resolve(melody)?;
        let mut out = String::from("channels:\n");
        for channel in channels {
            out.push_str(&format!("  {}\n", channel));
        }
        out.push_str(&format!("notes at {} Hz:\n", self.settings.sample_rate));
        for event in &events {
            out.push_str(&format!("  {}\n", event));
        }
        let total = total_samples(&events)?;
        out.push_str(&format!(
            "total: {} samples ({:.2} s)\n",
            total,
            total as f64 / self.settings.sample_rate as f64
        ));
        Ok(out)
    }
}

/// Length of the concatenated events, if it can be stored in one buffer.
fn total_samples(events: &[ResolvedEvent]) -> Result<usize> {
    events.iter().try_fold(0usize, |total, event| {
        total
            .checked_add(event.sample_count)
            .filter(|&total| total < MAX_SAMPLES)
            .ok_or_else(|| Error::InvalidParameter {
                parameter: "duration",
                value: events.iter().map(|e| e.duration).sum(),
            })
    })
}

/// Render a melody at the default sample rate, with fresh noise.
pub fn render_melody(melody: &[NoteEvent], channels: &[ChannelConfig]) -> Result<SampleBuffer> {
    Sequencer::standard(RenderSettings::default()).render(melody, channels, &mut rand::rng())
}

/// A channel playing a fixed frequency.
#[derive(Clone, Debug, PartialEq)]
pub struct Tone {
    pub channel: ChannelConfig,
    pub frequency: f64,
}

/// All four console channels, tuned 110 Hz apart starting at 440 Hz.
pub fn console_tones() -> Vec<Tone> {
    ChannelConfig::console_defaults()
        .into_iter()
        .enumerate()
        .map(|(index, channel)| Tone {
            channel: channel.with_active(true),
            frequency: 440.0 + 110.0 * index as f64,
        })
        .collect()
}

/// Play all active tones at once for `duration` seconds and scale the sum to full volume.
pub fn render_tones<R: Rng>(
    tones: &[Tone],
    duration: f64,
    settings: RenderSettings,
    rng: &mut R,
) -> Result<SampleBuffer> {
    let sample_rate = settings.checked_sample_rate()?;
    let mut voices = Vec::with_capacity(tones.len());
    for tone in tones.iter().filter(|tone| tone.channel.is_active()) {
        voices.push(tone.channel.generate(tone.frequency, duration, sample_rate, rng)?);
    }
    debug!("mixing {} tones of {} seconds", voices.len(), duration);
    let mixed = mix_sum(&voices)?;
    Ok(normalize_peak(&mixed))
}

/// Play every [`Waveform`] for `duration` seconds, one after another.
pub fn render_waveforms<R: Rng>(
    frequency: f64,
    amplitude: f64,
    duration: f64,
    settings: RenderSettings,
    rng: &mut R,
) -> Result<SampleBuffer> {
    let sample_rate = settings.checked_sample_rate()?;
    let mut samples = Vec::new();
    for &waveform in Waveform::ALL.iter() {
        debug!("{} wave at {} Hz", waveform, frequency);
        let buffer =
            generate_waveform(waveform, frequency, amplitude, duration, sample_rate, rng)?;
        samples.extend_from_slice(buffer.samples());
    }
    Ok(SampleBuffer::from_samples(sample_rate, samples))
}
