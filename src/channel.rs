// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The sound generators of the console channels: two pulse channels,
//! one wave channel and one noise channel.
//!
//! Triangle and sawtooth waves are not available on the channels,
//! but can be rendered on their own with [`generate_waveform`].

use std::f64::consts::PI;
use std::fmt;

use rand::Rng;

use crate::error::{in_range, Error, Result};
use crate::wave::{checked_sample_count, SampleBuffer};

/// Narrowest pulse a square channel can be configured with.
pub const MIN_DUTY: f64 = 0.1;
/// Widest pulse a square channel can be configured with.
pub const MAX_DUTY: f64 = 0.9;

pub const DEFAULT_AMPLITUDE: f64 = 0.5;
pub const DEFAULT_DUTY: f64 = 0.5;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ChannelKind {
    /// Pulse wave with a configurable duty cycle.
    Square,
    /// Sine wave.
    Wave,
    /// White noise, independent of the played note.
    Noise,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Square => "square",
            ChannelKind::Wave => "wave",
            ChannelKind::Noise => "noise",
        };
        f.write_str(name)
    }
}

/// Position inside one period of a wave, in the half-open interval [0, 1).
#[derive(Debug, Copy, Clone)]
pub struct Phase(f64);

impl Phase {
    pub const ZERO: Phase = Phase(0.0);

    pub fn new(offset: f64) -> Phase {
        Phase(offset - offset.floor())
    }

    /// Phase of a wave of the given frequency, `t` seconds after it started.
    pub fn at(frequency: f64, t: f64) -> Phase {
        Phase::new(frequency * t)
    }

    pub fn offset(self) -> f64 {
        self.0
    }
}

/// A source of samples for one channel.
pub trait ChannelGenerator {
    /// Evaluate the channel `t` seconds after the start of the note.
    fn sample_at(&mut self, t: f64) -> f64;

    /// Evaluate the channel at `sample_count` consecutive sample times.
    fn render(&mut self, sample_count: usize, sample_rate: u32) -> SampleBuffer {
        let rate = sample_rate as f64;
        let samples = (0..sample_count)
            .map(|index| self.sample_at(index as f64 / rate))
            .collect();
        SampleBuffer::from_samples(sample_rate, samples)
    }
}

/// Alternates between `+amplitude` and `-amplitude`, staying high for the `duty` fraction of each period.
#[derive(Debug)]
pub struct Pulse {
    pub frequency: f64,
    pub amplitude: f64,
    pub duty: f64,
}

impl ChannelGenerator for Pulse {
    fn sample_at(&mut self, t: f64) -> f64 {
        if Phase::at(self.frequency, t).offset() < self.duty {
            self.amplitude
        } else {
            -self.amplitude
        }
    }
}

#[derive(Debug)]
pub struct Sine {
    pub frequency: f64,
    pub amplitude: f64,
}

impl ChannelGenerator for Sine {
    fn sample_at(&mut self, t: f64) -> f64 {
        self.amplitude * (Phase::at(self.frequency, t).offset() * 2.0 * PI).sin()
    }
}

/// Uniform white noise drawn from `rng`, one value per sample.
pub struct Noise<'r, R> {
    pub amplitude: f64,
    pub rng: &'r mut R,
}

impl<R: Rng> ChannelGenerator for Noise<'_, R> {
    fn sample_at(&mut self, _t: f64) -> f64 {
        self.amplitude * self.rng.random_range(-1.0f64..1.0)
    }
}

/// Falls from `+amplitude` to `-amplitude` over the first half of each period and rises back.
#[derive(Debug)]
pub struct Triangle {
    pub frequency: f64,
    pub amplitude: f64,
}

impl ChannelGenerator for Triangle {
    fn sample_at(&mut self, t: f64) -> f64 {
        let phase = Phase::at(self.frequency, t).offset();
        self.amplitude * (2.0 * (2.0 * phase - 1.0).abs() - 1.0)
    }
}

/// Ramps from `-amplitude` up to `+amplitude` once per period.
#[derive(Debug)]
pub struct Sawtooth {
    pub frequency: f64,
    pub amplitude: f64,
}

impl ChannelGenerator for Sawtooth {
    fn sample_at(&mut self, t: f64) -> f64 {
        self.amplitude * (2.0 * Phase::at(self.frequency, t).offset() - 1.0)
    }
}

/// Waveforms that can be rendered on their own, outside of the console channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
        Waveform::Noise,
    ];
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Noise => "noise",
        };
        f.write_str(name)
    }
}

/// Check the parameters shared by all generators and return the number of samples to render.
fn checked_length(
    frequency: f64,
    amplitude: f64,
    duration: f64,
    sample_rate: u32,
) -> Result<usize> {
    if sample_rate == 0 {
        return Err(Error::InvalidParameter {
            parameter: "sample rate",
            value: 0.0,
        });
    }
    in_range("duration", duration, 0.0, f64::MAX)?;
    let count = checked_sample_count(duration, sample_rate)?;
    in_range("frequency", frequency, 0.0, f64::MAX)?;
    in_range("amplitude", amplitude, 0.0, 1.0)?;
    Ok(count)
}

/// Render `duration` seconds of one channel.
///
/// `shape` is the duty cycle of a square channel and ignored by the other kinds.
/// The noise channel ignores the frequency unless it is zero.
/// A frequency of zero is a rest, rendered as exact silence by every kind.
///
/// ```
/// use apu_synth::channel::*;
///
/// let mut rng = rand::rng();
/// let square = generate_channel(ChannelKind::Square, 441.0, 0.5, 0.5, 0.01, 44100, &mut rng).unwrap();
/// assert_eq!(square.len(), 441);
/// assert_eq!(&square.samples()[..3], &[0.5, 0.5, 0.5]);
/// assert_eq!(square.samples()[60], -0.5);
/// ```
pub fn generate_channel<R: Rng>(
    kind: ChannelKind,
    frequency: f64,
    amplitude: f64,
    shape: f64,
    duration: f64,
    sample_rate: u32,
    rng: &mut R,
) -> Result<SampleBuffer> {
    let count = checked_length(frequency, amplitude, duration, sample_rate)?;
    if kind == ChannelKind::Square && !(shape > 0.0 && shape < 1.0) {
        return Err(Error::InvalidParameter {
            parameter: "duty",
            value: shape,
        });
    }

    if frequency == 0.0 {
        return Ok(SampleBuffer::silence(sample_rate, count));
    }
    let buffer = match kind {
        ChannelKind::Square => Pulse {
            frequency,
            amplitude,
            duty: shape,
        }
        .render(count, sample_rate),
        ChannelKind::Wave => Sine {
            frequency,
            amplitude,
        }
        .render(count, sample_rate),
        ChannelKind::Noise => Noise { amplitude, rng }.render(count, sample_rate),
    };
    Ok(buffer)
}

/// Render `duration` seconds of a single waveform, with square waves at half duty.
///
/// The parameters are checked like in [`generate_channel`], and a frequency of zero is silence.
pub fn generate_waveform<R: Rng>(
    waveform: Waveform,
    frequency: f64,
    amplitude: f64,
    duration: f64,
    sample_rate: u32,
    rng: &mut R,
) -> Result<SampleBuffer> {
    let count = checked_length(frequency, amplitude, duration, sample_rate)?;
    if frequency == 0.0 {
        return Ok(SampleBuffer::silence(sample_rate, count));
    }
    let buffer = match waveform {
        Waveform::Sine => Sine {
            frequency,
            amplitude,
        }
        .render(count, sample_rate),
        Waveform::Square => Pulse {
            frequency,
            amplitude,
            duty: DEFAULT_DUTY,
        }
        .render(count, sample_rate),
        Waveform::Triangle => Triangle {
            frequency,
            amplitude,
        }
        .render(count, sample_rate),
        Waveform::Sawtooth => Sawtooth {
            frequency,
            amplitude,
        }
        .render(count, sample_rate),
        Waveform::Noise => Noise { amplitude, rng }.render(count, sample_rate),
    };
    Ok(buffer)
}

/// Settings of one channel for a whole render.
///
/// Values are checked when set and never clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelConfig {
    label: String,
    kind: ChannelKind,
    active: bool,
    amplitude: f64,
    duty: f64,
}

impl ChannelConfig {
    /// An active channel. The duty cycle is only checked for square channels.
    pub fn new(kind: ChannelKind, amplitude: f64, duty: f64) -> Result<Self> {
        Self::preset(kind.to_string(), kind, true)
            .with_amplitude(amplitude)?
            .with_duty(duty)
    }

    pub fn square(amplitude: f64, duty: f64) -> Result<Self> {
        Self::new(ChannelKind::Square, amplitude, duty)
    }

    pub fn wave(amplitude: f64) -> Result<Self> {
        Self::new(ChannelKind::Wave, amplitude, DEFAULT_DUTY)
    }

    pub fn noise(amplitude: f64) -> Result<Self> {
        Self::new(ChannelKind::Noise, amplitude, DEFAULT_DUTY)
    }

    /// The four console channels in their default state, where all but the noise channel are active.
    pub fn console_defaults() -> Vec<ChannelConfig> {
        vec![
            Self::preset("Square 1", ChannelKind::Square, true),
            Self::preset("Square 2", ChannelKind::Square, true),
            Self::preset("Wave", ChannelKind::Wave, true),
            Self::preset("Noise", ChannelKind::Noise, false),
        ]
    }

    fn preset(label: impl Into<String>, kind: ChannelKind, active: bool) -> Self {
        Self {
            label: label.into(),
            kind,
            active,
            amplitude: DEFAULT_AMPLITUDE,
            duty: DEFAULT_DUTY,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Result<Self> {
        self.amplitude = in_range("amplitude", amplitude, 0.0, 1.0)?;
        Ok(self)
    }

    pub fn with_duty(mut self, duty: f64) -> Result<Self> {
        if self.kind == ChannelKind::Square {
            in_range("duty", duty, MIN_DUTY, MAX_DUTY)?;
        }
        self.duty = duty;
        Ok(self)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn duty(&self) -> f64 {
        self.duty
    }

    /// Render this channel at `frequency` for `duration` seconds.
    pub fn generate<R: Rng>(
        &self,
        frequency: f64,
        duration: f64,
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<SampleBuffer> {
        generate_channel(
            self.kind,
            frequency,
            self.amplitude,
            self.duty,
            duration,
            sample_rate,
            rng,
        )
    }
}

impl fmt::Display for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) amplitude {:.2}", self.label, self.kind, self.amplitude)?;
        if self.kind == ChannelKind::Square {
            write!(f, " duty {:.2}", self.duty)?;
        }
        if !self.active {
            f.write_str(" off")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const KINDS: [ChannelKind; 3] = [ChannelKind::Square, ChannelKind::Wave, ChannelKind::Noise];

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn rest_is_silence() {
        for &kind in KINDS.iter() {
            let buffer = generate_channel(kind, 0.0, 1.0, 0.5, 0.25, 44100, &mut rng()).unwrap();
            assert_eq!(buffer.len(), 11025);
            assert!(buffer.iter().all(|&s| s == 0.0), "{} is not silent", kind);
        }
    }

    #[test]
    fn length_is_rounded() {
        for &kind in KINDS.iter() {
            let buffer =
                generate_channel(kind, 440.0, 0.5, 0.5, 0.123456, 8000, &mut rng()).unwrap();
            assert_eq!(buffer.len(), 988);
            assert_eq!(buffer.sample_rate(), 8000);
        }
    }

    #[test]
    fn square_duty() {
        // 441 Hz at 44100 Hz has a period of exactly 100 samples
        for &duty in &[0.1, 0.25, 0.5, 0.75, 0.9] {
            let buffer =
                generate_channel(ChannelKind::Square, 441.0, 0.8, duty, 1.0, 44100, &mut rng())
                    .unwrap();
            let period = &buffer.samples()[..100];
            assert!(period.iter().all(|&s| s == 0.8 || s == -0.8));
            let high = period.iter().filter(|&&s| s == 0.8).count() as f64;
            assert!((high - duty * 100.0).abs() <= 1.0, "duty {}: {} high", duty, high);
        }
    }

    #[test]
    fn sine_shape() {
        let buffer =
            generate_channel(ChannelKind::Wave, 441.0, 0.5, 0.5, 0.01, 44100, &mut rng()).unwrap();
        let samples = buffer.samples();
        assert_eq!(samples[0], 0.0);
        assert!((samples[25] - 0.5).abs() < 1e-9);
        assert!(samples[50].abs() < 1e-9);
        assert!((samples[75] + 0.5).abs() < 1e-9);
        assert!(buffer.peak() <= 0.5);
    }

    #[test]
    fn noise_is_bounded_and_fresh() {
        let mut rng = rng();
        let first =
            generate_channel(ChannelKind::Noise, 440.0, 0.3, 0.5, 0.1, 44100, &mut rng).unwrap();
        let second =
            generate_channel(ChannelKind::Noise, 440.0, 0.3, 0.5, 0.1, 44100, &mut rng).unwrap();
        assert!(first.iter().all(|s| s.abs() <= 0.3));
        assert_ne!(first, second);
        // not a constant signal
        assert!(first.samples().windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn invalid_parameters() {
        let invalid = |kind, frequency, amplitude, shape, duration, sample_rate| {
            let result = generate_channel(
                kind,
                frequency,
                amplitude,
                shape,
                duration,
                sample_rate,
                &mut rng(),
            );
            match result {
                Err(Error::InvalidParameter { parameter, .. }) => parameter,
                other => panic!("accepted: {:?}", other),
            }
        };
        assert_eq!(invalid(ChannelKind::Square, 440.0, 0.5, 0.0, 1.0, 44100), "duty");
        assert_eq!(invalid(ChannelKind::Square, 440.0, 0.5, 1.0, 1.0, 44100), "duty");
        assert_eq!(invalid(ChannelKind::Wave, 440.0, 1.5, 0.5, 1.0, 44100), "amplitude");
        assert_eq!(invalid(ChannelKind::Noise, 440.0, -0.1, 0.5, 1.0, 44100), "amplitude");
        assert_eq!(invalid(ChannelKind::Wave, -1.0, 0.5, 0.5, 1.0, 44100), "frequency");
        assert_eq!(invalid(ChannelKind::Wave, 440.0, 0.5, 0.5, -1.0, 44100), "duration");
        assert_eq!(invalid(ChannelKind::Wave, 440.0, 0.5, 0.5, f64::NAN, 44100), "duration");
        assert_eq!(invalid(ChannelKind::Square, 440.0, 0.5, 0.5, 1e300, 44100), "duration");
        assert_eq!(invalid(ChannelKind::Noise, 0.0, 0.5, 0.5, f64::MAX, 44100), "duration");
        assert_eq!(invalid(ChannelKind::Wave, 440.0, 0.5, 0.5, 1.0, 0), "sample rate");

        // the duty cycle only matters for pulses
        let wave = generate_channel(ChannelKind::Wave, 440.0, 0.5, 7.0, 0.1, 44100, &mut rng());
        assert!(wave.is_ok());
    }

    #[test]
    fn triangle_shape() {
        // one period is 100 samples long
        let buffer =
            generate_waveform(Waveform::Triangle, 441.0, 0.5, 0.01, 44100, &mut rng()).unwrap();
        let samples = buffer.samples();
        assert_eq!(samples.len(), 441);
        assert_eq!(samples[0], 0.5);
        assert!(samples[25].abs() < 1e-9);
        assert!((samples[50] + 0.5).abs() < 1e-9);
        assert!(samples[75].abs() < 1e-9);
        assert!(samples[..50].windows(2).all(|w| w[0] > w[1]));
        assert!(samples[51..100].windows(2).all(|w| w[0] < w[1]));
        assert!(buffer.peak() <= 0.5);
    }

    #[test]
    fn sawtooth_shape() {
        let buffer =
            generate_waveform(Waveform::Sawtooth, 441.0, 0.8, 0.01, 44100, &mut rng()).unwrap();
        let samples = buffer.samples();
        assert_eq!(samples[0], -0.8);
        assert!(samples[50].abs() < 1e-9);
        assert!((samples[99] - 0.8 * 0.98).abs() < 1e-9);
        assert!(samples[..100].windows(2).all(|w| w[0] < w[1]));
        // drops back in the next period
        assert!(samples[101] < 0.0);
        assert!(buffer.peak() <= 0.8);
    }

    #[test]
    fn waveforms_match_channels() {
        let square =
            generate_waveform(Waveform::Square, 440.0, 0.5, 0.1, 44100, &mut rng()).unwrap();
        let pulse =
            generate_channel(ChannelKind::Square, 440.0, 0.5, 0.5, 0.1, 44100, &mut rng()).unwrap();
        assert_eq!(square, pulse);
        let sine = generate_waveform(Waveform::Sine, 440.0, 0.5, 0.1, 44100, &mut rng()).unwrap();
        let wave =
            generate_channel(ChannelKind::Wave, 440.0, 0.5, 0.5, 0.1, 44100, &mut rng()).unwrap();
        assert_eq!(sine, wave);

        for &waveform in Waveform::ALL.iter() {
            let rest = generate_waveform(waveform, 0.0, 1.0, 0.05, 44100, &mut rng()).unwrap();
            assert_eq!(rest.len(), 2205);
            assert!(rest.iter().all(|&s| s == 0.0), "{} is not silent", waveform);
            assert!(generate_waveform(waveform, 440.0, 2.0, 0.05, 44100, &mut rng()).is_err());
            assert!(generate_waveform(waveform, 440.0, 0.5, 1e300, 44100, &mut rng()).is_err());
        }
    }

    #[test]
    fn config_validation() {
        assert!(ChannelConfig::square(0.5, 0.05).is_err());
        assert!(ChannelConfig::square(0.5, 0.95).is_err());
        assert!(ChannelConfig::square(1.01, 0.5).is_err());
        assert!(ChannelConfig::wave(-0.5).is_err());
        assert!(ChannelConfig::noise(f64::NAN).is_err());

        let square = ChannelConfig::square(0.0, 0.1).unwrap();
        assert!(square.is_active());
        assert_eq!(square.duty(), 0.1);
        assert_eq!(square.amplitude(), 0.0);

        let wave = ChannelConfig::wave(1.0).unwrap().with_duty(0.0).unwrap();
        assert_eq!(wave.kind(), ChannelKind::Wave);
    }

    #[test]
    fn console_channels() {
        let channels = ChannelConfig::console_defaults();
        let labels: Vec<_> = channels.iter().map(|c| c.label()).collect();
        assert_eq!(labels, ["Square 1", "Square 2", "Wave", "Noise"]);
        let active: Vec<_> = channels.iter().map(|c| c.is_active()).collect();
        assert_eq!(active, [true, true, true, false]);
        assert_eq!(channels[0].to_string(), "Square 1 (square) amplitude 0.50 duty 0.50");
        assert_eq!(channels[3].to_string(), "Noise (noise) amplitude 0.50 off");
    }
}
