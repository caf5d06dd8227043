// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Combining the output of several channels.
//!
//! Notes of a melody are mixed by averaging their channels ([`mix_per_note`]),
//! whole waveforms are summed and then scaled to full volume
//! ([`mix_sum`] followed by [`normalize_peak`]).

use crate::error::{Error, Result};
use crate::wave::SampleBuffer;

/// Peaks below this level are not amplified any further by [`normalize_peak`].
pub const PEAK_FLOOR: f64 = 1e-5;

/// Add up the buffers sample by sample.
///
/// All buffers must have the same length and sample rate, and there must be at least one.
pub fn mix_sum(buffers: &[SampleBuffer]) -> Result<SampleBuffer> {
    let first = buffers.first().ok_or(Error::NoActiveChannels {})?;
    for buffer in &buffers[1..] {
        if buffer.len() != first.len() {
            return Err(Error::MismatchedBuffers {
                expected: first.len(),
                actual: buffer.len(),
            });
        }
        if buffer.sample_rate() != first.sample_rate() {
            return Err(Error::MismatchedSampleRate {
                expected: first.sample_rate(),
                actual: buffer.sample_rate(),
            });
        }
    }

    let mut mixed = vec![0.0f64; first.len()];
    for buffer in buffers {
        for (out, sample) in mixed.iter_mut().zip(buffer.iter()) {
            *out += sample;
        }
    }
    Ok(SampleBuffer::from_samples(first.sample_rate(), mixed))
}

/// Average the channels of a single note.
///
/// ```
/// use apu_synth::mixer::*;
/// use apu_synth::wave::SampleBuffer;
///
/// let a = SampleBuffer::from_samples(2, vec![0.5, -0.5]);
/// let b = SampleBuffer::from_samples(2, vec![0.5, 0.5]);
/// assert_eq!(mix_per_note(&[a, b]).unwrap().samples(), &[0.5, 0.0]);
/// ```
pub fn mix_per_note(buffers: &[SampleBuffer]) -> Result<SampleBuffer> {
    let sum = mix_sum(buffers)?;
    let channels = buffers.len() as f64;
    let averaged = sum.into_samples().into_iter().map(|s| s / channels).collect();
    Ok(SampleBuffer::from_samples(buffers[0].sample_rate(), averaged))
}

/// Scale the buffer so that its loudest sample has an amplitude of one.
///
/// Silence stays silent.
pub fn normalize_peak(buffer: &SampleBuffer) -> SampleBuffer {
    let peak = buffer.peak().max(PEAK_FLOOR);
    let samples = buffer.iter().map(|s| s / peak).collect();
    SampleBuffer::from_samples(buffer.sample_rate(), samples)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::channel::{generate_channel, ChannelKind};

    fn sine(frequency: f64, amplitude: f64) -> SampleBuffer {
        generate_channel(
            ChannelKind::Wave,
            frequency,
            amplitude,
            0.5,
            0.05,
            44100,
            &mut rand::rng(),
        )
        .unwrap()
    }

    #[test]
    fn averaging_keeps_amplitude() {
        for n in 1..=4 {
            let square = generate_channel(
                ChannelKind::Square,
                440.0,
                0.7,
                0.5,
                0.05,
                44100,
                &mut rand::rng(),
            )
            .unwrap();
            let buffers = vec![square.clone(); n];
            let mixed = mix_per_note(&buffers).unwrap();
            assert_eq!(mixed.len(), square.len());
            for (m, s) in mixed.iter().zip(square.iter()) {
                assert!((m - s).abs() < 1e-12);
            }
            assert!((mixed.peak() - 0.7).abs() < 1e-12);

            let wave = sine(330.0, 0.3);
            let mixed = mix_per_note(&vec![wave.clone(); n]).unwrap();
            assert!((mixed.peak() - wave.peak()).abs() < 1e-12);
        }
    }

    #[test]
    fn summing() {
        let a = SampleBuffer::from_samples(3, vec![0.5, -0.25, 0.0]);
        let b = SampleBuffer::from_samples(3, vec![0.75, -0.5, 0.25]);
        assert_eq!(mix_sum(&[a, b]).unwrap().samples(), &[1.25, -0.75, 0.25]);
    }

    #[test]
    fn nothing_to_mix() {
        assert_eq!(mix_per_note(&[]), Err(Error::NoActiveChannels {}));
        assert_eq!(mix_sum(&[]), Err(Error::NoActiveChannels {}));
    }

    #[test]
    fn mismatched_inputs() {
        let short = SampleBuffer::silence(44100, 10);
        let long = SampleBuffer::silence(44100, 11);
        assert_eq!(
            mix_per_note(&[short.clone(), long]),
            Err(Error::MismatchedBuffers {
                expected: 10,
                actual: 11
            })
        );
        let other_rate = SampleBuffer::silence(22050, 10);
        assert_eq!(
            mix_sum(&[short, other_rate]),
            Err(Error::MismatchedSampleRate {
                expected: 44100,
                actual: 22050
            })
        );
    }

    #[test]
    fn peak_normalization() {
        let mixed = mix_sum(&[sine(440.0, 0.5), sine(660.0, 0.5), sine(550.0, 0.2)]).unwrap();
        let normalized = normalize_peak(&mixed);
        assert!((normalized.peak() - 1.0).abs() < 1e-12);
        assert!(normalized.iter().all(|s| s.abs() <= 1.0));

        let quiet = SampleBuffer::from_samples(4, vec![0.0, 0.125, -0.25, 0.0625]);
        assert_eq!(normalize_peak(&quiet).samples(), &[0.0, 0.5, -1.0, 0.25]);
    }

    #[test]
    fn silence_stays_silent() {
        let silence = SampleBuffer::silence(44100, 100);
        assert_eq!(normalize_peak(&silence), silence);
        let empty = SampleBuffer::silence(44100, 0);
        assert!(normalize_peak(&empty).is_empty());
    }
}
