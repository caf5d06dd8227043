// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! This is the namespace for all parts dealing with data in sampled waves.

use crate::error::{Error, Result};

/// Samples per second used when nothing else is requested.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Number of samples covering `duration` seconds.
///
/// ```
/// use apu_synth::wave::*;
///
/// assert_eq!(sample_count(0.1, 44100), 4410);
/// assert_eq!(sample_count(0.05, 44100), 2205);
/// assert_eq!(sample_count(0.0, 44100), 0);
/// ```
pub fn sample_count(duration: f64, sample_rate: u32) -> usize {
    (sample_rate as f64 * duration).round() as usize
}

/// Upper bound on the length of a buffer of `f64` samples.
pub const MAX_SAMPLES: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Like [`sample_count`], but rejects durations whose samples could not be stored.
///
/// ```
/// use apu_synth::wave::*;
///
/// assert_eq!(checked_sample_count(0.1, 44100), Ok(4410));
/// assert!(checked_sample_count(1e300, 44100).is_err());
/// assert!(checked_sample_count(-1.0, 44100).is_err());
/// ```
pub fn checked_sample_count(duration: f64, sample_rate: u32) -> Result<usize> {
    let count = (sample_rate as f64 * duration).round();
    if count >= 0.0 && count < MAX_SAMPLES as f64 {
        Ok(count as usize)
    } else {
        Err(Error::InvalidParameter {
            parameter: "duration",
            value: duration,
        })
    }
}

/// A mono buffer holding floating point audio data.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl SampleBuffer {
    pub fn from_samples(sample_rate: u32, samples: Vec<f64>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// A buffer of `sample_count` zero samples.
    pub fn silence(sample_rate: u32, sample_count: usize) -> Self {
        Self::from_samples(sample_rate, vec![0.0; sample_count])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Size of the buffer in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the buffer in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    /// The largest absolute sample value, zero for an empty buffer.
    ///
    /// ```
    /// use apu_synth::wave::*;
    ///
    /// let buffer = SampleBuffer::from_samples(4, vec![0.25, -0.75, 0.5, 0.0]);
    /// assert_eq!(buffer.peak(), 0.75);
    /// ```
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |peak, s| peak.max(s.abs()))
    }

    /// The first `millis` milliseconds of the buffer, or all of it if it is shorter.
    pub fn window_ms(&self, millis: f64) -> &[f64] {
        let count = sample_count(millis / 1000.0, self.sample_rate);
        &self.samples[..count.min(self.len())]
    }

    /// Size of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * std::mem::size_of::<f64>()
    }

    /// Copy the `f64` samples to little endian bytes.
    ///
    /// Returns the number of samples that were actually copied.
    /// Might be less than the number of input samples if the output buffer was not large enough.
    pub fn copy_bytes_to(&self, bytes: &mut [u8]) -> usize {
        let mut processed = 0;
        for (sample, target) in self.samples.iter().zip(bytes.chunks_exact_mut(8)) {
            target.copy_from_slice(&sample.to_le_bytes());
            processed += 1;
        }
        processed
    }
}
