// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Errors reported while turning notes into samples.

use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("Unknown note {:?}", name))]
    UnknownNote { name: String },
    #[snafu(display("Invalid {} {}", parameter, value))]
    InvalidParameter { parameter: &'static str, value: f64 },
    #[snafu(display("No active channel to render"))]
    NoActiveChannels {},
    #[snafu(display(
        "Cannot mix a buffer of {} samples with buffers of {} samples",
        actual,
        expected
    ))]
    MismatchedBuffers { expected: usize, actual: usize },
    #[snafu(display(
        "Cannot mix a buffer sampled at {} Hz with buffers sampled at {} Hz",
        actual,
        expected
    ))]
    MismatchedSampleRate { expected: u32, actual: u32 },
    #[snafu(display("Line {}: {}", line, message))]
    MelodySyntax { line: usize, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Accept `value` if it lies in the inclusive range `[min, max]`.
///
/// NaN is never accepted.
///
/// ```
/// use apu_synth::error::*;
///
/// assert_eq!(in_range("duty", 0.5, 0.1, 0.9), Ok(0.5));
/// assert!(in_range("duty", 0.95, 0.1, 0.9).is_err());
/// assert!(in_range("duty", f64::NAN, 0.1, 0.9).is_err());
/// ```
pub fn in_range(parameter: &'static str, value: f64, min: f64, max: f64) -> Result<f64> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { parameter, value })
    }
}
