// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Mapping note names to frequencies.

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::note::*;

/// Name of the silent note.
pub const REST: &str = "REST";

/// Lowest note of the table (A0).
pub const LOWEST_NOTE: u8 = 21;

/// Highest note of the table (C8).
pub const HIGHEST_NOTE: u8 = 108;

/// Defines the tuning of an instrument by assinging a frequency to a certain note.
/// This defines the frequencies of all other notes at a standard tuning of 12 half-tones per octave.
///
/// # Examples
///
/// ```
/// use apu_synth::note::*;
/// use apu_synth::tuning::*;
/// assert_eq!(Tuning::default().frequency(Note::from_midi(57)), 220.0);
/// assert_eq!(Tuning::default().frequency(Note::from_midi(81)), 880.0);
/// ```
pub struct Tuning {
    pub reference_note: Note,
    pub reference_frequency: f64,
}

impl Tuning {
    /// Return the frequency of a note relative to this tuning.
    pub fn frequency(&self, other: Note) -> f64 {
        let semitones = other.index() - self.reference_note.index();
        let octaves = semitones as f64 / 12.0;
        self.reference_frequency * 2.0f64.powf(octaves)
    }
}

/// Default concert tuning, where A4 corresponds to 440 Hz.
impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            reference_note: Note::from_midi(69),
            reference_frequency: 440.0,
        }
    }
}

/// Frequencies of the 88 piano keys from A0 to C8, plus the silent `REST`.
///
/// Frequencies are rounded to two decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    /// Indexed by MIDI note minus [`LOWEST_NOTE`].
    frequencies: Vec<f64>,
}

impl NoteTable {
    pub fn new(tuning: &Tuning) -> Self {
        let frequencies = (LOWEST_NOTE..=HIGHEST_NOTE)
            .map(|midi| round_cents(tuning.frequency(Note::from_midi(midi))))
            .collect();
        Self { frequencies }
    }

    /// The process-wide table in concert tuning.
    pub fn standard() -> &'static NoteTable {
        static STANDARD: OnceLock<NoteTable> = OnceLock::new();
        STANDARD.get_or_init(|| NoteTable::new(&Tuning::default()))
    }

    /// Look up the frequency of a spelled note, where `REST` is 0 Hz.
    ///
    /// ```
    /// use apu_synth::tuning::*;
    ///
    /// let table = NoteTable::standard();
    /// assert_eq!(table.frequency_of("A4"), Ok(440.0));
    /// assert_eq!(table.frequency_of("C4"), Ok(261.63));
    /// assert_eq!(table.frequency_of("REST"), Ok(0.0));
    /// assert!(table.frequency_of("H9").is_err());
    /// ```
    pub fn frequency_of(&self, name: &str) -> Result<f64> {
        if is_rest(name) {
            return Ok(0.0);
        }
        Note::named_str(name)
            .and_then(|note| self.frequency(note))
            .ok_or_else(|| Error::UnknownNote {
                name: name.to_string(),
            })
    }

    /// Frequency of a note, if it is one of the piano keys.
    pub fn frequency(&self, note: Note) -> Option<f64> {
        let index = note.to_midi().checked_sub(LOWEST_NOTE)?;
        self.frequencies.get(index as usize).copied()
    }

    /// Number of entries, including `REST`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.frequencies.len() + 1
    }

    /// All entries in MIDI order with their sharp spelling, followed by `REST`.
    pub fn iter(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.frequencies
            .iter()
            .enumerate()
            .map(|(index, freq)| {
                let note = Note::from_midi(LOWEST_NOTE + index as u8);
                (note.to_string(), *freq)
            })
            .chain(std::iter::once((REST.to_string(), 0.0)))
    }
}

/// Whether `name` denotes the silent note.
pub fn is_rest(name: &str) -> bool {
    name.eq_ignore_ascii_case(REST)
}

/// Look up a note in the standard table.
pub fn frequency_of(name: &str) -> Result<f64> {
    NoteTable::standard().frequency_of(name)
}

fn round_cents(frequency: f64) -> f64 {
    (frequency * 100.0).round() / 100.0
}
