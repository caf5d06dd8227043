// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Spelled notes like `C#5` and their MIDI numbers.

use std::fmt;

/// A key number in the MIDI convention, where C4 is 60 and A4 is 69.
///
/// Only A0 (21) to C8 (108) have a frequency in the note table,
/// but any of the 128 MIDI keys can be spelled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoteName {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl NoteName {
    fn from_letter(letter: char) -> Option<NoteName> {
        let name = match letter.to_ascii_uppercase() {
            'A' => NoteName::A,
            'B' => NoteName::B,
            'C' => NoteName::C,
            'D' => NoteName::D,
            'E' => NoteName::E,
            'F' => NoteName::F,
            'G' => NoteName::G,
            _ => return None,
        };
        Some(name)
    }

    /// Semitones above the C of the same octave.
    fn semitones(self) -> i64 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Accidental {
    Flat,
    Natural,
    Sharp,
}

impl Accidental {
    fn from_symbol(symbol: &str) -> Option<Accidental> {
        match symbol {
            "" => Some(Accidental::Natural),
            "#" | "♯" | "sharp" => Some(Accidental::Sharp),
            "b" | "♭" | "flat" => Some(Accidental::Flat),
            _ => None,
        }
    }

    fn semitones(self) -> i64 {
        match self {
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
        }
    }
}

const SHARP_SPELLING: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    /// The key with the given name, or `None` if it is outside the MIDI range.
    ///
    /// ```
    /// use apu_synth::note::*;
    ///
    /// assert_eq!(Note::try_named(NoteName::A, Accidental::Natural, 4), Some(Note::from_midi(69)));
    /// assert_eq!(Note::try_named(NoteName::G, Accidental::Flat, 2), Some(Note::from_midi(42)));
    /// assert_eq!(Note::try_named(NoteName::C, Accidental::Flat, -1), None);
    /// ```
    pub fn try_named(name: NoteName, accidental: Accidental, octave: i32) -> Option<Note> {
        // octave -1 starts at MIDI 0
        let c_of_octave = (octave as i64 + 1) * 12;
        Self::try_from_midi(c_of_octave + name.semitones() + accidental.semitones())
    }

    /// Parse `<letter><accidental><octave>`, e.g. `A4`, `c#5`, `Db3`, `F♯2` or `C-1`.
    ///
    /// ```
    /// # use apu_synth::note::*;
    /// assert_eq!(Note::named_str("a4"), Some(Note::from_midi(69)));
    /// assert_eq!(Note::named_str("Csharp6"), Some(Note::from_midi(85)));
    /// assert_eq!(Note::named_str("H9"), None);
    /// ```
    pub fn named_str(name_str: &str) -> Option<Note> {
        let mut chars = name_str.chars();
        let name = NoteName::from_letter(chars.next()?)?;
        let rest = chars.as_str();
        let octave_start = rest.find(|ch: char| ch.is_ascii_digit() || ch == '-')?;
        let (symbol, octave) = rest.split_at(octave_start);
        let accidental = Accidental::from_symbol(symbol)?;
        Note::try_named(name, accidental, octave.parse().ok()?)
    }

    /// # Panics
    ///
    /// - If `midi_note` is above 127.
    pub fn from_midi(midi_note: u8) -> Note {
        assert!(midi_note < 128, "MIDI only has notes 0 - 127");
        Note(midi_note)
    }

    pub fn try_from_midi(midi_note: i64) -> Option<Note> {
        if (0..128).contains(&midi_note) {
            Some(Note(midi_note as u8))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }

    pub fn index(self) -> i32 {
        self.0 as i32
    }

    pub fn octave(self) -> i32 {
        self.index() / 12 - 1
    }
}

/// Spells notes with sharps.
///
/// ```
/// # use apu_synth::note::*;
/// assert_eq!(Note::from_midi(21).to_string(), "A0");
/// assert_eq!(Note::named_str("Db4").unwrap().to_string(), "C#4");
/// ```
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pitch_class = SHARP_SPELLING[self.0 as usize % 12];
        write!(f, "{}{}", pitch_class, self.octave())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spelling_roundtrip() {
        for midi in 0..128 {
            let note = Note::from_midi(midi);
            assert_eq!(Note::named_str(&note.to_string()), Some(note));
        }
        assert_eq!(Note::from_midi(0).to_string(), "C-1");
        assert_eq!(Note::from_midi(127).to_string(), "G9");
    }

    #[test]
    fn enharmonics() {
        assert_eq!(Note::named_str("Cb4"), Note::named_str("B3"));
        assert_eq!(Note::named_str("E#4"), Note::named_str("F4"));
        assert_eq!(Note::named_str("Bflat3"), Note::named_str("A#3"));
        assert_eq!(Note::named_str("G♭2"), Note::named_str("F#2"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Note::named_str(""), None);
        assert_eq!(Note::named_str("Z"), None);
        assert_eq!(Note::named_str("A"), None);
        assert_eq!(Note::named_str("A#"), None);
        assert_eq!(Note::named_str("Ax4"), None);
        assert_eq!(Note::named_str("A4-"), None);
        assert_eq!(Note::named_str("G99"), None);
        assert_eq!(Note::named_str("C99999999999"), None);
    }
}
