// apu-synth -- a four channel retro console sound synthesizer
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Melodies, and a simple textual format for writing them down.
//!
//! A melody file is a sequence of `NOTE:SECONDS` items separated by whitespace.
//! Everything after a `;` until the end of the line is ignored.
//!
//! ```text
//! ; the first bar
//! E4:0.4 B3:0.2 C4:0.2 D4:0.4 G#4:0.2
//! REST:0.2
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// A note held for some time. The note is either a spelled pitch like `C#5` or `REST`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub note: String,
    /// How long the note is held, in seconds.
    pub duration: f64,
}

/// Notes played one after another.
pub type Melody = Vec<NoteEvent>;

impl NoteEvent {
    pub fn new(note: impl Into<String>, duration: f64) -> Self {
        Self {
            note: note.into(),
            duration,
        }
    }

    pub fn rest(duration: f64) -> Self {
        Self::new(crate::tuning::REST, duration)
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.note, self.duration)
    }
}

/// Build a melody from `(note, seconds)` pairs.
pub fn from_pairs(pairs: &[(&str, f64)]) -> Melody {
    pairs
        .iter()
        .map(|&(note, duration)| NoteEvent::new(note, duration))
        .collect()
}

/// The theme of a well-known falling blocks game.
pub fn tetris() -> Melody {
    from_pairs(&[
        ("E4", 0.4),
        ("B3", 0.2),
        ("C4", 0.2),
        ("D4", 0.4),
        ("C4", 0.2),
        ("B3", 0.2),
        ("A3", 0.4),
        ("A3", 0.2),
        ("C4", 0.2),
        ("E4", 0.4),
        ("D4", 0.2),
        ("C4", 0.2),
        ("B3", 0.4),
        ("B3", 0.2),
        ("C4", 0.2),
        ("D4", 0.4),
        ("E4", 0.4),
        ("C4", 0.4),
        ("A3", 0.4),
        ("A3", 0.4),
    ])
}

/// Parse a melody described in the textual format.
///
/// Note names are kept as written; they are only looked up when the melody is rendered.
///
/// ```
/// use apu_synth::melody::*;
///
/// let melody = parse_melody("A4:0.1 REST:0.05 ; breathe\nA4:0.1").unwrap();
/// assert_eq!(melody.len(), 3);
/// assert_eq!(melody[1], NoteEvent::rest(0.05));
/// ```
pub fn parse_melody(input: &str) -> Result<Melody> {
    let mut p = Parser::new(input);
    p.parse_root()
}

struct Parser<'a> {
    stream: Scan<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut stream = Scan::new(input);
        stream.skip_blank();
        Self { stream }
    }

    /// Parse the whole string as a melody, failing if not everything was consumed.
    fn parse_root(&mut self) -> Result<Melody> {
        let mut events = Vec::new();
        while !self.stream.is_eof() {
            events.push(self.parse_event()?);
            self.stream.skip_blank();
        }
        Ok(events)
    }

    fn parse_event(&mut self) -> Result<NoteEvent> {
        let note = self
            .stream
            .take_while(|ch| ch != ':' && ch != ';' && !ch.is_whitespace());
        if note.is_empty() {
            return Err(self.error("expected a note name"));
        }
        match self.stream.next() {
            Some(':') => {}
            _ => return Err(self.error(format!("expected ':' after {:?}", note))),
        }
        let duration_str = self.stream.take_while(|ch| ch != ';' && !ch.is_whitespace());
        let duration = duration_str
            .parse()
            .map_err(|_| self.error(format!("invalid duration {:?}", duration_str)))?;
        Ok(NoteEvent::new(note, duration))
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::MelodySyntax {
            line: self.stream.line(),
            message: message.into(),
        }
    }
}

struct Scan<'a> {
    input: &'a str,
    stream: std::iter::Peekable<std::str::CharIndices<'a>>,
    /// Number of line breaks consumed so far.
    line_breaks: usize,
}

impl<'a> Scan<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            stream: input.char_indices().peekable(),
            line_breaks: 0,
        }
    }

    fn is_eof(&mut self) -> bool {
        self.current().is_none()
    }

    /// One-based number of the line the scanner is on.
    fn line(&self) -> usize {
        self.line_breaks + 1
    }

    fn current(&mut self) -> Option<char> {
        self.stream.peek().map(|&(_, ch)| ch)
    }

    fn position(&mut self) -> usize {
        self.stream
            .peek()
            .map_or(self.input.len(), |&(pos, _)| pos)
    }

    fn next(&mut self) -> Option<char> {
        let (_, ch) = self.stream.next()?;
        if ch == '\n' {
            self.line_breaks += 1;
        }
        Some(ch)
    }

    /// Consume characters as long as `predicate` holds, and return them.
    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> &'a str {
        let start = self.position();
        while let Some(ch) = self.current() {
            if !predicate(ch) {
                break;
            }
            self.next();
        }
        let end = self.position();
        let input = self.input;
        &input[start..end]
    }

    /// Skip whitespace and comments.
    fn skip_blank(&mut self) {
        while let Some(ch) = self.current() {
            if ch == ';' {
                while let Some(ch) = self.next() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                self.next();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parser() {
        let mel = parse_melody(
            r"
            ; opening
            E4:0.4 B3:0.2 C4:0.2 D4:0.4
            C4:0.2 B3:0.2 A3:0.4   ; end of the bar
            rest:0.25
            ",
        )
        .unwrap();
        assert_eq!(mel.len(), 8);
        assert_eq!(mel[0], NoteEvent::new("E4", 0.4));
        assert_eq!(mel[6], NoteEvent::new("A3", 0.4));
        assert_eq!(mel[7], NoteEvent::new("rest", 0.25));
    }

    #[test]
    fn empty() {
        assert_eq!(parse_melody(""), Ok(vec![]));
        assert_eq!(parse_melody("  ; nothing\n\n"), Ok(vec![]));
    }

    #[test]
    fn names_are_not_resolved() {
        assert_eq!(parse_melody("H9:1"), Ok(vec![NoteEvent::new("H9", 1.0)]));
        assert_eq!(
            parse_melody("C#5:0.5;sharp\nDb5:0.5"),
            Ok(vec![NoteEvent::new("C#5", 0.5), NoteEvent::new("Db5", 0.5)])
        );
    }

    #[test]
    fn reports_lines() {
        assert_eq!(
            parse_melody("A4:0.1\nB4 0.2"),
            Err(Error::MelodySyntax {
                line: 2,
                message: "expected ':' after \"B4\"".to_string()
            })
        );
        assert_eq!(
            parse_melody("A4:0.1 ; fine\n\n  C4:fast"),
            Err(Error::MelodySyntax {
                line: 3,
                message: "invalid duration \"fast\"".to_string()
            })
        );
        assert_eq!(
            parse_melody(":0.1"),
            Err(Error::MelodySyntax {
                line: 1,
                message: "expected a note name".to_string()
            })
        );
        assert!(parse_melody("A4:").is_err());
    }

    #[test]
    fn builtin_theme() {
        let theme = tetris();
        assert_eq!(theme.len(), 20);
        let total: f64 = theme.iter().map(|e| e.duration).sum();
        assert!((total - 6.0).abs() < 1e-9);
        let written = theme
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(parse_melody(&written), Ok(theme));
    }
}
