// Absolute pitches: note-name parsing, keys, and chord/scale spelling.
//
// A `Pitch` is a MIDI-style note number: `(octave + 2) * 12 + pitch_class`,
// so "C4" is 72 and "A3" is 69. Note names are a letter A-G (either case),
// an optional accidental (`#`, or a lowercase `b` for flat), and one or more
// octave digits. Flats and other odd spellings ("E#", "Cb") are rewritten to
// their sharp equivalent before lookup, and the octave is kept as written.
//
// Two entry points: `parse_note_name` returns a `Result` for callers that
// want the error, `resolve` logs the error and yields `None` for callers that
// treat a bad name as an undefined pitch.
//
// `Key` is a validated pitch class; `scale_pitches` and `chord_pitches` spell
// out absolute pitches above a key root for melody.rs and compose.rs.

use crate::error::MuseError;
use crate::theory::{CHROMATIC, ChordSymbol, Mode, pitch_class_index, sharp_equivalent};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Absolute note number (MIDI numbering).
pub type Pitch = i32;

/// Octave number that maps to note number 0.
const OCTAVE_OFFSET: i32 = 2;

/// Parse a note name such as "C#4", "db3", or "A10" into a pitch.
pub fn parse_note_name(name: &str) -> Result<Pitch, MuseError> {
    let bad = || MuseError::Parse {
        input: name.to_string(),
    };

    let mut chars = name.chars();
    // Only the letter is capitalized; a lowercase 'b' after it is a flat.
    let letter = chars.next().ok_or_else(bad)?.to_ascii_uppercase();
    if !('A'..='G').contains(&letter) {
        return Err(bad());
    }

    let rest = chars.as_str();
    let (accidental, digits) = if let Some(d) = rest.strip_prefix('#') {
        ("#", d)
    } else if let Some(d) = rest.strip_prefix('b') {
        ("b", d)
    } else {
        ("", rest)
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let octave: i32 = digits.parse().map_err(|_| bad())?;

    let spelled = format!("{letter}{accidental}");
    let sharp = sharp_equivalent(&spelled).unwrap_or(spelled.as_str());
    let index = pitch_class_index(sharp).ok_or_else(bad)?;

    octave
        .checked_add(OCTAVE_OFFSET)
        .and_then(|o| o.checked_mul(12))
        .and_then(|p| p.checked_add(index as i32))
        .ok_or_else(bad)
}

/// Lenient form of `parse_note_name`: logs malformed input and returns `None`.
pub fn resolve(name: &str) -> Option<Pitch> {
    match parse_note_name(name) {
        Ok(pitch) => Some(pitch),
        Err(err) => {
            warn!(%err, "unresolvable note name");
            None
        }
    }
}

/// Frequency in Hz of a pitch under equal temperament, A = 440 Hz at 69.
pub fn midi_to_frequency(pitch: Pitch) -> f64 {
    440.0 * 2f64.powf((pitch - 69) as f64 / 12.0)
}

/// The tonic of a song, stored as a pitch class 0-11.
///
/// Serializes as its sharp spelling ("C#"), and parses any spelling the
/// note-name parser accepts ("Db", "c", "B#").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    pitch_class: u8,
}

impl Key {
    pub fn new(name: &str) -> Result<Self, MuseError> {
        let bad = || MuseError::Parse {
            input: name.to_string(),
        };
        if name.bytes().any(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        // Any octave works; 0 keeps the arithmetic small.
        let pitch = parse_note_name(&format!("{name}0")).map_err(|_| bad())?;
        Ok(Key {
            pitch_class: pitch.rem_euclid(12) as u8,
        })
    }

    /// Key for a `CHROMATIC` index. Wraps indices past 11.
    pub fn from_index(index: usize) -> Self {
        Key {
            pitch_class: (index % 12) as u8,
        }
    }

    pub fn pitch_class(self) -> u8 {
        self.pitch_class
    }

    pub fn name(self) -> &'static str {
        CHROMATIC[self.pitch_class() as usize]
    }

    /// The key's root note in the given octave, e.g. C in octave 2 is 48.
    pub fn root(self, octave: u8) -> Pitch {
        (octave as i32 + OCTAVE_OFFSET) * 12 + self.pitch_class() as i32
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Key {
    type Error = MuseError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Key::new(&name)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.name().to_string()
    }
}

/// The eight scale pitches (root through octave) of `key` in `octave`.
pub fn scale_pitches(key: Key, octave: u8, mode: Mode) -> [Pitch; 8] {
    let root = key.root(octave);
    let offsets = *mode.scale();
    offsets.map(|offset| root + offset)
}

/// Absolute chord tones of `chord` built on `base`.
pub fn chord_pitches(chord: ChordSymbol, base: Pitch) -> Vec<Pitch> {
    chord.offsets().iter().map(|&offset| base + offset).collect()
}
