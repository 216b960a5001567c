// src/pitch.rs
//
// Pitch model: pitch classes, enharmonic spelling and octave-placed notes.
//
// All pitches are spelled with flats. Absolute pitch is `octave * 12 + pc`
// (so C0 = 0 and C4 = 48); it is the unit of ordering and of
// voice-leading distance throughout the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NoteParseError;

/// Canonical (flat) pitch-class names, indexed by pitch class.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Alternate spellings mapped onto the canonical table.
const ENHARMONIC_EQUIVALENTS: [(&str, &str); 9] = [
    ("C#", "Db"),
    ("D#", "Eb"),
    ("F#", "Gb"),
    ("G#", "Ab"),
    ("A#", "Bb"),
    ("Cb", "B"),
    ("Fb", "E"),
    ("E#", "F"),
    ("B#", "C"),
];

/// One of the twelve equal-tempered pitch classes (0 = C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Wraps any integer into 0..12.
    #[inline]
    pub fn new(index: i32) -> Self {
        Self(index.rem_euclid(12) as u8)
    }

    #[inline]
    pub fn index(self) -> i32 {
        self.0 as i32
    }

    /// Canonical flat spelling.
    #[inline]
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.0 as usize]
    }

    /// Resolve a note name.
    ///
    /// Tries the canonical table first, then a single enharmonic
    /// substitution. Returns `None` if neither matches.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::lookup(name).or_else(|| {
            ENHARMONIC_EQUIVALENTS
                .iter()
                .find(|(alt, _)| *alt == name)
                .and_then(|(_, canonical)| Self::lookup(canonical))
        })
    }

    fn lookup(name: &str) -> Option<Self> {
        NOTE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self(i as u8))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pitch class placed in an octave.
///
/// Serialized as its name (`"Db3"`), which is what the UI and the sampler
/// exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Note {
    #[inline]
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Self {
            pitch_class,
            octave,
        }
    }

    /// Absolute pitch: `octave * 12 + pitch class`.
    #[inline]
    pub fn absolute(&self) -> i32 {
        self.octave * 12 + self.pitch_class.index()
    }

    /// Inverse of [`Note::absolute`].
    #[inline]
    pub fn from_absolute(pitch: i32) -> Self {
        Self {
            pitch_class: PitchClass::new(pitch),
            octave: pitch.div_euclid(12),
        }
    }

    /// MIDI note number (C4 = 60), if in range.
    pub fn midi(&self) -> Option<u8> {
        u8::try_from(self.absolute() + 12).ok().filter(|n| *n <= 127)
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.absolute().cmp(&other.absolute())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

impl FromStr for Note {
    type Err = NoteParseError;

    /// Parses `<name><octave>`, e.g. `C3`, `Bb2`, `F#4`, `C-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| NoteParseError(s.to_string()))?;
        let (name, octave) = s.split_at(split);

        let pitch_class = PitchClass::from_name(name).ok_or_else(|| NoteParseError(s.to_string()))?;
        let octave = octave
            .parse::<i32>()
            .map_err(|_| NoteParseError(s.to_string()))?;

        Ok(Self::new(pitch_class, octave))
    }
}

impl TryFrom<String> for Note {
    type Error = NoteParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.to_string()
    }
}
