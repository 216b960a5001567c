// src/chord.rs
//
// Chord descriptions and the quality → interval formula table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An abstract chord as the UI describes it.
///
/// `root` is a note name in any spelling the pitch model resolves
/// (`"C"`, `"Bb"`, `"F#"`). `quality` keys into [`ChordFormulas`].
/// `inversion` may be negative or larger than the chord size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSpec {
    pub root: String,
    pub quality: String,
    #[serde(default)]
    pub inversion: i32,
}

impl ChordSpec {
    pub fn new(root: impl Into<String>, quality: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            quality: quality.into(),
            inversion: 0,
        }
    }

    pub fn with_inversion(mut self, inversion: i32) -> Self {
        self.inversion = inversion;
        self
    }
}

/// Standard formulas: (name, aliases, offsets from the root).
///
/// Offsets are listed in table order, which is the order inversions
/// raise notes in. They are not required to be ascending.
const STANDARD_FORMULAS: &[(&str, &[&str], &[u8])] = &[
    // Triads
    ("major", &["", "M", "maj"], &[0, 4, 7]),
    ("minor", &["m", "min"], &[0, 3, 7]),
    ("diminished", &["dim", "d"], &[0, 3, 6]),
    ("augmented", &["aug", "+"], &[0, 4, 8]),
    ("sus2", &[], &[0, 2, 7]),
    ("sus4", &[], &[0, 5, 7]),
    ("5", &["power"], &[0, 7]),
    // Sixths
    ("6", &[], &[0, 4, 7, 9]),
    ("m6", &[], &[0, 3, 7, 9]),
    // Sevenths
    ("maj7", &["M7"], &[0, 4, 7, 11]),
    ("m7", &["min7"], &[0, 3, 7, 10]),
    ("7", &["dominant7"], &[0, 4, 7, 10]),
    ("dim7", &[], &[0, 3, 6, 9]),
    ("m7b5", &["half-diminished"], &[0, 3, 6, 10]),
    ("m(maj7)", &[], &[0, 3, 7, 11]),
    ("maj7#5", &[], &[0, 4, 8, 11]),
    ("7b5", &[], &[0, 4, 6, 10]),
    ("7#5", &[], &[0, 4, 8, 10]),
    // Extensions
    ("7b9", &[], &[0, 4, 7, 10, 13]),
    ("7#9", &[], &[0, 4, 7, 10, 15]),
    ("9", &[], &[0, 4, 7, 10, 14]),
    ("maj9", &[], &[0, 4, 7, 11, 14]),
    ("m9", &[], &[0, 3, 7, 10, 14]),
    ("m11", &[], &[0, 3, 7, 10, 14, 17]),
    ("13", &[], &[0, 4, 7, 10, 14, 21]),
];

/// Quality → ordered semitone offsets.
#[derive(Debug, Clone, Default)]
pub struct ChordFormulas {
    formulas: HashMap<String, Vec<u8>>,
}

impl ChordFormulas {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table, including symbol aliases.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (name, aliases, offsets) in STANDARD_FORMULAS {
            table.insert(*name, offsets.to_vec());
            for alias in *aliases {
                table.insert(*alias, offsets.to_vec());
            }
        }
        table
    }

    /// Add or replace a formula.
    pub fn insert(&mut self, quality: impl Into<String>, offsets: Vec<u8>) {
        self.formulas.insert(quality.into(), offsets);
    }

    pub fn get(&self, quality: &str) -> Option<&[u8]> {
        self.formulas.get(quality).map(Vec::as_slice)
    }

    pub fn contains(&self, quality: &str) -> bool {
        self.formulas.contains_key(quality)
    }

    pub fn qualities(&self) -> impl Iterator<Item = &str> {
        self.formulas.keys().map(String::as_str)
    }
}
