// src/voicing.rs
//
// Chord voicing engine.
//
// Turns a ChordSpec into an ascending, octave-placed list of notes. When a
// previous voicing is given, the new chord is transposed as a block so its
// root sits as close as possible to the previous voicing's lowest note.
// This is a cheap approximation of voice leading, not a per-voice match.

use std::sync::OnceLock;

use crate::chord::{ChordFormulas, ChordSpec};
use crate::pitch::{Note, PitchClass};

/// Octave used when there is no previous voicing.
pub const DEFAULT_BASE_OCTAVE: i32 = 3;

/// Candidate octaves searched when centering on a previous voicing.
pub const CANDIDATE_OCTAVES: std::ops::RangeInclusive<i32> = 2..=5;

fn standard_formulas() -> &'static ChordFormulas {
    static STANDARD: OnceLock<ChordFormulas> = OnceLock::new();
    STANDARD.get_or_init(ChordFormulas::standard)
}

/// Voice a chord with the standard formula table.
///
/// `previous` is the prior voicing in output order; pass an empty slice
/// for the first chord. Returns an empty vector for an unknown quality or
/// an unresolvable root.
pub fn voice(chord: &ChordSpec, previous: &[Note]) -> Vec<Note> {
    voice_with(standard_formulas(), chord, previous)
}

/// [`voice`] expressed as absolute pitches.
pub fn voice_as_absolute_pitch(chord: &ChordSpec, previous: &[Note]) -> Vec<i32> {
    voice_as_absolute_pitch_with(standard_formulas(), chord, previous)
}

pub fn voice_as_absolute_pitch_with(
    formulas: &ChordFormulas,
    chord: &ChordSpec,
    previous: &[Note],
) -> Vec<i32> {
    voice_with(formulas, chord, previous)
        .iter()
        .map(Note::absolute)
        .collect()
}

/// Voice a chord against an explicit formula table.
pub fn voice_with(formulas: &ChordFormulas, chord: &ChordSpec, previous: &[Note]) -> Vec<Note> {
    let Some(offsets) = formulas.get(&chord.quality) else {
        return Vec::new();
    };
    let Some(root) = PitchClass::from_name(&chord.root) else {
        return Vec::new();
    };
    if offsets.is_empty() {
        return Vec::new();
    }

    let root = root.index();
    let base_octave = base_octave(root, previous);

    let mut notes: Vec<Note> = offsets
        .iter()
        .map(|&offset| {
            let step = root + offset as i32;
            Note::new(PitchClass::new(step), base_octave + step.div_euclid(12))
        })
        .collect();

    apply_inversion(&mut notes, chord.inversion);

    // Stable: equal pitches keep formula order.
    notes.sort_by_key(Note::absolute);
    notes
}

/// Pick the octave for the chord root.
///
/// Anchors on `previous[0]`, the lowest sounding note of the previous
/// voicing. After an inversion that is not the previous chord's root.
// TODO: anchor on the previous chord's declared root once callers pass it.
fn base_octave(root: i32, previous: &[Note]) -> i32 {
    let Some(anchor) = previous.first() else {
        return DEFAULT_BASE_OCTAVE;
    };
    let anchor = anchor.absolute();

    let mut best_octave = DEFAULT_BASE_OCTAVE;
    let mut min_distance = i32::MAX;
    for octave in CANDIDATE_OCTAVES {
        let distance = (octave * 12 + root - anchor).abs();
        if distance < min_distance {
            min_distance = distance;
            best_octave = octave;
        }
    }
    best_octave
}

/// Raise the first `inversion mod N` notes (formula order) by an octave,
/// then shift the whole chord by `floor(inversion / N)` octaves.
fn apply_inversion(notes: &mut [Note], inversion: i32) {
    let count = notes.len() as i32;
    if count == 0 {
        return;
    }

    let octave_shift = inversion.div_euclid(count);
    let effective = inversion.rem_euclid(count) as usize;

    for note in notes.iter_mut().take(effective) {
        note.octave += 1;
    }
    if octave_shift != 0 {
        for note in notes.iter_mut() {
            note.octave += octave_shift;
        }
    }
}
