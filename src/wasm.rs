//! WebAssembly bindings via wasm-bindgen for the browser editor.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! The browser drives its own audio graph, so only the pure parts of the
//! engine cross the boundary: voicing, grid layout, downbeat detection and
//! tempo clamping.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { chordbox_init, voice_chord, WebTempo } from './chordbox.js';
//!
//! await init();
//! chordbox_init();
//!
//! const first = voice_chord({ root: "D", quality: "m7" }, []);
//! const next = voice_chord({ root: "G", quality: "7" }, first);
//! // next = ["G3", "B3", "D4", "F4"]
//!
//! const tempo = new WebTempo(120, false);
//! tempo.set_bpm(500); // clamped to 300
//! ```

use wasm_bindgen::prelude::*;

use crate::chord::ChordSpec;
use crate::metronome;
use crate::pitch::Note;
use crate::state::Progression;
use crate::transport::{BpmRange, TempoState};
use crate::voicing;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn chordbox_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Voicing
// ═══════════════════════════════════════════════════════════════════════════

fn previous_notes(previous: JsValue) -> Result<Vec<Note>, JsError> {
    if previous.is_undefined() || previous.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_wasm_bindgen::from_value(previous)?)
}

/// Voice `chord` (`{root, quality, inversion?}`) against the previous
/// voicing (array of note names, or null).
///
/// Returns note names such as `"Db3"`; an empty array for an unknown
/// quality or root.
#[wasm_bindgen]
pub fn voice_chord(chord: JsValue, previous: JsValue) -> Result<JsValue, JsError> {
    let chord: ChordSpec = serde_wasm_bindgen::from_value(chord)?;
    let previous = previous_notes(previous)?;
    let notes = voicing::voice(&chord, &previous);
    Ok(serde_wasm_bindgen::to_value(&notes)?)
}

/// [`voice_chord`] as absolute pitches (`octave * 12 + pitch class`).
#[wasm_bindgen]
pub fn voice_chord_absolute(chord: JsValue, previous: JsValue) -> Result<Vec<i32>, JsError> {
    let chord: ChordSpec = serde_wasm_bindgen::from_value(chord)?;
    let previous = previous_notes(previous)?;
    Ok(voicing::voice_as_absolute_pitch(&chord, &previous))
}

// ═══════════════════════════════════════════════════════════════════════════
// Grid + metronome helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Whether the click for `global_beat` is accented.
#[wasm_bindgen]
pub fn is_downbeat(global_beat: u32, beats_per_measure: u32) -> bool {
    metronome::is_downbeat(global_beat as u64, beats_per_measure)
}

/// Length of the editor grid for a progression (array of items).
#[wasm_bindgen]
pub fn grid_beats(progression: JsValue, beats_per_measure: u32) -> Result<u32, JsError> {
    let progression: Progression = serde_wasm_bindgen::from_value(progression)?;
    Ok(progression.grid_beats(beats_per_measure))
}

// ═══════════════════════════════════════════════════════════════════════════
// Tempo
// ═══════════════════════════════════════════════════════════════════════════

/// Tempo shared between the UI controls and the browser scheduler.
#[wasm_bindgen]
pub struct WebTempo {
    inner: TempoState,
}

#[wasm_bindgen]
impl WebTempo {
    /// `compact` selects the 40-300 range used by the compact controls.
    #[wasm_bindgen(constructor)]
    pub fn new(bpm: u32, compact: bool) -> WebTempo {
        let range = if compact {
            BpmRange::COMPACT
        } else {
            BpmRange::FULL
        };
        WebTempo {
            inner: TempoState::new(bpm, range),
        }
    }

    pub fn bpm(&self) -> u32 {
        self.inner.bpm()
    }

    /// Set the tempo, clamped into range. Returns the value stored.
    pub fn set_bpm(&self, bpm: f64) -> u32 {
        self.inner.set_bpm(bpm.round() as i64)
    }

    pub fn beat_duration_ms(&self) -> f64 {
        self.inner.beat_duration_ms()
    }

    pub fn min_bpm(&self) -> u32 {
        self.inner.range().min
    }

    pub fn max_bpm(&self) -> u32 {
        self.inner.range().max
    }
}
