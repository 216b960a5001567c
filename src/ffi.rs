// C-compatible FFI bindings for Swift/iOS integration.
//
// Safety requirements:
// - Pointers must be non-null unless documented otherwise
// - Tempo handles must be created by this module and not fabricated
// - String parameters must be valid UTF-8 (Swift strings are always valid)
// - Caller must call chordbox_tempo_destroy for each chordbox_tempo_create
//
// The native host owns the sampler and the timers; only voicing and tempo
// math cross this boundary.

use std::ffi::{CStr, c_char};

use crate::chord::ChordSpec;
use crate::metronome;
use crate::pitch::Note;
use crate::transport::{BpmRange, TempoState};
use crate::voicing;

use log::{LevelFilter, warn};
use oslog::OsLogger;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.chordbox.engine";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup. Logs appear in Console.app and in
/// Xcode's debug console.
#[unsafe(no_mangle)]
pub extern "C" fn chordbox_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Voicing
// ═══════════════════════════════════════════════════════════════════════════

/// Borrow a C string as UTF-8. Returns `None` for NULL or invalid UTF-8.
///
/// # Safety
/// `ptr` must be NULL or a valid null-terminated string that outlives `'a`.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok() }
}

/// Voice a chord and write its absolute pitches (`octave * 12 + pitch
/// class`) into `out`, lowest first.
///
/// `previous` holds the previous voicing as absolute pitches; it may be
/// NULL when `previous_len` is 0.
///
/// Returns the number of notes in the voicing, which may exceed `out_cap`;
/// only the first `out_cap` are written. Returns 0 for an unknown chord or
/// invalid arguments.
///
/// # Safety
/// - `root` and `quality` must be valid null-terminated strings
/// - `previous` must point to `previous_len` readable i32 values
/// - `out` must point to `out_cap` writable i32 values
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chordbox_voice_chord(
    root: *const c_char,
    quality: *const c_char,
    inversion: i32,
    previous: *const i32,
    previous_len: usize,
    out: *mut i32,
    out_cap: usize,
) -> usize {
    let (Some(root), Some(quality)) = (unsafe { read_str(root) }, unsafe { read_str(quality) })
    else {
        warn!("chordbox_voice_chord: missing or invalid chord name");
        return 0;
    };
    if previous.is_null() && previous_len > 0 {
        warn!("chordbox_voice_chord: previous is NULL with length {}", previous_len);
        return 0;
    }

    let previous: Vec<Note> = if previous_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(previous, previous_len) }
            .iter()
            .map(|&pitch| Note::from_absolute(pitch))
            .collect()
    };

    let chord = ChordSpec::new(root, quality).with_inversion(inversion);
    let pitches = voicing::voice_as_absolute_pitch(&chord, &previous);

    if !out.is_null() && out_cap > 0 {
        let out = unsafe { std::slice::from_raw_parts_mut(out, out_cap) };
        for (slot, pitch) in out.iter_mut().zip(&pitches) {
            *slot = *pitch;
        }
    }
    pitches.len()
}

/// Whether the click for `global_beat` is accented.
#[unsafe(no_mangle)]
pub extern "C" fn chordbox_is_downbeat(global_beat: u64, beats_per_measure: u32) -> bool {
    metronome::is_downbeat(global_beat, beats_per_measure)
}

// ═══════════════════════════════════════════════════════════════════════════
// Tempo
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to a shared tempo.
pub struct ChordboxTempo {
    inner: TempoState,
}

/// Create a tempo handle. `compact` selects the 40-300 bpm range.
///
/// Returns an opaque pointer that must be freed with `chordbox_tempo_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn chordbox_tempo_create(bpm: u32, compact: bool) -> *mut ChordboxTempo {
    let range = if compact {
        BpmRange::COMPACT
    } else {
        BpmRange::FULL
    };
    Box::into_raw(Box::new(ChordboxTempo {
        inner: TempoState::new(bpm, range),
    }))
}

/// # Safety
/// `tempo` must be a pointer returned by `chordbox_tempo_create`, or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chordbox_tempo_destroy(tempo: *mut ChordboxTempo) {
    if !tempo.is_null() {
        drop(unsafe { Box::from_raw(tempo) });
    }
}

/// Set the tempo, clamped into range. Returns the stored bpm (0 on NULL).
///
/// # Safety
/// `tempo` must be a valid handle or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chordbox_tempo_set_bpm(tempo: *const ChordboxTempo, bpm: i64) -> u32 {
    match unsafe { tempo.as_ref() } {
        Some(tempo) => tempo.inner.set_bpm(bpm),
        None => 0,
    }
}

/// # Safety
/// `tempo` must be a valid handle or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chordbox_tempo_get_bpm(tempo: *const ChordboxTempo) -> u32 {
    unsafe { tempo.as_ref() }.map_or(0, |t| t.inner.bpm())
}

/// Milliseconds per beat at the current tempo (0 on NULL).
///
/// # Safety
/// `tempo` must be a valid handle or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chordbox_tempo_beat_ms(tempo: *const ChordboxTempo) -> f64 {
    unsafe { tempo.as_ref() }.map_or(0.0, |t| t.inner.beat_duration_ms())
}
