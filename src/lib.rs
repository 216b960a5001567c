// src/lib.rs
//
// Library entry point for Rust, browser (wasm) and native (iOS) hosts.

mod chord;
mod config;
mod device;
mod error;
mod event;
mod metronome;
mod performer;
mod pitch;
mod render;
mod scheduler;
mod state;
mod transport;
mod voicing;

#[cfg(feature = "ios")]
pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;


// Re-export key types for Rust consumers
pub use chord::{ChordFormulas, ChordSpec};
pub use config::{PlayerConfig, PlayerControls, TimeSignature};
pub use device::{AudioDevice, EffectSend, OfflineClock};
pub use error::{ConfigError, DeviceError, NoteParseError, PlaybackError};
pub use event::{DeviceEvent, EventLog};
pub use metronome::{ClickScheduler, ClickSound, Metronome, is_downbeat};
pub use performer::{OfflinePacer, Pacer, Performer, RealTimePacer, audition};
pub use pitch::{NOTE_NAMES, Note, PitchClass};
pub use render::{ArpeggioStep, PlayMode, Renderer, arpeggio_steps};
pub use scheduler::{Cue, Hook, ItemCallback, PlayerBuilder, ProgressionPlayer, SessionEnd};
pub use state::{
    GRID_MARGIN_BEATS, PlaybackReadback, Progression, ProgressionItem, SharedProgression,
};
pub use transport::{BpmRange, DEFAULT_BPM, TempoState};
pub use voicing::{
    CANDIDATE_OCTAVES, DEFAULT_BASE_OCTAVE, voice, voice_as_absolute_pitch,
    voice_as_absolute_pitch_with, voice_with,
};
