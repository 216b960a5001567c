// src/render.rs
//
// How a voiced chord is sounded: all at once, or as an arpeggio.
//
// The play mode is read once when a session starts and turned into a
// Renderer, which is handed to every per-item callback of that session.
// The scheduler itself never looks at the mode.

use serde::{Deserialize, Serialize};

use crate::device::{AudioDevice, EffectSend};
use crate::error::DeviceError;
use crate::pitch::Note;
use crate::transport::TempoState;

/// User-facing audio mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Chord,
    Arpeggio,
}

impl PlayMode {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            PlayMode::Chord => 0,
            PlayMode::Arpeggio => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => PlayMode::Arpeggio,
            _ => PlayMode::Chord,
        }
    }
}

/// Velocity of the lowest arpeggio note.
pub const ARPEGGIO_BASE_VELOCITY: f32 = 0.45;

/// Velocity of the highest arpeggio note.
pub const ARPEGGIO_MAX_VELOCITY: f32 = 0.9;

/// Arpeggio notes overlap their successor by this factor.
pub const ARPEGGIO_OVERLAP: f64 = 1.2;

/// One arpeggio note, relative to the moment the arpeggio starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpeggioStep {
    pub note: Note,
    pub offset: f64,
    pub duration: f64,
    pub velocity: f32,
}

/// Rendering strategy resolved from a [`PlayMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// All notes together, held until the next release.
    Block,

    /// Notes spread over one beat, rising in velocity.
    Arpeggio,
}

impl From<PlayMode> for Renderer {
    fn from(mode: PlayMode) -> Self {
        match mode {
            PlayMode::Chord => Renderer::Block,
            PlayMode::Arpeggio => Renderer::Arpeggio,
        }
    }
}

impl Renderer {
    /// Release whatever is sounding, then sound `notes`.
    ///
    /// An empty voicing only releases.
    pub fn render(
        &self,
        device: &dyn AudioDevice,
        notes: &[Note],
        tempo: &TempoState,
    ) -> Result<(), DeviceError> {
        device.release_all();
        if notes.is_empty() {
            return Ok(());
        }

        match self {
            Renderer::Block => device.trigger_attack(notes, EffectSend::CHORD),
            Renderer::Arpeggio => {
                let now = device.now();
                for step in arpeggio_steps(notes, tempo.beat_duration_secs()) {
                    device.trigger_attack_release(
                        step.note,
                        step.duration,
                        now + step.offset,
                        step.velocity,
                        EffectSend::ARPEGGIO,
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Lay `notes` out over one beat of `beat_secs`.
///
/// The first note starts at 0 and the last on the beat's end. A single
/// note has no interval to divide; it lasts the whole beat.
pub fn arpeggio_steps(notes: &[Note], beat_secs: f64) -> Vec<ArpeggioStep> {
    let count = notes.len();
    let interval = if count > 1 {
        beat_secs / (count - 1) as f64
    } else {
        0.0
    };
    let duration = if interval > 0.0 {
        interval * ARPEGGIO_OVERLAP
    } else {
        beat_secs
    };
    let span = (count.saturating_sub(1)).max(1) as f32;

    notes
        .iter()
        .enumerate()
        .map(|(i, &note)| ArpeggioStep {
            note,
            offset: i as f64 * interval,
            duration,
            velocity: ARPEGGIO_BASE_VELOCITY
                + (ARPEGGIO_MAX_VELOCITY - ARPEGGIO_BASE_VELOCITY) * (i as f32 / span),
        })
        .collect()
}
