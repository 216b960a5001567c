// src/metronome.rs
//
// Metronome click delivery.
//
// The scheduler hands each click a global beat index; whether that click is
// accented is decided here, from the beat's position in the measure.

use std::sync::Arc;

use crate::device::{AudioDevice, EffectSend};
use crate::pitch::{Note, PitchClass};

/// Receives metronome clicks from the playback scheduler.
///
/// Implementations must not block and must not fail: a click that cannot
/// be delivered is dropped.
pub trait ClickScheduler: Send + Sync {
    /// Schedule one click at device time `at`.
    fn click(&self, global_beat: u64, beats_per_measure: u32, at: f64);
}

/// Whether `global_beat` opens a measure.
///
/// `beats_per_measure == 0` means no accent distinction.
#[inline]
pub fn is_downbeat(global_beat: u64, beats_per_measure: u32) -> bool {
    beats_per_measure > 0 && global_beat % beats_per_measure as u64 == 0
}

/// Sound of one click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickSound {
    pub note: Note,
    pub velocity: f32,
}

/// Click that triggers short notes on an audio device.
pub struct Metronome {
    device: Arc<dyn AudioDevice>,
    accent: ClickSound,
    regular: ClickSound,
    duration: f64,
}

impl Metronome {
    pub const CLICK_DURATION: f64 = 0.05;

    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        Self {
            device,
            accent: ClickSound {
                note: Note::new(PitchClass::C, 6),
                velocity: 1.0,
            },
            regular: ClickSound {
                note: Note::new(PitchClass::C, 5),
                velocity: 0.6,
            },
            duration: Self::CLICK_DURATION,
        }
    }

    pub fn with_sounds(mut self, accent: ClickSound, regular: ClickSound) -> Self {
        self.accent = accent;
        self.regular = regular;
        self
    }

    /// The sound used for `global_beat`.
    pub fn sound_for(&self, global_beat: u64, beats_per_measure: u32) -> ClickSound {
        if is_downbeat(global_beat, beats_per_measure) {
            self.accent
        } else {
            self.regular
        }
    }
}

impl ClickScheduler for Metronome {
    fn click(&self, global_beat: u64, beats_per_measure: u32, at: f64) {
        let sound = self.sound_for(global_beat, beats_per_measure);
        if let Err(e) = self.device.trigger_attack_release(
            sound.note,
            self.duration,
            at,
            sound.velocity,
            EffectSend::DRY,
        ) {
            log::warn!("Metronome click {} dropped: {}", global_beat, e);
        }
    }
}
