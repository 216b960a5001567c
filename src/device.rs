// src/device.rs
//
// Audio device seam.
//
// The synthesizer itself (sample playback, effects chain, audio I/O) lives
// outside this crate. The core only needs to trigger notes, release them,
// read the device clock and make sure the audio context is running.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DeviceError;
use crate::pitch::Note;

/// Effect levels applied to one trigger.
///
/// Passed with every trigger; devices keep no effect state between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSend {
    /// Reverb wet level (0.0 - 1.0).
    pub reverb_wet: f32,
}

impl EffectSend {
    /// Block chords.
    pub const CHORD: EffectSend = EffectSend { reverb_wet: 0.3 };

    /// Arpeggios ring out longer.
    pub const ARPEGGIO: EffectSend = EffectSend { reverb_wet: 0.8 };

    /// Metronome clicks.
    pub const DRY: EffectSend = EffectSend { reverb_wet: 0.0 };
}

/// Audio device trait.
///
/// Devices:
/// - do NOT know about progressions or tempo
/// - do NOT block in triggers (scheduling is by timestamp)
/// - use interior mutability, so every method takes `&self`
pub trait AudioDevice: Send + Sync {
    /// Monotonic device clock in seconds.
    fn now(&self) -> f64;

    /// Whether the audio context is running.
    fn is_running(&self) -> bool;

    /// Start or resume the audio context. May block until the host grants it.
    fn resume(&self) -> Result<(), DeviceError>;

    /// Start all `notes` now and hold them until released.
    fn trigger_attack(&self, notes: &[Note], send: EffectSend) -> Result<(), DeviceError>;

    /// Play one note at device time `time` for `duration` seconds.
    fn trigger_attack_release(
        &self,
        note: Note,
        duration: f64,
        time: f64,
        velocity: f32,
        send: EffectSend,
    ) -> Result<(), DeviceError>;

    /// Release every sounding note.
    fn release_all(&self);
}

/// Manually advanced clock for offline rendering and tests.
///
/// Stored as f64 bits (no AtomicF64 in std).
#[derive(Debug, Default)]
pub struct OfflineClock {
    seconds_bits: AtomicU64,
}

impl OfflineClock {
    pub fn new() -> Self {
        Self {
            seconds_bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    #[inline]
    pub fn now(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::Acquire))
    }

    pub fn advance(&self, seconds: f64) {
        let _ = self
            .seconds_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + seconds).to_bits())
            });
    }

    pub fn set(&self, seconds: f64) {
        self.seconds_bits.store(seconds.to_bits(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_clock_advances() {
        let clock = OfflineClock::new();
        assert_eq!(clock.now(), 0.0);
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.now(), 0.75);
        clock.set(2.0);
        assert_eq!(clock.now(), 2.0);
    }
}
