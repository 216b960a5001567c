use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

//
// ===============================
// MARK: Tempo limits
// ===============================
//

/// Allowed bpm interval for a tempo profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmRange {
    pub min: u32,
    pub max: u32,
}

impl BpmRange {
    /// Progression editor range.
    pub const FULL: BpmRange = BpmRange { min: 20, max: 300 };

    /// Narrower range used by the practice views.
    pub const COMPACT: BpmRange = BpmRange { min: 40, max: 300 };

    #[inline]
    pub fn clamp(&self, bpm: i64) -> u32 {
        bpm.clamp(self.min as i64, self.max as i64) as u32
    }
}

impl Default for BpmRange {
    fn default() -> Self {
        Self::FULL
    }
}

pub const DEFAULT_BPM: u32 = 120;

//
// ===================================
// MARK: Shared tempo state
// ===================================
//

/// Tempo shared between the UI and the playback scheduler.
///
/// This struct:
/// - is safe to read and write from any thread
/// - always holds a bpm inside its range
/// - does NOT reschedule anything when the bpm changes
///
/// Readers pick up a new bpm at their next scheduling decision; audio
/// events already handed to the device keep their timestamps.
#[derive(Debug)]
pub struct TempoState {
    bpm: AtomicU32,
    range: BpmRange,
}

impl Default for TempoState {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, BpmRange::FULL)
    }
}

impl TempoState {
    pub fn new(bpm: u32, range: BpmRange) -> Self {
        Self {
            bpm: AtomicU32::new(range.clamp(bpm as i64)),
            range,
        }
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn bpm(&self) -> u32 {
        self.bpm.load(Ordering::Acquire)
    }

    #[inline]
    pub fn range(&self) -> BpmRange {
        self.range
    }

    /// Duration of one beat in milliseconds (`60000 / bpm`).
    #[inline]
    pub fn beat_duration_ms(&self) -> f64 {
        60_000.0 / self.bpm() as f64
    }

    /// Duration of one beat in seconds.
    #[inline]
    pub fn beat_duration_secs(&self) -> f64 {
        self.beat_duration_ms() / 1000.0
    }

    /// Convert a beat count into seconds at the current tempo.
    #[inline]
    pub fn beats_to_secs(&self, beats: f64) -> f64 {
        beats * self.beat_duration_secs()
    }

    // -------------------------------
    // MARK: Mutators
    // -------------------------------

    /// Set the tempo, clamped into the range. Returns the stored value.
    pub fn set_bpm(&self, bpm: i64) -> u32 {
        let clamped = self.range.clamp(bpm);
        self.bpm.store(clamped, Ordering::Release);
        clamped
    }
}
