// src/config.rs
//
// Player configuration.
//
// PlayerConfig is the serializable form the UI stores; PlayerControls is
// the live copy the player reads while running. Toggling looping or the
// metronome on the controls takes effect at the scheduler's next check.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render::PlayMode;

// ═══════════════════════════════════════════════════════════════════════════
// Time signature
// ═══════════════════════════════════════════════════════════════════════════

/// Meter written as `N/D`. Only `N` drives the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    pub beats_per_measure: u32,
    pub beat_unit: u32,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        beats_per_measure: 4,
        beat_unit: 4,
    };
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl FromStr for TimeSignature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::TimeSignature(s.to_string());
        let (beats, unit) = s.trim().split_once('/').ok_or_else(invalid)?;
        let beats_per_measure = beats.trim().parse::<u32>().map_err(|_| invalid())?;
        let beat_unit = unit.trim().parse::<u32>().map_err(|_| invalid())?;
        if beats_per_measure == 0 || beat_unit == 0 {
            return Err(invalid());
        }
        Ok(Self {
            beats_per_measure,
            beat_unit,
        })
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_measure, self.beat_unit)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(ts: TimeSignature) -> Self {
        ts.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Stored configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Player settings as stored by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    /// Restart from the first item when the progression ends.
    pub looping: bool,

    /// Click on every beat.
    pub metronome: bool,

    pub time_signature: TimeSignature,

    pub play_mode: PlayMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            looping: true,
            metronome: true,
            time_signature: TimeSignature::COMMON,
            play_mode: PlayMode::Chord,
        }
    }
}

impl PlayerConfig {
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_metronome(mut self, metronome: bool) -> Self {
        self.metronome = metronome;
        self
    }

    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    pub fn with_play_mode(mut self, play_mode: PlayMode) -> Self {
        self.play_mode = play_mode;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Live controls
// ═══════════════════════════════════════════════════════════════════════════

/// Settings the player reads while a session runs.
#[derive(Debug)]
pub struct PlayerControls {
    looping: AtomicBool,
    metronome: AtomicBool,
    beats_per_measure: AtomicU32,
    play_mode: AtomicU8,
}

impl Default for PlayerControls {
    fn default() -> Self {
        Self::from(PlayerConfig::default())
    }
}

impl From<PlayerConfig> for PlayerControls {
    fn from(config: PlayerConfig) -> Self {
        Self {
            looping: AtomicBool::new(config.looping),
            metronome: AtomicBool::new(config.metronome),
            beats_per_measure: AtomicU32::new(config.time_signature.beats_per_measure),
            play_mode: AtomicU8::new(config.play_mode.to_u8()),
        }
    }
}

impl PlayerControls {
    #[inline]
    pub fn looping(&self) -> bool {
        self.looping.load(Ordering::Acquire)
    }

    #[inline]
    pub fn metronome(&self) -> bool {
        self.metronome.load(Ordering::Acquire)
    }

    #[inline]
    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure.load(Ordering::Acquire)
    }

    #[inline]
    pub fn play_mode(&self) -> PlayMode {
        PlayMode::from_u8(self.play_mode.load(Ordering::Acquire))
    }

    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Release);
    }

    pub fn set_metronome(&self, metronome: bool) {
        self.metronome.store(metronome, Ordering::Release);
    }

    pub fn set_time_signature(&self, time_signature: TimeSignature) {
        self.beats_per_measure
            .store(time_signature.beats_per_measure, Ordering::Release);
    }

    /// Takes effect from the next session.
    pub fn set_play_mode(&self, mode: PlayMode) {
        self.play_mode.store(mode.to_u8(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature_parse() {
        let ts: TimeSignature = "3/4".parse().unwrap();
        assert_eq!(ts.beats_per_measure, 3);
        assert_eq!(ts.to_string(), "3/4");
        assert_eq!(" 6 / 8 ".parse::<TimeSignature>().unwrap().beat_unit, 8);

        for bad in ["", "4", "0/4", "4/0", "a/4", "4/4/4"] {
            assert_eq!(
                bad.parse::<TimeSignature>(),
                Err(ConfigError::TimeSignature(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"looping": false, "timeSignature": "3/4", "playMode": "arpeggio"}"#)
                .unwrap();
        assert!(!config.looping);
        assert!(config.metronome);
        assert_eq!(config.time_signature.beats_per_measure, 3);
        assert_eq!(config.play_mode, PlayMode::Arpeggio);
    }

    #[test]
    fn test_bad_time_signature_in_json() {
        let result: Result<PlayerConfig, _> = serde_json::from_str(r#"{"timeSignature": "four"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_controls_follow_config() {
        let controls = PlayerControls::from(
            PlayerConfig::default()
                .with_looping(false)
                .with_time_signature("7/8".parse().unwrap())
                .with_play_mode(PlayMode::Arpeggio),
        );
        assert!(!controls.looping());
        assert!(controls.metronome());
        assert_eq!(controls.beats_per_measure(), 7);
        assert_eq!(controls.play_mode(), PlayMode::Arpeggio);

        controls.set_metronome(false);
        controls.set_time_signature(TimeSignature::COMMON);
        assert!(!controls.metronome());
        assert_eq!(controls.beats_per_measure(), 4);
    }
}
