// src/error.rs
//
// Error types for the playback core.
//
// Voicing never fails: an unknown quality or an unresolvable root yields an
// empty voicing. Everything here is either a device/runtime failure that
// ends the current session, or a malformed value coming from the UI.

use thiserror::Error;

/// Failure reported by an audio device.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceError {
    /// The audio context could not be started or resumed.
    #[error("audio context could not be started: {0}")]
    Activation(String),

    /// The device refused a note trigger.
    #[error("audio device rejected trigger: {0}")]
    Trigger(String),
}

/// Failure that ends a playback session.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The per-item callback failed for the item at `index`.
    #[error("item {index} failed: {message}")]
    Item { index: usize, message: String },
}

/// A note name that could not be parsed (e.g. `"H2"` or `"C"`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid note name '{0}'")]
pub struct NoteParseError(pub String);

/// Malformed player configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid time signature '{0}', expected N/D")]
    TimeSignature(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_converts_into_playback_error() {
        let err: PlaybackError = DeviceError::Trigger("no samples loaded".into()).into();
        assert_eq!(
            err.to_string(),
            "audio device rejected trigger: no samples loaded"
        );
    }

    #[test]
    fn test_item_error_message() {
        let err = PlaybackError::Item {
            index: 3,
            message: "sampler offline".into(),
        };
        assert_eq!(err.to_string(), "item 3 failed: sampler offline");
    }
}
