//! Hand-rolled error types for the parts of the data model that validate
//! caller input at the boundary.

use std::fmt;

/// Out-of-range BPM/swing/resolution, or a pattern that fails `validate_pattern`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    BpmOutOfRange(f32),
    SwingOutOfRange(f32),
    InvalidResolution(u32),
    InvalidVelocity(f32),
    InvalidVolume(f32),
    EmptyPattern,
    TrackStepCountMismatch {
        track_id: u64,
        expected: u32,
        actual: usize,
    },
    UnknownPattern(u64),
    UnknownTrack(u64),
    NoCurrentPattern,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BpmOutOfRange(b) => write!(f, "bpm {b} is outside [60, 200]"),
            ConfigError::SwingOutOfRange(s) => write!(f, "swing {s} is outside [0, 100]"),
            ConfigError::InvalidResolution(r) => {
                write!(f, "step resolution {r} is not one of 8, 16, 32, 64")
            }
            ConfigError::InvalidVelocity(v) => write!(f, "velocity {v} is outside [0, 1]"),
            ConfigError::InvalidVolume(v) => write!(f, "volume {v} is outside [0, 1]"),
            ConfigError::EmptyPattern => write!(f, "pattern has no tracks"),
            ConfigError::TrackStepCountMismatch {
                track_id,
                expected,
                actual,
            } => write!(
                f,
                "track {track_id} has {actual} steps, expected {expected}"
            ),
            ConfigError::UnknownPattern(id) => write!(f, "no pattern with id {id}"),
            ConfigError::UnknownTrack(id) => write!(f, "no track with id {id}"),
            ConfigError::NoCurrentPattern => write!(f, "no pattern is currently loaded"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_mention_the_offending_value() {
        let err = ConfigError::BpmOutOfRange(250.0);
        assert!(err.to_string().contains("250"));
    }
}
