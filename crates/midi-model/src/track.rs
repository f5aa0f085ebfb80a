use anyhow::{Context, Result};
use serde::Deserialize;

/// Hand classification of a source track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

/// A raw note as produced by the transcription pipeline.
/// Times are seconds; the chart builder converts to microseconds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawNote {
    /// Source pitch number (MIDI convention, 0-127 expected but not enforced).
    pub pitch: i32,
    /// Start time in seconds from chart start.
    pub time: f64,
    /// Duration in seconds (0 for percussive/tap events).
    #[serde(default)]
    pub duration: f64,
    /// Velocity, 0.0..=1.0.
    #[serde(default = "default_velocity")]
    pub velocity: f64,
}

fn default_velocity() -> f64 {
    1.0
}

impl RawNote {
    /// Whether the note carries usable timing data.
    /// Malformed entries are dropped at the boundary, never an error.
    pub fn is_valid(&self) -> bool {
        self.time.is_finite()
            && self.time >= 0.0
            && self.duration.is_finite()
            && self.duration >= 0.0
            && self.velocity.is_finite()
    }
}

/// A raw track: one source channel of the transcription output.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrack {
    /// Track name from the source file, if any.
    #[serde(default)]
    pub name: Option<String>,
    /// Source MIDI channel, if any.
    #[serde(default)]
    pub channel: Option<u32>,
    /// Notes carried by this track.
    #[serde(default)]
    pub notes: Vec<RawNote>,
}

impl RawTrack {
    /// Hand classification: channel 1 or a name containing "left" is
    /// the left-hand group, everything else the right/single group.
    pub fn hand(&self) -> Hand {
        if self.channel == Some(1) {
            return Hand::Left;
        }
        if let Some(name) = &self.name
            && name.to_lowercase().contains("left")
        {
            return Hand::Left;
        }
        Hand::Right
    }

    /// Valid notes only, with velocity clamped to 0.0..=1.0.
    pub fn sanitized_notes(&self) -> Vec<RawNote> {
        let mut dropped = 0usize;
        let notes: Vec<RawNote> = self
            .notes
            .iter()
            .filter(|n| {
                if n.is_valid() {
                    true
                } else {
                    dropped += 1;
                    false
                }
            })
            .map(|n| RawNote {
                velocity: n.velocity.clamp(0.0, 1.0),
                ..*n
            })
            .collect();
        if dropped > 0 {
            log::debug!(
                "dropped {} malformed note(s) from track {:?}",
                dropped,
                self.name
            );
        }
        notes
    }
}

/// Parse a raw track list from JSON.
pub fn load_tracks(json: &str) -> Result<Vec<RawTrack>> {
    serde_json::from_str(json).context("failed to parse track list")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_from_channel() {
        let track = RawTrack {
            name: None,
            channel: Some(1),
            notes: vec![],
        };
        assert_eq!(track.hand(), Hand::Left);
    }

    #[test]
    fn hand_from_name() {
        let track = RawTrack {
            name: Some("Left Hand".into()),
            channel: None,
            notes: vec![],
        };
        assert_eq!(track.hand(), Hand::Left);

        let track = RawTrack {
            name: Some("melody".into()),
            channel: Some(0),
            notes: vec![],
        };
        assert_eq!(track.hand(), Hand::Right);
    }

    #[test]
    fn sanitize_drops_malformed() {
        let track = RawTrack {
            name: None,
            channel: None,
            notes: vec![
                RawNote {
                    pitch: 60,
                    time: 1.0,
                    duration: 0.0,
                    velocity: 0.5,
                },
                RawNote {
                    pitch: 62,
                    time: -1.0,
                    duration: 0.0,
                    velocity: 0.5,
                },
                RawNote {
                    pitch: 64,
                    time: f64::NAN,
                    duration: 0.0,
                    velocity: 0.5,
                },
                RawNote {
                    pitch: 65,
                    time: 2.0,
                    duration: 0.0,
                    velocity: 3.0,
                },
            ],
        };
        let notes = track.sanitized_notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].pitch, 60);
        // Velocity clamped
        assert!((notes[1].velocity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_tracks_permissive_fields() {
        let json = r#"[
            {"channel": 1, "notes": [{"pitch": 48, "time": 0.5}]},
            {"name": "right", "notes": []}
        ]"#;
        let tracks = load_tracks(json).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].hand(), Hand::Left);
        assert_eq!(tracks[0].notes.len(), 1);
        assert!((tracks[0].notes[0].velocity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_tracks_rejects_garbage() {
        assert!(load_tracks("not json").is_err());
    }
}
