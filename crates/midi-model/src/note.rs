use serde::{Deserialize, Serialize};

/// Total number of play lanes.
pub const LANE_COUNT: usize = 7;

/// The centre lane, used for overlap-band pitches and degenerate charts.
pub const CENTER_LANE: usize = 3;

/// A single chart note, immutable once the chart is built.
///
/// Times are microseconds relative to chart start. `duration_us` is 0
/// for tap notes and the full hold length for long notes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique id within the chart.
    pub id: u32,
    /// Play lane, 0..LANE_COUNT.
    pub lane: usize,
    /// Start time in microseconds from chart start.
    pub time_us: i64,
    /// Hold length in microseconds (0 for tap notes).
    pub duration_us: i64,
    /// Source MIDI pitch number.
    pub pitch: i32,
    /// Normalized velocity, 0.0..=1.0.
    pub velocity: f32,
}

impl Note {
    /// Whether this note is a long (hold) note.
    pub fn is_long(&self) -> bool {
        self.duration_us > 0
    }

    /// End time of the note (equal to `time_us` for tap notes).
    pub fn end_time_us(&self) -> i64 {
        self.time_us + self.duration_us
    }
}
