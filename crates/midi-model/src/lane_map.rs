use crate::note::{CENTER_LANE, LANE_COUNT};
use crate::track::Hand;

/// Fallback pitch span (one octave) when a hand plays a single pitch,
/// so normalization never divides by zero.
const DEFAULT_SPAN: f64 = 12.0;

/// Lanes available to each hand in dual-hand mode (left: 0-2, right: 4-6).
const HAND_LANES: usize = 3;

/// Offset of the right-hand lane block.
const RIGHT_OFFSET: usize = 4;

/// Inclusive pitch range of one hand group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PitchRange {
    min: i32,
    max: i32,
}

impl PitchRange {
    fn from_pitches(pitches: &[i32]) -> Option<Self> {
        let min = *pitches.iter().min()?;
        let max = *pitches.iter().max()?;
        Some(Self { min, max })
    }

    fn span(&self) -> f64 {
        if self.max == self.min {
            DEFAULT_SPAN
        } else {
            (self.max - self.min) as f64
        }
    }

    /// Linear normalization of `pitch` onto `count` lanes starting at
    /// `offset`, clamped to the block.
    fn normalize(&self, pitch: i32, count: usize, offset: usize) -> usize {
        let idx = ((pitch - self.min) as f64 / self.span() * count as f64).floor() as i64;
        offset + idx.clamp(0, count as i64 - 1) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Both hand groups present: left on lanes 0-2, right on 4-6,
    /// overlap band on the centre lane.
    Dual {
        left: PitchRange,
        right: PitchRange,
        band_lo: i32,
        band_hi: i32,
    },
    /// One hand group (or no hand data): spread over all lanes.
    Single { range: PitchRange },
    /// No notes at all.
    Empty,
}

/// Maps source pitch + hand classification to one of the 7 play lanes.
/// A pure function of the chart content: identical inputs always give
/// identical lanes.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneMapper {
    mode: Mode,
}

impl LaneMapper {
    /// Build a mapper from all pitches of each hand group.
    pub fn new(left_pitches: &[i32], right_pitches: &[i32]) -> Self {
        let left = PitchRange::from_pitches(left_pitches);
        let right = PitchRange::from_pitches(right_pitches);

        let mode = match (left, right) {
            (Some(left), Some(right)) => {
                // Band between the hands' registers; reordered when the
                // hands overlap or cross.
                let band_lo = left.max.min(right.min);
                let band_hi = left.max.max(right.min);
                Mode::Dual {
                    left,
                    right,
                    band_lo,
                    band_hi,
                }
            }
            (Some(range), None) | (None, Some(range)) => Mode::Single { range },
            (None, None) => Mode::Empty,
        };
        Self { mode }
    }

    /// Assign a lane for a pitch played by the given hand.
    pub fn lane_for(&self, pitch: i32, hand: Hand) -> usize {
        match self.mode {
            Mode::Dual {
                left,
                right,
                band_lo,
                band_hi,
            } => {
                if pitch >= band_lo && pitch <= band_hi {
                    CENTER_LANE
                } else {
                    match hand {
                        Hand::Left => left.normalize(pitch, HAND_LANES, 0),
                        Hand::Right => right.normalize(pitch, HAND_LANES, RIGHT_OFFSET),
                    }
                }
            }
            Mode::Single { range } => range.normalize(pitch, LANE_COUNT, 0),
            Mode::Empty => CENTER_LANE,
        }
    }
}
