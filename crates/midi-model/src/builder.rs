use crate::lane_map::LaneMapper;
use crate::note::Note;
use crate::track::{Hand, RawNote, RawTrack};

/// Two notes starting within this window in the same lane are merged.
pub const DUP_WINDOW_US: i64 = 50_000;

/// Trailing buffer after the last note, for the final judgment/fade.
pub const TRAIL_BUFFER_US: i64 = 2_000_000;

/// Default minimum duration (seconds) for a note to count as a long note.
pub const DEFAULT_LONG_NOTE_THRESHOLD: f64 = 0.3;

/// Chart build options.
#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    /// Minimum duration in seconds for a hold note.
    pub long_note_threshold: f64,
    /// Declared song duration in seconds (from the source media).
    pub declared_duration: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            long_note_threshold: DEFAULT_LONG_NOTE_THRESHOLD,
            declared_duration: 0.0,
        }
    }
}

/// The immutable note chart: notes sorted ascending by time, no two
/// notes in the same lane starting within [`DUP_WINDOW_US`].
#[derive(Debug, Clone, Default)]
pub struct Chart {
    pub notes: Vec<Note>,
    /// Song duration in microseconds, at least the last note end plus
    /// [`TRAIL_BUFFER_US`].
    pub duration_us: i64,
}

impl Chart {
    pub fn total_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn long_note_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_long()).count()
    }
}

fn secs_to_us(secs: f64) -> i64 {
    (secs * 1_000_000.0).round() as i64
}

/// Intermediate note before dedup and id assignment.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    lane: usize,
    time_us: i64,
    duration_us: i64,
    pitch: i32,
    velocity: f32,
}

/// Builds the immutable [`Chart`] from raw track data.
pub struct ChartBuilder;

impl ChartBuilder {
    /// Build a chart. Empty or fully malformed input yields an empty
    /// chart, never an error.
    pub fn build(tracks: &[RawTrack], options: &ChartOptions) -> Chart {
        // Split into hand groups
        let mut left: Vec<RawNote> = Vec::new();
        let mut right: Vec<RawNote> = Vec::new();
        for track in tracks {
            let target = match track.hand() {
                Hand::Left => &mut left,
                Hand::Right => &mut right,
            };
            target.extend(track.sanitized_notes());
        }

        let left_pitches: Vec<i32> = left.iter().map(|n| n.pitch).collect();
        let right_pitches: Vec<i32> = right.iter().map(|n| n.pitch).collect();
        let mapper = LaneMapper::new(&left_pitches, &right_pitches);

        let threshold = options.long_note_threshold.max(0.0);
        let mut candidates: Vec<Candidate> = Vec::with_capacity(left.len() + right.len());
        for (notes, hand) in [(&left, Hand::Left), (&right, Hand::Right)] {
            for raw in notes.iter() {
                let duration_us = if raw.duration >= threshold {
                    secs_to_us(raw.duration)
                } else {
                    0
                };
                candidates.push(Candidate {
                    lane: mapper.lane_for(raw.pitch, hand),
                    time_us: secs_to_us(raw.time),
                    duration_us,
                    pitch: raw.pitch,
                    velocity: raw.velocity as f32,
                });
            }
        }

        candidates.sort_by_key(|c| (c.time_us, c.lane, c.pitch));
        let mut merged = Self::dedup(candidates);
        // A winning long note can carry a later start time than the tap
        // it replaced, so restore time order before assigning ids.
        merged.sort_by_key(|c| (c.time_us, c.lane, c.pitch));
        let notes: Vec<Note> = merged
            .into_iter()
            .enumerate()
            .map(|(id, c)| Note {
                id: id as u32,
                lane: c.lane,
                time_us: c.time_us,
                duration_us: c.duration_us,
                pitch: c.pitch,
                velocity: c.velocity,
            })
            .collect();

        let last_end = notes.iter().map(|n| n.end_time_us()).max().unwrap_or(0);
        let declared_us = secs_to_us(options.declared_duration.max(0.0));
        let duration_us = if notes.is_empty() {
            declared_us
        } else {
            declared_us.max(last_end + TRAIL_BUFFER_US)
        };

        log::info!(
            "chart built: {} notes ({} long), duration {:.1}s",
            notes.len(),
            notes.iter().filter(|n| n.is_long()).count(),
            duration_us as f64 / 1_000_000.0
        );

        Chart { notes, duration_us }
    }

    /// Merge same-lane notes starting within the duplicate window.
    /// A long note wins over a tap note; otherwise the earlier entry is
    /// kept with the longer duration.
    fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::with_capacity(candidates.len());
        let mut last_in_lane: [Option<usize>; crate::note::LANE_COUNT] =
            [None; crate::note::LANE_COUNT];

        for cand in candidates {
            if let Some(idx) = last_in_lane[cand.lane]
                && cand.time_us - out[idx].time_us < DUP_WINDOW_US
            {
                let kept = &mut out[idx];
                let cand_long = cand.duration_us > 0;
                let kept_long = kept.duration_us > 0;
                if cand_long && !kept_long {
                    *kept = cand;
                } else if cand_long == kept_long {
                    kept.duration_us = kept.duration_us.max(cand.duration_us);
                }
                // Incumbent long note beats a duplicate tap: drop it.
                continue;
            }
            last_in_lane[cand.lane] = Some(out.len());
            out.push(cand);
        }

        out
    }
}
