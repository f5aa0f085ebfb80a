use crate::builder::Chart;
use crate::note::LANE_COUNT;

/// Consecutive gaps under this count toward the speed-variation score.
pub const FAST_GAP_US: i64 = 100_000;

/// Note pairs starting within this window count as polyphony.
pub const POLYPHONY_GAP_US: i64 = 30_000;

const DENSITY_CAP: f64 = 6.0;
const SPEED_CAP: f64 = 5.0;
const SPREAD_CAP: f64 = 4.0;
const LONG_NOTE_CAP: f64 = 3.0;
const POLYPHONY_CAP: f64 = 2.0;

/// Derive a difficulty level in 1..=20 from chart statistics.
/// An empty chart is always level 1.
pub fn difficulty(chart: &Chart) -> u8 {
    if chart.is_empty() || chart.duration_us <= 0 {
        return 1;
    }

    let n = chart.total_notes();
    let duration_secs = chart.duration_us as f64 / 1_000_000.0;

    // Density: notes per second, scaled
    let nps = n as f64 / duration_secs;
    let density = (nps * 1.5).round().min(DENSITY_CAP);

    // Speed variation: proportion of fast consecutive gaps
    let mut fast_gaps = 0usize;
    let mut poly_pairs = 0usize;
    for pair in chart.notes.windows(2) {
        let gap = pair[1].time_us - pair[0].time_us;
        if gap < FAST_GAP_US {
            fast_gaps += 1;
        }
        if gap <= POLYPHONY_GAP_US && pair[0].lane != pair[1].lane {
            poly_pairs += 1;
        }
    }
    let pairs = (n - 1).max(1) as f64;
    let speed = (fast_gaps as f64 / pairs * 15.0).round().min(SPEED_CAP);

    // Lane spread: distinct lanes used
    let mut used = [false; LANE_COUNT];
    for note in &chart.notes {
        used[note.lane] = true;
    }
    let distinct = used.iter().filter(|&&u| u).count();
    let spread = (distinct as f64 / LANE_COUNT as f64 * 4.0).round().min(SPREAD_CAP);

    // Long-note ratio
    let long_ratio = chart.long_note_count() as f64 / n as f64;
    let long_notes = (long_ratio * 6.0).round().min(LONG_NOTE_CAP);

    // Polyphony: near-simultaneous pairs across lanes
    let polyphony = (poly_pairs as f64 / pairs * 10.0).round().min(POLYPHONY_CAP);

    let total = density + speed + spread + long_notes + polyphony;
    (total as i64).clamp(1, 20) as u8
}
