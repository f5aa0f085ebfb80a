/// Interval between sustained-hold score ticks.
pub const HOLD_TICK_US: i64 = 150_000;

/// Base points per sustained tick (before the combo multiplier).
pub const HOLD_TICK_POINTS: u64 = 15;

/// Base points for completing a hold (before the combo multiplier).
pub const HOLD_COMPLETE_POINTS: u64 = 100;

/// Live state of one held long note. Created when the hold starts,
/// removed on completion or early release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldState {
    pub note_id: u32,
    pub lane: usize,
    /// Chart time of the note start (tick timing is measured from here,
    /// not from the press instant).
    pub start_us: i64,
    /// Chart time of the hold end.
    pub end_us: i64,
    /// Number of ticks already paid out.
    pub ticks_scored: u32,
}

impl HoldState {
    pub fn new(note_id: u32, lane: usize, start_us: i64, end_us: i64) -> Self {
        Self {
            note_id,
            lane,
            start_us,
            end_us,
            ticks_scored: 0,
        }
    }

    /// Ticks elapsed at `now_us`, clamped to the hold range so a late
    /// completion frame still settles exactly the ticks the hold length
    /// allows.
    pub fn elapsed_ticks(&self, now_us: i64) -> u32 {
        let elapsed = (now_us.min(self.end_us) - self.start_us).max(0);
        (elapsed / HOLD_TICK_US) as u32
    }

    /// Whether the hold has reached its end.
    pub fn is_complete(&self, now_us: i64) -> bool {
        now_us >= self.end_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate_over_hold() {
        // 0.6s hold: floor(0.6 / 0.15) = 4 ticks total
        let hold = HoldState::new(0, 4, 2_000_000, 2_600_000);
        assert_eq!(hold.elapsed_ticks(2_000_000), 0);
        assert_eq!(hold.elapsed_ticks(2_149_999), 0);
        assert_eq!(hold.elapsed_ticks(2_150_000), 1);
        assert_eq!(hold.elapsed_ticks(2_300_000), 2);
        assert_eq!(hold.elapsed_ticks(2_599_999), 3);
        assert_eq!(hold.elapsed_ticks(2_600_000), 4);
    }

    #[test]
    fn ticks_clamp_past_end() {
        let hold = HoldState::new(0, 4, 2_000_000, 2_600_000);
        // A frame landing late still settles only the 4 in-range ticks
        assert_eq!(hold.elapsed_ticks(3_000_000), 4);
    }

    #[test]
    fn ticks_never_negative_before_start() {
        // Early hit: frame may run before the note's chart time
        let hold = HoldState::new(0, 2, 5_000_000, 5_500_000);
        assert_eq!(hold.elapsed_ticks(4_950_000), 0);
    }

    #[test]
    fn completion_boundary() {
        let hold = HoldState::new(0, 1, 1_000_000, 1_450_000);
        assert!(!hold.is_complete(1_449_999));
        assert!(hold.is_complete(1_450_000));
    }
}
