use serde::{Deserialize, Serialize};

use crate::judge::Judgment;

/// Combo values that mark a cosmetic milestone event.
pub const MILESTONES: [u32; 5] = [50, 100, 200, 500, 1000];

/// Judgment tallies, one slot per judgment level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
}

impl JudgmentCounts {
    pub fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Perfect => self.perfect += 1,
            Judgment::Great => self.great += 1,
            Judgment::Good => self.good += 1,
            Judgment::Miss => self.miss += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.good + self.miss
    }
}

/// Letter grade over the final accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    /// Grade boundaries: S >= 95, A >= 85, B >= 70, C >= 50, else D.
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 95.0 {
            Self::S
        } else if accuracy >= 85.0 {
            Self::A
        } else if accuracy >= 70.0 {
            Self::B
        } else if accuracy >= 50.0 {
            Self::C
        } else {
            Self::D
        }
    }
}

/// What kind of event produced a score update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreUpdateKind {
    /// A note was judged (tap hit, timeout miss, or hold start).
    Judged,
    /// A sustained hold paid out a tick.
    HoldTick,
    /// A hold reached its end and paid the completion bonus.
    HoldComplete,
    /// A hold was released early.
    HoldRelease,
}

/// Score notification emitted on every judgment or hold tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub score: u64,
    pub combo: u32,
    /// Presentation judgment label for this event.
    pub judgment: Judgment,
    pub kind: ScoreUpdateKind,
    /// Set when the combo just reached a milestone value.
    pub milestone: Option<u32>,
}

/// Accumulated score and combo state for one play session.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    score: u64,
    combo: u32,
    max_combo: u32,
    counts: JudgmentCounts,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn counts(&self) -> JudgmentCounts {
        self.counts
    }

    /// Combo multiplier: +10% for every full 10 combo.
    pub fn combo_multiplier(&self) -> f64 {
        1.0 + (self.combo / 10) as f64 * 0.1
    }

    /// Apply a full note judgment: tally, combo, and base points.
    /// Returns the points awarded and any milestone reached.
    pub fn apply_judgment(&mut self, judgment: Judgment) -> (u64, Option<u32>) {
        self.counts.record(judgment);
        if judgment.is_miss() {
            self.combo = 0;
            return (0, None);
        }
        let milestone = self.increment_combo();
        (self.award(judgment.base_points()), milestone)
    }

    /// Pay out one sustained hold tick. Does not touch the tally.
    pub fn hold_tick(&mut self, base_points: u64) -> (u64, Option<u32>) {
        let milestone = self.increment_combo();
        (self.award(base_points), milestone)
    }

    /// Pay out a hold completion bonus. Does not touch the tally.
    pub fn hold_complete(&mut self, base_points: u64) -> (u64, Option<u32>) {
        let milestone = self.increment_combo();
        (self.award(base_points), milestone)
    }

    /// Reset the combo without tallying (early hold release).
    pub fn break_combo(&mut self) {
        self.combo = 0;
    }

    fn increment_combo(&mut self) -> Option<u32> {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        MILESTONES.contains(&self.combo).then_some(self.combo)
    }

    /// Award points for the given base value, with the multiplier
    /// recomputed after the combo increment.
    fn award(&mut self, base: u64) -> u64 {
        let points = (base as f64 * self.combo_multiplier()).round() as u64;
        self.score += points;
        points
    }
}

/// End-of-session results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayResult {
    pub score: u64,
    pub max_combo: u32,
    pub judgments: JudgmentCounts,
    pub total_notes: u32,
    /// Weighted accuracy percentage, 0-100.
    pub accuracy: f64,
    pub grade: Grade,
    pub difficulty: u8,
}

impl PlayResult {
    pub fn new(board: &ScoreBoard, total_notes: u32, difficulty: u8) -> Self {
        let counts = board.counts();
        let judged = counts.total();
        let accuracy = if judged == 0 {
            0.0
        } else {
            (counts.perfect as f64 * 100.0 + counts.great as f64 * 70.0 + counts.good as f64 * 40.0)
                / judged as f64
        };
        Self {
            score: board.score(),
            max_combo: board.max_combo(),
            judgments: counts,
            total_notes,
            accuracy,
            grade: Grade::from_accuracy(accuracy),
            difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // ScoreBoard tests
    // =========================================================================

    #[test]
    fn base_points_without_combo_bonus() {
        let mut board = ScoreBoard::new();
        let (points, _) = board.apply_judgment(Judgment::Perfect);
        assert_eq!(points, 300);
        assert_eq!(board.score(), 300);
        assert_eq!(board.combo(), 1);
    }

    #[test]
    fn miss_resets_combo_and_awards_nothing() {
        let mut board = ScoreBoard::new();
        board.apply_judgment(Judgment::Great);
        board.apply_judgment(Judgment::Great);
        let (points, milestone) = board.apply_judgment(Judgment::Miss);
        assert_eq!(points, 0);
        assert_eq!(milestone, None);
        assert_eq!(board.combo(), 0);
        assert_eq!(board.max_combo(), 2);
        assert_eq!(board.counts().miss, 1);
    }

    #[test]
    fn multiplier_steps_every_ten_combo() {
        let mut board = ScoreBoard::new();
        for _ in 0..9 {
            board.apply_judgment(Judgment::Perfect);
        }
        // 10th hit crosses the step: multiplier becomes 1.1 after increment
        let (points, _) = board.apply_judgment(Judgment::Perfect);
        assert_eq!(points, 330);
        assert!((board.combo_multiplier() - 1.1).abs() < 1e-9);
    }

    #[test]
    fn hold_tick_points_use_multiplier() {
        let mut board = ScoreBoard::new();
        for _ in 0..10 {
            board.apply_judgment(Judgment::Perfect);
        }
        // combo 10 -> tick makes it 11, multiplier 1.1
        let (points, _) = board.hold_tick(15);
        assert_eq!(points, 17); // round(15 * 1.1)
        assert_eq!(board.combo(), 11);
    }

    #[test]
    fn break_combo_keeps_score_and_tally() {
        let mut board = ScoreBoard::new();
        board.apply_judgment(Judgment::Good);
        let score = board.score();
        board.break_combo();
        assert_eq!(board.combo(), 0);
        assert_eq!(board.score(), score);
        assert_eq!(board.counts().total(), 1);
    }

    #[test]
    fn milestone_fires_exactly_at_thresholds() {
        let mut board = ScoreBoard::new();
        let mut seen = Vec::new();
        for _ in 0..120 {
            let (_, milestone) = board.apply_judgment(Judgment::Perfect);
            if let Some(m) = milestone {
                seen.push(m);
            }
        }
        assert_eq!(seen, vec![50, 100]);
    }

    // =========================================================================
    // Grade / accuracy tests
    // =========================================================================

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::from_accuracy(100.0), Grade::S);
        assert_eq!(Grade::from_accuracy(95.0), Grade::S);
        assert_eq!(Grade::from_accuracy(94.9), Grade::A);
        assert_eq!(Grade::from_accuracy(85.0), Grade::A);
        assert_eq!(Grade::from_accuracy(70.0), Grade::B);
        assert_eq!(Grade::from_accuracy(50.0), Grade::C);
        assert_eq!(Grade::from_accuracy(49.9), Grade::D);
        assert_eq!(Grade::from_accuracy(0.0), Grade::D);
    }

    #[test]
    fn result_accuracy_weighting() {
        let mut board = ScoreBoard::new();
        board.apply_judgment(Judgment::Perfect);
        board.apply_judgment(Judgment::Great);
        board.apply_judgment(Judgment::Good);
        board.apply_judgment(Judgment::Miss);
        let result = PlayResult::new(&board, 4, 5);
        // (100 + 70 + 40 + 0) / 4
        assert!((result.accuracy - 52.5).abs() < 1e-9);
        assert_eq!(result.grade, Grade::C);
        assert_eq!(result.total_notes, 4);
        assert_eq!(result.difficulty, 5);
    }

    #[test]
    fn result_with_no_judgments() {
        let board = ScoreBoard::new();
        let result = PlayResult::new(&board, 0, 1);
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.grade, Grade::D);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn all_perfect_is_s_grade() {
        let mut board = ScoreBoard::new();
        for _ in 0..20 {
            board.apply_judgment(Judgment::Perfect);
        }
        let result = PlayResult::new(&board, 20, 10);
        assert!((result.accuracy - 100.0).abs() < 1e-9);
        assert_eq!(result.grade, Grade::S);
        assert_eq!(result.max_combo, 20);
    }
}
