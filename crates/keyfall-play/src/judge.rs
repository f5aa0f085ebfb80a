use serde::{Deserialize, Serialize};

/// Judgment for a processed note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Judgment {
    Perfect = 0,
    Great = 1,
    Good = 2,
    Miss = 3,
}

impl Judgment {
    /// Base points before the combo multiplier.
    pub fn base_points(self) -> u64 {
        match self {
            Judgment::Perfect => 300,
            Judgment::Great => 200,
            Judgment::Good => 100,
            Judgment::Miss => 0,
        }
    }

    pub fn is_miss(self) -> bool {
        self == Judgment::Miss
    }
}

/// Named judgment-difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JudgePreset {
    Easy,
    #[default]
    Normal,
    Hard,
    VeryHard,
}

impl JudgePreset {
    /// Parse a preset name. Unknown names fall back to `Normal`.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "easy" => Self::Easy,
            "normal" => Self::Normal,
            "hard" => Self::Hard,
            "very-hard" | "veryhard" | "very_hard" => Self::VeryHard,
            other => {
                log::warn!("unknown judge preset {other:?}, falling back to normal");
                Self::Normal
            }
        }
    }

    /// Timing windows for this preset.
    pub fn windows(self) -> JudgeWindows {
        match self {
            Self::Easy => JudgeWindows::new(80_000, 140_000, 200_000, 260_000),
            Self::Normal => JudgeWindows::new(50_000, 100_000, 150_000, 200_000),
            Self::Hard => JudgeWindows::new(35_000, 70_000, 100_000, 140_000),
            Self::VeryHard => JudgeWindows::new(20_000, 40_000, 70_000, 100_000),
        }
    }
}

/// Half-width timing windows in microseconds, increasing cutoffs.
/// A press within `miss_us` always consumes the note; the judgment is
/// determined by the innermost window the delta fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeWindows {
    pub perfect_us: i64,
    pub great_us: i64,
    pub good_us: i64,
    pub miss_us: i64,
}

impl JudgeWindows {
    pub fn new(perfect_us: i64, great_us: i64, good_us: i64, miss_us: i64) -> Self {
        Self {
            perfect_us,
            great_us,
            good_us,
            miss_us,
        }
    }

    /// Judge a press `delta_us = press_time - note_time`.
    /// Returns `None` when the press is outside the capture window and
    /// must not consume the note.
    pub fn judge(&self, delta_us: i64) -> Option<Judgment> {
        let abs = delta_us.abs();
        if abs > self.miss_us {
            return None;
        }
        Some(match abs {
            _ if abs <= self.perfect_us => Judgment::Perfect,
            _ if abs <= self.great_us => Judgment::Great,
            _ if abs <= self.good_us => Judgment::Good,
            _ => Judgment::Miss,
        })
    }

    /// Whether a note at `note_time_us` is past recovery at `now_us`.
    pub fn is_timed_out(&self, note_time_us: i64, now_us: i64) -> bool {
        now_us - note_time_us > self.miss_us
    }
}

impl Default for JudgeWindows {
    fn default() -> Self {
        JudgePreset::Normal.windows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Window tests (normal preset: 50/100/150/200 ms)
    // =========================================================================

    #[test]
    fn perfect_window() {
        let w = JudgePreset::Normal.windows();
        assert_eq!(w.judge(0), Some(Judgment::Perfect));
        assert_eq!(w.judge(30_000), Some(Judgment::Perfect));
        assert_eq!(w.judge(-50_000), Some(Judgment::Perfect));
    }

    #[test]
    fn great_window() {
        let w = JudgePreset::Normal.windows();
        assert_eq!(w.judge(51_000), Some(Judgment::Great));
        assert_eq!(w.judge(80_000), Some(Judgment::Great));
        assert_eq!(w.judge(-100_000), Some(Judgment::Great));
    }

    #[test]
    fn good_window() {
        let w = JudgePreset::Normal.windows();
        assert_eq!(w.judge(101_000), Some(Judgment::Good));
        assert_eq!(w.judge(-150_000), Some(Judgment::Good));
    }

    #[test]
    fn miss_window_consumes_note() {
        let w = JudgePreset::Normal.windows();
        assert_eq!(w.judge(151_000), Some(Judgment::Miss));
        assert_eq!(w.judge(-200_000), Some(Judgment::Miss));
    }

    #[test]
    fn outside_window_is_no_op() {
        let w = JudgePreset::Normal.windows();
        assert_eq!(w.judge(201_000), None);
        assert_eq!(w.judge(-201_000), None);
        assert_eq!(w.judge(1_000_000), None);
    }

    #[test]
    fn timeout_is_late_only() {
        let w = JudgePreset::Normal.windows();
        // Early notes never time out
        assert!(!w.is_timed_out(1_000_000, 500_000));
        assert!(!w.is_timed_out(1_000_000, 1_200_000));
        assert!(w.is_timed_out(1_000_000, 1_200_001));
    }

    // =========================================================================
    // Preset tests
    // =========================================================================

    #[test]
    fn preset_names() {
        assert_eq!(JudgePreset::from_name("easy"), JudgePreset::Easy);
        assert_eq!(JudgePreset::from_name("NORMAL"), JudgePreset::Normal);
        assert_eq!(JudgePreset::from_name("hard"), JudgePreset::Hard);
        assert_eq!(JudgePreset::from_name("very-hard"), JudgePreset::VeryHard);
    }

    #[test]
    fn unknown_preset_falls_back_to_normal() {
        assert_eq!(JudgePreset::from_name("impossible"), JudgePreset::Normal);
        assert_eq!(JudgePreset::from_name(""), JudgePreset::Normal);
    }

    #[test]
    fn presets_tighten_monotonically() {
        let presets = [
            JudgePreset::Easy,
            JudgePreset::Normal,
            JudgePreset::Hard,
            JudgePreset::VeryHard,
        ];
        for pair in presets.windows(2) {
            let (a, b) = (pair[0].windows(), pair[1].windows());
            assert!(a.perfect_us > b.perfect_us);
            assert!(a.miss_us > b.miss_us);
        }
    }

    // Note at 1.000s under the normal preset.
    #[test]
    fn scenario_single_note_timing() {
        let w = JudgePreset::Normal.windows();
        let note_time = 1_000_000;
        assert_eq!(w.judge(1_030_000 - note_time), Some(Judgment::Perfect));
        assert_eq!(w.judge(1_080_000 - note_time), Some(Judgment::Great));
        // 1.25s is beyond the capture window; the note times out instead
        assert_eq!(w.judge(1_250_000 - note_time), None);
        assert!(w.is_timed_out(note_time, 1_250_000));
    }
}
