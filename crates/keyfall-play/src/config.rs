use serde::{Deserialize, Serialize};

use crate::judge::JudgePreset;

/// Engine configuration accepted at construction or between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Note scroll speed in pixels per second. Purely presentational;
    /// carried through for the renderer.
    #[serde(default = "default_scroll_speed")]
    pub scroll_speed: f32,
    /// Audio offset in milliseconds; shifts the computed chart time.
    #[serde(default)]
    pub audio_offset_ms: i32,
    /// Judgment preset name; unknown names fall back to "normal".
    #[serde(default = "default_preset")]
    pub judge_preset: String,
    /// Minimum duration in seconds for a note to become a hold.
    #[serde(default = "default_long_note_threshold")]
    pub long_note_threshold: f64,
}

fn default_scroll_speed() -> f32 {
    500.0
}

fn default_preset() -> String {
    "normal".to_owned()
}

fn default_long_note_threshold() -> f64 {
    midi_model::builder::DEFAULT_LONG_NOTE_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scroll_speed: default_scroll_speed(),
            audio_offset_ms: 0,
            judge_preset: default_preset(),
            long_note_threshold: default_long_note_threshold(),
        }
    }
}

impl EngineConfig {
    pub fn preset(&self) -> JudgePreset {
        JudgePreset::from_name(&self.judge_preset)
    }

    pub fn audio_offset_us(&self) -> i64 {
        self.audio_offset_ms as i64 * 1000
    }
}
