//! The keyfall play engine: judgment, scoring, hold tracking, and the
//! play-session state machine.
//!
//! The engine is frame-driven and single-threaded. A host builds a
//! [`Chart`](midi_model::Chart), wraps it in a [`PlaySession`], then
//! calls [`PlaySession::update`] once per frame and routes lane input
//! through [`PlaySession::key_press`]/[`PlaySession::key_release`].
//! Rendering, audio decoding, and OS input live behind the
//! [`AudioOutput`], [`InputProvider`], and [`TimeProvider`] seams so
//! the whole engine runs headless in tests.

pub mod audio;
pub mod autoplay;
pub mod config;
pub mod hold;
pub mod input;
pub mod judge;
pub mod score;
pub mod session;
pub mod time;

pub use audio::{AudioOutput, AudioTrack, MockAudioOutput, VocalGate};
pub use autoplay::ScriptedInput;
pub use config::EngineConfig;
pub use hold::{HOLD_COMPLETE_POINTS, HOLD_TICK_POINTS, HOLD_TICK_US, HoldState};
pub use input::{InputProvider, KeyBindings, KeyEvent, Keyboard};
pub use judge::{JudgePreset, JudgeWindows, Judgment};
pub use score::{Grade, JudgmentCounts, PlayResult, ScoreBoard, ScoreUpdate, ScoreUpdateKind};
pub use session::{COUNTDOWN_US, GamePhase, PlaySession};
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
