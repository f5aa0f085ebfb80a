//! Chart model for the keyfall rhythm engine.
//!
//! Converts raw MIDI-derived track data into the immutable [`Chart`]
//! consumed during play: lane assignment via register/hand heuristics,
//! long-note classification, duplicate merging, and a one-shot
//! difficulty rating over the finished chart.

pub mod builder;
pub mod difficulty;
pub mod lane_map;
pub mod note;
pub mod track;

pub use builder::{Chart, ChartBuilder, ChartOptions};
pub use difficulty::difficulty;
pub use lane_map::LaneMapper;
pub use note::{CENTER_LANE, LANE_COUNT, Note};
pub use track::{Hand, RawNote, RawTrack, load_tracks};
