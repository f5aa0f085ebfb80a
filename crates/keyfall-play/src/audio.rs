use std::cell::RefCell;
use std::rc::Rc;

/// Linear fade length for vocal gating, to avoid clicks.
pub const VOCAL_FADE_US: i64 = 10_000;

/// Minimum gated window length for a tap note.
pub const VOCAL_MIN_WINDOW_US: i64 = 200_000;

/// The two playable tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTrack {
    /// Main backing track; its playback clock is the authoritative
    /// time base while engaged.
    Primary,
    /// Optional vocal track, gated to silence outside note windows.
    Vocal,
}

/// Abstraction over audio playback.
/// Implementations: a real backend in the host application,
/// [`MockAudioOutput`] for tests and headless simulation.
/// Decoding is outside the engine; tracks are opaque playable buffers.
pub trait AudioOutput {
    /// Begin playback from position zero.
    fn start(&mut self);
    /// Halt output without losing the playback position.
    fn pause(&mut self);
    /// Continue output from the paused position.
    fn resume(&mut self);
    /// Stop playback and release the position. Must be idempotent.
    fn stop(&mut self);
    /// Playback position of the primary track, microseconds since start.
    fn position_us(&self) -> i64;
    /// Set a track's gain, 0.0..=1.0.
    fn set_track_gain(&mut self, track: AudioTrack, gain: f32);
    /// Whether a track is loaded.
    fn has_track(&self, track: AudioTrack) -> bool;
}

/// Gates the vocal track: full gain inside the active note window,
/// silence otherwise, ramping linearly over [`VOCAL_FADE_US`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VocalGate {
    gain: f32,
}

impl VocalGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Advance the ramp by `delta_us` toward the target implied by
    /// `active` and push the gain to the backend.
    pub fn update(&mut self, delta_us: i64, active: bool, audio: &mut dyn AudioOutput) {
        if !audio.has_track(AudioTrack::Vocal) {
            return;
        }
        let target: f32 = if active { 1.0 } else { 0.0 };
        let step = delta_us.max(0) as f32 / VOCAL_FADE_US as f32;
        if (target - self.gain).abs() <= step {
            self.gain = target;
        } else if target > self.gain {
            self.gain += step;
        } else {
            self.gain -= step;
        }
        audio.set_track_gain(AudioTrack::Vocal, self.gain);
    }

    /// Drop straight to silence (session teardown).
    pub fn reset(&mut self, audio: &mut dyn AudioOutput) {
        self.gain = 0.0;
        if audio.has_track(AudioTrack::Vocal) {
            audio.set_track_gain(AudioTrack::Vocal, 0.0);
        }
    }
}

#[derive(Debug, Default)]
struct MockAudioState {
    playing: bool,
    paused: bool,
    position_us: i64,
    primary_gain: f32,
    vocal_gain: f32,
    has_vocal: bool,
    start_count: u32,
    stop_count: u32,
}

/// Shared-handle mock backend. Clones observe the same state, so a
/// test can keep a handle while the session owns the boxed trait object.
#[derive(Debug, Clone, Default)]
pub struct MockAudioOutput {
    inner: Rc<RefCell<MockAudioState>>,
}

impl MockAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vocal_track() -> Self {
        let out = Self::default();
        out.inner.borrow_mut().has_vocal = true;
        out
    }

    /// Drive the mock playback clock.
    pub fn set_position(&self, us: i64) {
        self.inner.borrow_mut().position_us = us;
    }

    pub fn advance(&self, delta_us: i64) {
        self.inner.borrow_mut().position_us += delta_us;
    }

    pub fn is_playing(&self) -> bool {
        self.inner.borrow().playing
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    pub fn vocal_gain(&self) -> f32 {
        self.inner.borrow().vocal_gain
    }

    pub fn start_count(&self) -> u32 {
        self.inner.borrow().start_count
    }

    pub fn stop_count(&self) -> u32 {
        self.inner.borrow().stop_count
    }
}

impl AudioOutput for MockAudioOutput {
    fn start(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.playing = true;
        state.paused = false;
        state.position_us = 0;
        state.start_count += 1;
    }

    fn pause(&mut self) {
        self.inner.borrow_mut().paused = true;
    }

    fn resume(&mut self) {
        self.inner.borrow_mut().paused = false;
    }

    fn stop(&mut self) {
        let mut state = self.inner.borrow_mut();
        if state.playing {
            state.stop_count += 1;
        }
        state.playing = false;
        state.paused = false;
    }

    fn position_us(&self) -> i64 {
        self.inner.borrow().position_us
    }

    fn set_track_gain(&mut self, track: AudioTrack, gain: f32) {
        let mut state = self.inner.borrow_mut();
        match track {
            AudioTrack::Primary => state.primary_gain = gain,
            AudioTrack::Vocal => state.vocal_gain = gain,
        }
    }

    fn has_track(&self, track: AudioTrack) -> bool {
        match track {
            AudioTrack::Primary => true,
            AudioTrack::Vocal => self.inner.borrow().has_vocal,
        }
    }
}
