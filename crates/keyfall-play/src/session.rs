use std::collections::HashMap;

use midi_model::{Chart, LANE_COUNT, difficulty};

use crate::audio::{AudioOutput, VOCAL_MIN_WINDOW_US, VocalGate};
use crate::config::EngineConfig;
use crate::hold::{HOLD_COMPLETE_POINTS, HOLD_TICK_POINTS, HoldState};
use crate::judge::{JudgeWindows, Judgment};
use crate::score::{PlayResult, ScoreBoard, ScoreUpdate, ScoreUpdateKind};

/// Countdown length before play begins.
pub const COUNTDOWN_US: i64 = 3_000_000;

/// Game phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No session running.
    Idle,
    /// Pre-play countdown.
    Countdown,
    /// Active play.
    Playing,
    /// Play suspended; the clock is frozen.
    Paused,
    /// Session finished; results are available.
    Ended,
}

/// Per-note tracking state within a lane.
#[derive(Debug, Clone, Copy)]
struct SessionNote {
    id: u32,
    time_us: i64,
    duration_us: i64,
    /// Terminal: the note has received its judgment.
    judged: bool,
    /// The note is an active hold, excluded from hit search.
    held: bool,
}

impl SessionNote {
    fn is_long(&self) -> bool {
        self.duration_us > 0
    }

    fn end_time_us(&self) -> i64 {
        self.time_us + self.duration_us
    }
}

/// Notes of one lane, sorted by time.
#[derive(Debug, Clone, Default)]
struct LaneNotes {
    notes: Vec<SessionNote>,
    /// First index that may still need attention; everything before it
    /// is judged.
    cursor: usize,
}

type ScoreCallback = Box<dyn FnMut(&ScoreUpdate)>;
type EndCallback = Box<dyn FnMut(&PlayResult)>;

/// How a hold left the active set.
enum HoldFinish {
    Completed,
    Released,
}

/// One play-through of a chart: the authoritative clock, per-lane note
/// state, hold lifecycle, and score accounting.
///
/// Single-threaded and frame-driven: the host calls [`update`] once per
/// frame and routes lane input through [`key_press`]/[`key_release`].
/// All times passed in are wall-clock microseconds from the host's
/// [`crate::time::TimeProvider`]; chart time is derived internally from
/// the audio clock when one is attached, wall-clock deltas otherwise.
///
/// [`update`]: PlaySession::update
/// [`key_press`]: PlaySession::key_press
/// [`key_release`]: PlaySession::key_release
pub struct PlaySession {
    chart: Chart,
    total_notes: u32,
    difficulty: u8,
    windows: JudgeWindows,
    offset_us: i64,
    scroll_speed: f32,

    phase: GamePhase,
    lanes: Vec<LaneNotes>,
    board: ScoreBoard,
    holds: HashMap<u32, HoldState>,
    key_down: [bool; LANE_COUNT],
    judged_notes: u32,
    current_time_us: i64,

    countdown_started_us: i64,
    countdown_display: u8,
    /// Wall instant the wall-clock time base was last anchored.
    clock_anchor_wall_us: i64,
    /// Chart time (sans offset) at the anchor.
    clock_base_us: i64,

    audio: Option<Box<dyn AudioOutput>>,
    vocal_gate: VocalGate,
    /// Chart-time window of the currently judged note, feeding the gate.
    vocal_window: Option<(i64, i64)>,

    on_score_update: Option<ScoreCallback>,
    on_end: Option<EndCallback>,
    final_result: Option<PlayResult>,
}

impl PlaySession {
    /// Create a session over a built chart. Difficulty is rated once
    /// here; the chart is immutable for the session's lifetime.
    pub fn new(chart: Chart, config: &EngineConfig) -> Self {
        let difficulty = difficulty(&chart);
        let total_notes = chart.total_notes() as u32;
        let mut session = Self {
            chart,
            total_notes,
            difficulty,
            windows: config.preset().windows(),
            offset_us: config.audio_offset_us(),
            scroll_speed: config.scroll_speed,
            phase: GamePhase::Idle,
            lanes: Vec::new(),
            board: ScoreBoard::new(),
            holds: HashMap::new(),
            key_down: [false; LANE_COUNT],
            judged_notes: 0,
            current_time_us: 0,
            countdown_started_us: 0,
            countdown_display: 0,
            clock_anchor_wall_us: 0,
            clock_base_us: 0,
            audio: None,
            vocal_gate: VocalGate::new(),
            vocal_window: None,
            on_score_update: None,
            on_end: None,
            final_result: None,
        };
        session.rebuild_lanes();
        session
    }

    /// Attach an audio backend; its playback clock becomes the
    /// authoritative time base while playing.
    pub fn with_audio(mut self, audio: Box<dyn AudioOutput>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Install the score-update observer, invoked synchronously from
    /// the frame loop on every judgment and hold tick.
    pub fn set_on_score_update(&mut self, callback: impl FnMut(&ScoreUpdate) + 'static) {
        self.on_score_update = Some(Box::new(callback));
    }

    /// Install the end-of-session observer.
    pub fn set_on_end(&mut self, callback: impl FnMut(&PlayResult) + 'static) {
        self.on_end = Some(Box::new(callback));
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn scroll_speed(&self) -> f32 {
        self.scroll_speed
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    /// Chart-relative time as of the last update, microseconds.
    pub fn current_time_us(&self) -> i64 {
        self.current_time_us
    }

    /// Seconds remaining on the countdown display, when counting down.
    pub fn countdown_display(&self) -> Option<u8> {
        (self.phase == GamePhase::Countdown).then_some(self.countdown_display)
    }

    /// Final results, available once the session has ended.
    pub fn result(&self) -> Option<&PlayResult> {
        self.final_result.as_ref()
    }

    pub fn is_key_down(&self, lane: usize) -> bool {
        self.key_down.get(lane).copied().unwrap_or(false)
    }

    /// Notes that have received their judgment so far.
    pub fn processed_notes(&self) -> u32 {
        self.judged_notes
    }

    /// Begin a session: resets all play state and enters the countdown.
    pub fn start(&mut self, wall_now_us: i64) {
        self.reset_play_state();
        self.phase = GamePhase::Countdown;
        self.countdown_started_us = wall_now_us;
        self.countdown_display = (COUNTDOWN_US / 1_000_000) as u8;
        log::info!(
            "session start: {} notes, difficulty {}",
            self.total_notes,
            self.difficulty
        );
    }

    /// Frame tick. Drives the countdown, the clock, miss detection,
    /// hold ticking, vocal gating, and the end-of-song check.
    pub fn update(&mut self, wall_now_us: i64) {
        match self.phase {
            GamePhase::Idle | GamePhase::Paused | GamePhase::Ended => {}
            GamePhase::Countdown => {
                let elapsed = wall_now_us - self.countdown_started_us;
                let remaining = (COUNTDOWN_US - elapsed).max(0);
                self.countdown_display = ((remaining + 999_999) / 1_000_000) as u8;
                if elapsed >= COUNTDOWN_US {
                    self.begin_playing(wall_now_us);
                }
            }
            GamePhase::Playing => {
                let previous = self.current_time_us;
                self.current_time_us = self.chart_time(wall_now_us);
                let now = self.current_time_us;

                let mut events = Vec::new();
                self.process_miss_notes(now, &mut events);
                self.tick_holds(now, &mut events);
                self.emit_updates(&events);
                self.update_vocal_gate(now - previous);

                if self.judged_notes >= self.total_notes || now > self.chart.duration_us {
                    self.finish();
                }
            }
        }
    }

    /// Lane key pressed. Judges the nearest open note in the lane, or
    /// does nothing when no note is within the capture window.
    pub fn key_press(&mut self, lane: usize, wall_now_us: i64) {
        if lane >= LANE_COUNT || self.key_down[lane] {
            return;
        }
        self.key_down[lane] = true;
        if self.phase != GamePhase::Playing {
            return;
        }

        let t = self.chart_time(wall_now_us);
        let Some(idx) = self.find_hit_candidate(lane, t) else {
            return;
        };

        let note = self.lanes[lane].notes[idx];
        // Within the capture window by construction.
        let Some(judgment) = self.windows.judge(t - note.time_us) else {
            return;
        };

        let mut events = Vec::new();
        if note.is_long() && !judgment.is_miss() {
            // Hold start: the judgment tally is recorded now, the note
            // stays open until completion or release.
            self.lanes[lane].notes[idx].held = true;
            self.holds.insert(
                note.id,
                HoldState::new(note.id, lane, note.time_us, note.end_time_us()),
            );
            let (_, milestone) = self.board.apply_judgment(judgment);
            events.push(self.score_update(judgment, ScoreUpdateKind::Judged, milestone));
            self.open_vocal_window(&note);
        } else {
            self.lanes[lane].notes[idx].judged = true;
            self.judged_notes += 1;
            let (_, milestone) = self.board.apply_judgment(judgment);
            events.push(self.score_update(judgment, ScoreUpdateKind::Judged, milestone));
            if !judgment.is_miss() {
                self.open_vocal_window(&note);
            }
        }
        self.emit_updates(&events);
    }

    /// Lane key released. Active holds on the lane resolve on the next
    /// frame tick.
    pub fn key_release(&mut self, lane: usize, _wall_now_us: i64) {
        if lane < LANE_COUNT {
            self.key_down[lane] = false;
        }
    }

    /// Suspend play. No-op outside `Playing`.
    pub fn pause(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        if let Some(audio) = &mut self.audio {
            audio.pause();
        }
        self.phase = GamePhase::Paused;
        log::debug!("paused at {}us", self.current_time_us);
    }

    /// Continue from a pause, re-anchoring the clock. No-op outside
    /// `Paused`.
    pub fn resume(&mut self, wall_now_us: i64) {
        if self.phase != GamePhase::Paused {
            return;
        }
        if let Some(audio) = &mut self.audio {
            audio.resume();
        } else {
            self.clock_base_us = self.current_time_us - self.offset_us;
            self.clock_anchor_wall_us = wall_now_us;
        }
        self.phase = GamePhase::Playing;
    }

    /// Tear down the session unconditionally. Safe to call repeatedly
    /// and from any phase; dropping the session is equivalent.
    pub fn stop(&mut self) {
        if let Some(audio) = &mut self.audio {
            audio.stop();
            self.vocal_gate.reset(audio.as_mut());
        }
        self.holds.clear();
        self.phase = GamePhase::Idle;
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn rebuild_lanes(&mut self) {
        let mut lanes = vec![LaneNotes::default(); LANE_COUNT];
        for note in &self.chart.notes {
            lanes[note.lane].notes.push(SessionNote {
                id: note.id,
                time_us: note.time_us,
                duration_us: note.duration_us,
                judged: false,
                held: false,
            });
        }
        // Chart order is already time-sorted per lane
        self.lanes = lanes;
    }

    fn reset_play_state(&mut self) {
        self.rebuild_lanes();
        self.board = ScoreBoard::new();
        self.holds.clear();
        self.key_down = [false; LANE_COUNT];
        self.judged_notes = 0;
        self.current_time_us = 0;
        self.vocal_window = None;
        self.final_result = None;
        if let Some(audio) = &mut self.audio {
            self.vocal_gate.reset(audio.as_mut());
        }
    }

    fn begin_playing(&mut self, wall_now_us: i64) {
        if let Some(audio) = &mut self.audio {
            audio.start();
        }
        self.clock_anchor_wall_us = wall_now_us;
        self.clock_base_us = 0;
        self.current_time_us = self.offset_us;
        self.phase = GamePhase::Playing;
        log::info!("countdown finished, playing");
    }

    /// Chart-relative time at a wall instant: the audio clock rules
    /// while attached, wall-clock deltas otherwise.
    fn chart_time(&self, wall_now_us: i64) -> i64 {
        match &self.audio {
            Some(audio) => audio.position_us() + self.offset_us,
            None => self.clock_base_us + (wall_now_us - self.clock_anchor_wall_us) + self.offset_us,
        }
    }

    /// Nearest open note in the lane within the capture window.
    fn find_hit_candidate(&self, lane: usize, t: i64) -> Option<usize> {
        let lane_notes = &self.lanes[lane];
        let mut best: Option<(usize, i64)> = None;
        for (i, note) in lane_notes.notes.iter().enumerate().skip(lane_notes.cursor) {
            if note.time_us - t > self.windows.miss_us {
                break;
            }
            if note.judged || note.held {
                continue;
            }
            let diff = (note.time_us - t).abs();
            if diff > self.windows.miss_us {
                continue;
            }
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((i, diff)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Flag unattended notes as missed once their window expires.
    fn process_miss_notes(&mut self, now_us: i64, events: &mut Vec<ScoreUpdate>) {
        for lane in &mut self.lanes {
            while lane.cursor < lane.notes.len() && lane.notes[lane.cursor].judged {
                lane.cursor += 1;
            }
            for note in lane.notes[lane.cursor..].iter_mut() {
                if now_us - note.time_us <= self.windows.miss_us {
                    break;
                }
                if note.judged || note.held {
                    continue;
                }
                note.judged = true;
                self.judged_notes += 1;
                self.board.apply_judgment(Judgment::Miss);
                events.push(ScoreUpdate {
                    score: self.board.score(),
                    combo: self.board.combo(),
                    judgment: Judgment::Miss,
                    kind: ScoreUpdateKind::Judged,
                    milestone: None,
                });
            }
        }
    }

    /// Advance all active holds: early release, tick payout, completion.
    fn tick_holds(&mut self, now_us: i64, events: &mut Vec<ScoreUpdate>) {
        let mut finished: Vec<(u32, usize, HoldFinish)> = Vec::new();

        for hold in self.holds.values_mut() {
            if !self.key_down[hold.lane] {
                self.board.break_combo();
                events.push(ScoreUpdate {
                    score: self.board.score(),
                    combo: 0,
                    judgment: Judgment::Miss,
                    kind: ScoreUpdateKind::HoldRelease,
                    milestone: None,
                });
                finished.push((hold.note_id, hold.lane, HoldFinish::Released));
                continue;
            }

            // Settle due ticks first so a completion frame still pays
            // the full tick count for the hold length.
            let due = hold.elapsed_ticks(now_us);
            while hold.ticks_scored < due {
                hold.ticks_scored += 1;
                let (_, milestone) = self.board.hold_tick(HOLD_TICK_POINTS);
                events.push(ScoreUpdate {
                    score: self.board.score(),
                    combo: self.board.combo(),
                    judgment: Judgment::Perfect,
                    kind: ScoreUpdateKind::HoldTick,
                    milestone,
                });
            }

            if hold.is_complete(now_us) {
                let (_, milestone) = self.board.hold_complete(HOLD_COMPLETE_POINTS);
                events.push(ScoreUpdate {
                    score: self.board.score(),
                    combo: self.board.combo(),
                    judgment: Judgment::Perfect,
                    kind: ScoreUpdateKind::HoldComplete,
                    milestone,
                });
                finished.push((hold.note_id, hold.lane, HoldFinish::Completed));
            }
        }

        for (id, lane, _finish) in finished {
            self.holds.remove(&id);
            if let Some(note) = self.lanes[lane].notes.iter_mut().find(|n| n.id == id) {
                note.judged = true;
                note.held = false;
                self.judged_notes += 1;
            }
        }
    }

    fn open_vocal_window(&mut self, note: &SessionNote) {
        let length = note.duration_us.max(VOCAL_MIN_WINDOW_US);
        self.vocal_window = Some((note.time_us, note.time_us + length));
    }

    fn update_vocal_gate(&mut self, delta_us: i64) {
        let active = self
            .vocal_window
            .is_some_and(|(from, to)| (from..=to).contains(&self.current_time_us));
        if let Some(audio) = &mut self.audio {
            self.vocal_gate.update(delta_us, active, audio.as_mut());
        }
    }

    fn finish(&mut self) {
        self.phase = GamePhase::Ended;
        if let Some(audio) = &mut self.audio {
            audio.stop();
            self.vocal_gate.reset(audio.as_mut());
        }
        let result = PlayResult::new(&self.board, self.total_notes, self.difficulty);
        log::info!(
            "session ended: score {} accuracy {:.1} grade {:?}",
            result.score,
            result.accuracy,
            result.grade
        );
        if let Some(callback) = self.on_end.as_mut() {
            callback(&result);
        }
        self.final_result = Some(result);
    }

    fn score_update(
        &self,
        judgment: Judgment,
        kind: ScoreUpdateKind,
        milestone: Option<u32>,
    ) -> ScoreUpdate {
        ScoreUpdate {
            score: self.board.score(),
            combo: self.board.combo(),
            judgment,
            kind,
            milestone,
        }
    }

    fn emit_updates(&mut self, events: &[ScoreUpdate]) {
        if let Some(callback) = self.on_score_update.as_mut() {
            for event in events {
                callback(event);
            }
        }
    }
}
