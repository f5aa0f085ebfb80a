use midi_model::{Chart, LANE_COUNT};

use crate::input::{InputProvider, KeyEvent};

/// Taps release shortly after the press.
const TAP_RELEASE_US: i64 = 50_000;
/// Holds release slightly past the note end so the boundary frame
/// never reads as an early release.
const HOLD_RELEASE_US: i64 = 30_000;

/// Scripted input source that plays a chart flawlessly: one press at
/// every note's exact time, held through long notes. Used by the
/// simulator and by end-to-end tests as the replay of a perfect player.
pub struct ScriptedInput {
    /// Press/release events sorted by time, releases before presses at
    /// the same instant.
    events: Vec<KeyEvent>,
    cursor: usize,
    down: [bool; LANE_COUNT],
}

impl ScriptedInput {
    /// Script a perfect performance of the chart.
    pub fn from_chart(chart: &Chart) -> Self {
        let mut events = Vec::with_capacity(chart.notes.len() * 2);
        for note in &chart.notes {
            let release_us = if note.is_long() {
                note.end_time_us() + HOLD_RELEASE_US
            } else {
                note.time_us + TAP_RELEASE_US
            };
            events.push(KeyEvent {
                lane: note.lane,
                pressed: true,
                time_us: note.time_us,
            });
            events.push(KeyEvent {
                lane: note.lane,
                pressed: false,
                time_us: release_us,
            });
        }
        Self::from_events(events)
    }

    /// Script an arbitrary event sequence, e.g. a deliberately flawed
    /// run in tests.
    pub fn from_events(mut events: Vec<KeyEvent>) -> Self {
        events.sort_by_key(|e| (e.time_us, e.pressed));
        Self {
            events,
            cursor: 0,
            down: [false; LANE_COUNT],
        }
    }

    /// True once every scripted event has been delivered.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.events.len()
    }
}

impl InputProvider for ScriptedInput {
    fn poll_events(&mut self, now_us: i64) -> Vec<KeyEvent> {
        let start = self.cursor;
        while self.cursor < self.events.len() && self.events[self.cursor].time_us <= now_us {
            let event = self.events[self.cursor];
            self.down[event.lane] = event.pressed;
            self.cursor += 1;
        }
        self.events[start..self.cursor].to_vec()
    }

    fn is_pressed(&self, lane: usize) -> bool {
        self.down.get(lane).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_model::Note;

    fn chart(notes: Vec<Note>) -> Chart {
        Chart {
            duration_us: notes.iter().map(|n| n.end_time_us()).max().unwrap_or(0),
            notes,
        }
    }

    fn note(id: u32, lane: usize, time_us: i64, duration_us: i64) -> Note {
        Note {
            id,
            lane,
            time_us,
            duration_us,
            pitch: 60,
            velocity: 1.0,
        }
    }

    #[test]
    fn tap_script_presses_then_releases() {
        let mut input = ScriptedInput::from_chart(&chart(vec![note(0, 2, 1_000_000, 0)]));
        assert!(input.poll_events(999_999).is_empty());

        let events = input.poll_events(1_000_000);
        assert_eq!(events.len(), 1);
        assert!(events[0].pressed);
        assert!(input.is_pressed(2));

        let events = input.poll_events(1_060_000);
        assert_eq!(events.len(), 1);
        assert!(!events[0].pressed);
        assert!(!input.is_pressed(2));
        assert!(input.is_exhausted());
    }

    #[test]
    fn hold_script_keys_through_note_end() {
        let mut input = ScriptedInput::from_chart(&chart(vec![note(0, 4, 2_000_000, 600_000)]));
        input.poll_events(2_000_000);
        input.poll_events(2_600_000);
        // Still down exactly at the note end
        assert!(input.is_pressed(4));
        input.poll_events(2_630_000);
        assert!(!input.is_pressed(4));
    }

    #[test]
    fn events_drain_in_time_order() {
        let mut input = ScriptedInput::from_chart(&chart(vec![
            note(0, 1, 1_000_000, 0),
            note(1, 5, 1_020_000, 0),
        ]));
        let events = input.poll_events(2_000_000);
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| w[0].time_us <= w[1].time_us));
    }
}
