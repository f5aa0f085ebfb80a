use midi_model::LANE_COUNT;

/// A lane input transition at a specific instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Target lane, 0..LANE_COUNT.
    pub lane: usize,
    /// true = pressed, false = released.
    pub pressed: bool,
    /// Timestamp in microseconds (chart-relative for scripted input).
    pub time_us: i64,
}

/// Abstraction over input sources.
/// Implementations: [`Keyboard`] in hosts, `ScriptedInput` for
/// autoplay and testing.
pub trait InputProvider {
    /// Drain events due at or before `now_us`, in time order.
    fn poll_events(&mut self, now_us: i64) -> Vec<KeyEvent>;

    /// Whether a lane's key is currently held down.
    fn is_pressed(&self, lane: usize) -> bool;

    fn key_count(&self) -> usize {
        LANE_COUNT
    }
}

/// Physical key bindings, one key code per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    keys: [u32; LANE_COUNT],
}

impl Default for KeyBindings {
    /// Home-row layout: S D F Space J K L.
    fn default() -> Self {
        Self {
            keys: [b'S' as u32, b'D' as u32, b'F' as u32, b' ' as u32, b'J' as u32, b'K' as u32, b'L' as u32],
        }
    }
}

impl KeyBindings {
    pub fn new(keys: [u32; LANE_COUNT]) -> Self {
        Self { keys }
    }

    /// Lane bound to a physical key code, if any.
    pub fn lane_for(&self, code: u32) -> Option<usize> {
        self.keys.iter().position(|&k| k == code)
    }
}

/// Edge-triggered keyboard adapter: turns raw key transitions into
/// lane events, dropping auto-repeat and unbound keys.
#[derive(Debug, Clone)]
pub struct Keyboard {
    bindings: KeyBindings,
    down: [bool; LANE_COUNT],
}

impl Keyboard {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            down: [false; LANE_COUNT],
        }
    }

    /// Translate a raw key transition. Returns `None` for unbound keys
    /// and repeated key-down events.
    pub fn handle_key(&mut self, code: u32, pressed: bool, time_us: i64) -> Option<KeyEvent> {
        let lane = self.bindings.lane_for(code)?;
        if pressed {
            if self.down[lane] {
                return None;
            }
            self.down[lane] = true;
        } else {
            if !self.down[lane] {
                return None;
            }
            self.down[lane] = false;
        }
        Some(KeyEvent {
            lane,
            pressed,
            time_us,
        })
    }

    pub fn is_pressed(&self, lane: usize) -> bool {
        self.down.get(lane).copied().unwrap_or(false)
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_map_one_to_one() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.lane_for(b'S' as u32), Some(0));
        assert_eq!(bindings.lane_for(b' ' as u32), Some(3));
        assert_eq!(bindings.lane_for(b'L' as u32), Some(6));
        assert_eq!(bindings.lane_for(b'Q' as u32), None);
    }

    #[test]
    fn auto_repeat_is_dropped() {
        let mut keyboard = Keyboard::default();
        assert!(keyboard.handle_key(b'F' as u32, true, 1000).is_some());
        // OS auto-repeat fires key-down again while held
        assert!(keyboard.handle_key(b'F' as u32, true, 2000).is_none());
        assert!(keyboard.is_pressed(2));
        assert!(keyboard.handle_key(b'F' as u32, false, 3000).is_some());
        assert!(!keyboard.is_pressed(2));
    }

    #[test]
    fn unbound_key_is_ignored() {
        let mut keyboard = Keyboard::default();
        assert!(keyboard.handle_key(b'Q' as u32, true, 1000).is_none());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut keyboard = Keyboard::default();
        assert!(keyboard.handle_key(b'J' as u32, false, 1000).is_none());
    }
}
