//! Key debouncing, touch filtering and the blocking event wait.
//!
//! The router sits between the raw device readers and the session loop.
//! Handlers are called from the reader thread; `wait_for_event` is called
//! from the session loop. All state lives behind one mutex, never held
//! across a blocking call.

use std::sync::Mutex;
use std::time::Duration;

use lifeboat_types::input::{Event, KEY_TABLE_SIZE, KeyCode};
use lifeboat_types::services::HostLink;

use crate::queue::EventQueue;

/// How often the cable signal is re-sampled while waiting.
const CABLE_POLL: Duration = Duration::from_secs(1);

struct RouterState {
    pressed: [bool; KEY_TABLE_SIZE],
    /// Key whose press is still eligible to register on release.
    last_down: Option<KeyCode>,
    touch_down: bool,
}

/// Debounces raw key transitions into registered key events.
///
/// Only a press and a release of the same key with nothing in between
/// registers. Any other transition in between (another key going down, any
/// key going up) invalidates the pending press, which absorbs the phantom
/// repeats noisy gpio-key hardware produces.
pub struct InputRouter {
    queue: EventQueue,
    state: Mutex<RouterState>,
}

impl InputRouter {
    pub fn new() -> Self {
        InputRouter {
            queue: EventQueue::new(),
            state: Mutex::new(RouterState {
                pressed: [false; KEY_TABLE_SIZE],
                last_down: None,
                touch_down: false,
            }),
        }
    }

    /// Feed one raw key transition.
    ///
    /// Codes outside the key table are dropped. A release only posts an
    /// [`Event::Key`] when it pairs with the most recent press.
    pub fn handle_key(&self, code: KeyCode, down: bool) {
        let Some(index) = code.index() else {
            log::debug!("dropping out-of-range key code {}", code.0);
            return;
        };
        let mut state = self.state.lock().unwrap();
        state.pressed[index] = down;
        if down {
            state.last_down = Some(code);
        } else {
            let registered = state.last_down == Some(code);
            state.last_down = None;
            drop(state);
            if registered {
                self.queue.post(Event::Key(code));
            }
        }
    }

    /// Feed one assembled touch report.
    ///
    /// `(0, 0)` is the hardware's "finger gone" sentinel: it resets the
    /// touch state without posting an event.
    pub fn handle_touch(&self, x: i32, y: i32, down: bool) {
        let mut state = self.state.lock().unwrap();
        if x == 0 && y == 0 {
            state.touch_down = false;
            return;
        }
        state.touch_down = down;
        drop(state);
        self.queue.post(Event::Touch { x, y, down });
    }

    /// Post an out-of-band message for the session loop.
    pub fn post_message(&self, text: impl Into<String>) {
        self.queue.post(Event::Message(text.into()));
    }

    /// Current pressed state of a key, for simultaneous-key gestures.
    pub fn is_pressed(&self, code: KeyCode) -> bool {
        match code.index() {
            Some(index) => self.state.lock().unwrap().pressed[index],
            None => false,
        }
    }

    pub fn is_touch_down(&self) -> bool {
        self.state.lock().unwrap().touch_down
    }

    /// Block for the next event, up to `timeout`.
    ///
    /// Returns `None` when the deadline passes with no event. The deadline
    /// is suspended while the host cable is attached: the wait re-arms with
    /// the full timeout once the cable detaches. Keeps the device from
    /// auto-rebooting out from under an active host session.
    pub fn wait_for_event(&self, timeout: Duration, host: &dyn HostLink) -> Option<Event> {
        let mut remaining = timeout;
        loop {
            let slice = remaining.min(CABLE_POLL);
            if let Some(event) = self.queue.wait(Some(slice)) {
                return Some(event);
            }
            if host.cable_attached() {
                remaining = timeout;
            } else {
                remaining = remaining.saturating_sub(slice);
                if remaining.is_zero() {
                    return None;
                }
            }
        }
    }

    /// Pop without blocking; used by screens that poll between redraws.
    pub fn try_next_event(&self) -> Option<Event> {
        self.queue.try_pop()
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}
