//! Input event types shared by the router and the session state machine.
//!
//! Key codes use the raw Linux evdev numbering so the reader thread can feed
//! them through without a mapping table. Codes at or above
//! [`KEY_TABLE_SIZE`] are outside the debounce table and are dropped at the
//! router boundary.

use serde::{Deserialize, Serialize};

/// Size of the pressed-key table; one slot per key code.
pub const KEY_TABLE_SIZE: usize = 256;

/// A raw evdev key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const ENTER: KeyCode = KeyCode(28);
    pub const HOME: KeyCode = KeyCode(102);
    pub const UP: KeyCode = KeyCode(103);
    pub const DOWN: KeyCode = KeyCode(108);
    pub const VOLUME_DOWN: KeyCode = KeyCode(114);
    pub const VOLUME_UP: KeyCode = KeyCode(115);
    pub const POWER: KeyCode = KeyCode(116);
    pub const BACK: KeyCode = KeyCode(158);

    /// Slot in the pressed-key table, `None` when the code is out of range.
    pub fn index(self) -> Option<usize> {
        let i = self.0 as usize;
        (i < KEY_TABLE_SIZE).then_some(i)
    }
}

/// An entry in the merged input queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A registered key event (full press+release cycle observed).
    Key(KeyCode),
    /// Touch state change at absolute screen coordinates.
    Touch { x: i32, y: i32, down: bool },
    /// Out-of-band message posted by another thread.
    Message(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_code_equality() {
        assert_eq!(KeyCode::UP, KeyCode(103));
        assert_ne!(KeyCode::UP, KeyCode::DOWN);
    }

    #[test]
    fn named_codes_are_in_table_range() {
        for code in [
            KeyCode::ENTER,
            KeyCode::HOME,
            KeyCode::UP,
            KeyCode::DOWN,
            KeyCode::VOLUME_DOWN,
            KeyCode::VOLUME_UP,
            KeyCode::POWER,
            KeyCode::BACK,
        ] {
            assert!(code.index().is_some(), "{code:?} outside key table");
        }
    }

    #[test]
    fn out_of_range_code_has_no_index() {
        assert_eq!(KeyCode(256).index(), None);
        assert_eq!(KeyCode(0x2FF).index(), None);
        assert_eq!(KeyCode(255).index(), Some(255));
    }

    #[test]
    fn key_code_hash_distinct() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(KeyCode::UP);
        set.insert(KeyCode::DOWN);
        set.insert(KeyCode::UP);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn key_code_serde_roundtrip() {
        let c = KeyCode::POWER;
        let json = serde_json::to_string(&c).unwrap();
        let c2: KeyCode = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn event_variants_distinct() {
        let events = [
            Event::Key(KeyCode::UP),
            Event::Touch {
                x: 0,
                y: 0,
                down: true,
            },
            Event::Message("wake".to_string()),
        ];
        for (i, a) in events.iter().enumerate() {
            for (j, b) in events.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "variants {i} and {j} should differ");
                }
            }
        }
    }

    #[test]
    fn touch_event_fields() {
        let e = Event::Touch {
            x: 120,
            y: 340,
            down: true,
        };
        if let Event::Touch { x, y, down } = e {
            assert_eq!((x, y, down), (120, 340, true));
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn event_clone() {
        let e = Event::Message("refresh".to_string());
        assert_eq!(e, e.clone());
    }
}
