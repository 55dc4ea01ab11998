//! The merged input event queue.
//!
//! One fixed-capacity FIFO shared by every producer (key reader, touch
//! reader, threads posting messages) and one consumer (the session loop).
//! Overflow drops the incoming event rather than evicting an older one, so
//! a wedged consumer sees the earliest inputs, not the latest.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use lifeboat_types::input::Event;

/// Maximum queued events.
pub const QUEUE_CAPACITY: usize = 64;

pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
    cond: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            events: Mutex::new(VecDeque::with_capacity(QUEUE_CAPACITY)),
            cond: Condvar::new(),
        }
    }

    /// Append an event. Returns `false` when the queue is full and the
    /// event was dropped.
    pub fn post(&self, event: Event) -> bool {
        let mut events = self.events.lock().unwrap();
        if events.len() >= QUEUE_CAPACITY {
            log::debug!("input queue full, dropping {event:?}");
            return false;
        }
        events.push_back(event);
        drop(events);
        self.cond.notify_one();
        true
    }

    /// Pop the oldest event without blocking.
    pub fn try_pop(&self) -> Option<Event> {
        self.events.lock().unwrap().pop_front()
    }

    /// Block until an event arrives. With a timeout, returns `None` once it
    /// elapses with the queue still empty; with `None`, waits indefinitely.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<Event> {
        let mut events = self.events.lock().unwrap();
        match timeout {
            Some(timeout) => {
                let (mut events, _) = self
                    .cond
                    .wait_timeout_while(events, timeout, |q| q.is_empty())
                    .unwrap();
                events.pop_front()
            }
            None => {
                while events.is_empty() {
                    events = self.cond.wait(events).unwrap();
                }
                events.pop_front()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
