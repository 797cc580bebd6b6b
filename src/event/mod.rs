//! Event model
//!
//! Events are created, consumed and discarded within a single tick. The
//! queue is owned by the simulator; nothing here is global.

use crate::execution::{Fill, Order};
use crate::signal::Signal;
use std::collections::VecDeque;
use std::fmt;

/// Tagged event flowing between pipeline stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new bar was released for every instrument
    Market,
    /// Strategy intent
    Signal(Signal),
    /// Sized instruction for the execution layer
    Order(Order),
    /// Execution result
    Fill(Fill),
}

/// Discriminant of an [`Event`], used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

impl EventKind {
    /// Label value
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Market => "market",
            EventKind::Signal => "signal",
            EventKind::Order => "order",
            EventKind::Fill => "fill",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Market => EventKind::Market,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }
}

/// Owned FIFO event queue with a non-blocking poll
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event at the back
    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Dequeue the oldest event, `None` when empty
    pub fn poll(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Extend<Event> for EventQueue {
    fn extend<T: IntoIterator<Item = Event>>(&mut self, iter: T) {
        self.events.extend(iter);
    }
}
