//! Named-event listener registry for recovering parsers.

use std::collections::HashMap;

use tracing::trace;

use crate::ParseError;
use crate::ast::Resource;

/// Something a recovering parser reports to its listeners.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// An entry failed and was recorded as junk.
    Error(&'a ParseError),
    /// A call to [`Parser::parse`](crate::Parser::parse) finished.
    Change(&'a Resource),
}

impl Event<'_> {
    /// Name listeners subscribe under.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Error(_) => "error",
            Event::Change(_) => "change",
        }
    }
}

/// Handle returned by [`Emitter::add_event_listener`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&Event<'_>)>;

/// Listeners keyed by event name, called in registration order.
#[derive(Default)]
pub struct Emitter {
    listeners: HashMap<String, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to events named `event`.
    pub fn add_event_listener<F>(&mut self, event: &str, listener: F) -> ListenerId
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe a listener. Unknown ids are ignored.
    pub fn remove_event_listener(&mut self, event: &str, id: ListenerId) {
        if let Some(listeners) = self.listeners.get_mut(event) {
            listeners.retain(|(registered, _)| *registered != id);
        }
    }

    /// Call every listener registered under `event.name()`.
    pub fn emit(&mut self, event: &Event<'_>) {
        let Some(listeners) = self.listeners.get_mut(event.name()) else {
            return;
        };
        trace!(event = event.name(), listeners = listeners.len(), "emit");
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
    }

    /// Number of listeners registered under `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event, listeners) in &self.listeners {
            map.entry(event, &listeners.len());
        }
        map.finish()
    }
}

/// Returned when registering listeners on a strict parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterUnavailable;

impl std::fmt::Display for EmitterUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Emitter not available")
    }
}

impl std::error::Error for EmitterUnavailable {}
