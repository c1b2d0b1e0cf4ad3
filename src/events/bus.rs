//! Kind-keyed publish/subscribe bus with a bounded drain.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use super::{EventKind, GameEvent};

/// A subscriber failed to handle an event. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

pub type EventListener = Box<dyn FnMut(&GameEvent) -> Result<(), ListenerError>>;

/// Queues published events and delivers them to subscribers on
/// [`process`](EventBus::process), at most `drain_limit` per call.
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<EventListener>>,
    catch_all: Vec<EventListener>,
    queue: VecDeque<GameEvent>,
    drain_limit: usize,
}

impl EventBus {
    pub fn new(drain_limit: usize) -> Self {
        Self {
            listeners: HashMap::new(),
            catch_all: Vec::new(),
            queue: VecDeque::new(),
            drain_limit,
        }
    }

    pub fn subscribe(&mut self, kind: EventKind, listener: EventListener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    /// Receives every event regardless of kind.
    pub fn subscribe_all(&mut self, listener: EventListener) {
        self.catch_all.push(listener);
    }

    pub fn publish(&mut self, event: GameEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers queued events in order. Returns how many were delivered;
    /// anything past the drain limit stays queued for the next call.
    pub fn process(&mut self) -> usize {
        let mut delivered = 0;
        while delivered < self.drain_limit {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            let kind = event.kind();
            let keyed = self.listeners.get_mut(&kind).into_iter().flatten();
            for listener in keyed.chain(self.catch_all.iter_mut()) {
                if let Err(err) = listener(&event) {
                    tracing::warn!(?kind, %err, "event listener failed");
                }
            }
            delivered += 1;
        }
        if !self.queue.is_empty() {
            tracing::debug!(remaining = self.queue.len(), "event drain limit reached");
        }
        delivered
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds", &self.listeners.len())
            .field("catch_all", &self.catch_all.len())
            .field("queued", &self.queue.len())
            .field("drain_limit", &self.drain_limit)
            .finish()
    }
}
