//! Event Bus
//!
//! Fire-and-forget notification channel for node events. Two kinds of consumers
//! are supported:
//!
//! - Named handlers registered with [`EventBus::subscribe`], invoked
//!   synchronously in publish order (`"*"` receives every event)
//! - Async consumers holding a `tokio::sync::broadcast::Receiver` from
//!   [`EventBus::subscribe_to_events`]
//!
//! Publishers never wait on subscribers. A lagging broadcast receiver loses the
//! oldest events, the same trade-off the UI forwarders accept.

use super::{Mutation, NodeEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Handler name that matches every event
pub const WILDCARD: &str = "*";

/// Broadcast channel capacity for node events.
///
/// Bulk graph loads emit a few events per node; 256 leaves headroom for a
/// render pass that falls briefly behind.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Callback invoked for matching events
pub type EventHandler = Arc<dyn Fn(&NodeEvent) + Send + Sync>;

/// Opaque token returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type HandlerTable = HashMap<String, Vec<(SubscriptionId, EventHandler)>>;

/// Shared notification channel
///
/// Cloning is cheap; clones publish to the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<HandlerTable>>,
    sender: broadcast::Sender<NodeEvent>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a handler for one event name (or [`WILDCARD`])
    pub fn subscribe<F>(&self, event_name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&NodeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut table = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table
            .entry(event_name.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler; returns `false` if it was not registered under `event_name`
    pub fn unsubscribe(&self, event_name: &str, id: SubscriptionId) -> bool {
        let mut table = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(entries) = table.get_mut(event_name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        let removed = entries.len() < before;
        if entries.is_empty() {
            table.remove(event_name);
        }
        removed
    }

    /// Subscribe to the raw event stream (async consumers)
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<NodeEvent> {
        self.sender.subscribe()
    }

    /// Publish one event to matching handlers and stream receivers
    pub fn publish(&self, event: &NodeEvent) {
        let name = event.event_name();
        let matching: Vec<EventHandler> = {
            let table = self
                .handlers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            [name.as_str(), WILDCARD]
                .iter()
                .filter_map(|key| table.get(*key))
                .flat_map(|entries| entries.iter().map(|(_, handler)| handler.clone()))
                .collect()
        };

        tracing::debug!(event = %name, handlers = matching.len(), "Publishing node event");

        // Handlers run outside the lock so they may (un)subscribe
        for handler in matching {
            handler(event);
        }

        // No receivers is fine: the channel is fire-and-forget
        let _ = self.sender.send(event.clone());
    }

    /// Publish every event of a mutation in order; returns whether it was applied
    pub fn dispatch(&self, mutation: Mutation) -> bool {
        let applied = mutation.is_applied();
        for event in mutation.into_events() {
            self.publish(&event);
        }
        applied
    }
}
