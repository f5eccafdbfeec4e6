//! Event bus module - topic-keyed publish/subscribe
//!
//! Topics are colon-delimited strings (`"Game:Diamond:Collected"`). Subscribers
//! are plain handler values (`H`), so the bus stays free of closures and the
//! owner decides how a handler value is executed.
//!
//! Dispatch is queue-based: [`EventBus::raise`] only enqueues, and the owner
//! drains with [`EventBus::next_dispatch`], receiving the event together with
//! a snapshot of the subscribers current at dispatch time. Events raised while
//! handling are therefore dispatched after every subscriber of the current
//! event has run; there is no reentrant interleaving.
//!
//! Topics are stored in a `BTreeMap`, so removing a whole group by prefix
//! (`"Game:"`) walks a single ordered range.

use std::collections::{BTreeMap, VecDeque};

use crate::entity::EntityId;
use crate::types::Cell;

/// One raised event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub topic: String,
    /// Entity the event originates from
    pub source: Option<EntityId>,
    /// Cell the event happened at
    pub cell: Option<Cell>,
    /// Numeric payload (score, level number, seconds left...)
    pub value: i64,
    /// Level the event belongs to, for session-level stats
    pub level: Option<u32>,
}

impl Event {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            source: None,
            cell: None,
            value: 0,
            level: None,
        }
    }

    pub fn from_entity(mut self, id: EntityId, cell: Cell) -> Self {
        self.source = Some(id);
        self.cell = Some(cell);
        self
    }

    pub fn at(mut self, cell: Cell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    pub fn for_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }
}

/// Topic registry plus pending dispatch queue
#[derive(Debug, Clone)]
pub struct EventBus<H> {
    topics: BTreeMap<String, Vec<H>>,
    queue: VecDeque<Event>,
}

impl<H: Clone + PartialEq> EventBus<H> {
    pub fn new() -> Self {
        Self {
            topics: BTreeMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Subscribe `handler` to `topic`
    ///
    /// Subscription order is dispatch order. Connecting the same handler twice
    /// to one topic is a no-op.
    pub fn connect(&mut self, topic: &str, handler: H) {
        let subs = self.topics.entry(topic.to_string()).or_default();
        if !subs.contains(&handler) {
            subs.push(handler);
        }
    }

    pub fn connect_many<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, H)>,
    {
        for (topic, handler) in pairs {
            self.connect(topic, handler);
        }
    }

    /// Unsubscribe one handler; returns whether it was connected
    pub fn disconnect(&mut self, topic: &str, handler: &H) -> bool {
        let Some(subs) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|h| h != handler);
        let removed = subs.len() != before;
        if subs.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Drop every subscription whose topic starts with `prefix`
    ///
    /// Returns the number of topics removed.
    pub fn disconnect_group(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .topics
            .range(prefix.to_string()..)
            .take_while(|(topic, _)| topic.starts_with(prefix))
            .map(|(topic, _)| topic.clone())
            .collect();
        for topic in &doomed {
            self.topics.remove(topic);
        }
        doomed.len()
    }

    /// Drop every subscription on every topic
    pub fn disconnect_all(&mut self) {
        self.topics.clear();
    }

    /// Drop every subscription of handlers matching `pred`
    pub fn disconnect_where(&mut self, mut pred: impl FnMut(&H) -> bool) {
        for subs in self.topics.values_mut() {
            subs.retain(|h| !pred(h));
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }

    /// Queue an event for dispatch
    pub fn raise(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Pop the oldest queued event with its current subscribers
    pub fn next_dispatch(&mut self) -> Option<(Event, Vec<H>)> {
        let event = self.queue.pop_front()?;
        let handlers = self.subscribers(&event.topic).to_vec();
        Some((event, handlers))
    }

    pub fn subscribers(&self, topic: &str) -> &[H] {
        self.topics.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_connected(&self, topic: &str) -> bool {
        !self.subscribers(topic).is_empty()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }
}

impl<H: Clone + PartialEq> Default for EventBus<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_preserves_order_and_dedups() {
        let mut bus = EventBus::new();
        bus.connect("Game:Rock:TouchedDown", 2u8);
        bus.connect("Game:Rock:TouchedDown", 1u8);
        bus.connect("Game:Rock:TouchedDown", 2u8);
        assert_eq!(bus.subscribers("Game:Rock:TouchedDown"), &[2, 1]);
    }

    #[test]
    fn test_dispatch_snapshots_subscribers() {
        let mut bus = EventBus::new();
        bus.connect_many([("A", 1u8), ("A", 2u8), ("B", 3u8)]);
        bus.raise(Event::new("A"));
        bus.raise(Event::new("C"));

        let (event, handlers) = bus.next_dispatch().unwrap();
        assert_eq!(event.topic, "A");
        assert_eq!(handlers, vec![1, 2]);

        let (event, handlers) = bus.next_dispatch().unwrap();
        assert_eq!(event.topic, "C");
        assert!(handlers.is_empty());
        assert!(bus.next_dispatch().is_none());
    }

    #[test]
    fn test_events_raised_during_dispatch_are_queued_after() {
        let mut bus = EventBus::new();
        bus.connect("first", 1u8);
        bus.raise(Event::new("first"));
        bus.raise(Event::new("second"));

        let (event, _) = bus.next_dispatch().unwrap();
        assert_eq!(event.topic, "first");
        // A handler of "first" raises "third"
        bus.raise(Event::new("third"));

        let order: Vec<String> = std::iter::from_fn(|| bus.next_dispatch())
            .map(|(e, _)| e.topic)
            .collect();
        assert_eq!(order, vec!["second".to_string(), "third".to_string()]);
    }

    #[test]
    fn test_disconnect_single_handler() {
        let mut bus = EventBus::new();
        bus.connect("T", 1u8);
        bus.connect("T", 2u8);
        assert!(bus.disconnect("T", &1));
        assert!(!bus.disconnect("T", &1));
        assert_eq!(bus.subscribers("T"), &[2]);
        assert!(bus.disconnect("T", &2));
        assert_eq!(bus.topic_count(), 0);
    }

    #[test]
    fn test_disconnect_group_by_prefix() {
        let mut bus = EventBus::new();
        bus.connect("Game:Diamond:Collected", 1u8);
        bus.connect("Game:Earth:Digged", 1u8);
        bus.connect("Gamer:Other", 1u8);
        bus.connect("Main:Game:Over", 1u8);
        bus.connect("Stats:Level:Won", 1u8);

        assert_eq!(bus.disconnect_group("Game:"), 2);
        assert!(!bus.is_connected("Game:Diamond:Collected"));
        assert!(bus.is_connected("Gamer:Other"));
        assert!(bus.is_connected("Main:Game:Over"));

        assert_eq!(bus.disconnect_group("Main:Game:"), 1);
        bus.disconnect_all();
        assert_eq!(bus.topic_count(), 0);
    }

    #[test]
    fn test_disconnect_where() {
        let mut bus = EventBus::new();
        bus.connect("A", 1u8);
        bus.connect("A", 2u8);
        bus.connect("B", 1u8);
        bus.disconnect_where(|h| *h == 1);
        assert_eq!(bus.subscribers("A"), &[2]);
        assert!(!bus.is_connected("B"));
    }
}
