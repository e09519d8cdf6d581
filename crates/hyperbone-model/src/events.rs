//! Change events and the listener registry shared by models and collections.
//!
//! A model emits `change:<key>` for every attribute whose value changed,
//! followed by a single `change`. Collections emit `add`, `remove`, and
//! `change`. Parents subscribe to the `change` topic of each child they hold
//! and re-emit it as `change:<key>` on themselves, so a mutation deep in the
//! tree reaches every ancestor without touching siblings.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

pub const CHANGE: &str = "change";
pub const ADD: &str = "add";
pub const REMOVE: &str = "remove";

pub type ListenerId = u64;

pub type Listener = Rc<dyn Fn(&ChangeEvent)>;

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub topic: String,
    /// Attribute key for `change:<key>` events.
    pub key: Option<String>,
    /// JSON snapshot of the new value. `None` when the attribute was removed
    /// or cannot be serialized.
    pub value: Option<Value>,
}

impl ChangeEvent {
    pub fn change() -> Self {
        Self {
            topic: CHANGE.to_string(),
            key: None,
            value: None,
        }
    }

    pub fn attribute(key: &str, value: Option<Value>) -> Self {
        Self {
            topic: attribute_topic(key),
            key: Some(key.to_string()),
            value,
        }
    }

    pub fn add(value: Value) -> Self {
        Self {
            topic: ADD.to_string(),
            key: None,
            value: Some(value),
        }
    }

    pub fn remove(value: Value) -> Self {
        Self {
            topic: REMOVE.to_string(),
            key: None,
            value: Some(value),
        }
    }
}

/// Topic name for changes of a single attribute.
pub fn attribute_topic(key: &str) -> String {
    format!("{}:{}", CHANGE, key)
}

/// Topic-filtered listener registry.
#[derive(Default)]
pub struct Listeners {
    next_id: Cell<ListenerId>,
    entries: RefCell<BTreeMap<ListenerId, (String, Listener)>>,
}

impl Listeners {
    pub fn on(&self, topic: &str, listener: Listener) -> ListenerId {
        let id = self.next_id.get().saturating_add(1);
        self.next_id.set(id);
        self.entries
            .borrow_mut()
            .insert(id, (topic.to_string(), listener));
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.entries.borrow_mut().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Call every listener subscribed to the event's topic.
    ///
    /// The registry is not borrowed while listeners run, so they may
    /// subscribe, unsubscribe, or mutate the emitting node.
    pub fn emit(&self, event: &ChangeEvent) {
        let matching: Vec<Listener> = self
            .entries
            .borrow()
            .values()
            .filter(|(topic, _)| *topic == event.topic)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        if matching.is_empty() {
            return;
        }
        trace!(topic = %event.topic, listeners = matching.len(), "emit");
        for listener in matching {
            listener(event);
        }
    }
}
