//! Observable attribute storage.
//!
//! Models are written strictly against [`AttributeStore`]: plain key/value
//! storage plus topic subscriptions and synchronous emission. Storage calls
//! never emit on their own; the model decides which events a mutation
//! produces and emits them through the same store.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::attribute::Attribute;
use crate::events::{ChangeEvent, Listener, ListenerId, Listeners};

pub trait AttributeStore {
    fn get(&self, key: &str) -> Option<Attribute>;

    /// Store `value` under `key`, returning the previous value.
    fn put(&self, key: &str, value: Attribute) -> Option<Attribute>;

    fn remove(&self, key: &str) -> Option<Attribute>;

    /// Keys in insertion order.
    fn keys(&self) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn on(&self, topic: &str, listener: Listener) -> ListenerId;

    fn off(&self, id: ListenerId) -> bool;

    fn emit(&self, event: &ChangeEvent);
}

/// In-memory store: an insertion-ordered map plus a listener registry.
#[derive(Default)]
pub struct MemoryStore {
    attributes: RefCell<IndexMap<String, Attribute>>,
    listeners: Listeners,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Attribute> {
        self.attributes.borrow().get(key).cloned()
    }

    fn put(&self, key: &str, value: Attribute) -> Option<Attribute> {
        self.attributes.borrow_mut().insert(key.to_string(), value)
    }

    fn remove(&self, key: &str) -> Option<Attribute> {
        self.attributes.borrow_mut().shift_remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.attributes.borrow().keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.attributes.borrow().len()
    }

    fn on(&self, topic: &str, listener: Listener) -> ListenerId {
        self.listeners.on(topic, listener)
    }

    fn off(&self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    fn emit(&self, event: &ChangeEvent) {
        self.listeners.emit(event);
    }
}
