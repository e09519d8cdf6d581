//! Resource nodes.
//!
//! A [`Model`] is a cheap handle onto a shared node. Cloning the handle does
//! not copy the node; [`Model::ptr_eq`] compares identity. Nested objects and
//! arrays of objects are materialized into child models and collections
//! owned by their parent, and the parent relays each child's `change` event
//! as `change:<key>` on itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use hyperbone_path::{is_simple_key, parse_path};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::attribute::Attribute;
use crate::class::ModelClass;
use crate::collection::Collection;
use crate::command::CommandTree;
use crate::error::ModelError;
use crate::events::{ChangeEvent, Listener, ListenerId, CHANGE};
use crate::links::LinkTable;
use crate::materialize::{is_model_array, materialize};
use crate::options::SetOptions;
use crate::resolve::{self, Node};
use crate::store::AttributeStore;

pub const LINKS_KEY: &str = "_links";
pub const EMBEDDED_KEY: &str = "_embedded";
pub const COMMANDS_KEY: &str = "_commands";

#[derive(Clone)]
pub struct Model {
    pub(crate) inner: Rc<ModelInner>,
}

pub(crate) struct ModelInner {
    pub(crate) class: Rc<ModelClass>,
    pub(crate) store: Box<dyn AttributeStore>,
    pub(crate) links: RefCell<LinkTable>,
    pub(crate) commands: RefCell<CommandTree>,
    /// Relay subscriptions held on child nodes, by attribute key.
    bindings: RefCell<HashMap<String, ListenerId>>,
}

/// Non-owning reference to a model.
#[derive(Clone)]
pub(crate) struct WeakModel(Weak<ModelInner>);

impl WeakModel {
    pub(crate) fn upgrade(&self) -> Option<Model> {
        self.0.upgrade().map(|inner| Model { inner })
    }
}

impl Model {
    /// Materialize `doc` with the base class.
    pub fn new(doc: Value) -> Model {
        Model::with_class(&ModelClass::base(), doc)
    }

    pub fn with_class(class: &Rc<ModelClass>, doc: Value) -> Model {
        Model::with_store(class, class.new_store(), doc)
    }

    /// Materialize `doc` on top of a caller-provided store.
    ///
    /// Class defaults are applied first and overridden by the document's own
    /// attributes, which are in turn overridden by `_embedded` entries. No
    /// events are emitted during construction.
    pub fn with_store(class: &Rc<ModelClass>, store: Box<dyn AttributeStore>, doc: Value) -> Model {
        let model = Model {
            inner: Rc::new(ModelInner {
                class: Rc::clone(class),
                store,
                links: RefCell::default(),
                commands: RefCell::default(),
                bindings: RefCell::default(),
            }),
        };

        let mut attributes = class.defaults().clone();
        match doc {
            Value::Object(map) => attributes.extend(map),
            Value::Null => {}
            other => warn!(class = class.name(), value = %other, "ignoring non-object resource document"),
        }
        model.apply_document(attributes, SetOptions::silent());

        debug!(
            class = class.name(),
            attributes = model.len(),
            links = model.inner.links.borrow().len(),
            commands = !model.inner.commands.borrow().is_empty(),
            "materialized resource"
        );
        model
    }

    pub fn class(&self) -> &Rc<ModelClass> {
        &self.inner.class
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakModel {
        WeakModel(Rc::downgrade(&self.inner))
    }

    // ── Attribute access ──────────────────────────────────────────────────

    /// Single-key lookup, without path parsing.
    pub fn attr(&self, key: &str) -> Option<Attribute> {
        self.inner.store.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.store.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.store.keys()
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Resolve `path` (`"a.b[2].c"`) against this model.
    ///
    /// A literal attribute named `path` takes precedence over traversal.
    /// Missing attributes resolve to `Ok(None)`; malformed paths are errors.
    pub fn get(&self, path: &str) -> Result<Option<Attribute>, ModelError> {
        if let Some(found) = self.inner.store.get(path) {
            return Ok(Some(found));
        }
        if is_simple_key(path) {
            return Ok(None);
        }
        let steps = parse_path(path)?;
        Ok(resolve::get(Node::Model(self.clone()), &steps))
    }

    pub fn get_model(&self, path: &str) -> Result<Option<Model>, ModelError> {
        Ok(self.get(path)?.and_then(Attribute::into_model))
    }

    pub fn get_collection(&self, path: &str) -> Result<Option<Collection>, ModelError> {
        Ok(self.get(path)?.and_then(Attribute::into_collection))
    }

    pub fn set(&self, path: &str, value: impl Into<Attribute>) -> Result<(), ModelError> {
        self.set_with(path, value, SetOptions::default())
    }

    /// Assign `value` at `path`.
    ///
    /// An existing literal attribute named `path` is assigned directly, as
    /// `get` reads it first. Missing intermediate models are created unless `no_traverse` is set.
    /// An object assigned over an existing model, or an array of objects
    /// assigned over an existing collection, updates the existing node in
    /// place so its identity and subscribers survive.
    pub fn set_with(
        &self,
        path: &str,
        value: impl Into<Attribute>,
        options: SetOptions,
    ) -> Result<(), ModelError> {
        let value = value.into();
        trace!(path, no_traverse = options.no_traverse, "set");
        if is_simple_key(path) || self.has(path) {
            self.set_attr(path, value, options);
            return Ok(());
        }
        let steps = parse_path(path)?;
        resolve::set(Node::Model(self.clone()), &steps, value, options)
    }

    /// Mapping form of `set`: every entry is assigned, reserved hypermedia
    /// keys update links, commands, and embedded resources.
    pub fn set_all(&self, attributes: Value) -> Result<(), ModelError> {
        self.set_all_with(attributes, SetOptions::default())
    }

    pub fn set_all_with(&self, attributes: Value, options: SetOptions) -> Result<(), ModelError> {
        match attributes {
            Value::Object(map) => {
                self.update(map, options);
                Ok(())
            }
            _ => Err(ModelError::NotAMapping),
        }
    }

    /// Remove the attribute at `path`, returning the removed value. A literal
    /// attribute named `path` is removed before traversal is tried.
    pub fn unset(&self, path: &str) -> Result<Option<Attribute>, ModelError> {
        if is_simple_key(path) || self.has(path) {
            return Ok(self.remove_attr(path, SetOptions::default()));
        }
        let steps = parse_path(path)?;
        resolve::unset(Node::Model(self.clone()), &steps)
    }

    /// Plain JSON view of the attributes. Links and commands are not
    /// attributes and are left out; opaque values are skipped.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for key in self.keys() {
            if let Some(value) = self.attr(&key).and_then(|a| a.to_json()) {
                out.insert(key, value);
            }
        }
        Value::Object(out)
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn on<F>(&self, topic: &str, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + 'static,
    {
        self.inner.store.on(topic, Rc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.store.off(id)
    }

    // ── Mutation internals ────────────────────────────────────────────────

    pub(crate) fn set_attr(&self, key: &str, value: Attribute, options: SetOptions) {
        if self.assign(key, value, options) {
            self.announce(&[key.to_string()], options);
        }
    }

    pub(crate) fn remove_attr(&self, key: &str, options: SetOptions) -> Option<Attribute> {
        let removed = self.inner.store.remove(key)?;
        self.unbind(key, &removed);
        self.announce(&[key.to_string()], options);
        Some(removed)
    }

    /// Replace the attribute with a freshly materialized `value`. Unlike
    /// `set_attr`, an existing child node is swapped out rather than merged.
    pub(crate) fn replace_attr(&self, key: &str, value: Value, options: SetOptions) {
        if self.attr(key).and_then(|a| a.to_json()).as_ref() == Some(&value) {
            return;
        }
        let value = materialize(key, Attribute::Value(value), self.class().prototypes());
        if self.store_slot(key, value) {
            self.announce(&[key.to_string()], options);
        }
    }

    /// Key-wise in-place update with a single batch of events.
    pub(crate) fn update(&self, attributes: Map<String, Value>, options: SetOptions) {
        let changed = self.apply_document(attributes, options);
        self.announce(&changed, options);
    }

    /// Apply a raw document, returning the keys whose own slot changed.
    ///
    /// Nested in-place updates emit on the nested node and reach this model
    /// through its relay subscriptions, so they are not reported here.
    fn apply_document(&self, attributes: Map<String, Value>, options: SetOptions) -> Vec<String> {
        let mut changed = Vec::new();
        let mut embedded = None;

        for (key, value) in attributes {
            match key.as_str() {
                LINKS_KEY => *self.inner.links.borrow_mut() = LinkTable::from_value(&value),
                COMMANDS_KEY => *self.inner.commands.borrow_mut() = CommandTree::from_value(&value),
                EMBEDDED_KEY => embedded = Some(value),
                _ => {
                    if self.assign(&key, Attribute::Value(value), options) {
                        changed.push(key);
                    }
                }
            }
        }

        match embedded {
            Some(Value::Object(resources)) => {
                debug!(class = self.class().name(), count = resources.len(), "hoisting embedded resources");
                for (key, value) in resources {
                    if self.assign(&key, Attribute::Value(value), options) && !changed.contains(&key) {
                        changed.push(key);
                    }
                }
            }
            Some(other) => warn!(value = %other, "ignoring non-object _embedded section"),
            None => {}
        }

        changed
    }

    /// Store `value` under `key` without emitting. Returns `true` when the
    /// slot now holds a different value.
    fn assign(&self, key: &str, value: Attribute, options: SetOptions) -> bool {
        let value = if options.no_traverse {
            value
        } else {
            match (self.attr(key), value) {
                (Some(Attribute::Model(child)), Attribute::Value(Value::Object(map))) => {
                    child.update(map, options);
                    return false;
                }
                (Some(Attribute::Collection(collection)), Attribute::Value(Value::Array(items)))
                    if is_model_array(&items) =>
                {
                    collection.update(items, options);
                    return false;
                }
                (_, value) => materialize(key, value, self.class().prototypes()),
            }
        };
        self.store_slot(key, value)
    }

    /// Put an already materialized value, rebinding relays. Returns `true`
    /// when the slot now holds a different value.
    fn store_slot(&self, key: &str, value: Attribute) -> bool {
        if let Some(existing) = self.inner.store.get(key) {
            if existing.same(&value) {
                return false;
            }
        }

        if let Some(previous) = self.inner.store.put(key, value.clone()) {
            self.unbind(key, &previous);
        }
        self.bind(key, &value);
        true
    }

    fn announce(&self, keys: &[String], options: SetOptions) {
        if options.silent || keys.is_empty() {
            return;
        }
        for key in keys {
            let snapshot = self.attr(key).and_then(|a| a.to_json());
            self.inner.store.emit(&ChangeEvent::attribute(key, snapshot));
        }
        self.inner.store.emit(&ChangeEvent::change());
    }

    fn bind(&self, key: &str, value: &Attribute) {
        let id = match value {
            Attribute::Model(child) => child.inner.store.on(CHANGE, self.relay(key)),
            Attribute::Collection(collection) => collection.subscribe(CHANGE, self.relay(key)),
            _ => return,
        };
        self.inner.bindings.borrow_mut().insert(key.to_string(), id);
    }

    fn unbind(&self, key: &str, previous: &Attribute) {
        let Some(id) = self.inner.bindings.borrow_mut().remove(key) else {
            return;
        };
        match previous {
            Attribute::Model(child) => child.off(id),
            Attribute::Collection(collection) => collection.off(id),
            _ => false,
        };
    }

    /// Listener re-emitting a child's change as `change:<key>` on this model.
    fn relay(&self, key: &str) -> Listener {
        let parent = self.downgrade();
        let key = key.to_string();
        Rc::new(move |_: &ChangeEvent| {
            if let Some(parent) = parent.upgrade() {
                parent.announce(std::slice::from_ref(&key), SetOptions::default());
            }
        })
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("class", &self.class().name())
            .field("attributes", &self.to_json())
            .field("links", &self.inner.links.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_construction_strips_reserved_keys() {
        let m = Model::new(json!({
            "_links": {"self": {"href": "/x"}},
            "_commands": {"edit": {"href": "/edit", "properties": {}}},
            "_embedded": {"thing": {"name": "A"}},
            "test": "Hello"
        }));
        assert_eq!(m.keys(), vec!["test", "thing"]);
        assert!(m.attr(LINKS_KEY).is_none());
        assert!(m.attr(COMMANDS_KEY).is_none());
        assert!(m.attr(EMBEDDED_KEY).is_none());
    }

    #[test]
    fn test_defaults_are_overridden_by_document() {
        let class = ModelClass::builder("Task")
            .defaults(json!({"done": false, "title": "untitled"}))
            .build();
        let m = Model::with_class(&class, json!({"title": "Write tests"}));
        assert_eq!(m.to_json(), json!({"done": false, "title": "Write tests"}));
    }

    #[test]
    fn test_set_same_value_emits_nothing() {
        let m = Model::new(json!({"name": "a"}));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        m.on(CHANGE, move |_| h.set(h.get() + 1));
        m.set("name", "a").unwrap();
        assert_eq!(hits.get(), 0);
        m.set("name", "b").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_replaced_child_stops_relaying() {
        let m = Model::new(json!({"child": {"a": 1}}));
        let old = m.get_model("child").unwrap().unwrap();
        m.set("child", 5).unwrap();

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        m.on("change:child", move |_| h.set(h.get() + 1));
        old.set("a", 2).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_set_all_rejects_non_mappings() {
        let m = Model::new(json!({}));
        assert_eq!(m.set_all(json!([1, 2])), Err(ModelError::NotAMapping));
    }

    #[test]
    fn test_set_all_emits_single_change() {
        let m = Model::new(json!({"a": 1, "b": 2}));
        let topics = Rc::new(RefCell::new(Vec::new()));
        for topic in ["change:a", "change:b", "change"] {
            let t = Rc::clone(&topics);
            m.on(topic, move |ev| t.borrow_mut().push(ev.topic.clone()));
        }
        m.set_all(json!({"a": 10, "b": 20})).unwrap();
        assert_eq!(*topics.borrow(), vec!["change:a", "change:b", "change"]);
    }

    #[test]
    fn test_silent_set_emits_nothing() {
        let m = Model::new(json!({"a": {"b": 1}}));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        m.on(CHANGE, move |_| h.set(h.get() + 1));
        m.set_with("a.b", 2, SetOptions::silent()).unwrap();
        m.set_with("c", 3, SetOptions::silent()).unwrap();
        assert_eq!(hits.get(), 0);
        assert_eq!(m.get("a.b").unwrap().unwrap(), json!(2));
    }
}
