//! Ordered collections of models.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use hyperbone_path::parse_path;
use serde_json::Value;
use tracing::trace;

use crate::attribute::Attribute;
use crate::class::ModelClass;
use crate::error::ModelError;
use crate::events::{ChangeEvent, Listener, ListenerId, Listeners, CHANGE};
use crate::model::Model;
use crate::options::SetOptions;
use crate::resolve::{self, Node};

#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

struct CollectionInner {
    class: Rc<ModelClass>,
    entries: RefCell<Vec<Entry>>,
    listeners: Listeners,
}

struct Entry {
    model: Model,
    relay: ListenerId,
}

impl Collection {
    pub fn new(class: &Rc<ModelClass>) -> Collection {
        Collection {
            inner: Rc::new(CollectionInner {
                class: Rc::clone(class),
                entries: RefCell::default(),
                listeners: Listeners::default(),
            }),
        }
    }

    /// Materialize every document as a model of `class`.
    pub fn from_documents(class: &Rc<ModelClass>, documents: Vec<Value>) -> Collection {
        let collection = Collection::new(class);
        for doc in documents {
            collection.insert(Model::with_class(class, doc));
        }
        collection
    }

    /// Class of materialized elements.
    pub fn class(&self) -> &Rc<ModelClass> {
        &self.inner.class
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    pub fn at(&self, index: usize) -> Option<Model> {
        self.inner
            .entries
            .borrow()
            .get(index)
            .map(|entry| entry.model.clone())
    }

    pub fn models(&self) -> Vec<Model> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.model.clone())
            .collect()
    }

    /// Resolve a path rooted at this collection, e.g. `"[0].name"`.
    pub fn get(&self, path: &str) -> Result<Option<Attribute>, ModelError> {
        let steps = parse_path(path)?;
        Ok(resolve::get(Node::Collection(self.clone()), &steps))
    }

    pub fn set(&self, path: &str, value: impl Into<Attribute>) -> Result<(), ModelError> {
        let steps = parse_path(path)?;
        resolve::set(
            Node::Collection(self.clone()),
            &steps,
            value.into(),
            SetOptions::default(),
        )
    }

    /// Append a model, materializing a raw object with the element class.
    pub fn push(&self, value: impl Into<Attribute>) -> Result<Model, ModelError> {
        let model = self.adopt(value.into())?;
        self.insert(model.clone());
        self.announce(ChangeEvent::add(model.to_json()), SetOptions::default());
        Ok(model)
    }

    pub fn remove_at(&self, index: usize) -> Option<Model> {
        self.remove_silently(index).map(|model| {
            self.announce(ChangeEvent::remove(model.to_json()), SetOptions::default());
            model
        })
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.models().iter().map(Model::to_json).collect())
    }

    pub fn on<F>(&self, topic: &str, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + 'static,
    {
        self.subscribe(topic, Rc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.listeners.off(id)
    }

    pub(crate) fn subscribe(&self, topic: &str, listener: Listener) -> ListenerId {
        self.inner.listeners.on(topic, listener)
    }

    /// Assign at `index`: an object over an existing element updates it in
    /// place, `index == len` appends. Slots only hold models, so with
    /// `no_traverse` a raw value is rejected instead of materialized.
    pub(crate) fn set_at(
        &self,
        index: usize,
        value: Attribute,
        options: SetOptions,
    ) -> Result<(), ModelError> {
        let len = self.len();
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len });
        }
        if options.no_traverse {
            if !matches!(value, Attribute::Model(_)) {
                return Err(ModelError::NotAResource);
            }
        } else if let (Some(existing), Attribute::Value(Value::Object(map))) = (self.at(index), &value) {
            existing.update(map.clone(), options);
            return Ok(());
        }
        let model = self.adopt(value)?;
        if index == len {
            self.insert(model.clone());
            self.announce(ChangeEvent::add(model.to_json()), options);
        } else {
            let previous = self.replace(index, model.clone());
            self.announce(ChangeEvent::remove(previous.to_json()), options);
            self.announce(ChangeEvent::add(model.to_json()), options);
        }
        Ok(())
    }

    /// Positional in-place update: existing elements are updated key-wise,
    /// extra documents are appended, and surplus elements are dropped.
    pub(crate) fn update(&self, documents: Vec<Value>, options: SetOptions) {
        let target_len = documents.len();
        trace!(from = self.len(), to = target_len, "update collection");

        for (index, doc) in documents.into_iter().enumerate() {
            let Value::Object(map) = doc else { continue };
            match self.at(index) {
                Some(existing) => existing.update(map, options),
                None => {
                    let model = Model::with_class(&self.inner.class, Value::Object(map));
                    self.insert(model.clone());
                    self.announce(ChangeEvent::add(model.to_json()), options);
                }
            }
        }

        while self.len() > target_len {
            if let Some(removed) = self.remove_silently(self.len() - 1) {
                self.announce(ChangeEvent::remove(removed.to_json()), options);
            }
        }
    }

    fn adopt(&self, value: Attribute) -> Result<Model, ModelError> {
        match value {
            Attribute::Model(model) => Ok(model),
            Attribute::Value(Value::Object(map)) => {
                Ok(Model::with_class(&self.inner.class, Value::Object(map)))
            }
            _ => Err(ModelError::NotAResource),
        }
    }

    fn insert(&self, model: Model) {
        let relay = model.on(CHANGE, self.relay());
        self.inner.entries.borrow_mut().push(Entry { model, relay });
    }

    fn replace(&self, index: usize, model: Model) -> Model {
        let relay = model.on(CHANGE, self.relay());
        let previous = std::mem::replace(
            &mut self.inner.entries.borrow_mut()[index],
            Entry { model, relay },
        );
        previous.model.off(previous.relay);
        previous.model
    }

    fn remove_silently(&self, index: usize) -> Option<Model> {
        let mut entries = self.inner.entries.borrow_mut();
        if index >= entries.len() {
            return None;
        }
        let entry = entries.remove(index);
        drop(entries);
        entry.model.off(entry.relay);
        Some(entry.model)
    }

    /// Emit a structural event followed by `change`.
    fn announce(&self, event: ChangeEvent, options: SetOptions) {
        if options.silent {
            return;
        }
        self.inner.listeners.emit(&event);
        self.inner.listeners.emit(&ChangeEvent::change());
    }

    fn relay(&self) -> impl Fn(&ChangeEvent) + 'static {
        let collection: Weak<CollectionInner> = Rc::downgrade(&self.inner);
        move |_: &ChangeEvent| {
            if let Some(inner) = collection.upgrade() {
                inner.listeners.emit(&ChangeEvent::change());
            }
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("class", &self.class().name())
            .field("models", &self.to_json())
            .finish()
    }
}
