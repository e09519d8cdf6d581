//! Model classes: defaults, per-key prototypes, and the backing store.
//!
//! A class is the unit of customization for materialized nodes. Its
//! [`PrototypeRegistry`] maps attribute keys (or `_embedded` keys) to the
//! class used when a nested object or array under that key is materialized.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::model::Model;
use crate::store::{AttributeStore, MemoryStore};

pub const BASE_CLASS_NAME: &str = "Model";

/// Constructor for the store backing each node of a class.
pub type StoreFactory = fn() -> Box<dyn AttributeStore>;

fn memory_store() -> Box<dyn AttributeStore> {
    Box::new(MemoryStore::new())
}

/// Attribute key → class used to materialize values under that key.
#[derive(Debug, Clone, Default)]
pub struct PrototypeRegistry {
    entries: HashMap<String, Rc<ModelClass>>,
}

impl PrototypeRegistry {
    pub fn get(&self, key: &str) -> Option<&Rc<ModelClass>> {
        self.entries.get(key)
    }

    /// Class for `key`, falling back to the base class.
    pub fn resolve(&self, key: &str) -> Rc<ModelClass> {
        self.entries
            .get(key)
            .map(Rc::clone)
            .unwrap_or_else(ModelClass::base)
    }

    pub fn insert(&mut self, key: impl Into<String>, class: Rc<ModelClass>) {
        self.entries.insert(key.into(), class);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ModelClass {
    name: String,
    defaults: Map<String, Value>,
    prototypes: PrototypeRegistry,
    store: StoreFactory,
}

impl ModelClass {
    /// The default class: no defaults, no prototypes, in-memory storage.
    pub fn base() -> Rc<ModelClass> {
        ModelClass::builder(BASE_CLASS_NAME).build()
    }

    pub fn builder(name: impl Into<String>) -> ModelClassBuilder {
        ModelClassBuilder {
            name: name.into(),
            defaults: Map::new(),
            prototypes: PrototypeRegistry::default(),
            store: memory_store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    pub fn prototypes(&self) -> &PrototypeRegistry {
        &self.prototypes
    }

    pub(crate) fn new_store(&self) -> Box<dyn AttributeStore> {
        (self.store)()
    }

    /// Materialize `doc` as an instance of this class.
    pub fn create(self: &Rc<Self>, doc: Value) -> Model {
        Model::with_class(self, doc)
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("prototypes", &self.prototypes)
            .finish()
    }
}

pub struct ModelClassBuilder {
    name: String,
    defaults: Map<String, Value>,
    prototypes: PrototypeRegistry,
    store: StoreFactory,
}

impl ModelClassBuilder {
    /// Merge an object of initial attribute values. Non-object values are
    /// ignored.
    pub fn defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.defaults.extend(map);
        }
        self
    }

    pub fn default_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    pub fn prototype(mut self, key: impl Into<String>, class: Rc<ModelClass>) -> Self {
        self.prototypes.insert(key, class);
        self
    }

    pub fn store(mut self, factory: StoreFactory) -> Self {
        self.store = factory;
        self
    }

    pub fn build(self) -> Rc<ModelClass> {
        Rc::new(ModelClass {
            name: self.name,
            defaults: self.defaults,
            prototypes: self.prototypes,
            store: self.store,
        })
    }
}
