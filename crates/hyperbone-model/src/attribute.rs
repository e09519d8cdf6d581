use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::collection::Collection;
use crate::model::Model;

/// A value held under an attribute key.
#[derive(Clone)]
pub enum Attribute {
    /// Scalar JSON, or raw JSON stored with `no_traverse`.
    Value(Value),
    Model(Model),
    Collection(Collection),
    /// Runtime object attached with `no_traverse`; compared by identity and
    /// skipped by serialization.
    Opaque(Rc<dyn Any>),
}

impl Attribute {
    pub fn opaque<T: Any>(value: T) -> Self {
        Attribute::Opaque(Rc::new(value))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attribute::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Attribute::Value(Value::Null))
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Attribute::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_model(self) -> Option<Model> {
        match self {
            Attribute::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Attribute::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Attribute::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Attribute::Opaque(o) => o.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Plain JSON for this value. Opaque values have none.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Attribute::Value(v) => Some(v.clone()),
            Attribute::Model(m) => Some(m.to_json()),
            Attribute::Collection(c) => Some(c.to_json()),
            Attribute::Opaque(_) => None,
        }
    }

    /// Identity for nodes and opaque values, equality for JSON.
    pub fn same(&self, other: &Attribute) -> bool {
        match (self, other) {
            (Attribute::Value(a), Attribute::Value(b)) => a == b,
            (Attribute::Model(a), Attribute::Model(b)) => a.ptr_eq(b),
            (Attribute::Collection(a), Attribute::Collection(b)) => a.ptr_eq(b),
            (Attribute::Opaque(a), Attribute::Opaque(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Value(v) => write!(f, "Value({})", v),
            Attribute::Model(m) => fmt::Debug::fmt(m, f),
            Attribute::Collection(c) => fmt::Debug::fmt(c, f),
            Attribute::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Deep comparison against plain JSON; nodes compare by their serialization.
impl PartialEq<Value> for Attribute {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Attribute::Value(v) => v == other,
            Attribute::Opaque(_) => false,
            node => node.to_json().as_ref() == Some(other),
        }
    }
}

impl PartialEq<&str> for Attribute {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl From<Value> for Attribute {
    fn from(v: Value) -> Self {
        Attribute::Value(v)
    }
}

impl From<&str> for Attribute {
    fn from(v: &str) -> Self {
        Attribute::Value(Value::String(v.to_string()))
    }
}

impl From<String> for Attribute {
    fn from(v: String) -> Self {
        Attribute::Value(Value::String(v))
    }
}

impl From<i32> for Attribute {
    fn from(v: i32) -> Self {
        Attribute::Value(Value::from(v))
    }
}

impl From<i64> for Attribute {
    fn from(v: i64) -> Self {
        Attribute::Value(Value::from(v))
    }
}

impl From<u64> for Attribute {
    fn from(v: u64) -> Self {
        Attribute::Value(Value::from(v))
    }
}

impl From<f64> for Attribute {
    fn from(v: f64) -> Self {
        Attribute::Value(Value::from(v))
    }
}

impl From<bool> for Attribute {
    fn from(v: bool) -> Self {
        Attribute::Value(Value::Bool(v))
    }
}

impl From<Model> for Attribute {
    fn from(m: Model) -> Self {
        Attribute::Model(m)
    }
}

impl From<Collection> for Attribute {
    fn from(c: Collection) -> Self {
        Attribute::Collection(c)
    }
}
