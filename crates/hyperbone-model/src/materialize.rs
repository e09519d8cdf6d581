//! Turning raw JSON into graph nodes.
//!
//! - scalars stay scalars;
//! - objects become models of the class registered for their key;
//! - arrays whose elements are all objects (including empty arrays) become
//!   collections whose elements share that class;
//! - any other array stays a plain JSON value.

use serde_json::Value;

use crate::attribute::Attribute;
use crate::class::PrototypeRegistry;
use crate::collection::Collection;
use crate::model::Model;

pub fn materialize(key: &str, value: Attribute, prototypes: &PrototypeRegistry) -> Attribute {
    match value {
        Attribute::Value(Value::Object(map)) => {
            Attribute::Model(Model::with_class(&prototypes.resolve(key), Value::Object(map)))
        }
        Attribute::Value(Value::Array(items)) if is_model_array(&items) => {
            Attribute::Collection(Collection::from_documents(&prototypes.resolve(key), items))
        }
        other => other,
    }
}

/// Arrays of objects materialize as collections.
pub fn is_model_array(items: &[Value]) -> bool {
    items.iter().all(Value::is_object)
}
