//! Path resolution over the materialized graph.

use hyperbone_path::{format_path, split_parent, PathError, PathStep};
use serde_json::{Map, Value};

use crate::attribute::Attribute;
use crate::collection::Collection;
use crate::error::ModelError;
use crate::model::Model;
use crate::options::SetOptions;

/// A node that path steps can descend through.
#[derive(Clone)]
pub(crate) enum Node {
    Model(Model),
    Collection(Collection),
}

impl Node {
    fn into_attribute(self) -> Attribute {
        match self {
            Node::Model(m) => Attribute::Model(m),
            Node::Collection(c) => Attribute::Collection(c),
        }
    }
}

/// Walk `steps` from `root`. Plain JSON reached on the way (untraversed
/// values, scalar arrays) is walked as JSON for the remaining steps.
pub(crate) fn get(root: Node, steps: &[PathStep]) -> Option<Attribute> {
    let mut current = root.into_attribute();
    for (i, step) in steps.iter().enumerate() {
        current = match (step, current) {
            (PathStep::Key(key), Attribute::Model(m)) => m.attr(key)?,
            (PathStep::Index(index), Attribute::Collection(c)) => Attribute::Model(c.at(*index)?),
            (_, Attribute::Value(v)) => {
                return hyperbone_path::get(&v, &steps[i..])
                    .cloned()
                    .map(Attribute::Value);
            }
            _ => return None,
        };
    }
    Some(current)
}

pub(crate) fn set(
    root: Node,
    steps: &[PathStep],
    value: Attribute,
    options: SetOptions,
) -> Result<(), ModelError> {
    let (parent, leaf) = split_parent(steps).ok_or(PathError::Empty)?;

    let mut current = root;
    for (i, step) in parent.iter().enumerate() {
        let next = parent.get(i + 1).unwrap_or(leaf);
        current = descend_or_create(current, step, next, options, steps)?;
    }

    match (leaf, current) {
        (PathStep::Key(key), Node::Model(m)) => {
            m.set_attr(key, value, options);
            Ok(())
        }
        (PathStep::Index(index), Node::Collection(c)) => c.set_at(*index, value, options),
        (step, _) => Err(ModelError::NotContainer {
            step: step.to_string(),
        }),
    }
}

pub(crate) fn unset(root: Node, steps: &[PathStep]) -> Result<Option<Attribute>, ModelError> {
    let (parent, leaf) = split_parent(steps).ok_or(PathError::Empty)?;

    let mut current = root;
    for step in parent {
        current = match descend(current, step)? {
            Some(node) => node,
            None => return Ok(None),
        };
    }

    match (leaf, current) {
        (PathStep::Key(key), Node::Model(m)) => Ok(m.remove_attr(key, SetOptions::default())),
        (PathStep::Index(index), Node::Collection(c)) => {
            Ok(c.remove_at(*index).map(Attribute::Model))
        }
        (step, _) => Err(ModelError::NotContainer {
            step: step.to_string(),
        }),
    }
}

/// One step down. `Ok(None)` when the step is missing.
fn descend(current: Node, step: &PathStep) -> Result<Option<Node>, ModelError> {
    match (step, current) {
        (PathStep::Key(key), Node::Model(m)) => match m.attr(key) {
            Some(Attribute::Model(child)) => Ok(Some(Node::Model(child))),
            Some(Attribute::Collection(c)) => Ok(Some(Node::Collection(c))),
            Some(Attribute::Value(Value::Null)) | None => Ok(None),
            Some(_) => Err(ModelError::NotContainer { step: key.clone() }),
        },
        (PathStep::Index(index), Node::Collection(c)) => Ok(c.at(*index).map(Node::Model)),
        (step, _) => Err(ModelError::NotContainer {
            step: step.to_string(),
        }),
    }
}

/// One step down, creating a missing model (or collection, when the next
/// step is an index) unless `no_traverse` is set.
fn descend_or_create(
    current: Node,
    step: &PathStep,
    next: &PathStep,
    options: SetOptions,
    full_path: &[PathStep],
) -> Result<Node, ModelError> {
    if let Some(node) = descend(current.clone(), step)? {
        return Ok(node);
    }
    let not_found = || ModelError::PathNotFound {
        path: format_path(full_path),
    };
    match (step, current) {
        (PathStep::Key(key), Node::Model(m)) if !options.no_traverse => {
            let blank = if next.is_index() {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
            m.set_attr(key, Attribute::Value(blank), options);
            match m.attr(key) {
                Some(Attribute::Model(child)) => Ok(Node::Model(child)),
                Some(Attribute::Collection(c)) => Ok(Node::Collection(c)),
                _ => Err(not_found()),
            }
        }
        (PathStep::Index(index), Node::Collection(c)) => Err(ModelError::IndexOutOfBounds {
            index: *index,
            len: c.len(),
        }),
        _ => Err(not_found()),
    }
}
