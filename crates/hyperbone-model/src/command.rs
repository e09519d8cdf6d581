//! `_commands` trees and bound command handles.
//!
//! A command is resolved either through a link whose href is a fragment
//! (`#_commands/edit/create`) or by a dotted path into the tree
//! (`edit.create`). Each resolution builds a fresh [`Command`] whose
//! properties node is materialized from the stored schema; edits to that node
//! are written back to the stored schema for keys it already has.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::ModelError;
use crate::events::CHANGE;
use crate::model::{Model, WeakModel};
use crate::options::SetOptions;

/// Accepted prefixes for command references in link hrefs.
pub const FRAGMENT_PREFIXES: [&str; 3] = ["#_commands/", "#commands/", "#command/"];

const DEFAULT_METHOD: &str = "GET";

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub href: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Property schema with current values. The key set never changes.
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandNode {
    Spec(CommandSpec),
    Namespace(IndexMap<String, CommandNode>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandTree {
    root: IndexMap<String, CommandNode>,
}

impl CommandTree {
    /// Parse a `_commands` section. An object with a string `href` is a leaf;
    /// any other object is a namespace. Anything else is skipped.
    pub fn from_value(commands: &Value) -> Self {
        match commands {
            Value::Object(map) => Self {
                root: parse_namespace("", map),
            },
            other => {
                warn!(value = %other, "ignoring non-object _commands section");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandSpec> {
        let (last, parents) = path.split_last()?;
        let mut level = &self.root;
        for step in parents {
            match level.get(step.as_ref())? {
                CommandNode::Namespace(children) => level = children,
                CommandNode::Spec(_) => return None,
            }
        }
        match level.get(last.as_ref())? {
            CommandNode::Spec(spec) => Some(spec),
            CommandNode::Namespace(_) => None,
        }
    }

    pub(crate) fn lookup_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut CommandSpec> {
        let (last, parents) = path.split_last()?;
        let mut level = &mut self.root;
        for step in parents {
            match level.get_mut(step.as_ref())? {
                CommandNode::Namespace(children) => level = children,
                CommandNode::Spec(_) => return None,
            }
        }
        match level.get_mut(last.as_ref())? {
            CommandNode::Spec(spec) => Some(spec),
            CommandNode::Namespace(_) => None,
        }
    }

    /// Dotted paths of every leaf, in document order.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(&self.root, "", &mut out);
        out
    }
}

fn parse_namespace(prefix: &str, map: &Map<String, Value>) -> IndexMap<String, CommandNode> {
    let mut nodes = IndexMap::new();
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let Value::Object(child) = value else {
            warn!(path = %path, "skipping non-object command entry");
            continue;
        };
        if child.get("href").is_some_and(Value::is_string) {
            match serde_json::from_value::<CommandSpec>(value.clone()) {
                Ok(spec) => {
                    nodes.insert(key.clone(), CommandNode::Spec(spec));
                }
                Err(err) => warn!(path = %path, error = %err, "skipping malformed command"),
            }
        } else {
            nodes.insert(key.clone(), CommandNode::Namespace(parse_namespace(&path, child)));
        }
    }
    nodes
}

fn collect_paths(level: &IndexMap<String, CommandNode>, prefix: &str, out: &mut Vec<String>) {
    for (key, node) in level {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match node {
            CommandNode::Spec(_) => out.push(path),
            CommandNode::Namespace(children) => collect_paths(children, &path, out),
        }
    }
}

/// Tree path encoded in a command fragment href, e.g. `#command/edit/create`.
pub fn parse_fragment(href: &str) -> Option<Vec<String>> {
    let rest = FRAGMENT_PREFIXES
        .iter()
        .find_map(|prefix| href.strip_prefix(prefix))?;
    let steps: Vec<String> = rest.split('/').map(str::to_string).collect();
    if steps.iter().any(String::is_empty) {
        return None;
    }
    Some(steps)
}

/// A command resolved against its owning resource.
pub struct Command {
    path: Vec<String>,
    spec: CommandSpec,
    properties: Model,
    owner: WeakModel,
}

impl Command {
    fn bind(owner: &Model, path: Vec<String>, spec: CommandSpec) -> Command {
        let properties = Model::new(Value::Object(spec.properties.clone()));
        let command = Command {
            path,
            spec,
            properties,
            owner: owner.downgrade(),
        };
        command.persist_on_change();
        command
    }

    /// Write property edits back into the owner's stored schema.
    fn persist_on_change(&self) {
        let owner = self.owner.clone();
        let node = self.properties.downgrade();
        let path = self.path.clone();
        self.properties.on(CHANGE, move |_| {
            let (Some(owner), Some(node)) = (owner.upgrade(), node.upgrade()) else {
                return;
            };
            let mut commands = owner.inner.commands.borrow_mut();
            let Some(stored) = commands.lookup_mut(&path) else {
                return;
            };
            for (key, slot) in stored.properties.iter_mut() {
                if let Some(value) = node.attr(key).and_then(|a| a.to_json()) {
                    *slot = value;
                }
            }
            trace!(command = %path.join("."), "persisted command properties");
        });
    }

    pub fn href(&self) -> &str {
        &self.spec.href
    }

    pub fn method(&self) -> &str {
        &self.spec.method
    }

    pub fn encoding(&self) -> Option<&str> {
        self.spec.encoding.as_deref()
    }

    /// The schema as it was when this command was resolved.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn properties(&self) -> &Model {
        &self.properties
    }

    pub fn owner(&self) -> Option<Model> {
        self.owner.upgrade()
    }

    fn schema_keys(&self) -> impl Iterator<Item = &String> {
        self.spec.properties.keys()
    }

    fn property(&self, key: &str) -> Option<Value> {
        self.properties.attr(key).and_then(|a| a.to_json())
    }

    fn owner_or_err(&self) -> Result<Model, ModelError> {
        self.owner.upgrade().ok_or(ModelError::OwnerReleased)
    }

    /// Copy owner attributes into matching properties, replacing each value
    /// whole.
    pub fn pull(&self) -> Result<(), ModelError> {
        let owner = self.owner_or_err()?;
        for key in self.schema_keys() {
            if let Some(value) = owner.attr(key).and_then(|a| a.to_json()) {
                self.properties.replace_attr(key, value, SetOptions::default());
            }
        }
        Ok(())
    }

    /// Copy properties onto the owner, creating attributes as needed.
    pub fn push(&self) -> Result<(), ModelError> {
        let owner = self.owner_or_err()?;
        for key in self.schema_keys() {
            if let Some(value) = self.property(key) {
                owner.replace_attr(key, value, SetOptions::default());
            }
        }
        Ok(())
    }

    /// Copy properties into `other` for keys in its schema only.
    pub fn push_to(&self, other: &Command) {
        for key in self.schema_keys() {
            if !other.spec.properties.contains_key(key) {
                continue;
            }
            if let Some(value) = self.property(key) {
                other.properties.replace_attr(key, value, SetOptions::default());
            }
        }
    }

    pub fn pull_from(&self, other: &Command) {
        other.push_to(self);
    }

    /// The schema with the current property values.
    pub fn to_json(&self) -> Value {
        let mut spec = self.spec.clone();
        for (key, slot) in spec.properties.iter_mut() {
            if let Some(value) = self.property(key) {
                *slot = value;
            }
        }
        serde_json::to_value(spec).unwrap_or(Value::Null)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("path", &self.path.join("."))
            .field("method", &self.spec.method)
            .field("href", &self.spec.href)
            .field("properties", &self.properties.to_json())
            .finish()
    }
}

impl Model {
    /// Resolve a command by link relation or dotted tree path.
    pub fn command(&self, reference: &str) -> Option<Command> {
        let link = self
            .inner
            .links
            .borrow()
            .get(reference)
            .map(|entry| entry.href().map(str::to_string));
        let path = match link {
            Some(href) => parse_fragment(&href?)?,
            None => reference.split('.').map(str::to_string).collect(),
        };
        let spec = self.inner.commands.borrow().lookup(&path)?.clone();
        Some(Command::bind(self, path, spec))
    }

    pub fn commands(&self) -> Vec<String> {
        self.inner.commands.borrow().paths()
    }
}
