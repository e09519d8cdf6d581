//! Observable attribute graphs for HAL-style hypermedia documents.
//!
//! A JSON resource document is materialized into a tree of [`Model`]s and
//! [`Collection`]s. Nested values are addressed with dotted paths
//! (`"foo.bar[2].kbo"`); `_links` become a [`LinkTable`] with curie support;
//! `_commands` become a [`CommandTree`] from which bound [`Command`]s are
//! resolved; `_embedded` resources are hoisted into ordinary attributes.
//! Every mutation emits change events synchronously, and changes inside a
//! child are re-announced on each ancestor.
//!
//! # Example
//!
//! ```
//! use hyperbone_model::Model;
//! use serde_json::json;
//!
//! let m = Model::new(json!({
//!     "_links": {
//!         "self": {"href": "/tasks"},
//!         "curie": {"name": "app", "href": "/rels/{rel}"},
//!         "app:create": {"href": "#_commands/create"}
//!     },
//!     "_commands": {
//!         "create": {"href": "/tasks", "method": "POST", "properties": {"title": ""}}
//!     },
//!     "_embedded": {"latest": {"title": "Write docs"}},
//!     "count": 1
//! }));
//!
//! assert_eq!(m.url().unwrap(), "/tasks");
//! assert_eq!(m.get("latest.title").unwrap().unwrap(), "Write docs");
//! assert_eq!(m.fully_qualified_rel("app:create").as_deref(), Some("/rels/create"));
//!
//! let create = m.command("app:create").unwrap();
//! create.properties().set("title", "Ship it").unwrap();
//! assert_eq!(create.method(), "POST");
//! assert_eq!(m.to_json(), json!({"count": 1, "latest": {"title": "Write docs"}}));
//! ```

pub mod attribute;
pub mod class;
pub mod collection;
pub mod command;
pub mod error;
pub mod events;
pub mod links;
pub mod materialize;
pub mod model;
pub mod options;
mod resolve;
pub mod store;
pub mod template;

pub use attribute::Attribute;
pub use class::{ModelClass, ModelClassBuilder, PrototypeRegistry, StoreFactory, BASE_CLASS_NAME};
pub use collection::Collection;
pub use command::{parse_fragment, Command, CommandNode, CommandSpec, CommandTree, FRAGMENT_PREFIXES};
pub use error::ModelError;
pub use events::{attribute_topic, ChangeEvent, Listener, ListenerId, ADD, CHANGE, REMOVE};
pub use links::{LinkDescriptor, LinkEntry, LinkTable, Rel};
pub use model::{Model, COMMANDS_KEY, EMBEDDED_KEY, LINKS_KEY};
pub use options::SetOptions;
pub use store::{AttributeStore, MemoryStore};

pub use hyperbone_path::{PathError, PathStep};
