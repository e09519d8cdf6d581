//! `_links` tables, relation lookup, and curie expansion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ModelError;
use crate::model::Model;
use crate::template;

pub const SELF_REL: &str = "self";
pub const CURIE_REL: &str = "curie";
pub const CURIES_REL: &str = "curies";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkDescriptor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: None,
            name: None,
            extra: Map::new(),
        }
    }

    /// Flagged `templated`, or carrying a `{name}` placeholder.
    pub fn is_templated(&self) -> bool {
        self.templated == Some(true) || template::has_placeholders(&self.href)
    }
}

/// One relation: a single descriptor or an ordered list, as in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEntry {
    One(LinkDescriptor),
    Many(Vec<LinkDescriptor>),
}

impl LinkEntry {
    pub fn descriptors(&self) -> &[LinkDescriptor] {
        match self {
            LinkEntry::One(d) => std::slice::from_ref(d),
            LinkEntry::Many(ds) => ds,
        }
    }

    /// The entry's descriptor when it holds exactly one, in either form.
    pub fn single(&self) -> Option<&LinkDescriptor> {
        match self.descriptors() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.single().map(|d| d.href.as_str())
    }
}

/// Result of resolving a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Rel {
    Href(String),
    /// Relations with more than one descriptor, unchanged.
    Many(Vec<LinkDescriptor>),
}

impl Rel {
    pub fn as_href(&self) -> Option<&str> {
        match self {
            Rel::Href(href) => Some(href),
            Rel::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[LinkDescriptor]> {
        match self {
            Rel::Many(ds) => Some(ds),
            Rel::Href(_) => None,
        }
    }
}

impl PartialEq<&str> for Rel {
    fn eq(&self, other: &&str) -> bool {
        self.as_href() == Some(*other)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkTable {
    entries: IndexMap<String, LinkEntry>,
}

impl LinkTable {
    /// Parse a `_links` section. Malformed relations are skipped.
    pub fn from_value(links: &Value) -> Self {
        let mut entries = IndexMap::new();
        let Value::Object(map) = links else {
            warn!(value = %links, "ignoring non-object _links section");
            return Self { entries };
        };
        for (rel, raw) in map {
            match serde_json::from_value::<LinkEntry>(raw.clone()) {
                Ok(entry) => {
                    entries.insert(rel.clone(), entry);
                }
                Err(err) => warn!(rel = %rel, error = %err, "skipping malformed link"),
            }
        }
        Self { entries }
    }

    pub fn get(&self, rel: &str) -> Option<&LinkEntry> {
        self.entries.get(rel)
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.entries.contains_key(rel)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LinkEntry)> {
        self.entries.iter()
    }

    pub fn self_href(&self) -> Option<&str> {
        self.get(SELF_REL).and_then(LinkEntry::href)
    }

    /// Curie descriptors from both the `curie` and `curies` relations.
    pub fn curies(&self) -> Vec<&LinkDescriptor> {
        [CURIE_REL, CURIES_REL]
            .iter()
            .filter_map(|rel| self.get(rel))
            .flat_map(LinkEntry::descriptors)
            .collect()
    }

    /// Resolve `rel` to an href, expanding templates from `params`.
    ///
    /// A list of one descriptor collapses to its href; longer lists are
    /// returned as they are. A templated href without `params` fails with
    /// [`ModelError::MissingTemplateData`].
    pub fn resolve(&self, rel: &str, params: Option<&Value>) -> Result<Option<Rel>, ModelError> {
        let Some(entry) = self.get(rel) else {
            return Ok(None);
        };
        let descriptor = match entry {
            LinkEntry::One(d) => d,
            LinkEntry::Many(ds) if ds.len() == 1 => &ds[0],
            LinkEntry::Many(ds) => return Ok(Some(Rel::Many(ds.clone()))),
        };
        if !descriptor.is_templated() {
            return Ok(Some(Rel::Href(descriptor.href.clone())));
        }
        match params {
            Some(params) => Ok(Some(Rel::Href(template::expand(&descriptor.href, params)))),
            None => Err(ModelError::MissingTemplateData {
                rel: rel.to_string(),
            }),
        }
    }

    /// Expand `prefix:suffix` through the curie named `prefix`.
    pub fn fully_qualified(&self, rel: &str) -> Option<String> {
        let (prefix, suffix) = rel.split_once(':')?;
        let curie = self
            .curies()
            .into_iter()
            .find(|c| c.name.as_deref() == Some(prefix))?;
        Some(template::expand_with(&curie.href, |name| {
            (name == "rel").then(|| suffix.to_string())
        }))
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (rel, entry) in &self.entries {
            if let Ok(value) = serde_json::to_value(entry) {
                out.insert(rel.clone(), value);
            }
        }
        Value::Object(out)
    }
}

impl Model {
    /// The `self` href.
    pub fn url(&self) -> Result<String, ModelError> {
        self.inner
            .links
            .borrow()
            .self_href()
            .map(str::to_string)
            .ok_or(ModelError::NotHypermediaResource)
    }

    pub fn is_hypermedia(&self) -> bool {
        self.inner.links.borrow().self_href().is_some()
    }

    pub fn rel(&self, name: &str, params: Option<&Value>) -> Result<Option<Rel>, ModelError> {
        self.inner.links.borrow().resolve(name, params)
    }

    /// Snapshot of the link table, for discovery.
    pub fn rels(&self) -> LinkTable {
        self.inner.links.borrow().clone()
    }

    pub fn fully_qualified_rel(&self, name: &str) -> Option<String> {
        self.inner.links.borrow().fully_qualified(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(links: Value) -> LinkTable {
        LinkTable::from_value(&links)
    }

    #[test]
    fn test_parse_keeps_arity_and_extra_fields() {
        let t = table(json!({
            "self": {"href": "/x", "title": "X"},
            "others": [{"href": "/one"}, {"href": "/two"}]
        }));
        assert_eq!(t.len(), 2);
        let own = t.get("self").unwrap();
        assert!(matches!(own, LinkEntry::One(_)));
        assert_eq!(own.single().unwrap().extra.get("title"), Some(&json!("X")));
        assert_eq!(t.get("others").unwrap().descriptors().len(), 2);
        assert_eq!(t.to_json()["others"][1]["href"], json!("/two"));
    }

    #[test]
    fn test_malformed_links_are_skipped() {
        let t = table(json!({"self": {"href": "/x"}, "broken": {"title": "no href"}, "num": 4}));
        assert_eq!(t.len(), 1);
        assert!(!t.contains("broken"));
        assert!(table(json!("nope")).is_empty());
    }

    #[test]
    fn test_resolve_collapses_single_element_lists() {
        let t = table(json!({
            "one": [{"href": "/one"}],
            "many": [{"href": "/a"}, {"href": "/b"}]
        }));
        assert_eq!(t.resolve("one", None).unwrap().unwrap(), "/one");
        let many = t.resolve("many", None).unwrap().unwrap();
        assert_eq!(many.as_many().unwrap().len(), 2);
        assert!(t.resolve("missing", None).unwrap().is_none());
    }

    #[test]
    fn test_resolve_templated() {
        let t = table(json!({
            "flagged": {"href": "/search{?q}", "templated": true},
            "thing": {"href": "/thing/{id}"}
        }));
        assert_eq!(
            t.resolve("thing", None),
            Err(ModelError::MissingTemplateData { rel: "thing".to_string() })
        );
        assert!(t.resolve("flagged", None).is_err());
        assert_eq!(
            t.resolve("thing", Some(&json!({"id": 7}))).unwrap().unwrap(),
            "/thing/7"
        );
    }

    #[test]
    fn test_curie_and_curies_are_equivalent() {
        let single = table(json!({"curie": {"name": "app", "href": "/rels/{rel}"}}));
        let plural = table(json!({"curies": [
            {"name": "doc", "href": "/docs/{rel}"},
            {"name": "app", "href": "/rels/{rel}"}
        ]}));
        for t in [&single, &plural] {
            assert_eq!(t.fully_qualified("app:test").as_deref(), Some("/rels/test"));
            assert_eq!(t.fully_qualified("nope:test"), None);
            assert_eq!(t.fully_qualified("plain"), None);
        }
        assert_eq!(plural.curies().len(), 2);
    }
}
