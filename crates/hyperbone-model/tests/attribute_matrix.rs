mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hyperbone_model::{Attribute, ChangeEvent, Model, ModelError, PathError, SetOptions};
use serde_json::json;

use common::fixtures::{init_tracing, use_fixture};

fn counter() -> (Rc<Cell<usize>>, impl Fn(&ChangeEvent) + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    (hits, move |_: &ChangeEvent| h.set(h.get() + 1))
}

#[test]
fn plain_attributes() {
    let m = Model::new(json!({"_links": {"self": {"href": "/test"}}, "name": "lol", "description": "test"}));
    assert_eq!(m.get("name").unwrap().unwrap(), "lol");
    assert_eq!(m.get("description").unwrap().unwrap(), "test");
    assert!(m.get("missing").unwrap().is_none());
}

#[test]
fn objects_become_models() {
    init_tracing();
    let m = Model::new(use_fixture("attribute-test"));
    let obj = m.get_model("anObject").unwrap().unwrap();
    assert_eq!(obj.get("name").unwrap().unwrap(), "name inside an object");
    assert_eq!(obj.get("description").unwrap().unwrap(), "description inside an object");
    assert_eq!(obj.url(), Err(ModelError::NotHypermediaResource));
    assert_eq!(obj.url().unwrap_err().to_string(), "Not a hypermedia resource");
}

#[test]
fn arrays_of_objects_become_collections() {
    let m = Model::new(use_fixture("attribute-test"));
    let items = m.get_collection("anArrayofObjects").unwrap().unwrap();
    assert_eq!(items.len(), 3);
    let first = items.at(0).unwrap();
    assert_eq!(first.get("name").unwrap().unwrap(), "obj 1");
    assert!(first.url().is_err());

    let scalars = m.get("anArrayOfScalars").unwrap().unwrap();
    assert_eq!(scalars, json!([1, 2, 3]));
    assert!(scalars.as_collection().is_none());
}

#[test]
fn child_change_bubbles_to_parent() {
    let m = Model::new(use_fixture("attribute-test"));
    let seen = Rc::new(RefCell::new(None));
    let s = Rc::clone(&seen);
    let parent = m.clone();
    m.on("change:anObject", move |_| {
        *s.borrow_mut() = parent.get("anObject.name").unwrap().and_then(|a| a.as_str().map(str::to_string));
    });
    m.get_model("anObject").unwrap().unwrap().set("name", "lol I changed the name").unwrap();
    assert_eq!(seen.borrow().as_deref(), Some("lol I changed the name"));
}

#[test]
fn collection_element_change_bubbles_to_parent() {
    let m = Model::new(use_fixture("attribute-test"));
    let (hits, listener) = counter();
    m.on("change:anArrayofObjects", listener);
    let (siblings, sibling_listener) = counter();
    m.on("change:anObject", sibling_listener);

    let items = m.get_collection("anArrayofObjects").unwrap().unwrap();
    items.at(0).unwrap().set("name", "lol I changed the name").unwrap();

    assert_eq!(hits.get(), 1);
    assert_eq!(siblings.get(), 0);
    assert_eq!(m.get("anArrayofObjects[0].name").unwrap().unwrap(), "lol I changed the name");
}

#[test]
fn deep_change_bubbles_through_every_ancestor() {
    let m = Model::new(json!({"foo": {"bar": {"kbo": {"lol": "rofl!"}}}}));
    let (root_hits, root) = counter();
    let (mid_hits, mid) = counter();
    m.on("change:foo", root);
    m.get_model("foo").unwrap().unwrap().on("change:bar", mid);

    m.set("foo.bar.kbo.lol", "hello").unwrap();
    assert_eq!(root_hits.get(), 1);
    assert_eq!(mid_hits.get(), 1);
}

#[test]
fn dot_and_index_notation() {
    let m = Model::new(use_fixture("attribute-test"));
    assert_eq!(m.get("anObject.name").unwrap().unwrap(), "name inside an object");
    let first = m.get_model("anArrayofObjects[0]").unwrap().unwrap();
    assert_eq!(first.get("name").unwrap().unwrap(), "obj 1");
    assert_eq!(m.get("anArrayofObjects[0].name").unwrap().unwrap(), "obj 1");
    assert_eq!(m.get("anArrayOfScalars[2]").unwrap().unwrap(), json!(3));
    assert!(m.get("anArrayofObjects[9].name").unwrap().is_none());
    assert!(m.get("name.deeper").unwrap().is_none());

    let nested = Model::new(json!({"foo": {"bar": [
        {"kbo": {"lol": "rofl!"}},
        {"kbo": {"lol": "haha!"}},
        {"kbo": {"lol": "chuckles"}}
    ]}}));
    assert_eq!(nested.get("foo.bar[1].kbo.lol").unwrap().unwrap(), "haha!");
    let kbo = nested.get_model("foo.bar[2].kbo").unwrap().unwrap();
    assert_eq!(kbo.get("lol").unwrap().unwrap(), "chuckles");
}

#[test]
fn malformed_paths_fail_fast() {
    let m = Model::new(json!({"a": {"b": 1}}));
    assert!(matches!(m.get("a..b"), Err(ModelError::Path(PathError::EmptySegment { .. }))));
    assert!(matches!(m.get("a[x]"), Err(ModelError::Path(_))));
    assert!(matches!(m.set("a[0", 1), Err(ModelError::Path(_))));
}

#[test]
fn deep_set_updates_the_existing_node() {
    let m = Model::new(json!({"foo": {"bar": {"kbo": {"lol": "rofl!"}}}}));
    let kbo = m.get_model("foo.bar.kbo").unwrap().unwrap();
    m.set("foo.bar.kbo.lol", "hello").unwrap();
    assert_eq!(kbo.get("lol").unwrap().unwrap(), "hello");
    assert!(m.attr("foo.bar.kbo.lol").is_none());
}

#[test]
fn set_creates_missing_intermediates() {
    let m = Model::new(json!({}));
    m.set("a.b.c", 1).unwrap();
    assert_eq!(m.to_json(), json!({"a": {"b": {"c": 1}}}));
    assert!(m.get("a.b").unwrap().unwrap().as_model().is_some());
}

#[test]
fn set_without_traversal_does_not_create_intermediates() {
    let m = Model::new(json!({}));
    assert!(m.set_with("a.b", 1, SetOptions::no_traverse()).is_err());
    assert!(m.is_empty());
}

#[test]
fn nested_update_keeps_identity_and_listeners() {
    let m = Model::new(json!({"foo": {"bar": {"kbo": "lol"}}}));
    let bar = m.get_model("foo.bar").unwrap().unwrap();
    let (hits, listener) = counter();
    bar.on("change:kbo", listener);

    m.set_all(json!({"foo": {"bar": {"kbo": "rofl"}}})).unwrap();

    assert_eq!(hits.get(), 1);
    assert!(bar.ptr_eq(&m.get_model("foo.bar").unwrap().unwrap()));
    assert_eq!(m.get("foo.bar.kbo").unwrap().unwrap(), "rofl");
}

#[test]
fn nested_collection_update_keeps_identity_and_listeners() {
    let m = Model::new(json!({"foo": [
        {"bar": {"kbo": "lol"}},
        {"bar": {"kbo": "haha"}}
    ]}));
    let bar = m.get_model("foo[0].bar").unwrap().unwrap();
    let collection = m.get_collection("foo").unwrap().unwrap();
    let (hits, listener) = counter();
    bar.on("change:kbo", listener);

    m.set_all(json!({"foo": [{"bar": {"kbo": "rofl"}}, {"bar": {"kbo": "chuckles"}}]})).unwrap();

    assert_eq!(hits.get(), 1);
    assert!(collection.ptr_eq(&m.get_collection("foo").unwrap().unwrap()));
    assert_eq!(m.get("foo[0].bar.kbo").unwrap().unwrap(), "rofl");
    assert_eq!(m.get("foo[1].bar.kbo").unwrap().unwrap(), "chuckles");
}

#[test]
fn collection_update_appends_and_drops_by_position() {
    let m = Model::new(json!({"items": [{"n": 1}, {"n": 2}]}));
    let items = m.get_collection("items").unwrap().unwrap();
    let first = items.at(0).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    for topic in ["add", "remove"] {
        let e = Rc::clone(&events);
        items.on(topic, move |ev| e.borrow_mut().push(ev.topic.clone()));
    }

    m.set("items", json!([{"n": 10}, {"n": 20}, {"n": 30}])).unwrap();
    assert_eq!(items.len(), 3);
    assert!(first.ptr_eq(&items.at(0).unwrap()));
    assert_eq!(items.to_json(), json!([{"n": 10}, {"n": 20}, {"n": 30}]));

    m.set("items", json!([{"n": 5}])).unwrap();
    assert_eq!(items.len(), 1);
    assert!(first.ptr_eq(&items.at(0).unwrap()));
    assert_eq!(*events.borrow(), vec!["add", "remove", "remove"]);
}

#[test]
fn set_returns_ok_for_object_values() {
    let m = Model::new(json!({"foo": {"bar": {"kbo": "lol"}}}));
    assert!(m.set("sub", json!({"el": "hello"})).is_ok());
    assert_eq!(m.get("sub.el").unwrap().unwrap(), "hello");
}

#[test]
fn opaque_values_are_stored_by_identity() {
    struct Handle {
        id: u32,
    }

    let m = Model::new(json!({}));
    let handle = Attribute::opaque(Handle { id: 7 });
    m.set_with("body", handle.clone(), SetOptions::no_traverse()).unwrap();

    let stored = m.get("body").unwrap().unwrap();
    assert!(stored.same(&handle));
    assert_eq!(stored.downcast_ref::<Handle>().map(|h| h.id), Some(7));
    assert_eq!(m.to_json(), json!({}));
}

#[test]
fn no_traverse_keeps_raw_json() {
    let m = Model::new(json!({}));
    m.set_with("raw", json!({"a": [{"b": 1}]}), SetOptions::no_traverse()).unwrap();
    let raw = m.get("raw").unwrap().unwrap();
    assert!(raw.as_model().is_none());
    assert_eq!(raw, json!({"a": [{"b": 1}]}));
}

#[test]
fn literal_dotted_key_wins_over_traversal() {
    let m = Model::new(json!({"a.b": "literal", "a": {"b": "nested"}}));
    assert_eq!(m.get("a.b").unwrap().unwrap(), "literal");
}

#[test]
fn set_then_get_round_trips_a_literal_dotted_key() {
    let m = Model::new(json!({"a.b": 1}));
    m.set("a.b", 2).unwrap();
    assert_eq!(m.get("a.b").unwrap().unwrap(), json!(2));
    assert_eq!(m.to_json(), json!({"a.b": 2}));
    assert!(m.attr("a").is_none());

    assert_eq!(m.unset("a.b").unwrap().unwrap(), json!(2));
    assert!(m.is_empty());
}

#[test]
fn dotted_set_without_a_literal_key_traverses() {
    let m = Model::new(json!({}));
    m.set("a.b", 2).unwrap();
    assert!(m.attr("a.b").is_none());
    assert_eq!(m.get("a.b").unwrap().unwrap(), json!(2));
    assert_eq!(m.to_json(), json!({"a": {"b": 2}}));
}

#[test]
fn raw_collection_slot_without_traversal_is_rejected() {
    let m = Model::new(json!({"items": [{"n": 1}]}));
    assert_eq!(
        m.set_with("items[0]", json!({"n": 2}), SetOptions::no_traverse()),
        Err(ModelError::NotAResource)
    );
    assert_eq!(m.get("items[0].n").unwrap().unwrap(), json!(1));
}

#[test]
fn unset_removes_and_announces() {
    let m = Model::new(json!({"a": {"b": 1, "c": 2}}));
    let (hits, listener) = counter();
    m.on("change:a", listener);
    let removed = m.unset("a.b").unwrap().unwrap();
    assert_eq!(removed, json!(1));
    assert_eq!(m.to_json(), json!({"a": {"c": 2}}));
    assert_eq!(hits.get(), 1);
    assert!(m.unset("a.zzz").unwrap().is_none());
}

#[test]
fn listeners_may_reenter_the_model() {
    let m = Model::new(json!({"count": 0, "mirror": 0}));
    let inner = m.clone();
    m.on("change:count", move |ev| {
        if let Some(value) = ev.value.clone() {
            inner.set("mirror", value).unwrap();
        }
    });
    m.set("count", 3).unwrap();
    assert_eq!(m.get("mirror").unwrap().unwrap(), json!(3));
}

#[test]
fn off_stops_delivery() {
    let m = Model::new(json!({"a": 1}));
    let (hits, listener) = counter();
    let id = m.on("change:a", listener);
    m.set("a", 2).unwrap();
    assert!(m.off(id));
    m.set("a", 3).unwrap();
    assert_eq!(hits.get(), 1);
    assert!(!m.off(id));
}
