//! Simple URI template expansion: `{name}` is replaced by the named value.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"))
}

pub fn has_placeholders(template: &str) -> bool {
    placeholder_regex().is_match(template)
}

/// Expand every placeholder with `lookup`; unknown names expand to nothing.
pub fn expand_with<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            lookup(caps[1].trim()).unwrap_or_default()
        })
        .into_owned()
}

/// Expand placeholders from the entries of a JSON object.
pub fn expand(template: &str, params: &Value) -> String {
    expand_with(template, |name| params.get(name).map(render))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_placeholders() {
        assert!(has_placeholders("/services/thing/{id}"));
        assert!(has_placeholders("/services/rels/{rel}"));
        assert!(!has_placeholders("/services/test"));
        assert!(!has_placeholders("/odd/{}"));
    }

    #[test]
    fn test_expand_matrix() {
        let params = json!({"id": "lol", "n": 3, "flag": true, "none": null});
        assert_eq!(expand("/services/thing/{id}", &params), "/services/thing/lol");
        assert_eq!(expand("/page/{n}?f={flag}", &params), "/page/3?f=true");
        assert_eq!(expand("/x/{none}/{missing}", &params), "/x//");
        assert_eq!(expand("/plain", &params), "/plain");
    }

    #[test]
    fn test_expand_with_closure() {
        let out = expand_with("/services/rels/{rel}", |name| {
            (name == "rel").then(|| "test".to_string())
        });
        assert_eq!(out, "/services/rels/test");
    }
}
