//! Dotted attribute path utilities.
//!
//! Paths address values inside nested models and collections using
//! `.`-separated attribute names and `[n]` positional suffixes.
//!
//! # Example
//!
//! ```
//! use hyperbone_path::{parse_path, format_path, get, PathStep};
//!
//! let path = parse_path("foo.bar[1].kbo").unwrap();
//! assert_eq!(
//!     path,
//!     vec![
//!         PathStep::key("foo"),
//!         PathStep::key("bar"),
//!         PathStep::Index(1),
//!         PathStep::key("kbo"),
//!     ]
//! );
//! assert_eq!(format_path(&path), "foo.bar[1].kbo");
//!
//! let doc = serde_json::json!({"foo": {"bar": [{"kbo": 1}, {"kbo": 2}]}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!(2)));
//! ```

pub mod get;
pub mod parser;
pub mod types;
pub mod util;

pub use get::{get, get_mut};
pub use parser::{PathError, PathParser};
pub use types::{Path, PathStep};
pub use util::{format_path, is_simple_key, is_valid_index, split_parent};

/// Parse a path string into steps.
///
/// # Example
///
/// ```
/// use hyperbone_path::{parse_path, PathStep};
///
/// assert_eq!(
///     parse_path("a[0][1]").unwrap(),
///     vec![PathStep::key("a"), PathStep::Index(0), PathStep::Index(1)]
/// );
/// assert!(parse_path("a..b").is_err());
/// ```
pub fn parse_path(path: &str) -> Result<Path, PathError> {
    PathParser::parse(path)
}

/// Validate a path string without keeping the parsed steps.
pub fn validate_path(path: &str) -> Result<(), PathError> {
    PathParser::parse(path).map(|_| ())
}
