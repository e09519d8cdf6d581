use crate::types::PathStep;

/// Check if a string represents a valid non-negative integer index.
///
/// Leading zeros are rejected unless the index is exactly `"0"`.
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Returns `true` when `path` addresses a single attribute and needs no parsing.
pub fn is_simple_key(path: &str) -> bool {
    !path.is_empty() && !path.contains(['.', '[', ']'])
}

/// Format steps back into path notation.
pub fn format_path(path: &[PathStep]) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            PathStep::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathStep::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Split a path into its parent steps and the final step.
pub fn split_parent(path: &[PathStep]) -> Option<(&[PathStep], &PathStep)> {
    let (leaf, parent) = path.split_last()?;
    Some((parent, leaf))
}
