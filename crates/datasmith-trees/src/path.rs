use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Tree;

/// Separator used by the textual form of a node path.
pub const PATH_SEPARATOR: char = '/';

/// How leading and trailing separators are treated by [`split_path`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slashes {
    /// Strip both: `"/a/b/"` -> `["a", "b"]`.
    #[default]
    Both,
    /// Strip the leading one only: `"/a/b/"` -> `["a", "b", ""]`.
    Leading,
    /// Strip the trailing one only: `"/a/b/"` -> `["", "a", "b"]`.
    Trailing,
    /// Keep both: `"/a/b/"` -> `["", "a", "b", ""]`.
    Neither,
}

/// Split a `/`-delimited path into its components.
///
/// Repeated separators collapse into one before splitting.
pub fn split_path(path: &str, slashes: Slashes) -> Vec<String> {
    let mut path = path;
    if matches!(slashes, Slashes::Both | Slashes::Leading) {
        path = path.strip_prefix(PATH_SEPARATOR).unwrap_or(path);
    }
    if matches!(slashes, Slashes::Both | Slashes::Trailing) {
        path = path.strip_suffix(PATH_SEPARATOR).unwrap_or(path);
    }

    let mut collapsed = String::with_capacity(path.len());
    let mut previous_was_separator = false;
    for ch in path.chars() {
        let is_separator = ch == PATH_SEPARATOR;
        if !(is_separator && previous_was_separator) {
            collapsed.push(ch);
        }
        previous_was_separator = is_separator;
    }

    collapsed
        .split(PATH_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Join path components into their textual form.
pub fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut joined = String::new();
    for (idx, part) in path.iter().enumerate() {
        if idx > 0 {
            joined.push(PATH_SEPARATOR);
        }
        joined.push_str(part.as_ref());
    }
    joined
}

/// Resolve `path` inside `tree`.
///
/// Returns `None` when a segment is missing or a non-object value is crossed
/// before the end of the path. An empty path does not name a value.
pub fn resolve<'t, S: AsRef<str>>(tree: &'t Tree, path: &[S]) -> Option<&'t Value> {
    let (last, parents) = path.split_last()?;
    let mut current = tree;
    for segment in parents {
        current = current.get(segment.as_ref())?.as_object()?;
    }
    current.get(last.as_ref())
}
