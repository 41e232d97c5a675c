//! Dotted element path helpers shared by the compiler, the elements
//! context and the crawler.

/// Whether `child` equals `parent` or is nested under it.
pub fn paths_compatible(parent: Option<&str>, child: Option<&str>) -> bool {
    match (parent, child) {
        (Some(parent), Some(child)) if !parent.is_empty() && !child.is_empty() => {
            child == parent || is_strict_descendant(parent, child)
        }
        _ => false,
    }
}

pub fn is_strict_descendant(parent: &str, child: &str) -> bool {
    child.len() > parent.len() + 1
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}

/// Strips `prefix.` from `path`; paths outside the prefix are returned unchanged.
pub fn trim_path_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if !prefix.is_empty() && is_strict_descendant(prefix, path) {
        &path[prefix.len() + 1..]
    } else {
        path
    }
}

/// Key of `path` relative to `anchor`, or `None` unless `path` is a strict descendant.
pub fn path_difference<'a>(anchor: &str, path: &'a str) -> Option<&'a str> {
    is_strict_descendant(anchor, path).then(|| &path[anchor.len() + 1..])
}

pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn uncapitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Yields every proper ancestor key of a dotted key, nearest first
/// (`a.b.c` gives `a.b`, then `a`).
pub fn ancestor_keys(key: &str) -> impl Iterator<Item = &str> {
    key.char_indices()
        .rev()
        .filter(|(_, c)| *c == '.')
        .map(move |(i, _)| &key[..i])
}
