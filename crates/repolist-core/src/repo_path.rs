//! Repository-relative path helpers.
//!
//! Every path exchanged with a repository backend is relative to the
//! repository root, uses `/` as separator regardless of host OS, and has
//! no leading or trailing separator. The empty string is the root.

/// Normalize a user supplied path.
///
/// Accepts both `/` and `\` separators, drops empty and `.` components,
/// and resolves `..` against the components seen so far. Components that
/// would climb above the root are discarded.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join a directory and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Split a normalized path into its components.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty() && *c != ".")
}

/// Number of components in a path.
pub fn depth(path: &str) -> usize {
    components(path).count()
}

/// Final component of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent of a path (the root is its own parent).
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Check whether `path` equals `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() || path == ancestor {
        return true;
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Express `path` relative to the query point `base`.
///
/// When both are identical the terminal name of `base` is returned
/// rather than an empty string.
pub fn relativize(base: &str, path: &str) -> String {
    if path == base {
        return file_name(base).to_string();
    }
    if base.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(base).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) => rest.to_string(),
        None => path.to_string(),
    }
}

/// Leading `depth` components of a path.
pub fn prefix(path: &str, depth: usize) -> String {
    components(path).take(depth).collect::<Vec<_>>().join("/")
}
