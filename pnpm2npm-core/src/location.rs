//! Placement paths as they appear as keys of `package-lock.json`.
//!
//! A location is `""` for the repository root, a workspace member's path
//! such as `packages/app`, or a `node_modules` path such as
//! `node_modules/a/node_modules/@scope/b`. The `node_modules` directory
//! owned by a location is its *scope*.

const NODE_MODULES: &str = "node_modules/";

/// Location of `name` inside the scope owned by `owner`.
pub fn child(owner: &str, name: &str) -> String {
    if owner.is_empty() {
        format!("{NODE_MODULES}{name}")
    } else {
        format!("{owner}/{NODE_MODULES}{name}")
    }
}

/// Owner of the scope that contains `location`, or `None` for the root.
/// Workspace members hang directly off the root scope.
pub fn parent(location: &str) -> Option<&str> {
    if location.is_empty() {
        return None;
    }

    match location.rfind(NODE_MODULES) {
        Some(0) => Some(""),
        Some(idx) => Some(location[..idx].trim_end_matches('/')),
        None => Some(""),
    }
}

/// Whether `location` is `owner` itself or lives somewhere below it.
pub fn is_within(location: &str, owner: &str) -> bool {
    owner.is_empty()
        || location == owner
        || location
            .strip_prefix(owner)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Normalizes a pnpm importer id (`.`, `./packages/a`, `packages/a`).
pub fn importer_location(id: &str) -> String {
    join("", id)
}

/// Resolves `relative` against `base` with forward slashes, collapsing
/// `.` and `..` segments. Segments that climb above the root are kept.
pub fn join(base: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = base
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    for segment in relative.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_child_locations() {
        assert_eq!(child("", "a"), "node_modules/a");
        assert_eq!(child("node_modules/a", "@s/b"), "node_modules/a/node_modules/@s/b");
        assert_eq!(child("packages/app", "b"), "packages/app/node_modules/b");
    }

    #[test]
    fn finds_parent_owner() {
        assert_eq!(parent(""), None);
        assert_eq!(parent("node_modules/a"), Some(""));
        assert_eq!(parent("node_modules/@s/a"), Some(""));
        assert_eq!(
            parent("node_modules/a/node_modules/@s/b"),
            Some("node_modules/a")
        );
        assert_eq!(parent("packages/app"), Some(""));
        assert_eq!(parent("packages/app/node_modules/b"), Some("packages/app"));
    }

    #[test]
    fn checks_containment() {
        assert!(is_within("node_modules/a/node_modules/b", "node_modules/a"));
        assert!(is_within("node_modules/a", "node_modules/a"));
        assert!(!is_within("node_modules/ab", "node_modules/a"));
        assert!(is_within("packages/app", ""));
    }

    #[test]
    fn joins_relative_paths() {
        assert_eq!(join("packages/app", "../lib"), "packages/lib");
        assert_eq!(join("", "packages/lib"), "packages/lib");
        assert_eq!(join("", "./packages/lib/"), "packages/lib");
        assert_eq!(join("", "../outside"), "../outside");
        assert_eq!(importer_location("."), "");
    }
}
