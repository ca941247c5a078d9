//! Path construction and inspection.

use crate::StoreError;

/// Join components into a path: `path(&["kid", "kex_1"])` → `/kid/kex_1`.
///
/// Slashes inside a component are not escaped, so callers must only pass
/// ids that cannot contain `/` (key ids, normalized names and service ids).
pub fn path(components: &[&str]) -> String {
    let mut out = String::new();
    for c in components {
        let c = c.trim_matches('/');
        if c.is_empty() {
            continue;
        }
        out.push('/');
        out.push_str(c);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Split a path into its components.
pub fn path_components(p: &str) -> Vec<&str> {
    p.split('/').filter(|c| !c.is_empty()).collect()
}

/// First component (the collection) of a path.
pub fn path_first(p: &str) -> Option<&str> {
    path_components(p).first().copied()
}

/// Last component (the id) of a path.
pub fn path_last(p: &str) -> Option<&str> {
    path_components(p).last().copied()
}

/// Check that a path is writable: a non-empty, even number of components.
pub fn check_document_path(p: &str) -> Result<(), StoreError> {
    let n = path_components(p).len();
    if n == 0 || n % 2 != 0 {
        return Err(StoreError::InvalidPath(p.to_string()));
    }
    Ok(())
}
