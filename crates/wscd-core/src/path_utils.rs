//! Path helpers shared by the index, the walker and the cli

use smallvec::SmallVec;
use std::path::{Component, Path, PathBuf};

/// Separator used for every key stored in the directory index, independent of the platform.
pub const KEY_SEPARATOR: char = '/';

const VENDOR_SEGMENT: &str = "vendor";

/// Canonicalize a path, resolving symlinks and producing an absolute path.
///
/// On Windows, uses `dunce::canonicalize` to avoid the `\\?\` extended-length path prefix
/// that `std::fs::canonicalize` produces, which would leak into printed targets.
#[cfg(windows)]
pub fn canonicalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    dunce::canonicalize(path)
}

#[cfg(not(windows))]
pub fn canonicalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

#[inline]
pub fn split_key(key: &str) -> SmallVec<[&str; 8]> {
    key.split(KEY_SEPARATOR).collect()
}

/// Returns true if some trailing run of `components`, joined with `/`, equals `query` verbatim.
///
/// `a/b/c` matches `c`, `b/c` and `a/b/c` but neither `x/c` nor `b/`.
pub fn has_trailing_components<S: AsRef<str>>(components: &[S], query: &str) -> bool {
    if query.is_empty() {
        return false;
    }

    let wanted = split_key(query);
    if wanted.len() > components.len() {
        return false;
    }

    let tail = &components[components.len() - wanted.len()..];
    tail.iter()
        .zip(wanted.iter())
        .all(|(component, expected)| component.as_ref() == *expected)
}

/// Directories whose subtree is never indexed nor matched.
#[inline]
pub fn is_pruned_dir_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_') || name == VENDOR_SEGMENT
}

/// Returns the directory holding the innermost `vendor` segment of `path`.
///
/// `/vendor/lib` yields `/`. Returns `None` if the path has no `vendor` segment
/// or a relative path starts with it, leaving nothing to return.
pub fn vendor_parent(path: &Path) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = path.components().collect();
    let position = components
        .iter()
        .rposition(|component| matches!(component, Component::Normal(name) if *name == VENDOR_SEGMENT))?;

    if position == 0 {
        return None;
    }
    Some(components[..position].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_components_match_every_suffix() {
        let components = ["a", "b", "c"];
        assert!(has_trailing_components(&components, "c"));
        assert!(has_trailing_components(&components, "b/c"));
        assert!(has_trailing_components(&components, "a/b/c"));

        assert!(!has_trailing_components(&components, "x/c"));
        assert!(!has_trailing_components(&components, "b"));
        assert!(!has_trailing_components(&components, "z/a/b/c"));
        assert!(!has_trailing_components(&components, "b/"));
        assert!(!has_trailing_components(&components, ""));
    }

    #[test]
    fn pruned_dir_names() {
        assert!(is_pruned_dir_name(".git"));
        assert!(is_pruned_dir_name("_build"));
        assert!(is_pruned_dir_name("vendor"));
        assert!(!is_pruned_dir_name("vendored"));
        assert!(!is_pruned_dir_name("src"));
    }

    #[test]
    #[cfg(not(target_family = "windows"))]
    fn vendor_parent_uses_innermost_vendor() {
        assert_eq!(
            vendor_parent(Path::new("/home/me/go/src/app/vendor/github.com/lib")),
            Some(PathBuf::from("/home/me/go/src/app"))
        );
        assert_eq!(
            vendor_parent(Path::new("/src/app/vendor/x/vendor/y")),
            Some(PathBuf::from("/src/app/vendor/x"))
        );
        assert_eq!(vendor_parent(Path::new("/src/app/lib")), None);
    }

    #[test]
    #[cfg(not(target_family = "windows"))]
    fn vendor_parent_at_filesystem_root() {
        assert_eq!(vendor_parent(Path::new("/vendor/lib")), Some(PathBuf::from("/")));
        assert_eq!(vendor_parent(Path::new("/vendor")), Some(PathBuf::from("/")));
        assert_eq!(
            vendor_parent(Path::new("app/vendor/lib")),
            Some(PathBuf::from("app"))
        );
        assert_eq!(vendor_parent(Path::new("vendor/lib")), None);
    }
}
