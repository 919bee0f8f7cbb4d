//! POSIX-style path helpers for the remote namespace.
//!
//! Remote paths are plain strings, always absolute with `/` separators,
//! independent of the local platform. `std::path` is deliberately not used
//! here — on Windows it would reinterpret the separators.

/// Normalize a remote path: guarantee a leading `/`, strip trailing
/// slashes (except for the root itself).
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Last component of a path. The root `/` is its own basename.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// File suffix including the leading dot (`".txt"`), or `None` when the
/// basename has no suffix. Dotfiles like `.bashrc` have no suffix.
pub fn extension(path: &str) -> Option<&str> {
    let base = basename(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => Some(&base[idx..]),
        _ => None,
    }
}

/// Join a child name onto a directory path.
pub fn join(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    format!("{parent}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_leading_slash() {
        assert_eq!(normalize("data/sub"), "/data/sub");
        assert_eq!(normalize("/data/sub"), "/data/sub");
    }

    #[test]
    fn normalize_strips_trailing_slash() {
        assert_eq!(normalize("/data/sub/"), "/data/sub");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn basename_of_nested_path() {
        assert_eq!(basename("/data/a.txt"), "a.txt");
        assert_eq!(basename("/data/sub/"), "sub");
        assert_eq!(basename("/"), "/");
    }

    #[test]
    fn extension_with_leading_dot() {
        assert_eq!(extension("/data/a.txt"), Some(".txt"));
        assert_eq!(extension("/data/vol.zarr"), Some(".zarr"));
        assert_eq!(extension("/data/archive.tar.gz"), Some(".gz"));
    }

    #[test]
    fn extension_absent() {
        assert_eq!(extension("/data/README"), None);
        assert_eq!(extension("/data/.bashrc"), None);
        assert_eq!(extension("/"), None);
    }

    #[test]
    fn join_paths() {
        assert_eq!(join("/data", "a.txt"), "/data/a.txt");
        assert_eq!(join("/data/", "sub"), "/data/sub");
        assert_eq!(join("/", "bucket"), "/bucket");
    }
}
