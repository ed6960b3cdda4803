//! Logical path helpers
//!
//! Logical paths are `/`-separated plaintext paths. Remote paths use the
//! same shape but carry ciphertext segment names.

/// Normalize a path: always absolute-style, no trailing slash (except
/// root), no empty or `.` segments.
pub fn clean_path(path: &str) -> String {
    let mut cleaned = String::from("/");
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !cleaned.ends_with('/') {
            cleaned.push('/');
        }
        cleaned.push_str(segment);
    }
    cleaned
}

/// Join path components, collapsing duplicate separators.
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        if base.is_empty() {
            return "/".to_string();
        }
        return base.to_string();
    }
    format!("{}/{}", base, rest)
}

/// Split a path into (directory, file name). A trailing slash means the
/// whole path is a directory and the file name is empty.
pub fn split_dir_file(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx + 1], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Compare two paths after normalization.
pub fn path_equal(a: &str, b: &str) -> bool {
    clean_path(a) == clean_path(b)
}
