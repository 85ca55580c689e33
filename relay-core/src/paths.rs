//! Path string helpers.
//!
//! Manifest paths and remote locations are plain `/`-separated strings, not
//! `PathBuf`s, so they mean the same thing on every platform and can be
//! spliced into URLs and FTP commands unchanged.

/// Replace platform separators (`\`) with `/`.
pub fn unify_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Unify separators and strip a single leading `/`.
pub fn normalize(path: &str) -> String {
    let unified = unify_separators(path);
    match unified.strip_prefix('/') {
        Some(rest) => rest.to_owned(),
        None => unified,
    }
}

/// Join path segments with `/`.
///
/// Each segment is separator-unified and trimmed of surrounding `/`; empty
/// segments are skipped. A leading `/` on the first segment is preserved so
/// that absolute roots stay absolute. `join([join([a, b]), c])` equals
/// `join([a, b, c])`.
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (index, segment) in segments.into_iter().enumerate() {
        let unified = unify_separators(segment.as_ref());
        if index == 0 && unified.starts_with('/') {
            joined.push('/');
        }
        let trimmed = unified.trim_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        if !joined.is_empty() && !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(trimmed);
    }
    joined
}

/// Ancestor directories of a file path, root first.
///
/// `a/b/c/file.txt` yields `a`, `a/b`, `a/b/c`. A bare file name yields
/// nothing.
pub fn incremental_prefixes(path: &str) -> Vec<String> {
    let normalized = normalize(path);
    let mut components: Vec<&str> = normalized.split('/').filter(|c| !c.is_empty()).collect();
    components.pop();

    let mut prefixes = Vec::with_capacity(components.len());
    let mut current = String::new();
    for component in components {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(component);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Whether the last component of `path` carries a file extension.
pub fn has_extension(path: &str) -> bool {
    let normalized = unify_separators(path);
    let name = normalized.rsplit('/').next().unwrap_or_default();
    match name.rfind('.') {
        Some(0) | None => false,
        Some(idx) => idx + 1 < name.len(),
    }
}

/// Check that a normalized manifest path stays below the directory it is
/// joined onto.
///
/// Rejects empty paths, absolute paths, drive prefixes (`C:`), and empty,
/// `.` or `..` components. The error is a short reason.
pub fn check_relative(path: &str) -> Result<(), &'static str> {
    let unified = unify_separators(path);
    if unified.is_empty() {
        return Err("path is empty");
    }
    if unified.starts_with('/') {
        return Err("path is absolute");
    }
    if unified.contains('\0') {
        return Err("path contains a NUL byte");
    }
    let mut components = unified.split('/').peekable();
    if let Some(first) = components.peek() {
        let bytes = first.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            return Err("path carries a drive prefix");
        }
    }
    for component in components {
        match component {
            "" => return Err("path has an empty component"),
            "." | ".." => return Err("path has a relative component"),
            _ => {}
        }
    }
    Ok(())
}
