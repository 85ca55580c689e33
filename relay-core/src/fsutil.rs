//! Small filesystem helpers shared by the transports and the updater.
//!
//! All helpers are idempotent with respect to absence: removing something
//! that is not there is not an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, CoreError};

/// Remove a file; missing files are ignored.
pub fn remove_file_if_exists(path: &Path) -> Result<(), CoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Remove a directory tree; a missing directory is ignored.
pub fn remove_dir_if_exists(path: &Path) -> Result<(), CoreError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Copy a single file, creating the destination's parent directories and
/// overwriting an existing destination.
pub fn copy_file(source: &Path, destination: &Path) -> Result<u64, CoreError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::copy(source, destination).map_err(|e| io_err(source, e))
}

/// Recursively copy the contents of `source` into `destination`.
///
/// Existing files with the same relative path are overwritten; files only
/// present in `destination` are left alone. Symbolic links are skipped, not
/// followed. Returns the number of files copied.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<usize, CoreError> {
    fs::create_dir_all(destination).map_err(|e| io_err(destination, e))?;

    let mut copied = 0;
    let entries = fs::read_dir(source).map_err(|e| io_err(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(source, e))?;
        let from = entry.path();
        let to = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| io_err(&from, e))?;
        if file_type.is_symlink() {
            tracing::warn!("skipping symbolic link {}", from.display());
        } else if file_type.is_dir() {
            copied += copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| io_err(&from, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Absolute, symlink-free form of `path`, which need not exist yet.
///
/// The deepest existing ancestor is canonicalized and the remaining
/// components are appended, with `..` and `.` applied lexically.
pub fn resolve_path(path: &Path) -> Result<PathBuf, CoreError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| io_err(path, e))?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut pending = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(mut resolved) => {
                for component in pending.iter().rev() {
                    match component {
                        Component::ParentDir => {
                            resolved.pop();
                        }
                        Component::CurDir => {}
                        other => resolved.push(other.as_os_str()),
                    }
                }
                return Ok(resolved);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                match (existing.parent(), existing.components().next_back()) {
                    (Some(parent), Some(last)) => {
                        pending.push(last);
                        existing = parent;
                    }
                    _ => return Err(io_err(path, err)),
                }
            }
            Err(err) => return Err(io_err(existing, err)),
        }
    }
}

/// Write `contents` to `path` through a `.tmp` sibling and a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    fs::write(tmp, contents).map_err(|e| io_err(tmp, e))?;
    if let Err(err) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn removing_missing_paths_is_ok() {
        let tmp = TempDir::new().unwrap();
        remove_file_if_exists(&tmp.path().join("missing.txt")).unwrap();
        remove_dir_if_exists(&tmp.path().join("missing")).unwrap();
    }

    #[test]
    fn remove_dir_deletes_nested_tree() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("scratch");
        fs::create_dir_all(dir.join("a/b")).unwrap();
        fs::write(dir.join("a/b/c.txt"), "x").unwrap();
        remove_dir_if_exists(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn copy_file_creates_parents_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("deep/nested/dst.txt");
        fs::write(&src, "first").unwrap();
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "first");

        fs::write(&src, "second").unwrap();
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "second");
    }

    #[test]
    fn copy_tree_merges_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.txt"), "new a").unwrap();
        fs::write(src.join("sub/b.txt"), "new b").unwrap();
        fs::write(dst.join("a.txt"), "old a").unwrap();
        fs::write(dst.join("keep.txt"), "untouched").unwrap();

        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "new a");
        assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).unwrap(), "new b");
        assert_eq!(fs::read_to_string(dst.join("keep.txt")).unwrap(), "untouched");
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_skips_symlinks() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(tmp.path().join("secret.txt"), "outside").unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("secret.txt"), src.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(tmp.path(), src.join("loop")).unwrap();

        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 1);
        assert!(dst.join("a.txt").is_file());
        assert!(fs::symlink_metadata(dst.join("link.txt")).is_err());
        assert!(fs::symlink_metadata(dst.join("loop")).is_err());
    }

    #[test]
    fn resolve_path_handles_missing_tails_and_parent_components() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("app")).unwrap();

        assert_eq!(resolve_path(&root.join("app")).unwrap(), root.join("app"));
        assert_eq!(
            resolve_path(&root.join("app/new/deeper")).unwrap(),
            root.join("app/new/deeper")
        );
        assert_eq!(
            resolve_path(&root.join("ghost/../app/./tmp")).unwrap(),
            root.join("app/tmp")
        );
    }

    #[test]
    fn write_atomic_leaves_no_tmp_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/manifest.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!tmp.path().join("out/manifest.json.tmp").exists());
    }
}
