use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

fn traversal(path: &Path, reason: &'static str) -> StorageError {
    StorageError::PathTraversalAttempt {
        message: path.display().to_string().into(),
        context: Some(reason.into()),
    }
}

/// Collapses `.` and `..` lexically; `..` may never climb above the relative base.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::Normal(segment) => out.push(segment),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(traversal(path, "Path attempted to escape sandbox via '..'"));
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(traversal(path, "Absolute paths are not allowed in sandbox"));
            },
        }
    }

    Ok(out)
}

/// Joins `path` to `root` and verifies the result (or its closest existing ancestor)
/// canonicalizes to a location inside `root`.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let joined = root.join(normalize_relative(path.as_ref())?);

    let mut probe = Some(joined.as_path());
    while let Some(candidate) = probe {
        if candidate == root {
            return Ok(joined);
        }
        match candidate.canonicalize() {
            Ok(canonical) if canonical.starts_with(root) => return Ok(joined),
            Ok(canonical) => {
                return Err(traversal(&canonical, "Resolved path is outside the sandbox (symlink?)"));
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => probe = candidate.parent(),
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(format!("Failed to verify {}", candidate.display()).into()),
                });
            },
        }
    }

    Err(traversal(&joined, "No valid parent directory found within sandbox"))
}

/// Applies the namespace prefix and shards the filename as `ab/cd/abcdef`
/// (names shorter than four characters are left unsharded).
pub(crate) fn resolve_sharding(
    root: &Path,
    namespace: Option<&str>,
    path: impl AsRef<Path>,
) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();
    let file_name =
        path.file_name().and_then(|s| s.to_str()).ok_or_else(|| StorageError::FileNotFound {
            message: path.display().to_string().into(),
            context: Some("Target must be a file".into()),
        })?;

    let mut sharded = PathBuf::new();
    if let Some(ns) = namespace {
        sharded.push(ns);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        sharded.push(parent);
    }

    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() >= 4 {
        sharded.push(chars[0..2].iter().collect::<String>());
        sharded.push(chars[2..4].iter().collect::<String>());
    }
    sharded.push(file_name);

    resolve_path(root, sharded)
}
