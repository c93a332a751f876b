//! Path validation and manipulation utilities.
//! Paths are absolute, slash-separated and compared as whole strings only.

use crate::config::{MAX_FILE_NAME_LEN, ROOT_PATH};
use crate::error::{FsError, Result};

/// Checks that `path` is an absolute, normalized path.
pub fn validate(path: &str) -> Result<()> {
    if path == ROOT_PATH {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(FsError::InvalidPath(path.to_string()));
    };
    for component in rest.split('/') {
        if component.is_empty() || component == "." || component == ".." || component.contains('\0') {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        if component.len() > MAX_FILE_NAME_LEN {
            return Err(FsError::NameTooLong(path.to_string()));
        }
    }
    Ok(())
}

/// Splits a validated path into (parent path, last component).
/// The root splits into ("/", "").
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => (ROOT_PATH, &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (ROOT_PATH, path),
    }
}

/// Last component of a path.
pub fn name_of(path: &str) -> &str {
    split(path).1
}

/// True if `path` lies strictly below `ancestor`.
/// "/foo" is not below "/fo", only below "/" itself.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT_PATH {
        return path != ROOT_PATH && path.starts_with('/');
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
}

/// Joins a child name onto a directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT_PATH {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}
