//! Path safety checks for object keys and static asset paths.
//!
//! Object keys arrive from URLs and are mapped onto the local filesystem by
//! the filesystem store, so every key is normalized and checked before it
//! touches the disk. The same checks guard the static asset handler.

use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};

/// Validates and normalizes an object key to prevent directory traversal.
///
/// Rejects keys that:
/// - Are empty
/// - Are absolute (start with `/` or a drive letter)
/// - Contain `..` components
/// - Contain a null byte
///
/// `.` components are dropped during normalization.
///
/// # Errors
///
/// Returns an error describing the first rejected component.
pub fn sanitize_key(key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        bail!("object key cannot be empty");
    }

    if key.contains('\0') {
        bail!("object key cannot contain a null byte");
    }

    let path = Path::new(key);

    if path.is_absolute() {
        bail!("object key cannot be absolute: {key}");
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => normalized.push(name),
            Component::CurDir => {},
            Component::ParentDir => bail!("object key cannot contain '..': {key}"),
            Component::RootDir | Component::Prefix(_) => {
                bail!("object key cannot contain a root or prefix: {key}")
            },
        }
    }

    if normalized.as_os_str().is_empty() {
        bail!("object key normalized to an empty path: {key}");
    }

    Ok(normalized)
}

/// Validates that a relative path stays within a base directory after
/// canonicalization, resolving symlinks along the way.
///
/// For paths that do not exist yet, the parent directory is canonicalized
/// instead so the subsequent read can fail with a clean not-found.
///
/// # Errors
///
/// Returns an error when the resolved path escapes `base_dir` or when the
/// base directory itself cannot be canonicalized.
pub fn resolve_within(base_dir: &Path, relative: &Path) -> Result<PathBuf> {
    let full_path = base_dir.join(relative);

    let canonical = if full_path.exists() {
        full_path
            .canonicalize()
            .map_err(|_| traversal_error(relative))?
    } else {
        let Some(parent) = full_path.parent() else {
            bail!("path has no parent directory: {}", relative.display());
        };
        let Some(file_name) = full_path.file_name() else {
            bail!("path has no file name: {}", relative.display());
        };

        if parent.exists() {
            parent
                .canonicalize()
                .map_err(|_| traversal_error(relative))?
                .join(file_name)
        } else {
            // Nothing on disk to resolve. The relative path is already
            // normalized, so the join cannot escape; the read will fail
            // with not-found.
            return Ok(full_path);
        }
    };

    let canonical_base = base_dir.canonicalize().map_err(|_| {
        anyhow::anyhow!("base directory cannot be resolved: {}", base_dir.display())
    })?;

    if !canonical.starts_with(&canonical_base) {
        return Err(traversal_error(relative));
    }

    Ok(canonical)
}

fn traversal_error(relative: &Path) -> anyhow::Error {
    anyhow::anyhow!("path escapes the base directory: {}", relative.display())
}
