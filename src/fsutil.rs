//! Filesystem helpers for the file-writing tools.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Atomically write `contents` to `path` via a temp file in the same
/// directory plus rename, so a crash mid-write never leaves a truncated
/// file behind.
///
/// # Errors
///
/// Returns an error if the parent directory is missing, the write fails,
/// or the rename fails (e.g. cross-device).
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("failed to flush temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}

/// Resolve `candidate` (absolute, or relative to `dir`) and check it stays
/// inside `dir`. Returns `None` for paths that escape — the caller records
/// the skip rather than failing the whole call.
///
/// `dir` must already be canonical. Symlinks and `..` segments are
/// resolved through the deepest existing ancestor, so a not-yet-created
/// file can still be checked.
pub fn resolve_within(dir: &Path, candidate: &str) -> Option<PathBuf> {
    let raw = if Path::new(candidate).is_absolute() {
        PathBuf::from(candidate)
    } else {
        dir.join(candidate)
    };

    let resolved = normalize(&raw)?;
    resolved.starts_with(dir).then_some(resolved)
}

/// Canonicalize `raw`, tolerating a nonexistent tail: the deepest existing
/// ancestor is canonicalized and the remaining plain components are joined
/// back on. A nonexistent path with `..` in its tail cannot be resolved
/// safely and yields `None`.
fn normalize(raw: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = raw.canonicalize() {
        return Some(canonical);
    }

    let mut ancestor = raw.to_path_buf();
    let mut suffix: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if ancestor.exists() {
            let mut resolved = ancestor.canonicalize().ok()?;
            for part in suffix.iter().rev() {
                resolved = resolved.join(part);
            }
            return Some(resolved);
        }
        // `file_name()` is None for a `..`-terminated path, which rejects
        // unresolvable traversal tails.
        suffix.push(ancestor.file_name()?.to_os_string());
        ancestor = ancestor.parent()?.to_path_buf();
    }
}
