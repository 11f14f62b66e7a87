use atr_core::{EngineError, EngineResult};
use camino::Utf8Path;
use std::fs;
use std::io::Write;

/// Writes `content` to `path` via a sibling temp file, fsync, then rename,
/// so a reader never observes a partially written file.
pub fn write_file_atomic(path: &Utf8Path, content: &[u8]) -> EngineResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| EngineError::validation(format!("no parent directory for {path}")))?;
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|err| EngineError::Io(err.error))?;
    Ok(())
}

/// Moves `from` to `to` atomically within the same filesystem. The content
/// store is always a single mount point, so cross-device fallback is not
/// attempted; a cross-device rename surfaces as an `Io` error.
pub fn rename_atomic(from: &Utf8Path, to: &Utf8Path) -> EngineResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(from, to)?;
    Ok(())
}

/// Recursively hard-links `src` into `dst`, creating directories with mode
/// `0755`. Used to clone a revision's files into `downloads/` without
/// doubling disk usage: the inode is shared, so the two paths are the same
/// bytes, and neither copy can be told apart from the other except by path.
pub fn clone_tree_hardlinked(src: &Utf8Path, dst: &Utf8Path) -> EngineResult<()> {
    clone_tree_hardlinked_inner(src, dst, false)
}

/// Walks `src` exactly as [`clone_tree_hardlinked`] would — validating every
/// entry name is UTF-8 and every destination parent is usable — without
/// creating a directory or link. Lets a caller fail fast on a tree that
/// can't be cloned before an earlier, harder-to-undo filesystem move (e.g.
/// the `finished/` rename) has already committed.
pub fn clone_tree_hardlinked_dry_run(src: &Utf8Path, dst: &Utf8Path) -> EngineResult<()> {
    clone_tree_hardlinked_inner(src, dst, true)
}

fn clone_tree_hardlinked_inner(src: &Utf8Path, dst: &Utf8Path, dry_run: bool) -> EngineResult<()> {
    if src.is_dir() {
        if !dry_run {
            fs::create_dir_all(dst)?;
            normalize_dir_mode(dst)?;
        } else if dst.exists() && !dst.is_dir() {
            return Err(EngineError::conflict(format!("{dst} exists and is not a directory")));
        }
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name
                .to_str()
                .ok_or_else(|| EngineError::validation("non-UTF-8 file name in content tree"))?;
            clone_tree_hardlinked_inner(&src.join(name), &dst.join(name), dry_run)?;
        }
    } else if !dry_run {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        if dst.exists() {
            fs::remove_file(dst)?;
        }
        fs::hard_link(src, dst)?;
    } else if dst.exists() && dst.is_dir() {
        return Err(EngineError::conflict(format!("{dst} exists and is a directory")));
    }
    Ok(())
}

/// Removes a directory tree. Used when a draft revision is discarded or a
/// release is deleted outright; never called on `finished/` content.
pub fn remove_tree(path: &Utf8Path) -> EngineResult<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

#[cfg(unix)]
pub fn normalize_dir_mode(path: &Utf8Path) -> EngineResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn normalize_dir_mode(_path: &Utf8Path) -> EngineResult<()> {
    Ok(())
}
