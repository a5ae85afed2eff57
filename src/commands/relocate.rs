// Rename and move commands
// One-step directory move when the backend has it; otherwise copy, then delete,
// with a sentinel in the target so an interrupted move can be finished later

use serde::{Deserialize, Serialize};

use super::common::{orRoot, splitLast};
use crate::directory::{Directory, EntryKind, MoveSupport};
use crate::error::{FolioError, Result};
use crate::storage::{ASSETS_DIR, joinPath, navigate, splitPath, validatePageSegments, validateSegment};

/// Marker written into the target of a copy-then-delete move
pub const MOVE_SENTINEL: &str = ".move-pending";

#[derive(Debug, Serialize, Deserialize)]
struct PendingMove {
    from: String,
}

/// Copy every file byte-for-byte and recurse into subdirectories
pub fn copyDirectory(source: &dyn Directory, target: &dyn Directory) -> Result<()> {
    for entry in source.entries()? {
        match entry.kind {
            EntryKind::File => {
                if entry.name == MOVE_SENTINEL {
                    continue;
                }
                let bytes = source.readFile(&entry.name)?;
                target.writeFile(&entry.name, &bytes)?;
            }
            EntryKind::Directory => {
                let from = source.getDirectory(&entry.name, false)?;
                let to = target.getDirectory(&entry.name, true)?;
                copyDirectory(from.as_ref(), to.as_ref())?;
            }
        }
    }
    Ok(())
}

/// Rename the last segment of `oldPath`; returns the new path
pub fn renamePage(root: &dyn Directory, oldPath: &str, newName: &str) -> Result<String> {
    tracing::debug!("[renamePage] Called with oldPath: {}, newName: {}", oldPath, newName);

    let from = splitPath(oldPath)?;
    let (parent, oldName) = splitLast(&from, oldPath)?;
    validatePageSegments(&from)?;

    let newName = newName.trim();
    if newName.contains('/') {
        return Err(FolioError::validation(format!("Page name cannot contain '/': {:?}", newName)));
    }
    validateSegment(newName)?;
    validatePageSegments(&[newName])?;

    let mut to = parent.to_vec();
    to.push(newName);
    let newPath = joinPath(&to);

    if oldName == newName {
        return Ok(newPath);
    }

    relocate(root, &from, &to)?;
    tracing::info!("[renamePage] {} -> {}", oldPath, newPath);
    Ok(newPath)
}

/// Move a page (and its subtree) to an arbitrary new path
pub fn movePage(root: &dyn Directory, sourcePath: &str, targetPath: &str) -> Result<()> {
    tracing::debug!("[movePage] Called with source: {}, target: {}", sourcePath, targetPath);

    let from = splitPath(sourcePath)?;
    let to = splitPath(targetPath)?;
    splitLast(&from, sourcePath)?;
    splitLast(&to, targetPath)?;
    validatePageSegments(&from)?;
    validatePageSegments(&to)?;

    if from == to {
        return Ok(());
    }
    // Prevent moving a page into itself or its children
    if to.starts_with(&from) {
        return Err(FolioError::validation("Cannot move a page into itself"));
    }

    relocate(root, &from, &to)?;
    tracing::info!("[movePage] {} -> {}", joinPath(&from), joinPath(&to));
    Ok(())
}

fn relocate(root: &dyn Directory, from: &[&str], to: &[&str]) -> Result<()> {
    let (fromParentSegments, fromName) = splitLast(from, "")?;
    let (toParentSegments, toName) = splitLast(to, "")?;

    let fromParent = navigate(root, fromParentSegments, false)?;
    let fromParent = orRoot(&fromParent, root);
    if !fromParent.hasDirectory(fromName) {
        return Err(FolioError::notFound(joinPath(from)));
    }

    // Refuse before creating any part of the target chain
    match navigate(root, toParentSegments, false) {
        Ok(existing) if orRoot(&existing, root).hasDirectory(toName) => {
            return Err(FolioError::validation(format!("{} already exists", joinPath(to))));
        }
        Ok(_) => {}
        Err(e) if e.isNotFound() => {}
        Err(e) => return Err(e),
    }

    let toParent = navigate(root, toParentSegments, true)?;
    let toParent = orRoot(&toParent, root);

    match fromParent.moveEntry(fromName, toParent, toName)? {
        MoveSupport::Moved => Ok(()),
        MoveSupport::Unsupported => {
            tracing::debug!("[relocate] No native move, copying {} -> {}", joinPath(from), joinPath(to));
            copyThenDelete(fromParent, fromName, toParent, toName, &joinPath(from))
        }
    }
}

fn copyThenDelete(
    fromParent: &dyn Directory,
    fromName: &str,
    toParent: &dyn Directory,
    toName: &str,
    fromPath: &str,
) -> Result<()> {
    let target = toParent.getDirectory(toName, true)?;
    let marker = serde_json::to_vec(&PendingMove { from: fromPath.to_string() })?;
    target.writeFile(MOVE_SENTINEL, &marker)?;

    let source = fromParent.getDirectory(fromName, false)?;
    copyDirectory(source.as_ref(), target.as_ref())?;

    if let Err(e) = fromParent.removeEntry(fromName, true) {
        tracing::warn!("[relocate] Copied but could not remove {}; old copy retained: {}", fromPath, e);
        return Err(e);
    }

    target.removeEntry(MOVE_SENTINEL, false)?;
    Ok(())
}

// ============================================
// RECOVERY
// ============================================

/// Finish copy-then-delete moves that were interrupted. Returns how many were resolved.
pub fn recoverPendingMoves(root: &dyn Directory) -> Result<usize> {
    let mut pending = Vec::new();
    findPending(root, &mut Vec::new(), &mut pending)?;

    for (targetSegments, marker) in &pending {
        let targetSegments: Vec<&str> = targetSegments.iter().map(String::as_str).collect();
        let target = navigate(root, &targetSegments, false)?
            .ok_or_else(|| FolioError::validation("Move sentinel found at workspace root"))?;

        let fromSegments = splitPath(&marker.from)?;
        match navigate(root, &fromSegments, false) {
            Ok(Some(source)) => {
                tracing::info!("[recoverPendingMoves] Resuming move {} -> {}", marker.from, targetSegments.join("/"));
                copyDirectory(source.as_ref(), target.as_ref())?;
                let (parentSegments, name) = splitLast(&fromSegments, &marker.from)?;
                let parent = navigate(root, parentSegments, false)?;
                orRoot(&parent, root).removeEntry(name, true)?;
            }
            Ok(None) => {}
            Err(e) if e.isNotFound() => {
                tracing::debug!("[recoverPendingMoves] Source {} already gone", marker.from);
            }
            Err(e) => return Err(e),
        }
        target.removeEntry(MOVE_SENTINEL, false)?;
    }

    Ok(pending.len())
}

fn findPending(dir: &dyn Directory, prefix: &mut Vec<String>, found: &mut Vec<(Vec<String>, PendingMove)>) -> Result<()> {
    for entry in dir.entries()? {
        match entry.kind {
            EntryKind::File if entry.name == MOVE_SENTINEL && !prefix.is_empty() => {
                match serde_json::from_slice::<PendingMove>(&dir.readFile(MOVE_SENTINEL)?) {
                    Ok(marker) => found.push((prefix.clone(), marker)),
                    Err(e) => tracing::warn!("[recoverPendingMoves] Ignoring unreadable sentinel in {}: {}", prefix.join("/"), e),
                }
            }
            EntryKind::Directory if entry.name != ASSETS_DIR && !entry.name.starts_with('.') => {
                let child = dir.getDirectory(&entry.name, false)?;
                prefix.push(entry.name);
                findPending(child.as_ref(), prefix, found)?;
                prefix.pop();
            }
            _ => {}
        }
    }
    Ok(())
}
