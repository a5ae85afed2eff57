// Page tree commands - recursive enumeration of the workspace

use super::common::orRoot;
use crate::directory::{Directory, EntryKind};
use crate::error::Result;
use crate::models::PageTreeNode;
use crate::storage::{ASSETS_DIR, INDEX_FILE, navigate, splitPath};

/// Scan pages recursively from a directory.
/// Only directories holding index.md are pages; `assets` and dot-entries are skipped.
pub(crate) fn scanPages(dir: &dyn Directory, prefix: &str) -> Result<Vec<PageTreeNode>> {
    let mut names: Vec<String> = dir
        .entries()?
        .into_iter()
        .filter(|e| e.kind == EntryKind::Directory)
        .map(|e| e.name)
        .filter(|name| name != ASSETS_DIR && !name.starts_with('.'))
        .collect();
    names.sort();

    let mut pages = Vec::with_capacity(names.len());
    for name in names {
        let child = dir.getDirectory(&name, false)?;
        if !child.hasFile(INDEX_FILE) {
            continue;
        }
        let path = if prefix.is_empty() { name.clone() } else { format!("{}/{}", prefix, name) };
        let children = scanPages(child.as_ref(), &path)?;
        pages.push(PageTreeNode::new(name, path, children));
    }
    Ok(pages)
}

/// Page tree below `path` ("" for the whole workspace), sorted by name at each level
pub fn listPages(root: &dyn Directory, path: &str) -> Result<Vec<PageTreeNode>> {
    let segments = splitPath(path)?;
    let start = navigate(root, &segments, false)?;
    let pages = scanPages(orRoot(&start, root), &segments.join("/"))?;
    tracing::debug!("[listPages] Found {} pages under {:?}", pages.len(), path);
    Ok(pages)
}
