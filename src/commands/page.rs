// Page commands - create, read, write, delete
// A page is a directory holding index.md; its path is the slash-joined directory chain

use super::common::{orRoot, splitLast};
use super::tree::listPages;
use crate::codec::{decode, encodePage};
use crate::directory::Directory;
use crate::error::{FolioError, Result};
use crate::models::{Block, Page, PageMetadata, defaultBlocks};
use crate::storage::{INDEX_FILE, navigate, splitPath, validatePageSegments};

/// Name of the page created when the last root page disappears
pub const FALLBACK_PAGE: &str = "Welcome";

/// True when `path` names a directory that holds index.md
pub fn pageExists(root: &dyn Directory, path: &str) -> bool {
    let Ok(segments) = splitPath(path) else {
        return false;
    };
    if segments.is_empty() {
        return false;
    }
    match navigate(root, &segments, false) {
        Ok(Some(dir)) => dir.hasFile(INDEX_FILE),
        _ => false,
    }
}

/// Create a page with the default two-block document.
/// An existing index.md at `path` is overwritten; check `pageExists` first to avoid that.
pub fn createPage(root: &dyn Directory, path: &str) -> Result<()> {
    tracing::debug!("[createPage] Called with path: {}", path);

    let segments = splitPath(path)?;
    let (_, title) = splitLast(&segments, path)?;
    validatePageSegments(&segments)?;

    let dir = navigate(root, &segments, true)?
        .ok_or_else(|| FolioError::validation("Page path is empty"))?;

    let mut blocks = defaultBlocks(title);
    let text = encodePage(root, &mut blocks, Some(&PageMetadata::new()))?;
    dir.writeFile(INDEX_FILE, text.as_bytes())?;

    tracing::info!("[createPage] Created page {}", segments.join("/"));
    Ok(())
}

/// Load and decode a page. The empty path is "no page" and yields no blocks.
pub fn readPage(root: &dyn Directory, path: &str) -> Result<Page> {
    let segments = splitPath(path)?;
    if segments.is_empty() {
        return Ok(Page::default());
    }

    let dir = navigate(root, &segments, false)?
        .ok_or_else(|| FolioError::notFound(path.to_string()))?;
    if !dir.hasFile(INDEX_FILE) {
        return Err(FolioError::notFound(format!("{}/{}", segments.join("/"), INDEX_FILE)));
    }

    let text = dir.readText(INDEX_FILE)?;
    let decoded = decode(&text);
    tracing::debug!(
        "[readPage] {} -> {} blocks, {} warnings",
        path,
        decoded.page.blocks.len(),
        decoded.warnings.len()
    );
    Ok(decoded.page)
}

/// Encode and overwrite index.md, creating the directory chain if needed.
/// `metadata.lastEdited` is refreshed; missing metadata is synthesized.
pub fn writePage(root: &dyn Directory, path: &str, blocks: &[Block], metadata: Option<&PageMetadata>) -> Result<()> {
    let segments = splitPath(path)?;
    splitLast(&segments, path)?;
    validatePageSegments(&segments)?;

    let dir = navigate(root, &segments, true)?
        .ok_or_else(|| FolioError::validation("Page path is empty"))?;

    let mut metadata = metadata.cloned().unwrap_or_default();
    metadata.touch();

    let mut blocks = blocks.to_vec();
    let text = encodePage(root, &mut blocks, Some(&metadata))?;
    dir.writeFile(INDEX_FILE, text.as_bytes())?;

    tracing::debug!("[writePage] Wrote {} blocks to {} ({} bytes)", blocks.len(), path, text.len());
    Ok(())
}

/// Remove a page and everything below it. Returns the path of the fallback page
/// when removing a root page left the workspace without any.
pub fn deletePage(root: &dyn Directory, path: &str) -> Result<Option<String>> {
    tracing::debug!("[deletePage] Called with path: {}", path);

    let segments = splitPath(path)?;
    let (parentSegments, name) = splitLast(&segments, path)?;
    validatePageSegments(&segments)?;

    let parent = navigate(root, parentSegments, false)?;
    let parentDir = orRoot(&parent, root);
    if !parentDir.hasDirectory(name) {
        return Err(FolioError::notFound(path.to_string()));
    }
    parentDir.removeEntry(name, true)?;
    tracing::info!("[deletePage] Deleted {}", segments.join("/"));

    if parentSegments.is_empty() {
        return ensureRootPage(root);
    }
    Ok(None)
}

/// Create the fallback page if the workspace has no root pages
pub fn ensureRootPage(root: &dyn Directory) -> Result<Option<String>> {
    if !listPages(root, "")?.is_empty() {
        return Ok(None);
    }
    tracing::info!("[ensureRootPage] No root pages left, creating {}", FALLBACK_PAGE);
    createPage(root, FALLBACK_PAGE)?;
    Ok(Some(FALLBACK_PAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::LocalDirectory;
    use crate::models::BlockContent;

    fn workspace() -> (tempfile::TempDir, LocalDirectory) {
        let tmp = tempfile::tempdir().unwrap();
        let root = LocalDirectory::open(tmp.path()).unwrap();
        (tmp, root)
    }

    #[test]
    fn test_create_writes_default_document() {
        let (_tmp, root) = workspace();
        createPage(&root, "Projects/Alpha").unwrap();

        let page = readPage(&root, "Projects/Alpha").unwrap();
        assert_eq!(page.blocks.len(), 2);
        assert_eq!(page.blocks[0].content, BlockContent::Heading { level: 1, content: "Alpha".into() });
        assert!(matches!(page.blocks[1].content, BlockContent::Paragraph { .. }));

        // Intermediate directories are created but are not pages
        assert!(!pageExists(&root, "Projects"));
        assert!(pageExists(&root, "Projects/Alpha"));
    }

    #[test]
    fn test_reserved_name_is_rejected_without_mutation() {
        let (tmp, root) = workspace();
        assert!(matches!(createPage(&root, "assets"), Err(FolioError::Validation(_))));
        assert!(matches!(createPage(&root, "foo/assets"), Err(FolioError::Validation(_))));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_path_reads_as_no_page() {
        let (_tmp, root) = workspace();
        assert!(readPage(&root, "").unwrap().blocks.is_empty());
    }

    #[test]
    fn test_missing_page_is_not_found() {
        let (_tmp, root) = workspace();
        assert!(matches!(readPage(&root, "Nope"), Err(FolioError::NotFound(_))));

        root.getDirectory("Bare", true).unwrap();
        assert!(matches!(readPage(&root, "Bare"), Err(FolioError::NotFound(_))));
    }

    #[test]
    fn test_write_then_read() {
        let (_tmp, root) = workspace();
        let blocks = vec![Block::paragraph(1, "Hello"), Block::paragraph(2, "World")];
        writePage(&root, "Notes", &blocks, None).unwrap();

        let page = readPage(&root, "Notes").unwrap();
        let ids: Vec<_> = page.blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_delete_child_returns_none() {
        let (_tmp, root) = workspace();
        createPage(&root, "A").unwrap();
        createPage(&root, "A/B").unwrap();

        assert_eq!(deletePage(&root, "A/B").unwrap(), None);
        assert!(!pageExists(&root, "A/B"));
        assert!(pageExists(&root, "A"));
    }

    #[test]
    fn test_delete_refuses_the_assets_folder() {
        let (_tmp, root) = workspace();
        root.getDirectory("assets", true).unwrap().writeFile("logo.png", b"png").unwrap();

        assert!(matches!(deletePage(&root, "assets"), Err(FolioError::Validation(_))));
        assert!(matches!(deletePage(&root, "A/assets"), Err(FolioError::Validation(_))));
        assert!(root.getDirectory("assets", false).unwrap().hasFile("logo.png"));
    }

    #[test]
    fn test_delete_missing_page_is_not_found() {
        let (_tmp, root) = workspace();
        assert!(matches!(deletePage(&root, "Ghost"), Err(FolioError::NotFound(_))));
    }
}
