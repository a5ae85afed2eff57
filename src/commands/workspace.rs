// Workspace commands - bootstrap the folder layout and track opened workspaces

use std::path::PathBuf;

use super::common::now;
use super::page::ensureRootPage;
use super::relocate::recoverPendingMoves;
use crate::directory::{Directory, LocalDirectory};
use crate::error::{FolioError, Result};
use crate::models::WorkspaceEntry;
use crate::storage::{ASSETS_DIR, WorkspaceSession};

const WRITE_PROBE: &str = ".write-probe";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WorkspaceInfo {
    pub path: String,
    pub name: String,
    pub lastOpened: i64,
    pub isCurrent: bool,
}

/// True iff `assets/` exists and accepts writes
pub fn checkWorkspaceStructure(root: &dyn Directory) -> bool {
    let assets = match root.getDirectory(ASSETS_DIR, false) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::debug!("[checkWorkspaceStructure] No {} folder: {}", ASSETS_DIR, e);
            return false;
        }
    };
    let writable = assets.writeFile(WRITE_PROBE, b"").and_then(|_| assets.removeEntry(WRITE_PROBE, false));
    match writable {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("[checkWorkspaceStructure] {} is not writable: {}", ASSETS_DIR, e);
            false
        }
    }
}

/// Create `assets/`; false when the folder cannot be made writable
pub fn createWorkspaceStructure(root: &dyn Directory) -> bool {
    if let Err(e) = root.getDirectory(ASSETS_DIR, true) {
        tracing::error!("[createWorkspaceStructure] Failed to create {}: {}", ASSETS_DIR, e);
        return false;
    }
    checkWorkspaceStructure(root)
}

pub fn getWorkspaces(session: &WorkspaceSession) -> Vec<WorkspaceInfo> {
    let current = session.currentWorkspace();
    session
        .workspaces
        .read()
        .iter()
        .map(|ws| WorkspaceInfo {
            path: ws.path.clone(),
            name: ws.name.clone(),
            lastOpened: ws.lastOpened,
            isCurrent: current.as_ref() == Some(&ws.path),
        })
        .collect()
}

/// Make `path` the current workspace: bootstrap its layout, finish interrupted
/// moves, make sure a root page exists, and remember it in the session.
pub fn openWorkspace(session: &WorkspaceSession, path: &str) -> Result<WorkspaceInfo> {
    tracing::debug!("[openWorkspace] Called with path: {}", path);

    let root = LocalDirectory::open(path)?;
    if !checkWorkspaceStructure(&root) && !createWorkspaceStructure(&root) {
        return Err(FolioError::Config(format!("Cannot prepare workspace at {}", path)));
    }

    let recovered = recoverPendingMoves(&root)?;
    if recovered > 0 {
        tracing::info!("[openWorkspace] Finished {} interrupted move(s)", recovered);
    }
    ensureRootPage(&root)?;

    let name = PathBuf::from(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Workspace")
        .to_string();
    let lastOpened = now();

    {
        let mut workspaces = session.workspaces.write();
        match workspaces.iter_mut().find(|ws| ws.path == path) {
            Some(ws) => ws.lastOpened = lastOpened,
            None => workspaces.push(WorkspaceEntry {
                path: path.to_string(),
                name: name.clone(),
                lastOpened,
            }),
        }
    }
    session.settings.write().currentWorkspace = Some(path.to_string());
    session.save()?;

    tracing::info!("[openWorkspace] Opened workspace {} at {}", name, path);
    Ok(WorkspaceInfo {
        path: path.to_string(),
        name,
        lastOpened,
        isCurrent: true,
    })
}

pub fn closeWorkspace(session: &WorkspaceSession) -> Result<()> {
    {
        let mut settings = session.settings.write();
        settings.currentWorkspace = None;
        settings.lastPage = None;
    }
    session.save()?;
    tracing::info!("[closeWorkspace] Workspace closed");
    Ok(())
}

/// Forget a workspace (its files are left untouched)
pub fn removeWorkspace(session: &WorkspaceSession, path: &str) -> Result<()> {
    session.workspaces.write().retain(|ws| ws.path != path);
    {
        let mut settings = session.settings.write();
        if settings.currentWorkspace.as_deref() == Some(path) {
            settings.currentWorkspace = None;
            settings.lastPage = None;
        }
    }
    session.save()
}
