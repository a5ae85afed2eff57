// Commands module - page store and workspace operations
// Every command takes the workspace root explicitly; session state lives in storage::WorkspaceSession

pub mod common;
pub mod page;
pub mod relocate;
pub mod tree;
pub mod workspace;

pub use page::{FALLBACK_PAGE, createPage, deletePage, ensureRootPage, pageExists, readPage, writePage};
pub use relocate::{MOVE_SENTINEL, copyDirectory, movePage, recoverPendingMoves, renamePage};
pub use tree::listPages;
pub use workspace::{
    WorkspaceInfo, checkWorkspaceStructure, closeWorkspace, createWorkspaceStructure, getWorkspaces, openWorkspace,
    removeWorkspace,
};
