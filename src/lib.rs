// Allow non-snake_case names for JSON serialization compatibility with the frontend
#![allow(non_snake_case)]

pub mod autosave;
pub mod codec;
pub mod commands;
pub mod directory;
pub mod error;
pub mod models;
pub mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use autosave::{AutoSaver, AutosaveStatus};
pub use codec::{DecodeWarning, DecodedPage, decode, encode};
pub use commands::{
    checkWorkspaceStructure, copyDirectory, createPage, createWorkspaceStructure, deletePage, listPages, movePage,
    openWorkspace, pageExists, readPage, renamePage, writePage,
};
pub use directory::{DirEntry, Directory, EntryKind, LocalDirectory, MoveSupport};
pub use error::{FolioError, Result};
pub use models::{Block, BlockContent, BlockId, BlockType, Page, PageMetadata, PageTreeNode};
pub use storage::{SessionState, WorkspaceSession};

/// Install the fmt subscriber, filtered by RUST_LOG (default "info").
/// Safe to call more than once; later calls are ignored.
pub fn initLogging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let result = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();

    if result.is_ok() {
        tracing::info!("Folio {} logging initialized", env!("CARGO_PKG_VERSION"));
    }
}
