// Models module for folio filesystem-based storage
// All fields use camelCase for consistency with the JSON stored in index.md

pub mod block;
pub mod common;
pub mod config;
pub mod page;

pub use block::{Block, BlockContent, BlockType, defaultBlocks, nextBlockId};
pub use common::{BlockId, FileData, ListItem};
pub use config::{SessionSettings, SettingsUpdate, WorkspaceEntry};
pub use page::{NodeKind, Page, PageMetadata, PageTreeNode};
