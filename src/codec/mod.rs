// Page codec - index.md <-> ordered blocks + page metadata
// Format: <!--{page json}--> then, per block, <!--{block json}--> followed by a markdown body

pub mod assets;
pub mod decode;
pub mod encode;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{BlockId, BlockType, Page};

pub use assets::{assetDataUri, externalizeAssets, readAsset};
pub use decode::decode;
pub use encode::{encode, encodePage};

pub const COMMENT_OPEN: &str = "<!--";
pub const COMMENT_CLOSE: &str = "-->";
pub const FILE_OPEN: &str = "[FILE-BLOCK]";
pub const FILE_CLOSE: &str = "[/FILE-BLOCK]";
pub const FRAME_OPEN: &str = "[FRAME-BLOCK]";
pub const FRAME_CLOSE: &str = "[/FRAME-BLOCK]";

/// Per-block comment. Extra keys hold what the markdown body cannot express.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BlockMeta {
    #[serde(rename = "type")]
    pub blockType: BlockType,
    pub id: BlockId,
    #[serde(default = "chrono::Utc::now")]
    pub createdAt: DateTime<Utc>,
    #[serde(default = "chrono::Utc::now")]
    pub lastEdited: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itemIds: Option<Vec<BlockId>>,
}

/// Frame blocks travel as inline JSON like file blocks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct FramePayload {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub caption: String,
}

/// Non-fatal decode problem; the affected fragment was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    /// 1-based line where the fragment started
    pub line: usize,
    pub message: String,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Result of decoding one index.md
#[derive(Debug, Clone, Default)]
pub struct DecodedPage {
    pub page: Page,
    pub warnings: Vec<DecodeWarning>,
}
