// Page model for filesystem-based storage
// A page is a directory holding index.md; nested directories are child pages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::block::Block;

/// Page-level metadata (leading comment in index.md)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default = "chrono::Utc::now")]
    pub createdAt: DateTime<Utc>,
    #[serde(default = "chrono::Utc::now")]
    pub lastEdited: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Keys written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            createdAt: now,
            lastEdited: now,
            title: None,
            tags: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn touch(&mut self) {
        self.lastEdited = Utc::now();
    }
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Full page: ordered blocks plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Page {
    pub blocks: Vec<Block>,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
}

/// One entry of the page tree (derived from the directory layout, never stored)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub children: Vec<PageTreeNode>,
}

impl PageTreeNode {
    pub fn new(name: String, path: String, children: Vec<PageTreeNode>) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::Directory,
            children,
        }
    }
}
