// Block model - one editable unit of page content
// The payload is a closed sum type; the discriminant doubles as the JSON "type" field

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{BlockId, FileData, ListItem};

/// Block discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Paragraph,
    Heading,
    Table,
    Image,
    File,
    Todo,
    List,
    Code,
    Quote,
    Frame,
    Reference,
    Divider,
}

impl BlockType {
    pub fn asStr(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Table => "table",
            Self::Image => "image",
            Self::File => "file",
            Self::Todo => "todo",
            Self::List => "list",
            Self::Code => "code",
            Self::Quote => "quote",
            Self::Frame => "frame",
            Self::Reference => "reference",
            Self::Divider => "divider",
        }
    }
}

fn defaultLevel() -> u8 {
    1
}

/// Type-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockContent {
    Paragraph {
        #[serde(default)]
        content: String,
    },
    Heading {
        #[serde(default = "defaultLevel")]
        level: u8,
        #[serde(default)]
        content: String,
    },
    Table {
        #[serde(default)]
        data: Vec<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Vec<String>>,
    },
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        caption: String,
    },
    File {
        #[serde(default)]
        fileData: FileData,
    },
    Todo {
        #[serde(default)]
        items: Vec<ListItem>,
    },
    List {
        #[serde(default)]
        items: Vec<ListItem>,
    },
    Code {
        #[serde(default)]
        language: String,
        #[serde(default)]
        content: String,
    },
    Quote {
        #[serde(default)]
        content: String,
    },
    Frame {
        #[serde(default)]
        src: String,
        #[serde(default)]
        caption: String,
    },
    Reference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        referenceId: Option<BlockId>,
    },
    Divider,
}

impl BlockContent {
    /// Payload with every field at its default
    pub fn empty(blockType: BlockType) -> Self {
        match blockType {
            BlockType::Paragraph => Self::Paragraph { content: String::new() },
            BlockType::Heading => Self::Heading { level: 1, content: String::new() },
            BlockType::Table => Self::Table { data: Vec::new(), headers: None },
            BlockType::Image => Self::Image { src: String::new(), caption: String::new() },
            BlockType::File => Self::File { fileData: FileData::default() },
            BlockType::Todo => Self::Todo { items: Vec::new() },
            BlockType::List => Self::List { items: Vec::new() },
            BlockType::Code => Self::Code { language: String::new(), content: String::new() },
            BlockType::Quote => Self::Quote { content: String::new() },
            BlockType::Frame => Self::Frame { src: String::new(), caption: String::new() },
            BlockType::Reference => Self::Reference { referenceId: None },
            BlockType::Divider => Self::Divider,
        }
    }

    pub fn blockType(&self) -> BlockType {
        match self {
            Self::Paragraph { .. } => BlockType::Paragraph,
            Self::Heading { .. } => BlockType::Heading,
            Self::Table { .. } => BlockType::Table,
            Self::Image { .. } => BlockType::Image,
            Self::File { .. } => BlockType::File,
            Self::Todo { .. } => BlockType::Todo,
            Self::List { .. } => BlockType::List,
            Self::Code { .. } => BlockType::Code,
            Self::Quote { .. } => BlockType::Quote,
            Self::Frame { .. } => BlockType::Frame,
            Self::Reference { .. } => BlockType::Reference,
            Self::Divider => BlockType::Divider,
        }
    }

    /// True when nothing worth persisting has been written into the payload
    pub fn isEmpty(&self) -> bool {
        match self {
            Self::Paragraph { content }
            | Self::Heading { content, .. }
            | Self::Code { content, .. }
            | Self::Quote { content } => content.trim().is_empty(),
            Self::Table { data, .. } => data.is_empty(),
            Self::Todo { items } | Self::List { items } => items.is_empty(),
            Self::Image { src, caption } | Self::Frame { src, caption } => src.is_empty() && caption.is_empty(),
            Self::File { fileData } => fileData.name.is_empty() && fileData.base64.is_empty(),
            Self::Reference { referenceId } => referenceId.is_none(),
            Self::Divider => false,
        }
    }
}

/// A block with its identity and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default = "chrono::Utc::now")]
    pub createdAt: DateTime<Utc>,
    #[serde(default = "chrono::Utc::now")]
    pub lastEdited: DateTime<Utc>,
    #[serde(flatten)]
    pub content: BlockContent,
}

impl Block {
    pub fn new(id: BlockId, content: BlockContent) -> Self {
        let now = Utc::now();
        Self {
            id,
            createdAt: now,
            lastEdited: now,
            content,
        }
    }

    pub fn paragraph(id: BlockId, content: impl Into<String>) -> Self {
        Self::new(id, BlockContent::Paragraph { content: content.into() })
    }

    pub fn heading(id: BlockId, level: u8, content: impl Into<String>) -> Self {
        Self::new(id, BlockContent::Heading { level, content: content.into() })
    }

    pub fn blockType(&self) -> BlockType {
        self.content.blockType()
    }

    pub fn isEmpty(&self) -> bool {
        self.content.isEmpty()
    }
}

/// Fresh block id: the current millisecond timestamp, kept above every id already in use
pub fn nextBlockId(existing: &[Block]) -> BlockId {
    let now = Utc::now().timestamp_millis();
    let maxExisting = existing.iter().map(|b| b.id).max().unwrap_or(i64::MIN);
    if now > maxExisting { now } else { maxExisting + 1 }
}

/// The two-block document every new page starts with
pub fn defaultBlocks(title: &str) -> Vec<Block> {
    let first = nextBlockId(&[]);
    vec![
        Block::heading(first, 1, title),
        Block::paragraph(first + 1, "Start writing here..."),
    ]
}
