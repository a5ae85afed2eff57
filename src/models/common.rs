// Payload pieces shared by several block types
// All fields use camelCase to match the JSON embedded in index.md

use serde::{Deserialize, Serialize};

pub type BlockId = i64;

/// One row of a todo or list block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListItem {
    #[serde(default)]
    pub id: BlockId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl ListItem {
    pub fn new(id: BlockId, text: impl Into<String>, completed: bool) -> Self {
        Self {
            id,
            text: text.into(),
            completed,
        }
    }
}

/// Attachment carried inline by a file block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base64: String,
}
