// Error types for page store operations
// Validation and NotFound are meant for the UI layer, decode problems never surface here

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FolioError {
    /// Reserved names, malformed paths, impossible moves
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing directory segment or index.md
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl FolioError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn notFound(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn isNotFound(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<serde_yaml::Error> for FolioError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(format!("YAML error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;
