// Filesystem-based storage layer for folio
// Page paths, index.md location, and the persisted workspace session

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::directory::{Directory, LocalDirectory};
use crate::error::{FolioError, Result};
use crate::models::{SessionSettings, SettingsUpdate, WorkspaceEntry};

pub const INDEX_FILE: &str = "index.md";
pub use crate::codec::assets::ASSETS_DIR;

// ============================================
// PATH HELPERS
// ============================================

/// Global config directory (~/.folio/)
pub fn globalConfigDir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| FolioError::Config("Failed to get home directory".to_string()))?;
    Ok(home.join(".folio"))
}

/// Global config file path
pub fn globalConfigPath() -> Result<PathBuf> {
    Ok(globalConfigDir()?.join("config.md"))
}

/// Split a slash-separated page path into validated segments.
/// Empty segments are ignored, so "a//b/" is "a/b".
pub fn splitPath(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in &segments {
        validateSegment(segment)?;
    }
    Ok(segments)
}

pub fn validateSegment(segment: &str) -> Result<()> {
    if segment.trim().is_empty() || segment.starts_with('.') || segment.contains('\\') {
        return Err(FolioError::validation(format!("Malformed path segment: {:?}", segment)));
    }
    Ok(())
}

/// Rejects the reserved assets folder anywhere in the path
pub fn validatePageSegments(segments: &[&str]) -> Result<()> {
    if segments.iter().any(|s| *s == ASSETS_DIR) {
        return Err(FolioError::validation(format!("\"{}\" is a reserved name", ASSETS_DIR)));
    }
    Ok(())
}

pub fn joinPath(segments: &[&str]) -> String {
    segments.join("/")
}

/// Walk (or build, with `create`) the directory chain for `segments`
pub fn navigate(root: &dyn Directory, segments: &[&str], create: bool) -> Result<Option<Box<dyn Directory>>> {
    let mut current: Option<Box<dyn Directory>> = None;
    for segment in segments {
        let next = match &current {
            Some(dir) => dir.getDirectory(segment, create),
            None => root.getDirectory(segment, create),
        };
        current = Some(next?);
    }
    Ok(current)
}

// ============================================
// FRONTMATTER PARSING
// ============================================

/// Parse YAML frontmatter from markdown content
pub fn parseFrontmatter<T: serde::de::DeserializeOwned>(content: &str) -> Option<(T, String)> {
    let content = content.trim();
    if !content.starts_with("---") {
        return None;
    }

    let rest = &content[3..];
    let end = rest.find("\n---")?;
    let yaml = &rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml).ok()?;
    Some((frontmatter, body))
}

/// Serialize frontmatter + body to markdown
pub fn toMarkdown<T: serde::Serialize>(frontmatter: &T, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// SESSION STATE
// ============================================

/// Everything the UI used to keep in ambient browser storage, passed around explicitly
pub struct WorkspaceSession {
    configPath: PathBuf,
    pub settings: RwLock<SessionSettings>,
    pub workspaces: RwLock<Vec<WorkspaceEntry>>,
}

pub type SessionState = Arc<WorkspaceSession>;

impl WorkspaceSession {
    /// Load the session from `configPath`; a missing or unreadable file gives defaults
    pub fn load(configPath: impl Into<PathBuf>) -> Self {
        let configPath = configPath.into();
        tracing::debug!("[WorkspaceSession::load] Config path: {:?}", configPath);

        let (mut settings, workspaces) = loadConfig(&configPath);

        // Forget a current workspace whose folder is gone
        if let Some(ws) = settings.currentWorkspace.clone() {
            let exists = PathBuf::from(&ws).is_dir();
            tracing::debug!("[WorkspaceSession::load] Workspace path '{}' exists: {}", ws, exists);
            if !exists {
                settings.currentWorkspace = None;
            }
        }

        tracing::info!("[WorkspaceSession::load] Loaded {} workspaces, current: {:?}", workspaces.len(), settings.currentWorkspace);
        Self {
            configPath,
            settings: RwLock::new(settings),
            workspaces: RwLock::new(workspaces),
        }
    }

    /// Session stored in the user's global config
    pub fn loadDefault() -> Result<Self> {
        Ok(Self::load(globalConfigPath()?))
    }

    pub fn configPath(&self) -> &Path {
        &self.configPath
    }

    pub fn currentWorkspace(&self) -> Option<String> {
        self.settings.read().currentWorkspace.clone()
    }

    /// Handle on the open workspace
    pub fn currentRoot(&self) -> Result<LocalDirectory> {
        let path = self.currentWorkspace().ok_or_else(|| FolioError::notFound("No workspace selected"))?;
        LocalDirectory::open(path)
    }

    pub fn updateSettings(&self, update: SettingsUpdate) -> Result<()> {
        self.settings.write().apply(update);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.configPath.parent() {
            fs::create_dir_all(parent)?;
        }

        let settings = self.settings.read();
        let workspaces = self.workspaces.read();

        // Build workspaces table
        let mut body = String::from("# Workspaces\n\n| path | name | lastOpened |\n|------|------|------------|\n");
        for ws in workspaces.iter() {
            body.push_str(&format!("| {} | {} | {} |\n", ws.path, ws.name, ws.lastOpened));
        }

        let content = toMarkdown(&*settings, &body)?;
        fs::write(&self.configPath, content)?;
        tracing::debug!("[WorkspaceSession::save] Wrote {:?}", self.configPath);
        Ok(())
    }
}

fn loadConfig(path: &Path) -> (SessionSettings, Vec<WorkspaceEntry>) {
    if !path.exists() {
        tracing::debug!("[loadConfig] Config file does not exist, returning defaults");
        return (SessionSettings::default(), Vec::new());
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("[loadConfig] Failed to read {:?}: {}", path, e);
            return (SessionSettings::default(), Vec::new());
        }
    };

    let (settings, body) = parseFrontmatter::<SessionSettings>(&content).unwrap_or_else(|| {
        tracing::warn!("[loadConfig] Failed to parse frontmatter, using defaults");
        (SessionSettings::default(), String::new())
    });

    (settings, parseWorkspacesTable(&body))
}

/// Parse markdown table of workspaces from body
fn parseWorkspacesTable(body: &str) -> Vec<WorkspaceEntry> {
    let mut workspaces = Vec::new();

    for line in body.lines() {
        let line = line.trim();
        // Skip header rows and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with("|--") || line.starts_with("| path |") {
            continue;
        }
        // Parse table row: | path | name | lastOpened |
        if line.starts_with('|') {
            let parts: Vec<&str> = line.split('|').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();

            if parts.len() >= 3 {
                let path = parts[0].to_string();
                let name = parts[1].to_string();
                let lastOpened = parts[2].parse::<i64>().unwrap_or(0);

                // Only add if path exists on filesystem
                if PathBuf::from(&path).exists() {
                    workspaces.push(WorkspaceEntry { path, name, lastOpened });
                }
            }
        }
    }

    workspaces
}
