// Session configuration models
// Persisted in the global config.md: settings in the frontmatter, workspaces in a table

use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 1000;

/// Settings that survive between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currentWorkspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastPage: Option<String>,
    #[serde(default = "defaultSidebarWidth")]
    pub sidebarWidth: u32,
    #[serde(default)]
    pub expandedPages: Vec<String>,
    #[serde(default = "defaultAutosaveDelay")]
    pub autosaveDelayMs: u64,
}

fn defaultSidebarWidth() -> u32 {
    260
}

fn defaultAutosaveDelay() -> u64 {
    DEFAULT_AUTOSAVE_DELAY_MS
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            currentWorkspace: None,
            lastPage: None,
            sidebarWidth: defaultSidebarWidth(),
            expandedPages: Vec::new(),
            autosaveDelayMs: defaultAutosaveDelay(),
        }
    }
}

/// Workspace entry in the config body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub path: String,
    pub name: String,
    pub lastOpened: i64,
}

/// Partial update coming from the UI (unset fields are left alone)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub lastPage: Option<String>,
    pub sidebarWidth: Option<u32>,
    pub expandedPages: Option<Vec<String>>,
    pub autosaveDelayMs: Option<u64>,
}

impl SessionSettings {
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(lastPage) = update.lastPage {
            self.lastPage = Some(lastPage).filter(|p| !p.is_empty());
        }
        if let Some(sidebarWidth) = update.sidebarWidth {
            self.sidebarWidth = sidebarWidth;
        }
        if let Some(expandedPages) = update.expandedPages {
            self.expandedPages = expandedPages;
        }
        if let Some(autosaveDelayMs) = update.autosaveDelayMs {
            self.autosaveDelayMs = autosaveDelayMs;
        }
    }
}
