// Directory abstraction for the page store
// The store only talks to folders through this trait; LocalDirectory backs it with std::fs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{FolioError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Outcome of asking a backend to move a child entry in one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSupport {
    Moved,
    Unsupported,
}

/// A capability handle on one folder
pub trait Directory: Send + Sync {
    fn name(&self) -> &str;

    /// Child directory handle, created when `create` is set
    fn getDirectory(&self, name: &str, create: bool) -> Result<Box<dyn Directory>>;

    fn hasFile(&self, name: &str) -> bool;

    fn readFile(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace the whole file (creating it if needed)
    fn writeFile(&self, name: &str, data: &[u8]) -> Result<()>;

    fn entries(&self) -> Result<Vec<DirEntry>>;

    fn removeEntry(&self, name: &str, recursive: bool) -> Result<()>;

    /// Move child `name` into `target` as `newName` in a single step.
    /// Backends without a native rename keep the default.
    fn moveEntry(&self, _name: &str, _target: &dyn Directory, _newName: &str) -> Result<MoveSupport> {
        Ok(MoveSupport::Unsupported)
    }

    /// Filesystem location, if this handle has one
    fn localPath(&self) -> Option<&Path> {
        None
    }

    fn hasDirectory(&self, name: &str) -> bool {
        self.getDirectory(name, false).is_ok()
    }

    fn readText(&self, name: &str) -> Result<String> {
        let bytes = self.readFile(name)?;
        String::from_utf8(bytes)
            .map_err(|e| FolioError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// Reject names that would escape the handle
fn checkName(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(FolioError::validation(format!("Invalid entry name: {:?}", name)));
    }
    Ok(())
}

fn mapNotFound(e: io::Error, what: &Path) -> FolioError {
    if e.kind() == io::ErrorKind::NotFound {
        FolioError::notFound(what.display().to_string())
    } else {
        FolioError::Io(e)
    }
}

// ============================================
// LOCAL FILESYSTEM
// ============================================

#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    /// Open an existing directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(FolioError::notFound(path.display().to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Directory for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn getDirectory(&self, name: &str, create: bool) -> Result<Box<dyn Directory>> {
        checkName(name)?;
        let child = self.path.join(name);
        if create {
            fs::create_dir_all(&child)?;
        }
        if !child.is_dir() {
            return Err(FolioError::notFound(child.display().to_string()));
        }
        Ok(Box::new(LocalDirectory {
            path: child,
            name: name.to_string(),
        }))
    }

    fn hasFile(&self, name: &str) -> bool {
        checkName(name).is_ok() && self.path.join(name).is_file()
    }

    fn readFile(&self, name: &str) -> Result<Vec<u8>> {
        checkName(name)?;
        let target = self.path.join(name);
        fs::read(&target).map_err(|e| mapNotFound(e, &target))
    }

    fn writeFile(&self, name: &str, data: &[u8]) -> Result<()> {
        checkName(name)?;
        // Write beside the target, then swap it in; concurrent writers never share a temp file
        let tmp = self.path.join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, self.path.join(name)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn entries(&self) -> Result<Vec<DirEntry>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(|e| mapNotFound(e, &self.path))? {
            let entry = entry?;
            let fileType = entry.file_type()?;
            // Symlinks are not followed so enumeration cannot cycle
            let kind = if fileType.is_dir() {
                EntryKind::Directory
            } else if fileType.is_file() {
                EntryKind::File
            } else {
                tracing::debug!("[entries] Skipping non-regular entry {:?}", entry.path());
                continue;
            };
            result.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
            });
        }
        Ok(result)
    }

    fn removeEntry(&self, name: &str, recursive: bool) -> Result<()> {
        checkName(name)?;
        let target = self.path.join(name);
        let meta = fs::symlink_metadata(&target).map_err(|e| mapNotFound(e, &target))?;
        if meta.is_dir() {
            if recursive {
                fs::remove_dir_all(&target)?;
            } else {
                fs::remove_dir(&target)?;
            }
        } else {
            fs::remove_file(&target)?;
        }
        Ok(())
    }

    fn moveEntry(&self, name: &str, target: &dyn Directory, newName: &str) -> Result<MoveSupport> {
        checkName(name)?;
        checkName(newName)?;
        let Some(targetPath) = target.localPath() else {
            return Ok(MoveSupport::Unsupported);
        };
        let from = self.path.join(name);
        let to = targetPath.join(newName);
        if !from.exists() {
            return Err(FolioError::notFound(from.display().to_string()));
        }
        if to.exists() {
            return Err(FolioError::validation(format!("{} already exists", to.display())));
        }
        match fs::rename(&from, &to) {
            Ok(()) => Ok(MoveSupport::Moved),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!("[moveEntry] Cross-device rename {:?} -> {:?}", from, to);
                Ok(MoveSupport::Unsupported)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn localPath(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl std::fmt::Debug for dyn Directory {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Directory").field("name", &self.name()).finish()
        }
    }

    #[test]
    fn test_write_replaces_and_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = LocalDirectory::open(tmp.path()).unwrap();

        dir.writeFile("index.md", b"first").unwrap();
        dir.writeFile("index.md", b"second").unwrap();

        assert_eq!(dir.readText("index.md").unwrap(), "second");
        let names: Vec<_> = dir.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["index.md".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_to_one_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = LocalDirectory::open(tmp.path()).unwrap();

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let dir = &dir;
                scope.spawn(move || {
                    for round in 0..25 {
                        dir.writeFile("index.md", format!("{}-{}", writer, round).as_bytes()).unwrap();
                    }
                });
            }
        });

        assert!(dir.readText("index.md").unwrap().ends_with("-24"));
        let names: Vec<_> = dir.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["index.md".to_string()]);
    }

    #[test]
    fn test_missing_child_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = LocalDirectory::open(tmp.path()).unwrap();

        assert!(dir.getDirectory("nope", false).unwrap_err().isNotFound());
        assert!(dir.readFile("nope.md").unwrap_err().isNotFound());
        assert!(dir.getDirectory("made", true).is_ok());
        assert!(dir.hasDirectory("made"));
    }

    #[test]
    fn test_rejects_escaping_names() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = LocalDirectory::open(tmp.path()).unwrap();

        assert!(matches!(dir.getDirectory("..", true), Err(FolioError::Validation(_))));
        assert!(matches!(dir.writeFile("a/b", b"x"), Err(FolioError::Validation(_))));
    }

    #[test]
    fn test_move_entry_renames_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = LocalDirectory::open(tmp.path()).unwrap();
        let child = dir.getDirectory("old", true).unwrap();
        child.writeFile("index.md", b"x").unwrap();

        let outcome = dir.moveEntry("old", &dir, "new").unwrap();

        assert_eq!(outcome, MoveSupport::Moved);
        assert!(!dir.hasDirectory("old"));
        assert_eq!(dir.getDirectory("new", false).unwrap().readText("index.md").unwrap(), "x");
    }
}
