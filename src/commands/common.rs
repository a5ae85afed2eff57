// Common helpers for commands

use crate::directory::Directory;
use crate::error::{FolioError, Result};

/// Get current timestamp in milliseconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Handle for `dir` if present, else `root` (empty parent chain)
pub(crate) fn orRoot<'a>(dir: &'a Option<Box<dyn Directory>>, root: &'a dyn Directory) -> &'a dyn Directory {
    match dir {
        Some(d) => d.as_ref(),
        None => root,
    }
}

/// Split off the last segment, refusing the empty path
pub(crate) fn splitLast<'p>(segments: &'p [&'p str], path: &str) -> Result<(&'p [&'p str], &'p str)> {
    match segments.split_last() {
        Some((last, parent)) => Ok((parent, *last)),
        None => Err(FolioError::validation(format!("Page path is empty: {:?}", path))),
    }
}
