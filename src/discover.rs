//! Content discovery.
//!
//! The pipeline's producer side: walks the content directory and streams
//! every matching file path into the work channel the processing workers
//! pull from. Filters are plain predicates composed by AND, so the caller
//! decides what counts as content.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use walkdir::WalkDir;

/// A filename predicate applied during discovery.
pub type FileFilter = fn(&Path) -> bool;

/// Lets only Markdown files pass.
pub fn markdown_only(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Rejects files whose name starts with an underscore, the conventional
/// marker for drafts and includes that should not become pages.
pub fn no_underscores(path: &Path) -> bool {
    path.file_name()
        .map(|name| !name.to_string_lossy().starts_with('_'))
        .unwrap_or(false)
}

/// Walks `path` and sends every file accepted by all `filters` through the
/// `files` sender. The sender is dropped on return, which closes the
/// channel for the consuming workers.
///
/// A non-existing content directory streams nothing and is not an error.
/// If the receiving side hangs up early the walk simply stops.
pub fn stream_files(
    path: &Path,
    files: Sender<PathBuf>,
    filters: &[FileFilter],
) -> Result<(), walkdir::Error> {
    if !path.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !filters.iter().all(|filter| filter(entry.path())) {
            continue;
        }
        if files.send(entry.path().to_path_buf()).is_err() {
            break;
        }
    }

    Ok(())
}
