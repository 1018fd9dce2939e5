use std::path::Path;

use tracing::{debug, warn};

/// Marker filename. Stable across runs so repeated migrations are idempotent.
pub const KEEP_MARKER: &str = ".gitkeep";

const GIT_DIR: &str = ".git";

/// Walk `root` and drop a marker into every empty leaf directory.
///
/// A directory qualifies only when it holds nothing besides a marker left by
/// a previous run: no files (hidden files count), no subdirectories. The rule
/// is not transitive; a directory whose only child is an empty subdirectory
/// keeps its shape through the child's marker. `.git` directories are never
/// entered and never counted. Symbolic links are never followed: a link is
/// content wherever it points, so the walk stays inside `root`.
///
/// Returns the number of markers newly created. The walk itself cannot fail:
/// unreadable directories are skipped, and so is any single marker that
/// cannot be written.
pub fn write_markers(root: &Path) -> usize {
    let mut created = 0;
    visit(root, &mut created);
    created
}

fn visit(dir: &Path, created: &mut usize) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("skipping unreadable directory {}: {}", dir.display(), err);
            return;
        }
    };

    let mut has_files = false;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        // The entry's own type: a symlinked directory is content here, not a
        // directory to walk into.
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            if entry.file_name() == GIT_DIR {
                continue;
            }
            subdirs.push(entry.path());
        } else if entry.file_name() != KEEP_MARKER {
            has_files = true;
        }
    }

    if !has_files && subdirs.is_empty() {
        let marker = dir.join(KEEP_MARKER);
        if marker.exists() {
            return;
        }
        match std::fs::File::create(&marker) {
            Ok(_) => {
                debug!("created marker {}", marker.display());
                *created += 1;
            }
            Err(err) => warn!("could not create {}: {}", marker.display(), err),
        }
        return;
    }

    for sub in subdirs {
        visit(&sub, created);
    }
}
