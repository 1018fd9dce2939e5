use std::path::PathBuf;

use anyhow::{Result, bail};

use super::folder_or_cwd;
use crate::core::markers;
use crate::core::style;

/// Standalone placeholder pass. Works in folders that are already git
/// repositories; only the migration refuses those.
pub async fn run(folder: Option<PathBuf>) -> Result<()> {
    let folder = folder_or_cwd(folder)?;
    if !folder.is_dir() {
        bail!("Not a folder: {}", folder.display());
    }

    let created = markers::write_markers(&folder);
    if created > 0 {
        eprintln!(
            "{}",
            style::success(&format!(
                "Created {created} placeholder file(s) in empty folders"
            ))
        );
    } else {
        eprintln!("{}", style::success("No empty folders found"));
    }
    Ok(())
}
