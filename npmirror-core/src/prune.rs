use crate::console;
use crate::{MirrorError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Copy)]
pub struct PruneSummary {
    pub files_removed: usize,
    pub directories_removed: usize,
}

/// Deletes everything under `root` the run did not touch. Files are
/// unlinked; directories are removed only when empty, children first, so
/// a directory emptied by this sweep goes too. Individual removal
/// failures are ignored; the next run gets another chance at them.
pub fn sweep(root: &Path, required: &BTreeSet<PathBuf>) -> Result<PruneSummary> {
    let mut summary = PruneSummary::default();

    if !root.is_dir() {
        return Ok(summary);
    }

    sweep_directory(root, required, &mut summary)?;
    Ok(summary)
}

fn sweep_directory(
    dir: &Path,
    required: &BTreeSet<PathBuf>,
    summary: &mut PruneSummary,
) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| MirrorError::ReadFile {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| MirrorError::ReadFile {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            sweep_directory(&path, required, summary)?;

            if !required.contains(&path) && fs::remove_dir(&path).is_ok() {
                summary.directories_removed += 1;
                console::pruned(&path);
            }
        } else if !required.contains(&path) && fs::remove_file(&path).is_ok() {
            summary.files_removed += 1;
            console::pruned(&path);
        }
    }

    Ok(())
}
