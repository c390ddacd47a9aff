//! Reads the client's Rust sources from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{ArchitectureLintError, LintSource};

/// Every `.rs` file under `src_dir`, in path order, with paths relative to
/// `src_dir`.
pub(crate) fn read_sources(src_dir: &Path) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let mut pending = vec![src_dir.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();

    files
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path)?;
            Ok(LintSource {
                file: relative_to(src_dir, &path)?,
                contents,
            })
        })
        .collect()
}

fn relative_to(root: &Path, path: &Path) -> Result<PathBuf, ArchitectureLintError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| ArchitectureLintError::Unclassified {
            file: path.to_path_buf(),
        })
}
