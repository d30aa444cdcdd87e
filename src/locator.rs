//! Contract discovery: a recursive walk of the contracts directory.

use crate::error::{Error, Result};
use crate::model::ContractFile;
use glob::Pattern;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// File extensions recognized as contract sources.
pub const CONTRACT_EXTENSIONS: &[&str] = &["vy"];

#[derive(Debug, Default, Clone)]
pub struct LocatorOptions {
    /// Glob patterns matched against paths relative to the contracts root
    pub exclude: Vec<String>,
}

/// Find every contract below `root`, sorted by path so repeated runs see the
/// same discovery order.
pub fn locate(root: &Path, options: &LocatorOptions) -> Result<Vec<ContractFile>> {
    if !root.is_dir() {
        return Err(Error::ContractsDirNotFound(root.to_path_buf()));
    }

    let excludes = options
        .exclude
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| Error::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_contract(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if excludes.iter().any(|p| p.matches_path(&relative)) {
            debug!(path = %relative.display(), "excluded");
            continue;
        }
        files.push(ContractFile {
            path: entry.path().to_path_buf(),
            relative,
        });
    }

    debug!(count = files.len(), root = %root.display(), "located contracts");
    Ok(files)
}

pub fn is_contract(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CONTRACT_EXTENSIONS.contains(&ext))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
