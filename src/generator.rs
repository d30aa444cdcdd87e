//! Writes the Sphinx source tree: `conf.py`, `index.rst`, and one page per
//! contract under `contracts/`, mirroring the input directory layout.

use crate::error::{Error, Result};
use crate::model::ContractDoc;
use crate::render::{self, sphinx::ProjectInfo};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Directory (below the docs root) holding the contract pages.
pub const CONTRACTS_SUBDIR: &str = "contracts";

#[derive(Debug, Default, Clone)]
pub struct GeneratorOptions {
    pub project: ProjectInfo,
    /// Also document `@internal` functions
    pub include_internal: bool,
}

/// Paths written by [`generate`].
#[derive(Debug)]
pub struct GeneratedTree {
    pub docs_dir: PathBuf,
    pub conf_py: PathBuf,
    pub index: PathBuf,
    pub pages: Vec<PathBuf>,
}

/// Render and write the whole tree. Pages are listed in the index in the order
/// of `contracts`.
pub fn generate(
    contracts: &[ContractDoc],
    docs_dir: &Path,
    options: &GeneratorOptions,
) -> Result<GeneratedTree> {
    fs::create_dir_all(docs_dir).map_err(|e| Error::io(docs_dir, e))?;

    let conf_py = docs_dir.join("conf.py");
    write_atomic(&conf_py, &render::render_conf_py(&options.project))?;

    let mut pages = Vec::with_capacity(contracts.len());
    let mut docnames = Vec::with_capacity(contracts.len());
    for contract in contracts {
        let page = docs_dir.join(page_path(&contract.relative));
        write_atomic(&page, &render::render_contract(contract, options.include_internal))?;
        docnames.push(docname(&contract.relative));
        pages.push(page);
    }

    let index = docs_dir.join("index.rst");
    write_atomic(&index, &render::render_index(&options.project, &docnames))?;

    info!(pages = pages.len(), docs = %docs_dir.display(), "generated documentation sources");
    Ok(GeneratedTree {
        docs_dir: docs_dir.to_path_buf(),
        conf_py,
        index,
        pages,
    })
}

/// `tokens/ERC20.vy` → `contracts/tokens/ERC20.rst`
pub fn page_path(relative: &Path) -> PathBuf {
    Path::new(CONTRACTS_SUBDIR).join(relative.with_extension("rst"))
}

/// Toctree entry for a contract: `contracts/tokens/ERC20`, always with `/`.
pub fn docname(relative: &Path) -> String {
    let mut parts = vec![CONTRACTS_SUBDIR.to_string()];
    parts.extend(
        relative
            .with_extension("")
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            }),
    );
    parts.join("/")
}

/// Replace `path` with `contents` via a temp file in the same directory, so a
/// failed write never leaves a truncated file behind. Unchanged files are not
/// touched, which keeps Sphinx's incremental rebuilds cheap.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if fs::read(path).is_ok_and(|existing| existing == contents.as_bytes()) {
        debug!(path = %path.display(), "unchanged");
        return Ok(());
    }

    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::io(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    debug!(path = %path.display(), "wrote");
    Ok(())
}
