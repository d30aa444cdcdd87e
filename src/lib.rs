//! Sphinx documentation generator for Vyper contracts.
//!
//! The pipeline is `locate` → `parse` → `generate` → `build`, with an
//! optional static server over the built HTML.

pub mod builder;
pub mod error;
pub mod generator;
pub mod locator;
pub mod model;
pub mod parser;
pub mod render;
pub mod server;

pub use error::{Error, Result};
pub use generator::{generate, GeneratedTree, GeneratorOptions};
pub use locator::{locate, LocatorOptions};
pub use model::{ContractDoc, ContractFile};
pub use parser::parse_contract;

use tracing::warn;

/// Parse every located file, in order. With `skip_invalid`, files that fail
/// to parse are dropped with a warning; otherwise the first failure aborts.
pub fn parse_all(files: &[ContractFile], skip_invalid: bool) -> Result<Vec<ContractDoc>> {
    let mut docs = Vec::with_capacity(files.len());
    for file in files {
        match parse_contract(file) {
            Ok(doc) => docs.push(doc),
            Err(e @ Error::Parse { .. }) if skip_invalid => {
                warn!("skipping {}: {}", file.relative.display(), e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(docs)
}
