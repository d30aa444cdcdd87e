//! Reads a contract file and scans it into a ContractDoc.

pub mod natspec;
pub mod source;
pub mod types;

use crate::error::{Error, Result};
use crate::model::{ContractDoc, ContractFile};
use std::fs;
use std::path::Path;

pub use source::parse_source;

/// Read and parse one contract file.
///
/// Non-UTF-8 input and structurally broken files (unterminated docstrings or
/// signatures) fail with [`Error::Parse`].
pub fn parse_contract(file: &ContractFile) -> Result<ContractDoc> {
    let bytes = fs::read(&file.path).map_err(|e| Error::io(&file.path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        Error::Parse {
            path: file.path.clone(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            message: "file is not valid UTF-8".to_string(),
        }
    })?;
    parse_text(&file.path, &file.relative, &text)
}

/// Parse already-loaded source text; `path` is only used in error messages.
pub fn parse_text(path: &Path, relative: &Path, text: &str) -> Result<ContractDoc> {
    parse_source(relative, text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })
}
