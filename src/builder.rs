//! Runs `sphinx-build` over the generated sources.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Builder executable, looked up on `PATH` when not a path
    pub sphinx_build: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            sphinx_build: PathBuf::from("sphinx-build"),
        }
    }
}

/// `sphinx-build -b html <docs_dir> <html_dir>`. A failing builder is not
/// retried; its diagnostics are returned in [`Error::Build`].
pub fn build(docs_dir: &Path, html_dir: &Path, options: &BuildOptions) -> Result<()> {
    let mut cmd = Command::new(&options.sphinx_build);
    cmd.arg("-b").arg("html").arg(docs_dir).arg(html_dir);
    debug!(?cmd, "running builder");

    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::Build(format!(
            "{} not found; install Sphinx (pip install sphinx sphinx-rtd-theme)",
            options.sphinx_build.display()
        )),
        _ => Error::Build(format!(
            "failed to run {}: {}",
            options.sphinx_build.display(),
            e
        )),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        let status = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        return Err(Error::Build(if message.is_empty() {
            status
        } else {
            format!("{}: {}", status, message)
        }));
    }

    info!(html = %html_dir.display(), "sphinx build finished");
    Ok(())
}
