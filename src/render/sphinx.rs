//! `index.rst` and `conf.py`.

use super::heading;

/// Values written into `conf.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub project: String,
    pub author: String,
    pub copyright: Option<String>,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            project: "Vyper Smart Contracts".to_string(),
            author: "Vyper Developer".to_string(),
            copyright: None,
        }
    }
}

/// Root document with a toctree over `docnames` (in the given order).
pub fn render_index(info: &ProjectInfo, docnames: &[String]) -> String {
    let mut out = heading(&format!("{} Documentation", info.project), '=');
    out.push_str(".. toctree::\n   :maxdepth: 2\n   :caption: Contents:\n");
    if !docnames.is_empty() {
        out.push('\n');
        for name in docnames {
            out.push_str(&format!("   {}\n", name));
        }
    }
    out
}

/// Minimal Sphinx configuration using the Read the Docs theme.
pub fn render_conf_py(info: &ProjectInfo) -> String {
    let mut out = String::new();
    out.push_str("# Configuration file for the Sphinx documentation builder.\n");
    out.push_str("# Generated by sphinx-autodoc-vyper; edits are overwritten on the next run.\n\n");
    out.push_str(&format!("project = {}\n", py_str(&info.project)));
    if let Some(ref copyright) = info.copyright {
        out.push_str(&format!("copyright = {}\n", py_str(copyright)));
    }
    out.push_str(&format!("author = {}\n\n", py_str(&info.author)));
    out.push_str(
        "extensions = [\n    'sphinx.ext.autodoc',\n    'sphinx.ext.napoleon',\n    'sphinx.ext.viewcode',\n]\n\n",
    );
    out.push_str("exclude_patterns = ['_build', 'Thumbs.db', '.DS_Store']\n\n");
    out.push_str("html_theme = 'sphinx_rtd_theme'\n");
    out
}

/// Single-quoted Python string literal.
fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn index_lists_documents_in_order() {
        let info = ProjectInfo::default();
        let out = render_index(
            &info,
            &["contracts/token".to_string(), "contracts/nested/nested_token".to_string()],
        );
        assert_eq!(
            out,
            "\
Vyper Smart Contracts Documentation
===================================

.. toctree::
   :maxdepth: 2
   :caption: Contents:

   contracts/token
   contracts/nested/nested_token
"
        );
    }

    #[test]
    fn conf_py_uses_rtd_theme() {
        let out = render_conf_py(&ProjectInfo::default());
        assert!(out.contains("project = 'Vyper Smart Contracts'\n"));
        assert!(out.contains("'sphinx.ext.autodoc'"));
        assert!(out.contains("html_theme = 'sphinx_rtd_theme'"));
        assert!(!out.contains("copyright"));
    }

    #[test]
    fn conf_py_escapes_strings() {
        let info = ProjectInfo {
            project: "Bob's \\ Vault".to_string(),
            author: "A".to_string(),
            copyright: Some("2024, Bob".to_string()),
        };
        let out = render_conf_py(&info);
        assert!(out.contains("project = 'Bob\\'s \\\\ Vault'\n"));
        assert!(out.contains("copyright = '2024, Bob'\n"));
    }
}
