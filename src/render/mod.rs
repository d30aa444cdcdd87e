//! reStructuredText rendering of contract pages and the Sphinx scaffolding.

pub mod contract;
pub mod sphinx;

pub use contract::render_contract;
pub use sphinx::{render_conf_py, render_index};

/// Title with a matching underline.
fn heading(title: &str, underline: char) -> String {
    let width = title.chars().count().max(1);
    format!("{}\n{}\n\n", title, underline.to_string().repeat(width))
}

/// Indent every non-empty line; blank lines stay empty so the output carries
/// no trailing whitespace.
fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line.trim_end())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A `:name: body` field. Multi-line bodies continue three columns deeper than
/// the field marker.
fn field(name: &str, body: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut out = match lines.next() {
        Some(first) => format!("{}:{}: {}\n", pad, name, first),
        None => format!("{}:{}:\n", pad, name),
    };
    for line in lines {
        out.push_str(&format!("{}   {}\n", pad, line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_matches_title_width() {
        assert_eq!(heading("ERC20", '='), "ERC20\n=====\n\n");
        assert_eq!(heading("Ünïcode", '-'), "Ünïcode\n-------\n\n");
    }

    #[test]
    fn indent_leaves_blank_lines_empty() {
        assert_eq!(indent("a\n\n  b  ", 3), "   a\n\n     b");
    }

    #[test]
    fn empty_field_has_no_trailing_space() {
        assert_eq!(field("param to", "", 3), "   :param to:\n");
        assert_eq!(field("returns", "first\nsecond", 3), "   :returns: first\n      second\n");
    }
}
