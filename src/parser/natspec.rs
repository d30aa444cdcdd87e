//! NatSpec docstring tags.
//!
//! Tags are recognized at the start of a line, in any order. A tag's text runs
//! until the next tag; untagged text before the first tag is description.
//! Unknown tags (including `@custom:*`) swallow their text silently.

use regex::Regex;
use std::sync::LazyLock;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][\w:\-]*)(?:[ \t]+(.*))?$").unwrap());

static RE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:[ \t]+(.*))?$").unwrap());

/// Tags extracted from one docstring.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Docstring {
    pub title: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    /// Untagged text followed by every @notice block
    pub description: String,
    pub dev: String,
    /// (name, text) in tag order
    pub params: Vec<(String, String)>,
    pub returns: String,
}

#[derive(Clone, Copy)]
enum Target {
    Description,
    Notice,
    Dev,
    Param(usize),
    Return,
    Title,
    Author,
    License,
    Ignored,
}

#[derive(Default)]
struct Blocks {
    untagged: Vec<String>,
    notice: Vec<Vec<String>>,
    dev: Vec<Vec<String>>,
    params: Vec<(String, Vec<String>)>,
    returns: Vec<Vec<String>>,
    title: Vec<String>,
    author: Vec<String>,
    license: Vec<String>,
}

impl Blocks {
    fn push(&mut self, target: Target, line: String) {
        match target {
            Target::Description => self.untagged.push(line),
            // Continuation lines of a tag are aligned under the tag text,
            // so their extra indentation is not significant.
            Target::Notice => push_last(&mut self.notice, line.trim().to_string()),
            Target::Dev => push_last(&mut self.dev, line.trim().to_string()),
            Target::Param(i) => self.params[i].1.push(line),
            Target::Return => push_last(&mut self.returns, line),
            Target::Title => self.title.push(line),
            Target::Author => self.author.push(line),
            Target::License => self.license.push(line),
            Target::Ignored => {}
        }
    }
}

fn push_last(blocks: &mut [Vec<String>], line: String) {
    if let Some(last) = blocks.last_mut() {
        last.push(line);
    }
}

/// Parse the inner text of a triple-quoted docstring.
pub fn parse(raw: &str) -> Docstring {
    let lines = dedent(raw);
    let mut blocks = Blocks::default();
    let mut target = Target::Description;

    for line in lines {
        let trimmed = line.trim();
        let Some(caps) = RE_TAG.captures(trimmed) else {
            blocks.push(target, line.clone());
            continue;
        };
        let rest = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();

        if &caps[1] == "param" {
            target = match RE_PARAM.captures(&rest) {
                Some(p) => {
                    let text = p.get(2).map_or("", |m| m.as_str()).to_string();
                    blocks.params.push((p[1].to_string(), vec![text]));
                    Target::Param(blocks.params.len() - 1)
                }
                None => Target::Ignored,
            };
            continue;
        }

        target = match &caps[1] {
            "notice" => {
                blocks.notice.push(Vec::new());
                Target::Notice
            }
            "dev" => {
                blocks.dev.push(Vec::new());
                Target::Dev
            }
            "return" | "returns" => {
                blocks.returns.push(Vec::new());
                Target::Return
            }
            "title" => Target::Title,
            "author" => Target::Author,
            "license" => Target::License,
            _ => Target::Ignored,
        };
        if !rest.is_empty() {
            blocks.push(target, rest);
        }
    }

    let mut description = Vec::new();
    let untagged = join_lines(&blocks.untagged);
    if !untagged.is_empty() {
        description.push(untagged);
    }
    description.extend(blocks.notice.iter().map(|b| join_lines(b)).filter(|s| !s.is_empty()));

    Docstring {
        title: join_words(&blocks.title),
        author: join_words(&blocks.author),
        license: join_words(&blocks.license),
        description: description.join("\n\n"),
        dev: blocks
            .dev
            .iter()
            .map(|b| join_lines(b))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        params: blocks
            .params
            .into_iter()
            .map(|(name, text)| (name, join_words(&text).unwrap_or_default()))
            .collect(),
        returns: blocks
            .returns
            .iter()
            .filter_map(|b| join_words(b))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Remove the common indentation of spaces and tabs. The first line is usually
/// on the same line as the opening quotes and is only trimmed.
pub fn dedent(raw: &str) -> Vec<String> {
    let mut lines = raw.lines();
    let first = lines.next().map(|l| l.trim().to_string());
    let rest: Vec<&str> = lines.collect();

    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = first.into_iter().collect();
    for line in rest {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            out.push(line[indent.min(line.len())..].trim_end().to_string());
        }
    }
    out
}

/// Keep line structure, drop leading/trailing blank lines and collapse blank runs.
fn join_lines(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        if line.is_empty() && out.last().is_some_and(|l: &&str| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Single-paragraph text: lines joined with spaces.
fn join_words(lines: &[String]) -> Option<String> {
    let words: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags_in_any_order() {
        let doc = parse(
            "\n    @return Success status\n    @param amount The amount\n    @notice Transfer tokens\n    @param to The recipient\n    ",
        );
        assert_eq!(doc.description, "Transfer tokens");
        assert_eq!(doc.returns, "Success status");
        assert_eq!(
            doc.params,
            vec![
                ("amount".to_string(), "The amount".to_string()),
                ("to".to_string(), "The recipient".to_string()),
            ]
        );
    }

    #[test]
    fn untagged_text_is_description() {
        let doc = parse("\n    Get the token balance of an account.\n    ");
        assert_eq!(doc.description, "Get the token balance of an account.");
        assert!(doc.params.is_empty());
    }

    #[test]
    fn continuation_lines() {
        let doc = parse(
            "@notice Moves tokens\n         between accounts.\n@param to The\n    recipient address\n@dev Emits Transfer.\n    Reverts on overflow.",
        );
        assert_eq!(doc.description, "Moves tokens\nbetween accounts.");
        assert_eq!(doc.params[0].1, "The recipient address");
        assert_eq!(doc.dev, "Emits Transfer.\nReverts on overflow.");
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let doc = parse("@notice Hello\n@custom:security contact@example.com\n  more hidden text\n@return ok");
        assert_eq!(doc.description, "Hello");
        assert_eq!(doc.returns, "ok");
    }

    #[test]
    fn module_level_tags() {
        let doc = parse("\n@title ERC20 Token\n@author Vyper Team\n@license MIT\n@notice Sample token.\n");
        assert_eq!(doc.title.as_deref(), Some("ERC20 Token"));
        assert_eq!(doc.author.as_deref(), Some("Vyper Team"));
        assert_eq!(doc.license.as_deref(), Some("MIT"));
        assert_eq!(doc.description, "Sample token.");
    }

    #[test]
    fn param_without_text() {
        let doc = parse("@param spender");
        assert_eq!(doc.params, vec![("spender".to_string(), String::new())]);
    }

    #[test]
    fn dedent_keeps_relative_indentation() {
        assert_eq!(
            dedent("First\n        * item\n          continued\n"),
            vec!["First", "* item", "  continued"]
        );
    }

    #[test]
    fn unicode_whitespace_is_not_indentation() {
        assert_eq!(
            dedent("x\n    a\n  \u{a0}b\n"),
            vec!["x", "  a", "\u{a0}b"]
        );
        assert_eq!(dedent("x\n  a\n\u{3000}b\n"), vec!["x", "  a", "\u{3000}b"]);

        let doc = parse("\n @notice a\n\u{3000}more\n");
        assert!(doc.description.starts_with('a'), "{:?}", doc.description);
        assert!(doc.description.contains("more"), "{:?}", doc.description);
    }
}
