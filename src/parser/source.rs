//! Vyper source scanner: line and block based, no grammar.
//!
//! Only top-level (column 0) statements are inspected. Function bodies are
//! skipped except for the docstring on their first line.

use super::natspec::{self, Docstring};
use super::types::{self, parse_type, split_top_level};
use crate::model::*;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

// -- Regex patterns -----------------------------------------------------------

static RE_DECORATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\w+)").unwrap());

static RE_DEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^def\s+(\w+)\s*\(").unwrap());

static RE_BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(struct|event|enum|flag|interface)\s+(\w+)\s*:\s*(pass)?\s*$").unwrap()
});

static RE_CONSTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*:\s*constant\s*\((.+?)\)\s*=\s*(.+)$").unwrap());

static RE_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*:\s*(.+)$").unwrap());

static RE_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(public|immutable|transient)\s*\((.*)\)$").unwrap());

static RE_INDEXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^indexed\s*\((.*)\)$").unwrap());

static RE_MEMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());

/// Module-level statements that look like `name: value` but declare no storage.
const DECLARATION_KEYWORDS: &[&str] = &["implements", "uses", "initializes", "exports"];

const DOCSTRING_QUOTES: &[&str] = &["\"\"\"", "'''"];

// -- Errors -------------------------------------------------------------------

/// A structural problem that makes the file unreadable as a contract.
#[derive(Debug, PartialEq, Eq)]
pub struct ScanError {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl ScanError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            line: index + 1,
            message: message.into(),
        }
    }
}

// -- Public API ---------------------------------------------------------------

/// Scan contract source text. `relative` is the path below the contracts root;
/// its file stem becomes the contract name.
pub fn parse_source(relative: &Path, text: &str) -> Result<ContractDoc, ScanError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();
    let mut scanner = Scanner {
        lines: &lines,
        doc: ContractDoc {
            name: relative
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            relative: relative.to_path_buf(),
            ..Default::default()
        },
        seen_statement: false,
    };
    scanner.run()?;
    let doc = scanner.doc;

    check_types(&doc);
    debug!(
        contract = %doc.name,
        functions = doc.functions.len(),
        structs = doc.structs.len(),
        events = doc.events.len(),
        "parsed contract"
    );
    Ok(doc)
}

// -- Scanner ------------------------------------------------------------------

struct Scanner<'a> {
    lines: &'a [&'a str],
    doc: ContractDoc,
    /// Only the first statement can be the module docstring.
    seen_statement: bool,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) -> Result<(), ScanError> {
        let mut i = 0;
        while i < self.lines.len() {
            i = self.statement(i)?;
        }
        Ok(())
    }

    /// Handle the statement starting at line `i`, return the next line to look at.
    fn statement(&mut self, i: usize) -> Result<usize, ScanError> {
        let raw = self.lines[i];
        let code = strip_comment(raw);
        let trimmed = code.trim();

        if trimmed.is_empty() {
            return Ok(i + 1);
        }

        // Indented lines belong to a body we are not interested in. Multi-line
        // strings still have to be skipped as a unit, since their content may
        // start at column 0.
        if indent_of(raw) > 0 {
            return skip_string_block(self.lines, i);
        }

        if starts_docstring(trimmed) {
            let (inner, next) = read_docstring(self.lines, i)?;
            if !self.seen_statement {
                self.module_docstring(&inner);
            }
            self.seen_statement = true;
            return Ok(next);
        }
        self.seen_statement = true;

        if trimmed.starts_with('@') {
            return self.decorated_function(i);
        }
        if RE_DEF.is_match(trimmed) {
            return self.function(i, &[]);
        }
        if let Some(caps) = RE_BLOCK_HEADER.captures(trimmed) {
            let kind = caps[1].to_string();
            let name = caps[2].to_string();
            let (body, next) = if caps.get(3).is_some() {
                (Vec::new(), i + 1)
            } else {
                read_body(self.lines, i + 1)
            };
            self.block(&kind, name, &body);
            return Ok(next);
        }
        if let Some(caps) = RE_CONSTANT.captures(trimmed) {
            let (value, next) = read_balanced(self.lines, i, caps[3].trim());
            self.doc.constants.push(ConstantDoc {
                name: caps[1].to_string(),
                ty: parse_type(&caps[2]),
                value,
            });
            return Ok(next);
        }
        if let Some(caps) = RE_DECLARATION.captures(trimmed) {
            let name = &caps[1];
            if !DECLARATION_KEYWORDS.contains(&name) && !caps[2].contains('=') {
                self.doc.variables.push(variable(name, &caps[2]));
            }
            return Ok(i + 1);
        }

        // import, from ... import, and anything else we don't document
        Ok(i + 1)
    }

    fn module_docstring(&mut self, inner: &str) {
        let parsed = natspec::parse(inner);
        self.doc.module = ModuleDoc {
            title: parsed.title,
            author: parsed.author,
            license: parsed.license,
            description: parsed.description,
            dev: parsed.dev,
        };
    }

    fn decorated_function(&mut self, start: usize) -> Result<usize, ScanError> {
        let mut decorators = Vec::new();
        let mut i = start;
        while i < self.lines.len() {
            let line = strip_comment(self.lines[i]);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                i += 1;
                continue;
            }
            match RE_DECORATOR.captures(trimmed) {
                Some(caps) => {
                    decorators.push(caps[1].to_string());
                    i += 1;
                }
                None => break,
            }
        }

        if i < self.lines.len() && RE_DEF.is_match(strip_comment(self.lines[i]).trim()) {
            return self.function(i, &decorators);
        }
        debug!(line = start + 1, ?decorators, "decorators not followed by def; ignoring");
        Ok(i)
    }

    fn function(&mut self, start: usize, decorators: &[String]) -> Result<usize, ScanError> {
        let (signature, sig_end) = read_signature(self.lines, start)?;
        let mut func = parse_signature(&signature, decorators);

        let mut next = sig_end + 1;
        // A one-line function (`def f(): pass`) has no docstring.
        let body_on_same_line = !signature_remainder(&signature).is_empty();
        let docstring = match first_code_line(self.lines, next) {
            Some(j) if !body_on_same_line && indent_of(self.lines[j]) > 0 => {
                if starts_docstring(self.lines[j].trim()) {
                    let (inner, after) = read_docstring(self.lines, j)?;
                    next = after;
                    Some(natspec::parse(&inner))
                } else {
                    None
                }
            }
            _ => None,
        };

        if let Some(doc) = docstring {
            attach_docstring(&self.doc.name, &mut func, doc);
        }
        self.doc.functions.push(func);
        Ok(next)
    }

    fn block(&mut self, kind: &str, name: String, body: &[&str]) {
        match kind {
            "struct" => {
                let fields = body
                    .iter()
                    .filter_map(|line| split_declaration(line))
                    .map(|(name, ty)| Field {
                        name: name.to_string(),
                        ty: parse_type(ty),
                    })
                    .collect();
                self.doc.structs.push(StructDoc { name, fields });
            }
            "event" => {
                let fields = body
                    .iter()
                    .filter_map(|line| split_declaration(line))
                    .map(|(name, ty)| match RE_INDEXED.captures(ty.trim()) {
                        Some(caps) => EventField {
                            name: name.to_string(),
                            ty: parse_type(&caps[1]),
                            indexed: true,
                        },
                        None => EventField {
                            name: name.to_string(),
                            ty: parse_type(ty),
                            indexed: false,
                        },
                    })
                    .collect();
                self.doc.events.push(EventDoc { name, fields });
            }
            "enum" | "flag" => {
                let members = body
                    .iter()
                    .map(|line| line.trim())
                    .filter(|line| RE_MEMBER.is_match(line) && *line != "pass")
                    .map(str::to_string)
                    .collect();
                self.doc.enums.push(EnumDoc {
                    name,
                    is_flag: kind == "flag",
                    members,
                });
            }
            "interface" => self.doc.interfaces.push(name),
            _ => {}
        }
    }
}

// -- Functions ----------------------------------------------------------------

/// Collect the `def` line and its continuation lines until the `:` that ends
/// the signature. Returns the comment-free signature text and its last line.
fn read_signature(lines: &[&str], start: usize) -> Result<(String, usize), ScanError> {
    let mut text = String::new();
    for (j, line) in lines.iter().enumerate().skip(start) {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(strip_comment(line).trim());
        if signature_end(&text).is_some() {
            return Ok((text, j));
        }
    }
    Err(ScanError::new(start, "unterminated function signature"))
}

/// Byte offset of the `:` that closes a signature, once the parameter list is
/// balanced.
fn signature_end(text: &str) -> Option<usize> {
    let open = text.find('(')?;
    let mut depth = 0i32;
    let mut close = None;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;

    let mut depth = 0i32;
    for (i, ch) in text[close + 1..].char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ':' if depth == 0 => return Some(close + 1 + i),
            _ => {}
        }
    }
    None
}

/// Text after the signature's closing `:` (a same-line body).
fn signature_remainder(signature: &str) -> &str {
    signature_end(signature).map_or("", |end| signature[end + 1..].trim())
}

fn parse_signature(signature: &str, decorators: &[String]) -> FunctionDoc {
    let end = signature_end(signature).unwrap_or(signature.len());
    let head = &signature[..end];

    let name = RE_DEF
        .captures(head)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let open = head.find('(').unwrap_or(0);
    let close = matching_paren(head, open).unwrap_or(head.len());
    let params_text = head.get(open + 1..close).unwrap_or("");
    let params = split_top_level(params_text, ',')
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .filter_map(parse_param)
        .collect::<Vec<_>>();

    let returns = head
        .get(close + 1..)
        .map(str::trim)
        .and_then(|rest| rest.strip_prefix("->"))
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(parse_type);

    let mut visibility = Visibility::Internal;
    let mut mutability = Mutability::Nonpayable;
    let mut nonreentrant = false;
    for decorator in decorators {
        match decorator.as_str() {
            "external" => visibility = Visibility::External,
            "internal" => visibility = Visibility::Internal,
            "deploy" => visibility = Visibility::Deploy,
            "view" => mutability = Mutability::View,
            "pure" => mutability = Mutability::Pure,
            "payable" => mutability = Mutability::Payable,
            "nonpayable" => mutability = Mutability::Nonpayable,
            "nonreentrant" => nonreentrant = true,
            other => debug!(function = %name, decorator = other, "unknown decorator"),
        }
    }

    let param_docs = vec![String::new(); params.len()];
    FunctionDoc {
        name,
        visibility,
        mutability,
        nonreentrant,
        params,
        returns,
        description: String::new(),
        dev: String::new(),
        param_docs,
        return_doc: String::new(),
    }
}

fn parse_param(text: &str) -> Option<Param> {
    let (name, rest) = text.split_once(':')?;
    let parts = split_top_level(rest, '=');
    let ty = parse_type(parts[0]);
    let default = if parts.len() > 1 {
        Some(parts[1..].join("=").trim().to_string())
    } else {
        None
    };
    Some(Param {
        name: name.trim().to_string(),
        ty,
        default,
    })
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, ch) in text.get(open..)?.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Fill the function's description fields, aligning @param text with the
/// declared parameters by name.
fn attach_docstring(contract: &str, func: &mut FunctionDoc, doc: Docstring) {
    func.description = doc.description;
    func.dev = doc.dev;
    func.return_doc = doc.returns;
    for (name, text) in doc.params {
        match func.params.iter().position(|p| p.name == name) {
            Some(idx) => func.param_docs[idx] = text,
            None => warn!(
                contract,
                function = %func.name,
                param = %name,
                "@param does not match any parameter; ignoring"
            ),
        }
    }
}

// -- Declarations -------------------------------------------------------------

fn variable(name: &str, decl: &str) -> VariableDoc {
    let mut public = false;
    let mut kind = VariableKind::Storage;
    let mut ty = decl.trim().to_string();
    while let Some(caps) = RE_WRAPPER.captures(&ty) {
        match &caps[1] {
            "public" => public = true,
            "immutable" => kind = VariableKind::Immutable,
            "transient" => kind = VariableKind::Transient,
            _ => {}
        }
        ty = caps[2].trim().to_string();
    }
    VariableDoc {
        name: name.to_string(),
        ty: parse_type(&ty),
        public,
        kind,
    }
}

fn split_declaration(line: &str) -> Option<(&str, &str)> {
    let (name, ty) = line.split_once(':')?;
    let name = name.trim();
    RE_MEMBER.is_match(name).then_some((name, ty.trim()))
}

/// Log types that don't resolve to a built-in or a declaration in this file.
fn check_types(doc: &ContractDoc) {
    let declared: Vec<String> = doc
        .structs
        .iter()
        .map(|s| s.name.clone())
        .chain(doc.enums.iter().map(|e| e.name.clone()))
        .chain(doc.interfaces.iter().cloned())
        .collect();
    for func in &doc.functions {
        for param in &func.params {
            types::check_known(&param.ty, &declared, &func.name);
        }
        if let Some(ref ret) = func.returns {
            types::check_known(ret, &declared, &func.name);
        }
    }
    for s in &doc.structs {
        for field in &s.fields {
            types::check_known(&field.ty, &declared, &s.name);
        }
    }
    for e in &doc.events {
        for field in &e.fields {
            types::check_known(&field.ty, &declared, &e.name);
        }
    }
}

// -- Line helpers -------------------------------------------------------------

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn starts_docstring(trimmed: &str) -> bool {
    DOCSTRING_QUOTES.iter().any(|q| trimmed.starts_with(q))
}

/// Drop a trailing `#` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, ch) in line.char_indices() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Read a triple-quoted string starting on line `start`. Returns the text
/// between the quotes and the index of the line after the closing quotes.
fn read_docstring(lines: &[&str], start: usize) -> Result<(String, usize), ScanError> {
    let trimmed = lines[start].trim_start();
    let quote = DOCSTRING_QUOTES
        .iter()
        .find(|q| trimmed.starts_with(**q))
        .copied()
        .unwrap_or("\"\"\"");
    let after_open = &trimmed[quote.len()..];

    if let Some(end) = after_open.find(quote) {
        return Ok((after_open[..end].to_string(), start + 1));
    }

    let mut inner = after_open.to_string();
    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        inner.push('\n');
        if let Some(end) = line.find(quote) {
            inner.push_str(&line[..end]);
            return Ok((inner, j + 1));
        }
        inner.push_str(line);
    }
    Err(ScanError::new(start, "unterminated docstring"))
}

/// Step over line `start`, and over the rest of a triple-quoted string that it
/// leaves open.
fn skip_string_block(lines: &[&str], start: usize) -> Result<usize, ScanError> {
    let line = lines[start];
    let Some(quote) = DOCSTRING_QUOTES
        .iter()
        .copied()
        .find(|q| line.matches(q).count() % 2 == 1)
    else {
        return Ok(start + 1);
    };
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, l)| l.contains(quote))
        .map(|(j, _)| j + 1)
        .ok_or_else(|| ScanError::new(start, "unterminated string"))
}

/// Indented (or blank) lines following a block header.
fn read_body<'a>(lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
    let mut body = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let line = lines[i];
        let code = strip_comment(line);
        if code.trim().is_empty() {
            i += 1;
            continue;
        }
        if indent_of(line) == 0 {
            break;
        }
        body.push(code.trim());
        i += 1;
    }
    (body, i)
}

/// Join continuation lines of a value whose brackets span several lines.
fn read_balanced(lines: &[&str], start: usize, first: &str) -> (String, usize) {
    let mut value = first.to_string();
    let mut i = start + 1;
    while bracket_depth(&value) > 0 && i < lines.len() {
        let part = strip_comment(lines[i]).trim();
        if !part.is_empty() {
            if !value.ends_with(['[', '(', '{']) && !part.starts_with([']', ')', '}']) {
                value.push(' ');
            }
            value.push_str(part);
        }
        i += 1;
    }
    (value, i)
}

fn bracket_depth(text: &str) -> i32 {
    text.chars().fold(0, |depth, ch| match ch {
        '(' | '[' | '{' => depth + 1,
        ')' | ']' | '}' => depth - 1,
        _ => depth,
    })
}

fn first_code_line(lines: &[&str], start: usize) -> Option<usize> {
    (start..lines.len()).find(|&j| !strip_comment(lines[j]).trim().is_empty())
}
