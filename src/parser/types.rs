//! Type expression parsing: `uint256`, `DynArray[T, N]`, `(T, U)`, `HashMap[K, V]`.

use crate::model::{ArrayLen, VyperType};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static RE_SIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Bytes|String)\[\s*(\w+)\s*\]$").unwrap());

static RE_BYTES_M: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bytes([1-9]|[12][0-9]|3[0-2])$").unwrap());

static RE_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^u?int([0-9]+)$").unwrap());

/// Parse a type expression. Never fails: anything unrecognized becomes
/// `VyperType::Named` with whitespace normalized.
pub fn parse_type(input: &str) -> VyperType {
    let text = input.trim();

    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        let parts = split_top_level(inner, ',');
        return VyperType::Tuple(
            parts
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| parse_type(p))
                .collect(),
        );
    }

    if let Some(inner) = text
        .strip_prefix("DynArray")
        .map(str::trim_start)
        .and_then(|t| t.strip_prefix('['))
        .and_then(|t| t.strip_suffix(']'))
    {
        let parts = split_top_level(inner, ',');
        if let [elem, bound] = parts.as_slice() {
            let bound = bound.trim();
            let max_len = match bound.parse::<u64>() {
                Ok(n) => ArrayLen::Literal(n),
                Err(_) => ArrayLen::Constant(bound.to_string()),
            };
            return VyperType::DynArray {
                elem: Box::new(parse_type(elem)),
                max_len,
            };
        }
    }

    VyperType::Named(normalize(text))
}

/// Whether `name` is one of Vyper's built-in base types.
pub fn is_builtin(name: &str) -> bool {
    match name {
        "address" | "bool" | "decimal" | "bytes32" => true,
        _ if RE_SIZED.is_match(name) || RE_BYTES_M.is_match(name) => true,
        _ if name.starts_with("HashMap[") => true,
        _ => RE_INT
            .captures(name)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .is_some_and(|bits| bits % 8 == 0 && (8..=256).contains(&bits)),
    }
}

/// Log base types that are neither built in nor declared in the contract.
pub fn check_known(ty: &VyperType, declared: &[String], context: &str) {
    match ty {
        VyperType::Named(name) => {
            if !is_builtin(name) && !declared.iter().any(|d| d == name) {
                debug!(ty = %name, context, "type is not a built-in or locally declared Vyper type");
            }
        }
        VyperType::DynArray { elem, .. } => check_known(elem, declared, context),
        VyperType::Tuple(types) => {
            for t in types {
                check_known(t, declared, context);
            }
        }
    }
}

/// Split on `sep` where it is not nested inside `()` or `[]`.
pub fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Collapse whitespace so `HashMap[address,  uint256]` reads `HashMap[address, uint256]`.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() && !matches!(ch, ']' | ')' | ',' | '[') {
            let last = out.chars().last();
            if !matches!(last, Some('[') | Some('(')) {
                out.push(' ');
            }
        }
        pending_space = false;
        out.push(ch);
        if ch == ',' {
            pending_space = true;
        }
    }
    out
}
