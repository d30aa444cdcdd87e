//! One RST page per contract.
//!
//! Functions become `py:function` directives, structs/events/enums become
//! `py:class` directives with `py:attribute` members, and constants and
//! storage variables become `py:data`. Each page opens a `py:module` named
//! after the contract's relative path so identically named functions in
//! different contracts don't collide in the Sphinx index.

use super::{field, heading, indent};
use crate::model::*;
use std::path::Path;

/// Render the full page for one contract.
pub fn render_contract(doc: &ContractDoc, include_internal: bool) -> String {
    let mut out = String::new();

    out.push_str(&heading(&doc.name, '='));
    out.push_str(&format!(".. py:module:: {}\n\n", module_name(&doc.relative)));

    out.push_str(&render_module_doc(&doc.module));

    if !doc.structs.is_empty() {
        out.push_str(&heading("Structs", '-'));
        for s in &doc.structs {
            out.push_str(&render_struct(s));
        }
    }

    if !doc.events.is_empty() {
        out.push_str(&heading("Events", '-'));
        for e in &doc.events {
            out.push_str(&render_event(e));
        }
    }

    if !doc.enums.is_empty() {
        out.push_str(&heading("Enums", '-'));
        for e in &doc.enums {
            out.push_str(&render_enum(e));
        }
    }

    if !doc.constants.is_empty() {
        out.push_str(&heading("Constants", '-'));
        for c in &doc.constants {
            out.push_str(&render_constant(c));
        }
    }

    if !doc.variables.is_empty() {
        out.push_str(&heading("State Variables", '-'));
        for v in &doc.variables {
            out.push_str(&render_variable(v));
        }
    }

    let external: Vec<&FunctionDoc> = doc.external_functions().collect();
    if !external.is_empty() {
        out.push_str(&heading("External Functions", '-'));
        for func in external {
            out.push_str(&render_function(func));
        }
    }

    if include_internal {
        let internal: Vec<&FunctionDoc> = doc.internal_functions().collect();
        if !internal.is_empty() {
            out.push_str(&heading("Internal Functions", '-'));
            for func in internal {
                out.push_str(&render_function(func));
            }
        }
    }

    finish(out)
}

/// `tokens/ERC20.vy` → `tokens.ERC20`
pub fn module_name(relative: &Path) -> String {
    let stem = relative.with_extension("");
    stem.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn render_module_doc(module: &ModuleDoc) -> String {
    let mut out = String::new();
    if !module.description.is_empty() {
        out.push_str(&module.description);
        out.push_str("\n\n");
    }
    // Plain paragraphs rather than a field list: docutils would swallow a
    // field list placed first in the document as hidden docinfo.
    for (label, value) in [
        ("Title", &module.title),
        ("Author", &module.author),
        ("License", &module.license),
    ] {
        if let Some(value) = value {
            out.push_str(&format!("**{}:** {}\n\n", label, value));
        }
    }
    if !module.dev.is_empty() {
        out.push_str(".. note::\n\n");
        out.push_str(&indent(&module.dev, 3));
        out.push_str("\n\n");
    }
    out
}

/// Render a single function directive.
pub fn render_function(func: &FunctionDoc) -> String {
    let mut out = format!(".. py:function:: {}\n\n", func.signature());

    if !func.description.is_empty() {
        out.push_str(&indent(&func.description, 3));
        out.push_str("\n\n");
    }

    if !func.dev.is_empty() {
        out.push_str("   .. note::\n\n");
        out.push_str(&indent(&func.dev, 6));
        out.push_str("\n\n");
    }

    let mut fields = String::new();
    for (param, doc) in func.params.iter().zip(&func.param_docs) {
        fields.push_str(&field(&format!("param {}", param.name), doc, 3));
        fields.push_str(&field(&format!("type {}", param.name), &param.ty.to_string(), 3));
    }
    if let Some(ref ret) = func.returns {
        if !func.return_doc.is_empty() {
            fields.push_str(&field("returns", &func.return_doc, 3));
        }
        fields.push_str(&field("rtype", &ret.to_string(), 3));
    }
    if func.visibility == Visibility::Deploy {
        fields.push_str(&field("Constructor", "yes", 3));
    }
    if func.mutability != Mutability::Nonpayable {
        fields.push_str(&field("Mutability", func.mutability.as_str(), 3));
    }
    if func.nonreentrant {
        fields.push_str(&field("Nonreentrant", "yes", 3));
    }
    if !fields.is_empty() {
        out.push_str(&fields);
        out.push('\n');
    }

    out
}

fn render_struct(s: &StructDoc) -> String {
    let mut out = format!(".. py:class:: {}\n\n", s.name);
    for f in &s.fields {
        out.push_str(&member(&f.name, &f.ty.to_string()));
    }
    out
}

fn render_event(e: &EventDoc) -> String {
    let mut out = format!(".. py:class:: {}\n\n", e.name);
    for f in &e.fields {
        let ty = if f.indexed {
            format!("indexed({})", f.ty)
        } else {
            f.ty.to_string()
        };
        out.push_str(&member(&f.name, &ty));
    }
    out
}

fn render_enum(e: &EnumDoc) -> String {
    let mut out = format!(".. py:class:: {}\n\n", e.name);
    if e.is_flag {
        out.push_str("   Flag: members can be combined.\n\n");
    }
    for m in &e.members {
        out.push_str(&format!("   .. py:attribute:: {}\n\n", m));
    }
    out
}

fn render_constant(c: &ConstantDoc) -> String {
    format!(
        ".. py:data:: {}\n   :type: {}\n   :value: {}\n\n",
        c.name, c.ty, c.value
    )
}

fn render_variable(v: &VariableDoc) -> String {
    let mut out = format!(".. py:data:: {}\n   :type: {}\n\n", v.name, v.ty);
    let mut declared = v.ty.to_string();
    match v.kind {
        VariableKind::Storage => {}
        VariableKind::Immutable => declared = format!("immutable({})", declared),
        VariableKind::Transient => declared = format!("transient({})", declared),
    }
    if v.public {
        declared = format!("public({})", declared);
    }
    if v.public || v.kind != VariableKind::Storage {
        out.push_str(&format!("   Declared as ``{}``.\n\n", declared));
    }
    out
}

fn member(name: &str, ty: &str) -> String {
    format!("   .. py:attribute:: {}\n      :type: {}\n\n", name, ty)
}

/// Exactly one trailing newline.
fn finish(mut out: String) -> String {
    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
