//! Data model for parsed contracts, independent of the output format.

use std::fmt;
use std::path::PathBuf;

/// A contract source file found by the locator.
#[derive(Debug, Clone)]
pub struct ContractFile {
    pub path: PathBuf,
    /// Path relative to the contracts root, e.g. `tokens/ERC20.vy`
    pub relative: PathBuf,
}

/// Everything extracted from a single contract.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContractDoc {
    /// File stem, e.g. `ERC20`
    pub name: String,
    pub relative: PathBuf,
    pub module: ModuleDoc,
    pub structs: Vec<StructDoc>,
    pub events: Vec<EventDoc>,
    pub enums: Vec<EnumDoc>,
    pub constants: Vec<ConstantDoc>,
    pub variables: Vec<VariableDoc>,
    pub interfaces: Vec<String>,
    pub functions: Vec<FunctionDoc>,
}

impl ContractDoc {
    /// Functions callable from outside the contract, in source order.
    pub fn external_functions(&self) -> impl Iterator<Item = &FunctionDoc> {
        self.functions.iter().filter(|f| f.visibility.is_external())
    }

    pub fn internal_functions(&self) -> impl Iterator<Item = &FunctionDoc> {
        self.functions.iter().filter(|f| !f.visibility.is_external())
    }
}

/// Module-level docstring.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleDoc {
    /// @title
    pub title: Option<String>,
    /// @author
    pub author: Option<String>,
    /// @license
    pub license: Option<String>,
    /// Untagged text and @notice
    pub description: String,
    /// @dev
    pub dev: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    External,
    Internal,
    /// Vyper 0.4 constructor marker
    Deploy,
}

impl Visibility {
    pub fn is_external(self) -> bool {
        matches!(self, Visibility::External | Visibility::Deploy)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    #[default]
    Nonpayable,
    View,
    Pure,
    Payable,
}

impl Mutability {
    pub fn as_str(self) -> &'static str {
        match self {
            Mutability::Nonpayable => "nonpayable",
            Mutability::View => "view",
            Mutability::Pure => "pure",
            Mutability::Payable => "payable",
        }
    }
}

/// A `def` with its decorators, signature and docstring.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDoc {
    pub name: String,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub nonreentrant: bool,
    pub params: Vec<Param>,
    pub returns: Option<VyperType>,
    /// Untagged text and @notice
    pub description: String,
    /// @dev
    pub dev: String,
    /// @param text, one entry per element of `params` (empty when untagged)
    pub param_docs: Vec<String>,
    /// @return
    pub return_doc: String,
}

impl FunctionDoc {
    /// `name(a: T, b: U) -> R` as it appears in the directive line.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(Param::to_string).collect();
        let mut sig = format!("{}({})", self.name, params.join(", "));
        if let Some(ref ret) = self.returns {
            sig.push_str(&format!(" -> {}", ret));
        }
        sig
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: VyperType,
    pub default: Option<String>,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)?;
        if let Some(ref default) = self.default {
            write!(f, " = {}", default)?;
        }
        Ok(())
    }
}

/// A type expression as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VyperType {
    /// Base types, sized byte/string types, HashMaps and user-defined names
    Named(String),
    DynArray {
        elem: Box<VyperType>,
        max_len: ArrayLen,
    },
    Tuple(Vec<VyperType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayLen {
    Literal(u64),
    /// Bound given by a constant, e.g. `DynArray[address, MAX_OWNERS]`
    Constant(String),
}

impl fmt::Display for VyperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VyperType::Named(name) => f.write_str(name),
            VyperType::DynArray { elem, max_len } => match max_len {
                ArrayLen::Literal(n) => write!(f, "DynArray[{}, {}]", elem, n),
                ArrayLen::Constant(c) => write!(f, "DynArray[{}, {}]", elem, c),
            },
            VyperType::Tuple(types) => {
                let inner: Vec<String> = types.iter().map(VyperType::to_string).collect();
                write!(f, "({})", inner.join(", "))
            }
        }
    }
}

/// `struct Name:` with typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDoc {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: VyperType,
}

/// `event Name:` with optionally indexed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDoc {
    pub name: String,
    pub fields: Vec<EventField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventField {
    pub name: String,
    pub ty: VyperType,
    pub indexed: bool,
}

/// `enum Name:` (Vyper 0.3) or `flag Name:` (Vyper 0.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDoc {
    pub name: String,
    pub is_flag: bool,
    pub members: Vec<String>,
}

/// `NAME: constant(type) = value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantDoc {
    pub name: String,
    pub ty: VyperType,
    pub value: String,
}

/// Storage declaration such as `owner: public(address)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDoc {
    pub name: String,
    pub ty: VyperType,
    pub public: bool,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Storage,
    Immutable,
    Transient,
}
