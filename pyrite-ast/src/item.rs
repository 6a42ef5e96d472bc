use crate::expr::Expr;
use crate::stmt::Block;
use crate::types::Type;
use pyrite_diagnostics::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub imports: Vec<Import>,
    pub items: Vec<Item>,
}

/// Dotted or double-colon module path: `import std.io;` / `import std::io;`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Function(Function),
    Struct(Struct),
    Enum(Enum),
    Trait(Trait),
    TraitImpl(TraitImpl),
    TypeAlias(TypeAlias),
    Const(Const),
    ExternBlock(ExternBlock),
}

/// Parsed-through annotation (`#[repr(C)]`, `#[inline]`); inspected only by
/// codegen/the linter, never given semantics beyond what's named here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<String>,
}

/// A generic parameter whose argument must be an int or bool literal known
/// at compile time; distinct from an ordinary [`TypeParam`] because it
/// drives monomorphization rather than type unification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompileTimeParam {
    Int(String),
    Bool(String),
}

impl CompileTimeParam {
    pub fn name(&self) -> &str {
        match self {
            CompileTimeParam::Int(name) | CompileTimeParam::Bool(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TraitBound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TraitBound {
    Simple(String),
    Callable {
        trait_name: String,
        param_types: Vec<Type>,
        return_type: Box<Type>,
    },
}

impl Eq for TraitBound {}

impl std::hash::Hash for TraitBound {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            TraitBound::Simple(name) => {
                0u8.hash(state);
                name.hash(state);
            }
            TraitBound::Callable { trait_name, .. } => {
                1u8.hash(state);
                trait_name.hash(state);
            }
        }
    }
}

/// `where T: Display` alongside the inline `T: Display` form on `TypeParam`
/// — the source language allows either spelling on a generic item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClausePredicate {
    pub type_param: String,
    pub bounds: Vec<TraitBound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub compile_time_params: Vec<CompileTimeParam>,
    pub where_clause: Vec<WhereClausePredicate>,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub mutable: bool,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub compile_time_params: Vec<CompileTimeParam>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<Function>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub variants: Vec<EnumVariantDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariantDecl {
    pub name: String,
    /// Empty for unit variants.
    pub data: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub super_traits: Vec<String>,
    pub associated_types: Vec<String>,
    pub methods: Vec<TraitMethod>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitMethod {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    /// `Some` = default body provided; `None` = required, implementors must
    /// supply it.
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitImpl {
    pub trait_name: String,
    pub type_params: Vec<TypeParam>,
    pub for_type: Type,
    pub associated_type_bindings: Vec<(String, Type)>,
    pub methods: Vec<Function>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Const {
    pub name: String,
    pub ty: Option<Type>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternBlock {
    pub abi: String,
    pub types: Vec<ExternType>,
    pub functions: Vec<ExternFunction>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub is_variadic: bool,
}
