//! Expressions and patterns.
//!
//! Every expression carries a stable [`NodeId`] alongside its [`Span`]. The
//! type checker never mutates these nodes; instead it keys an external
//! `TypeTable` by `NodeId`, so the AST stays immutable until monomorphization
//! actually needs to rewrite it.

use crate::{NodeId, Param};
use crate::types::Type;
use pyrite_diagnostics::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Self { id, span, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    BoolLiteral(bool),
    CharLiteral(char),

    Ident(String),

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },

    /// `foo(a, b)` or, with compile-time arguments, `foo[3](a, b)`.
    Call {
        func: Box<Expr>,
        compile_time_args: Vec<ConstArg>,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    ArrayLiteral(Vec<Expr>),
    TupleLiteral(Vec<Expr>),
    StructLiteral {
        name: String,
        type_args: Vec<Type>,
        fields: Vec<(String, Expr)>,
    },
    /// `EnumName.Variant(args)`.
    EnumLiteral {
        enum_name: String,
        variant: String,
        data: Vec<Expr>,
    },

    Reference {
        mutable: bool,
        expr: Box<Expr>,
    },
    Deref(Box<Expr>),

    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Block {
        statements: Vec<crate::stmt::Stmt>,
        tail: Option<Box<Expr>>,
    },

    Cast {
        expr: Box<Expr>,
        target_type: Type,
    },
    /// `try e`: e must be `Result<T, E>`; value type is `T`.
    Try(Box<Expr>),

    /// Parameter closure (`fn[…] …`) — a compile-time-only callable that
    /// must be inlined at its call site before codegen.
    ParamClosure {
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Box<Expr>,
    },
    /// Runtime closure (`fn(…) …`) — a first-class value with a heap
    /// environment. `captures` is filled in by the type checker.
    RuntimeClosure {
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Box<Expr>,
        captures: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstArg {
    Int(i64),
    Bool(bool),
    /// Not a literal yet — resolved to `Int`/`Bool` before monomorphization,
    /// or reported as `NonLiteralCompileTimeArgument` if it never is.
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Wildcard,
    Literal(Expr),
    Ident(String),
    Tuple(Vec<Pattern>),
    Struct {
        name: String,
        fields: Vec<(String, Pattern)>,
    },
    Enum {
        name: String,
        variant: String,
        data: Vec<Pattern>,
    },
    Or(Vec<Pattern>),
}

impl Pattern {
    /// Names bound by this pattern, for scope population.
    pub fn bound_names(&self) -> Vec<&str> {
        match self {
            Pattern::Ident(name) => vec![name.as_str()],
            Pattern::Tuple(items) | Pattern::Or(items) => {
                items.iter().flat_map(Pattern::bound_names).collect()
            }
            Pattern::Struct { fields, .. } => {
                fields.iter().flat_map(|(_, p)| p.bound_names()).collect()
            }
            Pattern::Enum { data, .. } => data.iter().flat_map(Pattern::bound_names).collect(),
            Pattern::Wildcard | Pattern::Literal(_) => vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}
