use crate::expr::Expr;
use crate::types::Type;
use crate::NodeId;
use pyrite_diagnostics::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(id: NodeId, span: Span, kind: StmtKind) -> Self {
        Self { id, span, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `let x: T = e;` (`mutable` distinguishes `let` from `var`).
    Let {
        mutable: bool,
        name: String,
        ty: Option<Type>,
        value: Expr,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    CompoundAssign {
        target: Expr,
        op: CompoundOp,
        value: Expr,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    /// Runs at scope exit, LIFO, per spec §4.7 defer sequencing.
    Defer(Box<Stmt>),

    If {
        condition: Expr,
        then_block: Block,
        elif_branches: Vec<(Expr, Block)>,
        else_block: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    /// `for var in a..b`; other iterables are not supported by the core
    /// generator (spec §4.7).
    ForRange {
        var: String,
        start: Expr,
        end: Expr,
        inclusive: bool,
        body: Block,
    },
    /// Desugared output of the scoped-resource pass
    /// (`with r = try e: body` → `Let` + `Defer` + the inlined body); kept
    /// as a distinct statement only pre-desugaring so the pass has
    /// something concrete to rewrite.
    With {
        name: String,
        resource: Expr,
        body: Block,
    },
    Unsafe(Block),
    Expression(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}
