//! The AST data model consumed by the compiler core.
//!
//! The lexer and parser that would produce these nodes are out of scope;
//! this crate only specifies the tree shape they emit. Every node carries a
//! [`Span`] for diagnostics and a stable [`NodeId`] that the type checker
//! uses as an external lookup key (`TypeTable: HashMap<NodeId, Type>`)
//! instead of mutating the tree in place.

pub mod arena;
pub mod expr;
pub mod item;
pub mod stmt;
pub mod types;

pub use expr::{BinaryOp, ConstArg, Expr, ExprKind, MatchArm, Pattern, UnaryOp};
pub use item::{
    Attribute, CompileTimeParam, Const, Enum, EnumVariantDecl, ExternBlock, ExternFunction,
    ExternType, FieldDecl, Function, Import, Item, Param, Program, Receiver, Struct, Trait,
    TraitBound, TraitImpl, TraitMethod, TypeAlias, TypeParam, WhereClausePredicate,
};
pub use pyrite_diagnostics::Span;
pub use stmt::{Block, CompoundOp, Stmt, StmtKind};
pub use types::{FloatWidth, IntWidth, Type};

/// Stable identity for an AST node, assigned once at construction time and
/// never reused. Doubles as the key for the type checker's `TypeTable` and
/// the ownership tracker's per-expression bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub u32);

/// Monotonic `NodeId` source. One instance per parse; the parser (out of
/// scope here) is expected to thread a single generator through the whole
/// tree it builds so ids are unique within a `Program`.
#[derive(Debug, Default)]
pub struct NodeIdGenerator {
    next: u32,
}

impl NodeIdGenerator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique_and_monotonic() {
        let mut gen = NodeIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn program_round_trips_through_json() {
        let program = Program {
            imports: vec![Import {
                path: vec!["std".to_string(), "io".to_string()],
                alias: None,
                span: Span::unknown(),
            }],
            items: vec![],
        };
        let json = serde_json::to_string(&program).expect("serialize");
        let restored: Program = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(program, restored);
    }
}
