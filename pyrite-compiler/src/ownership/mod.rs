//! Ownership tracker (spec §4.3): per-function dataflow over variable
//! states. Implemented as a single recursive-descent walk over the
//! function's statement tree with explicit join handling at `if`/`match`
//! arms and loop back-edges — the source language has no unstructured
//! jumps besides `break`/`continue`/`return`, so no separate CFG is built.

pub mod errors;
pub use errors::OwnershipError;

use pyrite_ast::{Block, Expr, ExprKind, Function, Stmt, StmtKind, Type};
use pyrite_diagnostics::Span;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipState {
    Owned,
    Moved,
    BorrowedShared,
    BorrowedExclusive,
    Uninitialized,
}

#[derive(Debug, Clone)]
struct VarInfo {
    state: OwnershipState,
    ty: Type,
    mutable: bool,
    moved_into: Option<String>,
    last_span: Span,
}

/// Join operator for control-flow merges (spec §9): `(Owned, Owned) ->
/// Owned`; `(Moved, _) -> Moved`; `(Borrowed-shared, Borrowed-shared) ->
/// Borrowed-shared`; anything else widens to the most conservative state
/// (`Moved`), and a later use is reported against the branch that moved it.
fn join(a: OwnershipState, b: OwnershipState) -> OwnershipState {
    use OwnershipState::*;
    match (a, b) {
        (Owned, Owned) => Owned,
        (Moved, _) | (_, Moved) => Moved,
        (BorrowedShared, BorrowedShared) => BorrowedShared,
        (BorrowedExclusive, BorrowedExclusive) => BorrowedExclusive,
        (Uninitialized, Uninitialized) => Uninitialized,
        _ => Moved,
    }
}

pub struct OwnershipTracker {
    vars: HashMap<String, VarInfo>,
    errors: Vec<OwnershipError>,
}

impl OwnershipTracker {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[OwnershipError] {
        &self.errors
    }

    pub fn check_function(&mut self, f: &Function) {
        self.vars.clear();
        if let Some(receiver) = &f.receiver {
            self.vars.insert(
                "self".to_string(),
                VarInfo {
                    state: OwnershipState::Owned,
                    ty: receiver.ty.clone(),
                    mutable: receiver.mutable,
                    moved_into: None,
                    last_span: f.span.clone(),
                },
            );
        }
        for param in &f.params {
            self.vars.insert(
                param.name.clone(),
                VarInfo {
                    state: OwnershipState::Owned,
                    ty: param.ty.clone(),
                    mutable: false,
                    moved_into: None,
                    last_span: f.span.clone(),
                },
            );
        }
        self.check_block(&f.body);
    }

    fn check_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { mutable, name, ty, value } => {
                self.use_expr(value, &stmt.span);
                if let ExprKind::Ident(source) = &value.kind {
                    self.record_move_target(source, name);
                }
                self.vars.insert(
                    name.clone(),
                    VarInfo {
                        state: OwnershipState::Owned,
                        ty: ty.clone().unwrap_or(Type::Void),
                        mutable: *mutable,
                        moved_into: None,
                        last_span: stmt.span.clone(),
                    },
                );
            }
            StmtKind::Assign { target, value } => {
                self.use_expr(value, &stmt.span);
                if let ExprKind::Ident(name) = &target.kind {
                    let declared_mutable = self.vars.get(name).map(|v| v.mutable);
                    match declared_mutable {
                        Some(false) => self.errors.push(OwnershipError::AssignToImmutable {
                            name: name.clone(),
                            span: stmt.span.clone(),
                        }),
                        Some(true) => {
                            if let Some(info) = self.vars.get_mut(name) {
                                info.state = OwnershipState::Owned;
                                info.last_span = stmt.span.clone();
                            }
                        }
                        None => {}
                    }
                }
            }
            StmtKind::CompoundAssign { value, .. } => self.use_expr(value, &stmt.span),
            StmtKind::Return(Some(e)) => self.use_expr(e, &stmt.span),
            StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Defer(inner) => self.check_stmt(inner),
            StmtKind::If {
                condition,
                then_block,
                elif_branches,
                else_block,
            } => {
                self.use_expr(condition, &stmt.span);
                let before = self.vars.clone();

                self.check_block(then_block);
                let mut merged = self.vars.clone();

                for (cond, block) in elif_branches {
                    self.vars = before.clone();
                    self.use_expr(cond, &stmt.span);
                    self.check_block(block);
                    merged = self.merge(&merged, &self.vars.clone());
                }

                self.vars = before.clone();
                if let Some(block) = else_block {
                    self.check_block(block);
                }
                merged = self.merge(&merged, &self.vars.clone());
                self.vars = merged;
            }
            StmtKind::While { condition, body } => {
                self.use_expr(condition, &stmt.span);
                let before = self.vars.clone();
                self.check_block(body);
                self.vars = self.merge(&before, &self.vars.clone());
            }
            StmtKind::ForRange { var, start, end, body, .. } => {
                self.use_expr(start, &stmt.span);
                self.use_expr(end, &stmt.span);
                self.vars.insert(
                    var.clone(),
                    VarInfo {
                        state: OwnershipState::Owned,
                        ty: Type::i32(),
                        mutable: true,
                        moved_into: None,
                        last_span: stmt.span.clone(),
                    },
                );
                self.check_block(body);
            }
            StmtKind::With { resource, body, name } => {
                self.use_expr(resource, &stmt.span);
                self.vars.insert(
                    name.clone(),
                    VarInfo {
                        state: OwnershipState::Owned,
                        ty: Type::Void,
                        mutable: false,
                        moved_into: None,
                        last_span: stmt.span.clone(),
                    },
                );
                self.check_block(body);
            }
            StmtKind::Unsafe(block) => self.check_block(block),
            StmtKind::Expression(e) => self.use_expr(e, &stmt.span),
        }
    }

    fn merge(&self, a: &HashMap<String, VarInfo>, b: &HashMap<String, VarInfo>) -> HashMap<String, VarInfo> {
        let mut out = a.clone();
        for (name, b_info) in b {
            match out.get(name) {
                Some(a_info) => {
                    let state = join(a_info.state, b_info.state);
                    let newer = if b_info.state == OwnershipState::Moved {
                        b_info
                    } else {
                        a_info
                    };
                    out.insert(
                        name.clone(),
                        VarInfo {
                            state,
                            ty: newer.ty.clone(),
                            mutable: newer.mutable,
                            moved_into: newer.moved_into.clone(),
                            last_span: newer.last_span.clone(),
                        },
                    );
                }
                None => {
                    out.insert(name.clone(), b_info.clone());
                }
            }
        }
        out
    }

    /// Records a use of `expr` at `span`: a bare `Ident` of a non-Copy type
    /// moves the source variable; a reference borrows it instead.
    fn use_expr(&mut self, expr: &Expr, span: &Span) {
        match &expr.kind {
            ExprKind::Ident(name) => self.move_or_copy(name, span),
            ExprKind::Reference { mutable, expr: inner } => {
                if let ExprKind::Ident(name) = &inner.kind {
                    self.borrow(name, *mutable, span);
                } else {
                    self.use_expr(inner, span);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.use_expr(left, span);
                self.use_expr(right, span);
            }
            ExprKind::Unary { expr: inner, .. }
            | ExprKind::Deref(inner)
            | ExprKind::Cast { expr: inner, .. }
            | ExprKind::Try(inner) => self.use_expr(inner, span),
            ExprKind::Call { args, func, .. } => {
                self.use_expr(func, span);
                for arg in args {
                    self.use_expr(arg, span);
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.use_expr(receiver, span);
                for arg in args {
                    self.use_expr(arg, span);
                }
            }
            ExprKind::FieldAccess { object, .. } => self.use_expr(object, span),
            ExprKind::Index { object, index } => {
                self.use_expr(object, span);
                self.use_expr(index, span);
            }
            ExprKind::ArrayLiteral(items) | ExprKind::TupleLiteral(items) => {
                for item in items {
                    self.use_expr(item, span);
                }
            }
            ExprKind::StructLiteral { fields, .. } => {
                for (_, value) in fields {
                    self.use_expr(value, span);
                }
            }
            ExprKind::EnumLiteral { data, .. } => {
                for d in data {
                    self.use_expr(d, span);
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                self.use_expr(scrutinee, span);
                let before = self.vars.clone();
                let mut merged: Option<HashMap<String, VarInfo>> = None;
                for arm in arms {
                    self.vars = before.clone();
                    self.use_expr(&arm.body, span);
                    merged = Some(match merged {
                        Some(acc) => self.merge(&acc, &self.vars.clone()),
                        None => self.vars.clone(),
                    });
                }
                if let Some(m) = merged {
                    self.vars = m;
                }
            }
            ExprKind::Block { statements, tail } => {
                for stmt in statements {
                    self.check_stmt(stmt);
                }
                if let Some(tail) = tail {
                    self.use_expr(tail, span);
                }
            }
            _ => {}
        }
    }

    fn move_or_copy(&mut self, name: &str, span: &Span) {
        let Some(info) = self.vars.get(name).cloned() else {
            return;
        };
        match info.state {
            OwnershipState::Moved => {
                self.errors.push(OwnershipError::UseAfterMove {
                    name: name.to_string(),
                    moved_into: info.moved_into.clone(),
                    use_span: span.clone(),
                    move_span: info.last_span.clone(),
                });
            }
            OwnershipState::BorrowedExclusive => {
                self.errors.push(OwnershipError::MoveOutOfBorrowed {
                    name: name.to_string(),
                    span: span.clone(),
                });
            }
            _ => {
                if !info.ty.is_copy() {
                    if let Some(var) = self.vars.get_mut(name) {
                        var.state = OwnershipState::Moved;
                        var.last_span = span.clone();
                    }
                }
            }
        }
    }

    fn borrow(&mut self, name: &str, mutable: bool, span: &Span) {
        if let Some(info) = self.vars.get_mut(name) {
            info.state = if mutable {
                OwnershipState::BorrowedExclusive
            } else {
                OwnershipState::BorrowedShared
            };
            info.last_span = span.clone();
        }
    }

    /// Marks that `target` received the moved value previously owned by
    /// `source` — used to annotate `UseAfterMove` with "value moved into
    /// `b` here" the way the concrete scenario in spec §8 expects.
    pub fn record_move_target(&mut self, source: &str, target: &str) {
        if let Some(info) = self.vars.get_mut(source) {
            info.moved_into = Some(target.to_string());
        }
    }
}

impl Default for OwnershipTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_ast::NodeId;
    use pyrite_diagnostics::Span;

    fn ident(name: &str) -> Expr {
        Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident(name.to_string()))
    }

    #[test]
    fn use_after_move_is_detected() {
        let mut tracker = OwnershipTracker::new();
        tracker.vars.insert(
            "a".to_string(),
            VarInfo {
                state: OwnershipState::Owned,
                ty: Type::String,
                mutable: false,
                moved_into: None,
                last_span: Span::unknown(),
            },
        );
        tracker.move_or_copy("a", &Span::unknown());
        tracker.record_move_target("a", "b");
        tracker.move_or_copy("a", &Span::unknown());
        assert!(matches!(
            tracker.errors().first(),
            Some(OwnershipError::UseAfterMove { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn copy_types_are_never_moved() {
        let mut tracker = OwnershipTracker::new();
        tracker.vars.insert(
            "n".to_string(),
            VarInfo {
                state: OwnershipState::Owned,
                ty: Type::i32(),
                mutable: false,
                moved_into: None,
                last_span: Span::unknown(),
            },
        );
        tracker.use_expr(&ident("n"), &Span::unknown());
        tracker.use_expr(&ident("n"), &Span::unknown());
        assert!(tracker.errors().is_empty());
    }

    #[test]
    fn exclusive_borrow_blocks_moving_the_source() {
        let mut tracker = OwnershipTracker::new();
        tracker.vars.insert(
            "xs".to_string(),
            VarInfo {
                state: OwnershipState::Owned,
                ty: Type::String,
                mutable: true,
                moved_into: None,
                last_span: Span::unknown(),
            },
        );
        tracker.borrow("xs", true, &Span::unknown());
        tracker.move_or_copy("xs", &Span::unknown());
        assert!(matches!(
            tracker.errors().first(),
            Some(OwnershipError::MoveOutOfBorrowed { name, .. }) if name == "xs"
        ));
    }
}
