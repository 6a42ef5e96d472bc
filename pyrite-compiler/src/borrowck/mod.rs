//! Borrow checker (spec §4.4): enforces aliasing rules on outstanding
//! borrow records. Structured as a `BorrowRulesChecker` (the aliasing
//! itself) plus an `ImmutabilityChecker` (write-while-borrowed), both
//! orchestrated by `BorrowChecker::check_function`.

pub mod errors;
pub use errors::BorrowError;

use pyrite_ast::{Block, Expr, ExprKind, Function, Stmt, StmtKind};
use pyrite_diagnostics::Span;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowKind {
    Shared,
    Exclusive,
}

#[derive(Debug, Clone)]
struct BorrowRecord {
    kind: BorrowKind,
    span: Span,
    scope_depth: usize,
}

pub struct BorrowChecker {
    active: HashMap<String, Vec<BorrowRecord>>,
    scope_depth: usize,
    errors: Vec<BorrowError>,
}

impl BorrowChecker {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
            scope_depth: 0,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[BorrowError] {
        &self.errors
    }

    pub fn check_function(&mut self, f: &Function) {
        self.active.clear();
        self.scope_depth = 0;
        self.check_block(&f.body);
    }

    fn enter_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Releases every borrow issued at or below the scope being exited —
    /// rule 2: a borrow's lifetime is the lexical scope of its binding.
    fn exit_scope(&mut self) {
        for records in self.active.values_mut() {
            records.retain(|r| r.scope_depth < self.scope_depth);
        }
        self.scope_depth -= 1;
    }

    fn check_block(&mut self, block: &Block) {
        self.enter_scope();
        for stmt in &block.statements {
            self.check_stmt(stmt);
        }
        self.exit_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { value, .. } => self.check_expr(value),
            StmtKind::Assign { target, value } => {
                self.check_expr(value);
                if let ExprKind::Ident(name) = &target.kind {
                    self.check_write(name, &stmt.span);
                }
            }
            StmtKind::CompoundAssign { target, value, .. } => {
                self.check_expr(value);
                if let ExprKind::Ident(name) = &target.kind {
                    self.check_write(name, &stmt.span);
                }
            }
            StmtKind::Return(Some(e)) => self.check_expr(e),
            StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Defer(inner) => self.check_stmt(inner),
            StmtKind::If {
                condition,
                then_block,
                elif_branches,
                else_block,
            } => {
                self.check_expr(condition);
                self.check_block(then_block);
                for (cond, block) in elif_branches {
                    self.check_expr(cond);
                    self.check_block(block);
                }
                if let Some(block) = else_block {
                    self.check_block(block);
                }
            }
            StmtKind::While { condition, body } => {
                self.check_expr(condition);
                self.check_block(body);
            }
            StmtKind::ForRange { start, end, body, .. } => {
                self.check_expr(start);
                self.check_expr(end);
                self.check_block(body);
            }
            StmtKind::With { resource, body, .. } => {
                self.check_expr(resource);
                self.check_block(body);
            }
            StmtKind::Unsafe(block) => self.check_block(block),
            StmtKind::Expression(e) => self.check_expr(e),
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Reference { mutable, expr: inner } => {
                if let ExprKind::Ident(name) = &inner.kind {
                    self.issue_borrow(name, *mutable, &expr.span);
                } else {
                    self.check_expr(inner);
                }
            }
            ExprKind::Ident(name) => self.check_read(name, &expr.span),
            ExprKind::Binary { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            ExprKind::Unary { expr: inner, .. }
            | ExprKind::Deref(inner)
            | ExprKind::Cast { expr: inner, .. }
            | ExprKind::Try(inner) => self.check_expr(inner),
            ExprKind::Call { func, args, .. } => {
                self.check_expr(func);
                for arg in args {
                    self.check_expr(arg);
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.check_expr(receiver);
                for arg in args {
                    self.check_expr(arg);
                }
            }
            ExprKind::FieldAccess { object, .. } => self.check_expr(object),
            ExprKind::Index { object, index } => {
                self.check_expr(object);
                self.check_expr(index);
            }
            ExprKind::ArrayLiteral(items) | ExprKind::TupleLiteral(items) => {
                for item in items {
                    self.check_expr(item);
                }
            }
            ExprKind::StructLiteral { fields, .. } => {
                for (_, v) in fields {
                    self.check_expr(v);
                }
            }
            ExprKind::EnumLiteral { data, .. } => {
                for d in data {
                    self.check_expr(d);
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                self.check_expr(scrutinee);
                for arm in arms {
                    self.check_expr(&arm.body);
                }
            }
            ExprKind::Block { statements, tail } => {
                self.enter_scope();
                for stmt in statements {
                    self.check_stmt(stmt);
                }
                if let Some(tail) = tail {
                    self.check_expr(tail);
                }
                self.exit_scope();
            }
            _ => {}
        }
    }

    /// Rule 1: shared-xor-exclusive. Rule 2: the issued borrow's scope is
    /// the current lexical depth, released on scope exit.
    fn issue_borrow(&mut self, name: &str, mutable: bool, span: &Span) {
        let records = self.active.entry(name.to_string()).or_default();
        let existing_exclusive = records.iter().find(|r| r.kind == BorrowKind::Exclusive).cloned();
        let existing_shared = records.iter().find(|r| r.kind == BorrowKind::Shared).cloned();

        if mutable {
            if let Some(shared) = existing_shared {
                self.errors.push(BorrowError::ExclusiveBorrowWhileAliased {
                    name: name.to_string(),
                    span: span.clone(),
                    shared_span: shared.span,
                });
                return;
            }
            if let Some(exclusive) = existing_exclusive {
                self.errors.push(BorrowError::ExclusiveBorrowWhileAliased {
                    name: name.to_string(),
                    span: span.clone(),
                    shared_span: exclusive.span,
                });
                return;
            }
        } else if let Some(exclusive) = existing_exclusive {
            self.errors.push(BorrowError::BorrowWhileExclusivelyBorrowed {
                name: name.to_string(),
                span: span.clone(),
                exclusive_span: exclusive.span,
            });
            return;
        }

        self.active.entry(name.to_string()).or_default().push(BorrowRecord {
            kind: if mutable { BorrowKind::Exclusive } else { BorrowKind::Shared },
            span: span.clone(),
            scope_depth: self.scope_depth,
        });
    }

    /// Rule 4: while any shared borrow is live, the source is readable.
    /// Rule 3: while an exclusive borrow is live, it is not.
    fn check_read(&mut self, name: &str, span: &Span) {
        if let Some(records) = self.active.get(name) {
            if let Some(exclusive) = records.iter().find(|r| r.kind == BorrowKind::Exclusive) {
                self.errors.push(BorrowError::BorrowWhileExclusivelyBorrowed {
                    name: name.to_string(),
                    span: span.clone(),
                    exclusive_span: exclusive.span.clone(),
                });
            }
        }
    }

    /// Rule 3/4: the source is never writable by name while any borrow
    /// (shared or exclusive) is outstanding.
    fn check_write(&mut self, name: &str, span: &Span) {
        if let Some(records) = self.active.get(name) {
            if let Some(record) = records.first() {
                self.errors.push(BorrowError::ExclusiveBorrowWhileAliased {
                    name: name.to_string(),
                    span: span.clone(),
                    shared_span: record.span.clone(),
                });
            }
        }
    }
}

impl Default for BorrowChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_ast::{Block, NodeId, Param, Stmt, StmtKind, Type};
    use pyrite_diagnostics::Span;

    fn ident(name: &str) -> Expr {
        Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident(name.to_string()))
    }

    fn borrow(name: &str, mutable: bool) -> Expr {
        Expr::new(
            NodeId(0),
            Span::unknown(),
            ExprKind::Reference {
                mutable,
                expr: Box::new(ident(name)),
            },
        )
    }

    fn let_stmt(name: &str, value: Expr) -> Stmt {
        Stmt::new(
            NodeId(0),
            Span::unknown(),
            StmtKind::Let {
                mutable: false,
                name: name.to_string(),
                ty: None,
                value,
            },
        )
    }

    #[test]
    fn exclusive_borrow_while_shared_is_aliased_is_rejected() {
        let f = Function {
            attributes: vec![],
            name: "f".to_string(),
            type_params: vec![],
            compile_time_params: vec![],
            where_clause: vec![],
            receiver: None,
            params: vec![Param {
                name: "xs".to_string(),
                ty: Type::String,
            }],
            return_type: None,
            body: Block {
                statements: vec![
                    let_stmt("r", borrow("xs", false)),
                    let_stmt("m", borrow("xs", true)),
                ],
            },
            span: Span::unknown(),
        };
        let mut checker = BorrowChecker::new();
        checker.check_function(&f);
        assert!(matches!(
            checker.errors().first(),
            Some(BorrowError::ExclusiveBorrowWhileAliased { name, .. }) if name == "xs"
        ));
    }

    #[test]
    fn borrows_release_at_scope_exit() {
        let f = Function {
            attributes: vec![],
            name: "f".to_string(),
            type_params: vec![],
            compile_time_params: vec![],
            where_clause: vec![],
            receiver: None,
            params: vec![Param {
                name: "xs".to_string(),
                ty: Type::String,
            }],
            return_type: None,
            body: Block {
                statements: vec![
                    Stmt::new(
                        NodeId(0),
                        Span::unknown(),
                        StmtKind::If {
                            condition: ident("xs"),
                            then_block: Block {
                                statements: vec![let_stmt("r", borrow("xs", false))],
                            },
                            elif_branches: vec![],
                            else_block: None,
                        },
                    ),
                    let_stmt("m", borrow("xs", true)),
                ],
            },
            span: Span::unknown(),
        };
        let mut checker = BorrowChecker::new();
        checker.check_function(&f);
        assert!(checker.errors().is_empty());
    }
}
