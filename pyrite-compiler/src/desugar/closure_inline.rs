//! Parameter-closure inlining (spec §4.6), run after type checking. A call
//! whose callee is directly a parameter-closure literal — the shape every
//! parameter-closure argument takes once the type checker has resolved it to
//! its definition — is replaced by the closure's body with its formal
//! parameters substituted by the call's actual arguments.

use super::errors::DesugarError;
use crate::monomorphize::{expr_children, map_expr_kind};
use pyrite_ast::{Block, Expr, ExprKind, Item, Param, Program, Stmt, StmtKind};
use std::collections::HashMap;

/// Bounds chosen generously enough to never reject realistic source
/// programs while still catching runaway self-referential inlining.
const MAX_INLINE_DEPTH: usize = 16;
const MAX_INLINE_BODY_SIZE: usize = 512;

pub struct ClosureInliner {
    errors: Vec<DesugarError>,
}

impl ClosureInliner {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn errors(&self) -> &[DesugarError] {
        &self.errors
    }

    pub fn run(&mut self, program: &mut Program) {
        for item in &mut program.items {
            if let Item::Function(f) = item {
                f.body = self.inline_block(&f.body, 0);
            }
        }
    }

    fn inline_block(&mut self, block: &Block, depth: usize) -> Block {
        Block {
            statements: block.statements.iter().map(|s| self.inline_stmt(s, depth)).collect(),
        }
    }

    fn inline_stmt(&mut self, stmt: &Stmt, depth: usize) -> Stmt {
        let kind = match &stmt.kind {
            StmtKind::Let { mutable, name, ty, value } => StmtKind::Let {
                mutable: *mutable,
                name: name.clone(),
                ty: ty.clone(),
                value: self.inline_expr(value, depth),
            },
            StmtKind::Assign { target, value } => StmtKind::Assign {
                target: self.inline_expr(target, depth),
                value: self.inline_expr(value, depth),
            },
            StmtKind::CompoundAssign { target, op, value } => StmtKind::CompoundAssign {
                target: self.inline_expr(target, depth),
                op: *op,
                value: self.inline_expr(value, depth),
            },
            StmtKind::Return(e) => StmtKind::Return(e.as_ref().map(|e| self.inline_expr(e, depth))),
            StmtKind::Break => StmtKind::Break,
            StmtKind::Continue => StmtKind::Continue,
            StmtKind::Defer(inner) => StmtKind::Defer(Box::new(self.inline_stmt(inner, depth))),
            StmtKind::If {
                condition,
                then_block,
                elif_branches,
                else_block,
            } => StmtKind::If {
                condition: self.inline_expr(condition, depth),
                then_block: self.inline_block(then_block, depth),
                elif_branches: elif_branches
                    .iter()
                    .map(|(c, b)| (self.inline_expr(c, depth), self.inline_block(b, depth)))
                    .collect(),
                else_block: else_block.as_ref().map(|b| self.inline_block(b, depth)),
            },
            StmtKind::While { condition, body } => StmtKind::While {
                condition: self.inline_expr(condition, depth),
                body: self.inline_block(body, depth),
            },
            StmtKind::ForRange {
                var,
                start,
                end,
                inclusive,
                body,
            } => StmtKind::ForRange {
                var: var.clone(),
                start: self.inline_expr(start, depth),
                end: self.inline_expr(end, depth),
                inclusive: *inclusive,
                body: self.inline_block(body, depth),
            },
            StmtKind::With { name, resource, body } => StmtKind::With {
                name: name.clone(),
                resource: self.inline_expr(resource, depth),
                body: self.inline_block(body, depth),
            },
            StmtKind::Unsafe(block) => StmtKind::Unsafe(self.inline_block(block, depth)),
            StmtKind::Expression(e) => StmtKind::Expression(self.inline_expr(e, depth)),
        };
        Stmt::new(stmt.id, stmt.span.clone(), kind)
    }

    fn inline_expr(&mut self, expr: &Expr, depth: usize) -> Expr {
        let kind = map_expr_kind(&expr.kind, &mut |e| self.inline_expr(e, depth));
        if let ExprKind::Call { func, args, .. } = &kind {
            if let ExprKind::ParamClosure { params, body, .. } = &func.kind {
                if depth >= MAX_INLINE_DEPTH || expr_size(body) > MAX_INLINE_BODY_SIZE {
                    self.errors.push(DesugarError::ClosureInlineBudget {
                        closure: "<parameter closure>".to_string(),
                        span: expr.span.clone(),
                    });
                    return Expr::new(expr.id, expr.span.clone(), kind);
                }
                let subst: HashMap<String, Expr> = params
                    .iter()
                    .map(Param::clone)
                    .zip(args.iter().cloned())
                    .map(|(p, a)| (p.name, a))
                    .collect();
                let substituted = substitute(body, &subst);
                return self.inline_expr(&substituted, depth + 1);
            }
        }
        Expr::new(expr.id, expr.span.clone(), kind)
    }
}

impl Default for ClosureInliner {
    fn default() -> Self {
        Self::new()
    }
}

fn substitute(expr: &Expr, subst: &HashMap<String, Expr>) -> Expr {
    if let ExprKind::Ident(name) = &expr.kind {
        if let Some(actual) = subst.get(name) {
            return actual.clone();
        }
    }
    let kind = map_expr_kind(&expr.kind, &mut |e| substitute(e, subst));
    Expr::new(expr.id, expr.span.clone(), kind)
}

fn expr_size(expr: &Expr) -> usize {
    1 + expr_children(expr).iter().map(|c| expr_size(c)).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_ast::NodeId;
    use pyrite_diagnostics::Span;

    fn int(n: i64) -> Expr {
        Expr::new(NodeId(0), Span::unknown(), ExprKind::IntLiteral(n))
    }

    #[test]
    fn immediately_invoked_closure_inlines_to_its_body() {
        let closure = Expr::new(
            NodeId(0),
            Span::unknown(),
            ExprKind::ParamClosure {
                params: vec![Param {
                    name: "n".to_string(),
                    ty: pyrite_ast::Type::i32(),
                }],
                return_type: None,
                body: Box::new(Expr::new(
                    NodeId(0),
                    Span::unknown(),
                    ExprKind::Binary {
                        left: Box::new(Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident("n".to_string()))),
                        op: pyrite_ast::BinaryOp::Add,
                        right: Box::new(int(1)),
                    },
                )),
            },
        );
        let call = Expr::new(
            NodeId(0),
            Span::unknown(),
            ExprKind::Call {
                func: Box::new(closure),
                compile_time_args: vec![],
                args: vec![int(5)],
            },
        );

        let mut inliner = ClosureInliner::new();
        let inlined = inliner.inline_expr(&call, 0);
        assert!(inliner.errors().is_empty());
        match inlined.kind {
            ExprKind::Binary { left, .. } => assert_eq!(left.kind, ExprKind::IntLiteral(5)),
            other => panic!("expected inlined binary expression, got {:?}", other),
        }
    }
}
