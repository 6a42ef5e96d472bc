//! `with r = try e: body` → `let r = try e; defer r.close(); body` (spec §4.6),
//! run before type checking so the checker only ever sees `Let`/`Defer`.

use pyrite_ast::{Block, Expr, ExprKind, NodeId, Stmt, StmtKind};

pub fn desugar_block(block: &Block) -> Block {
    let mut statements = Vec::with_capacity(block.statements.len());
    for stmt in &block.statements {
        desugar_stmt_into(stmt, &mut statements);
    }
    Block { statements }
}

fn desugar_stmt_into(stmt: &Stmt, out: &mut Vec<Stmt>) {
    match &stmt.kind {
        StmtKind::With { name, resource, body } => {
            out.push(Stmt::new(
                stmt.id,
                stmt.span.clone(),
                StmtKind::Let {
                    mutable: false,
                    name: name.clone(),
                    ty: None,
                    value: resource.clone(),
                },
            ));
            let close_call = Expr::new(
                NodeId(0),
                stmt.span.clone(),
                ExprKind::MethodCall {
                    receiver: Box::new(Expr::new(
                        NodeId(0),
                        stmt.span.clone(),
                        ExprKind::Ident(name.clone()),
                    )),
                    method: "close".to_string(),
                    args: vec![],
                },
            );
            out.push(Stmt::new(
                stmt.id,
                stmt.span.clone(),
                StmtKind::Defer(Box::new(Stmt::new(
                    NodeId(0),
                    stmt.span.clone(),
                    StmtKind::Expression(close_call),
                ))),
            ));
            let inlined = desugar_block(body);
            out.extend(inlined.statements);
        }
        StmtKind::If {
            condition,
            then_block,
            elif_branches,
            else_block,
        } => out.push(Stmt::new(
            stmt.id,
            stmt.span.clone(),
            StmtKind::If {
                condition: condition.clone(),
                then_block: desugar_block(then_block),
                elif_branches: elif_branches
                    .iter()
                    .map(|(c, b)| (c.clone(), desugar_block(b)))
                    .collect(),
                else_block: else_block.as_ref().map(desugar_block),
            },
        )),
        StmtKind::While { condition, body } => out.push(Stmt::new(
            stmt.id,
            stmt.span.clone(),
            StmtKind::While {
                condition: condition.clone(),
                body: desugar_block(body),
            },
        )),
        StmtKind::ForRange {
            var,
            start,
            end,
            inclusive,
            body,
        } => out.push(Stmt::new(
            stmt.id,
            stmt.span.clone(),
            StmtKind::ForRange {
                var: var.clone(),
                start: start.clone(),
                end: end.clone(),
                inclusive: *inclusive,
                body: desugar_block(body),
            },
        )),
        StmtKind::Unsafe(block) => out.push(Stmt::new(
            stmt.id,
            stmt.span.clone(),
            StmtKind::Unsafe(desugar_block(block)),
        )),
        StmtKind::Defer(inner) => {
            let mut nested = Vec::new();
            desugar_stmt_into(inner, &mut nested);
            if nested.len() == 1 {
                if let Some(only) = nested.pop() {
                    out.push(Stmt::new(stmt.id, stmt.span.clone(), StmtKind::Defer(Box::new(only))));
                }
            } else {
                out.extend(nested);
            }
        }
        _ => out.push(stmt.clone()),
    }
}

/// Convenience used by the driver's test fixtures: desugars a whole program's
/// function bodies in place.
pub fn desugar_program(program: &mut pyrite_ast::Program) {
    for item in &mut program.items {
        if let pyrite_ast::Item::Function(f) = item {
            f.body = desugar_block(&f.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_diagnostics::Span;

    #[test]
    fn with_expands_to_let_and_defer() {
        let block = Block {
            statements: vec![Stmt::new(
                NodeId(0),
                Span::unknown(),
                StmtKind::With {
                    name: "f".to_string(),
                    resource: Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident("open_file".to_string())),
                    body: Block {
                        statements: vec![Stmt::new(
                            NodeId(0),
                            Span::unknown(),
                            StmtKind::Expression(Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident("f".to_string()))),
                        )],
                    },
                },
            )],
        };

        let desugared = desugar_block(&block);
        assert_eq!(desugared.statements.len(), 3);
        assert!(matches!(desugared.statements[0].kind, StmtKind::Let { .. }));
        assert!(matches!(desugared.statements[1].kind, StmtKind::Defer(_)));
        assert!(matches!(desugared.statements[2].kind, StmtKind::Expression(_)));
    }
}
