//! Monomorphizer (spec §4.5): rewrites every call site that carries
//! compile-time arguments into a call to a deep-cloned, constant-folded
//! specialization, then deletes the generic original.

pub mod errors;
pub use errors::MonoError;

use pyrite_ast::{
    BinaryOp, Block, ConstArg, Expr, ExprKind, Function, Item, NodeId, Program, Stmt, StmtKind,
    UnaryOp,
};
use pyrite_diagnostics::Span;
use std::collections::HashMap;

/// Hard cap on distinct specializations per run; a program that needs more
/// almost certainly has a non-terminating compile-time recursion.
const MAX_SPECIALIZATIONS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstKey {
    Int(i64),
    Bool(bool),
}

impl ConstKey {
    fn mangled_suffix(&self) -> String {
        match self {
            ConstKey::Int(n) if *n < 0 => format!("neg{}", -n),
            ConstKey::Int(n) => n.to_string(),
            ConstKey::Bool(b) => b.to_string(),
        }
    }

    fn as_expr(&self) -> Expr {
        let kind = match self {
            ConstKey::Int(n) => ExprKind::IntLiteral(*n),
            ConstKey::Bool(b) => ExprKind::BoolLiteral(*b),
        };
        Expr::new(NodeId(0), Span::unknown(), kind)
    }
}

fn mangle(base: &str, keys: &[ConstKey]) -> String {
    let mut name = base.to_string();
    for key in keys {
        name.push('_');
        name.push_str(&key.mangled_suffix());
    }
    name
}

pub struct MonomorphizationContext {
    cache: HashMap<(String, Vec<ConstKey>), Function>,
    errors: Vec<MonoError>,
}

impl MonomorphizationContext {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[MonoError] {
        &self.errors
    }

    /// Runs the full six-step algorithm over `program` in place.
    pub fn run(&mut self, program: &mut Program) {
        let generic: HashMap<String, Function> = program
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Function(f) if !f.compile_time_params.is_empty() => {
                    Some((f.name.clone(), f.clone()))
                }
                _ => None,
            })
            .collect();

        if generic.is_empty() {
            return;
        }

        let mut pending: Vec<(String, Vec<ConstKey>)> = Vec::new();
        for item in &program.items {
            if let Item::Function(f) = item {
                self.collect_calls(&f.body, &generic, &mut pending);
            }
        }

        let mut iterations = 0;
        while let Some((name, keys)) = pending.pop() {
            iterations += 1;
            if iterations > MAX_SPECIALIZATIONS {
                self.errors.push(MonoError::MonomorphizationNonTermination {
                    function: name,
                    span: Span::unknown(),
                });
                continue;
            }
            if self.cache.contains_key(&(name.clone(), keys.clone())) {
                continue;
            }
            let Some(template) = generic.get(&name) else {
                continue;
            };
            let specialized = Self::specialize(template, &keys);
            self.collect_calls(&specialized.body, &generic, &mut pending);
            self.cache.insert((name, keys), specialized);
        }

        for item in &mut program.items {
            if let Item::Function(f) = item {
                Self::rewrite_calls(&mut f.body, &generic);
            }
        }

        program.items.retain(|item| match item {
            Item::Function(f) => !generic.contains_key(&f.name),
            _ => true,
        });
        let specialized: Vec<Function> = self.cache.drain().map(|(_, f)| f).collect();
        program.items.extend(specialized.into_iter().map(Item::Function));
    }

    /// Step 3-4: deep-clone the template, substitute each compile-time
    /// parameter identifier with its literal, fold constant arithmetic, and
    /// rename the result to its mangled specialization name.
    fn specialize(template: &Function, keys: &[ConstKey]) -> Function {
        let mut subst = HashMap::new();
        for (param, key) in template.compile_time_params.iter().zip(keys) {
            subst.insert(param.name().to_string(), key.as_expr());
        }
        let mut specialized = template.clone();
        specialized.name = mangle(&template.name, keys);
        specialized.compile_time_params.clear();
        specialized.body = substitute_block(&specialized.body, &subst);
        specialized.body = fold_block(&specialized.body);
        specialized
    }

    /// Step 2: walk `body` (belonging to function `_within`) collecting
    /// `(name, resolved-keys)` for every call into a compile-time-generic
    /// function. Non-literal compile-time arguments are reported and the
    /// call site is skipped.
    fn collect_calls(
        &mut self,
        body: &Block,
        generic: &HashMap<String, Function>,
        pending: &mut Vec<(String, Vec<ConstKey>)>,
    ) {
        let mut found = Vec::new();
        collect_calls_block(body, generic, &mut found);
        for (name, span, args) in found {
            let mut keys = Vec::with_capacity(args.len());
            let mut ok = true;
            for arg in &args {
                match resolve_const_arg(arg) {
                    Some(key) => keys.push(key),
                    None => {
                        ok = false;
                        self.errors.push(MonoError::NonLiteralCompileTimeArgument {
                            function: name.clone(),
                            span: span.clone(),
                        });
                    }
                }
            }
            if ok {
                pending.push((name, keys));
            }
        }
    }

    /// Step 5: point every call's function reference at the mangled name and
    /// clear its compile-time argument list.
    fn rewrite_calls(block: &mut Block, generic: &HashMap<String, Function>) {
        for stmt in &mut block.statements {
            rewrite_calls_stmt(stmt, generic);
        }
    }
}

impl Default for MonomorphizationContext {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_const_arg(arg: &ConstArg) -> Option<ConstKey> {
    match arg {
        ConstArg::Int(n) => Some(ConstKey::Int(*n)),
        ConstArg::Bool(b) => Some(ConstKey::Bool(*b)),
        ConstArg::Expr(e) => match fold_expr(e).kind {
            ExprKind::IntLiteral(n) => Some(ConstKey::Int(n)),
            ExprKind::BoolLiteral(b) => Some(ConstKey::Bool(b)),
            _ => None,
        },
    }
}

fn collect_calls_block(
    block: &Block,
    generic: &HashMap<String, Function>,
    found: &mut Vec<(String, Span, Vec<ConstArg>)>,
) {
    for stmt in &block.statements {
        collect_calls_stmt(stmt, generic, found);
    }
}

fn collect_calls_stmt(
    stmt: &Stmt,
    generic: &HashMap<String, Function>,
    found: &mut Vec<(String, Span, Vec<ConstArg>)>,
) {
    match &stmt.kind {
        StmtKind::Let { value, .. } => collect_calls_expr(value, generic, found),
        StmtKind::Assign { target, value } => {
            collect_calls_expr(target, generic, found);
            collect_calls_expr(value, generic, found);
        }
        StmtKind::CompoundAssign { target, value, .. } => {
            collect_calls_expr(target, generic, found);
            collect_calls_expr(value, generic, found);
        }
        StmtKind::Return(Some(e)) => collect_calls_expr(e, generic, found),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Defer(inner) => collect_calls_stmt(inner, generic, found),
        StmtKind::If {
            condition,
            then_block,
            elif_branches,
            else_block,
        } => {
            collect_calls_expr(condition, generic, found);
            collect_calls_block(then_block, generic, found);
            for (cond, block) in elif_branches {
                collect_calls_expr(cond, generic, found);
                collect_calls_block(block, generic, found);
            }
            if let Some(block) = else_block {
                collect_calls_block(block, generic, found);
            }
        }
        StmtKind::While { condition, body } => {
            collect_calls_expr(condition, generic, found);
            collect_calls_block(body, generic, found);
        }
        StmtKind::ForRange { start, end, body, .. } => {
            collect_calls_expr(start, generic, found);
            collect_calls_expr(end, generic, found);
            collect_calls_block(body, generic, found);
        }
        StmtKind::With { resource, body, .. } => {
            collect_calls_expr(resource, generic, found);
            collect_calls_block(body, generic, found);
        }
        StmtKind::Unsafe(block) => collect_calls_block(block, generic, found),
        StmtKind::Expression(e) => collect_calls_expr(e, generic, found),
    }
}

fn collect_calls_expr(
    expr: &Expr,
    generic: &HashMap<String, Function>,
    found: &mut Vec<(String, Span, Vec<ConstArg>)>,
) {
    if let ExprKind::Call {
        func,
        compile_time_args,
        args,
    } = &expr.kind
    {
        if let ExprKind::Ident(name) = &func.kind {
            if generic.contains_key(name) && !compile_time_args.is_empty() {
                found.push((name.clone(), expr.span.clone(), compile_time_args.clone()));
            }
        }
        for arg in args {
            collect_calls_expr(arg, generic, found);
        }
        return;
    }
    for child in expr_children(expr) {
        collect_calls_expr(child, generic, found);
    }
}

fn rewrite_calls_stmt(stmt: &mut Stmt, generic: &HashMap<String, Function>) {
    match &mut stmt.kind {
        StmtKind::Let { value, .. } => rewrite_calls_expr(value, generic),
        StmtKind::Assign { target, value } => {
            rewrite_calls_expr(target, generic);
            rewrite_calls_expr(value, generic);
        }
        StmtKind::CompoundAssign { target, value, .. } => {
            rewrite_calls_expr(target, generic);
            rewrite_calls_expr(value, generic);
        }
        StmtKind::Return(Some(e)) => rewrite_calls_expr(e, generic),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Defer(inner) => rewrite_calls_stmt(inner, generic),
        StmtKind::If {
            condition,
            then_block,
            elif_branches,
            else_block,
        } => {
            rewrite_calls_expr(condition, generic);
            MonomorphizationContext::rewrite_calls(then_block, generic);
            for (cond, block) in elif_branches {
                rewrite_calls_expr(cond, generic);
                MonomorphizationContext::rewrite_calls(block, generic);
            }
            if let Some(block) = else_block {
                MonomorphizationContext::rewrite_calls(block, generic);
            }
        }
        StmtKind::While { condition, body } => {
            rewrite_calls_expr(condition, generic);
            MonomorphizationContext::rewrite_calls(body, generic);
        }
        StmtKind::ForRange { start, end, body, .. } => {
            rewrite_calls_expr(start, generic);
            rewrite_calls_expr(end, generic);
            MonomorphizationContext::rewrite_calls(body, generic);
        }
        StmtKind::With { resource, body, .. } => {
            rewrite_calls_expr(resource, generic);
            MonomorphizationContext::rewrite_calls(body, generic);
        }
        StmtKind::Unsafe(block) => MonomorphizationContext::rewrite_calls(block, generic),
        StmtKind::Expression(e) => rewrite_calls_expr(e, generic),
    }
}

fn rewrite_calls_expr(expr: &mut Expr, generic: &HashMap<String, Function>) {
    if let ExprKind::Call {
        func,
        compile_time_args,
        args,
    } = &mut expr.kind
    {
        if let ExprKind::Ident(name) = &func.kind {
            if generic.contains_key(name) && !compile_time_args.is_empty() {
                let keys: Vec<ConstKey> = compile_time_args
                    .iter()
                    .filter_map(resolve_const_arg)
                    .collect();
                if keys.len() == compile_time_args.len() {
                    func.kind = ExprKind::Ident(mangle(name, &keys));
                    compile_time_args.clear();
                }
            }
        }
        for arg in args {
            rewrite_calls_expr(arg, generic);
        }
        return;
    }
    for child in expr_children_mut(expr) {
        rewrite_calls_expr(child, generic);
    }
}

/// Substitutes every `Ident` bound by `subst` with its literal, leaving the
/// rest of the tree structurally unchanged. Used once per specialization.
fn substitute_block(block: &Block, subst: &HashMap<String, Expr>) -> Block {
    Block {
        statements: block.statements.iter().map(|s| substitute_stmt(s, subst)).collect(),
    }
}

fn substitute_stmt(stmt: &Stmt, subst: &HashMap<String, Expr>) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Let { mutable, name, ty, value } => StmtKind::Let {
            mutable: *mutable,
            name: name.clone(),
            ty: ty.clone(),
            value: substitute_expr(value, subst),
        },
        StmtKind::Assign { target, value } => StmtKind::Assign {
            target: substitute_expr(target, subst),
            value: substitute_expr(value, subst),
        },
        StmtKind::CompoundAssign { target, op, value } => StmtKind::CompoundAssign {
            target: substitute_expr(target, subst),
            op: *op,
            value: substitute_expr(value, subst),
        },
        StmtKind::Return(e) => StmtKind::Return(e.as_ref().map(|e| substitute_expr(e, subst))),
        StmtKind::Break => StmtKind::Break,
        StmtKind::Continue => StmtKind::Continue,
        StmtKind::Defer(inner) => StmtKind::Defer(Box::new(substitute_stmt(inner, subst))),
        StmtKind::If {
            condition,
            then_block,
            elif_branches,
            else_block,
        } => StmtKind::If {
            condition: substitute_expr(condition, subst),
            then_block: substitute_block(then_block, subst),
            elif_branches: elif_branches
                .iter()
                .map(|(c, b)| (substitute_expr(c, subst), substitute_block(b, subst)))
                .collect(),
            else_block: else_block.as_ref().map(|b| substitute_block(b, subst)),
        },
        StmtKind::While { condition, body } => StmtKind::While {
            condition: substitute_expr(condition, subst),
            body: substitute_block(body, subst),
        },
        StmtKind::ForRange {
            var,
            start,
            end,
            inclusive,
            body,
        } => StmtKind::ForRange {
            var: var.clone(),
            start: substitute_expr(start, subst),
            end: substitute_expr(end, subst),
            inclusive: *inclusive,
            body: substitute_block(body, subst),
        },
        StmtKind::With { name, resource, body } => StmtKind::With {
            name: name.clone(),
            resource: substitute_expr(resource, subst),
            body: substitute_block(body, subst),
        },
        StmtKind::Unsafe(block) => StmtKind::Unsafe(substitute_block(block, subst)),
        StmtKind::Expression(e) => StmtKind::Expression(substitute_expr(e, subst)),
    };
    Stmt::new(stmt.id, stmt.span.clone(), kind)
}

fn substitute_expr(expr: &Expr, subst: &HashMap<String, Expr>) -> Expr {
    if let ExprKind::Ident(name) = &expr.kind {
        if let Some(literal) = subst.get(name) {
            return Expr::new(expr.id, expr.span.clone(), literal.kind.clone());
        }
    }
    let kind = map_expr_kind(&expr.kind, &mut |e| substitute_expr(e, subst));
    Expr::new(expr.id, expr.span.clone(), kind)
}

/// Step 3's constant-folding pass: collapses `+ - * / %` on int literals,
/// `and or` on bool literals, and obvious identities, bottom-up.
fn fold_block(block: &Block) -> Block {
    Block {
        statements: block.statements.iter().map(fold_stmt).collect(),
    }
}

fn fold_stmt(stmt: &Stmt) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Let { mutable, name, ty, value } => StmtKind::Let {
            mutable: *mutable,
            name: name.clone(),
            ty: ty.clone(),
            value: fold_expr(value),
        },
        StmtKind::Assign { target, value } => StmtKind::Assign {
            target: fold_expr(target),
            value: fold_expr(value),
        },
        StmtKind::CompoundAssign { target, op, value } => StmtKind::CompoundAssign {
            target: fold_expr(target),
            op: *op,
            value: fold_expr(value),
        },
        StmtKind::Return(e) => StmtKind::Return(e.as_ref().map(fold_expr)),
        StmtKind::Break => StmtKind::Break,
        StmtKind::Continue => StmtKind::Continue,
        StmtKind::Defer(inner) => StmtKind::Defer(Box::new(fold_stmt(inner))),
        StmtKind::If {
            condition,
            then_block,
            elif_branches,
            else_block,
        } => StmtKind::If {
            condition: fold_expr(condition),
            then_block: fold_block(then_block),
            elif_branches: elif_branches
                .iter()
                .map(|(c, b)| (fold_expr(c), fold_block(b)))
                .collect(),
            else_block: else_block.as_ref().map(fold_block),
        },
        StmtKind::While { condition, body } => StmtKind::While {
            condition: fold_expr(condition),
            body: fold_block(body),
        },
        StmtKind::ForRange {
            var,
            start,
            end,
            inclusive,
            body,
        } => StmtKind::ForRange {
            var: var.clone(),
            start: fold_expr(start),
            end: fold_expr(end),
            inclusive: *inclusive,
            body: fold_block(body),
        },
        StmtKind::With { name, resource, body } => StmtKind::With {
            name: name.clone(),
            resource: fold_expr(resource),
            body: fold_block(body),
        },
        StmtKind::Unsafe(block) => StmtKind::Unsafe(fold_block(block)),
        StmtKind::Expression(e) => StmtKind::Expression(fold_expr(e)),
    };
    Stmt::new(stmt.id, stmt.span.clone(), kind)
}

fn fold_expr(expr: &Expr) -> Expr {
    let kind = map_expr_kind(&expr.kind, &mut fold_expr);
    let kind = match kind {
        ExprKind::Unary { op: UnaryOp::Neg, expr: inner } => {
            let inner = *inner;
            match inner.kind {
                ExprKind::IntLiteral(n) => ExprKind::IntLiteral(-n),
                other => ExprKind::Unary { op: UnaryOp::Neg, expr: Box::new(Expr::new(inner.id, inner.span, other)) },
            }
        }
        ExprKind::Unary { op: UnaryOp::Not, expr: inner } => {
            let inner = *inner;
            match inner.kind {
                ExprKind::BoolLiteral(b) => ExprKind::BoolLiteral(!b),
                other => ExprKind::Unary { op: UnaryOp::Not, expr: Box::new(Expr::new(inner.id, inner.span, other)) },
            }
        }
        ExprKind::Binary { left, op, right } => match (&left.kind, &right.kind) {
            (ExprKind::IntLiteral(a), ExprKind::IntLiteral(b)) => match fold_int_binary(op, *a, *b) {
                Some(folded) => folded,
                None => ExprKind::Binary { left, op, right },
            },
            (ExprKind::BoolLiteral(a), ExprKind::BoolLiteral(b)) => match fold_bool_binary(op, *a, *b) {
                Some(folded) => folded,
                None => ExprKind::Binary { left, op, right },
            },
            _ => ExprKind::Binary { left, op, right },
        },
        other => other,
    };
    Expr::new(expr.id, expr.span.clone(), kind)
}

fn fold_int_binary(op: BinaryOp, a: i64, b: i64) -> Option<ExprKind> {
    match op {
        BinaryOp::Add => Some(ExprKind::IntLiteral(a + b)),
        BinaryOp::Sub => Some(ExprKind::IntLiteral(a - b)),
        BinaryOp::Mul => Some(ExprKind::IntLiteral(a * b)),
        BinaryOp::Div if b != 0 => Some(ExprKind::IntLiteral(a / b)),
        BinaryOp::Mod if b != 0 => Some(ExprKind::IntLiteral(a % b)),
        BinaryOp::Eq => Some(ExprKind::BoolLiteral(a == b)),
        BinaryOp::NotEq => Some(ExprKind::BoolLiteral(a != b)),
        BinaryOp::Lt => Some(ExprKind::BoolLiteral(a < b)),
        BinaryOp::LtEq => Some(ExprKind::BoolLiteral(a <= b)),
        BinaryOp::Gt => Some(ExprKind::BoolLiteral(a > b)),
        BinaryOp::GtEq => Some(ExprKind::BoolLiteral(a >= b)),
        _ => None,
    }
}

fn fold_bool_binary(op: BinaryOp, a: bool, b: bool) -> Option<ExprKind> {
    match op {
        BinaryOp::And => Some(ExprKind::BoolLiteral(a && b)),
        BinaryOp::Or => Some(ExprKind::BoolLiteral(a || b)),
        BinaryOp::Eq => Some(ExprKind::BoolLiteral(a == b)),
        BinaryOp::NotEq => Some(ExprKind::BoolLiteral(a != b)),
        _ => None,
    }
}

/// Applies `f` to every immediate child expression of `kind`, rebuilding the
/// same variant. Shared by the substitute and fold passes so each only
/// states the leaf behavior that differs.
pub(crate) fn map_expr_kind(kind: &ExprKind, f: &mut impl FnMut(&Expr) -> Expr) -> ExprKind {
    match kind {
        ExprKind::IntLiteral(n) => ExprKind::IntLiteral(*n),
        ExprKind::FloatLiteral(n) => ExprKind::FloatLiteral(*n),
        ExprKind::StringLiteral(s) => ExprKind::StringLiteral(s.clone()),
        ExprKind::BoolLiteral(b) => ExprKind::BoolLiteral(*b),
        ExprKind::CharLiteral(c) => ExprKind::CharLiteral(*c),
        ExprKind::Ident(name) => ExprKind::Ident(name.clone()),
        ExprKind::Binary { left, op, right } => ExprKind::Binary {
            left: Box::new(f(left)),
            op: *op,
            right: Box::new(f(right)),
        },
        ExprKind::Unary { op, expr } => ExprKind::Unary {
            op: *op,
            expr: Box::new(f(expr)),
        },
        ExprKind::Call { func, compile_time_args, args } => ExprKind::Call {
            func: Box::new(f(func)),
            compile_time_args: compile_time_args.clone(),
            args: args.iter().map(f).collect(),
        },
        ExprKind::MethodCall { receiver, method, args } => ExprKind::MethodCall {
            receiver: Box::new(f(receiver)),
            method: method.clone(),
            args: args.iter().map(f).collect(),
        },
        ExprKind::FieldAccess { object, field } => ExprKind::FieldAccess {
            object: Box::new(f(object)),
            field: field.clone(),
        },
        ExprKind::Index { object, index } => ExprKind::Index {
            object: Box::new(f(object)),
            index: Box::new(f(index)),
        },
        ExprKind::ArrayLiteral(items) => ExprKind::ArrayLiteral(items.iter().map(f).collect()),
        ExprKind::TupleLiteral(items) => ExprKind::TupleLiteral(items.iter().map(f).collect()),
        ExprKind::StructLiteral { name, type_args, fields } => ExprKind::StructLiteral {
            name: name.clone(),
            type_args: type_args.clone(),
            fields: fields.iter().map(|(n, e)| (n.clone(), f(e))).collect(),
        },
        ExprKind::EnumLiteral { enum_name, variant, data } => ExprKind::EnumLiteral {
            enum_name: enum_name.clone(),
            variant: variant.clone(),
            data: data.iter().map(f).collect(),
        },
        ExprKind::Reference { mutable, expr } => ExprKind::Reference {
            mutable: *mutable,
            expr: Box::new(f(expr)),
        },
        ExprKind::Deref(inner) => ExprKind::Deref(Box::new(f(inner))),
        ExprKind::Match { scrutinee, arms } => ExprKind::Match {
            scrutinee: Box::new(f(scrutinee)),
            arms: arms
                .iter()
                .map(|arm| pyrite_ast::MatchArm {
                    pattern: arm.pattern.clone(),
                    guard: arm.guard.as_ref().map(&mut *f),
                    body: f(&arm.body),
                })
                .collect(),
        },
        ExprKind::Block { statements, tail } => ExprKind::Block {
            statements: statements.clone(),
            tail: tail.as_ref().map(|t| Box::new(f(t))),
        },
        ExprKind::Cast { expr, target_type } => ExprKind::Cast {
            expr: Box::new(f(expr)),
            target_type: target_type.clone(),
        },
        ExprKind::Try(inner) => ExprKind::Try(Box::new(f(inner))),
        ExprKind::ParamClosure { params, return_type, body } => ExprKind::ParamClosure {
            params: params.clone(),
            return_type: return_type.clone(),
            body: Box::new(f(body)),
        },
        ExprKind::RuntimeClosure { params, return_type, body, captures } => ExprKind::RuntimeClosure {
            params: params.clone(),
            return_type: return_type.clone(),
            body: Box::new(f(body)),
            captures: captures.clone(),
        },
    }
}

pub(crate) fn expr_children(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::Binary { left, right, .. } => vec![left, right],
        ExprKind::Unary { expr, .. }
        | ExprKind::Reference { expr, .. }
        | ExprKind::Deref(expr)
        | ExprKind::Try(expr)
        | ExprKind::Cast { expr, .. } => vec![expr],
        ExprKind::MethodCall { receiver, args, .. } => {
            let mut v = vec![receiver.as_ref()];
            v.extend(args.iter());
            v
        }
        ExprKind::FieldAccess { object, .. } => vec![object],
        ExprKind::Index { object, index } => vec![object, index],
        ExprKind::ArrayLiteral(items) | ExprKind::TupleLiteral(items) => items.iter().collect(),
        ExprKind::StructLiteral { fields, .. } => fields.iter().map(|(_, e)| e).collect(),
        ExprKind::EnumLiteral { data, .. } => data.iter().collect(),
        ExprKind::Match { scrutinee, arms } => {
            let mut v = vec![scrutinee.as_ref()];
            for arm in arms {
                if let Some(guard) = &arm.guard {
                    v.push(guard);
                }
                v.push(&arm.body);
            }
            v
        }
        ExprKind::Block { tail, .. } => tail.iter().map(|t| t.as_ref()).collect(),
        ExprKind::ParamClosure { body, .. } | ExprKind::RuntimeClosure { body, .. } => vec![body],
        _ => vec![],
    }
}

fn expr_children_mut(expr: &mut Expr) -> Vec<&mut Expr> {
    match &mut expr.kind {
        ExprKind::Binary { left, right, .. } => vec![left, right],
        ExprKind::Unary { expr, .. }
        | ExprKind::Reference { expr, .. }
        | ExprKind::Deref(expr)
        | ExprKind::Try(expr)
        | ExprKind::Cast { expr, .. } => vec![expr],
        ExprKind::MethodCall { receiver, args, .. } => {
            let mut v = vec![receiver.as_mut()];
            v.extend(args.iter_mut());
            v
        }
        ExprKind::FieldAccess { object, .. } => vec![object],
        ExprKind::Index { object, index } => vec![object, index],
        ExprKind::ArrayLiteral(items) | ExprKind::TupleLiteral(items) => items.iter_mut().collect(),
        ExprKind::StructLiteral { fields, .. } => fields.iter_mut().map(|(_, e)| e).collect(),
        ExprKind::EnumLiteral { data, .. } => data.iter_mut().collect(),
        ExprKind::Match { scrutinee, arms } => {
            let mut v = vec![scrutinee.as_mut()];
            for arm in arms {
                if let Some(guard) = &mut arm.guard {
                    v.push(guard);
                }
                v.push(&mut arm.body);
            }
            v
        }
        ExprKind::Block { tail, .. } => tail.iter_mut().map(|t| t.as_mut()).collect(),
        ExprKind::ParamClosure { body, .. } | ExprKind::RuntimeClosure { body, .. } => vec![body],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_ast::{CompileTimeParam, Param, Type};

    fn int(n: i64) -> Expr {
        Expr::new(NodeId(0), Span::unknown(), ExprKind::IntLiteral(n))
    }

    fn generic_function(name: &str) -> Function {
        Function {
            attributes: vec![],
            name: name.to_string(),
            type_params: vec![],
            compile_time_params: vec![CompileTimeParam::Int("N".to_string())],
            where_clause: vec![],
            receiver: None,
            params: vec![],
            return_type: Some(Type::i32()),
            body: Block {
                statements: vec![Stmt::new(
                    NodeId(0),
                    Span::unknown(),
                    StmtKind::Return(Some(Expr::new(
                        NodeId(0),
                        Span::unknown(),
                        ExprKind::Binary {
                            left: Box::new(Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident("N".to_string()))),
                            op: BinaryOp::Add,
                            right: Box::new(int(1)),
                        },
                    ))),
                )],
            },
            span: Span::unknown(),
        }
    }

    fn call_with_const_arg(name: &str, n: i64) -> Expr {
        Expr::new(
            NodeId(0),
            Span::unknown(),
            ExprKind::Call {
                func: Box::new(Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident(name.to_string()))),
                compile_time_args: vec![ConstArg::Int(n)],
                args: vec![],
            },
        )
    }

    #[test]
    fn specialization_mangles_name_and_folds_the_body() {
        let mut program = Program {
            imports: vec![],
            items: vec![
                Item::Function(generic_function("f")),
                Item::Function(Function {
                    attributes: vec![],
                    name: "main".to_string(),
                    type_params: vec![],
                    compile_time_params: vec![],
                    where_clause: vec![],
                    receiver: None,
                    params: vec![],
                    return_type: None,
                    body: Block {
                        statements: vec![Stmt::new(
                            NodeId(0),
                            Span::unknown(),
                            StmtKind::Expression(call_with_const_arg("f", 3)),
                        )],
                    },
                    span: Span::unknown(),
                }),
            ],
        };

        let mut ctx = MonomorphizationContext::new();
        ctx.run(&mut program);

        assert!(ctx.errors().is_empty());
        let names: Vec<&str> = program
            .items
            .iter()
            .filter_map(|i| match i {
                Item::Function(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert!(names.contains(&"f_3"));
        assert!(!names.contains(&"f"));

        let specialized = program
            .items
            .iter()
            .find_map(|i| match i {
                Item::Function(f) if f.name == "f_3" => Some(f),
                _ => None,
            })
            .unwrap();
        match &specialized.body.statements[0].kind {
            StmtKind::Return(Some(e)) => assert_eq!(e.kind, ExprKind::IntLiteral(4)),
            _ => panic!("expected folded return"),
        }
    }

    #[test]
    fn distinct_argument_tuples_produce_distinct_specializations() {
        let mut program = Program {
            imports: vec![],
            items: vec![
                Item::Function(generic_function("f")),
                Item::Function(Function {
                    attributes: vec![],
                    name: "main".to_string(),
                    type_params: vec![],
                    compile_time_params: vec![],
                    where_clause: vec![],
                    receiver: None,
                    params: vec![],
                    return_type: None,
                    body: Block {
                        statements: vec![
                            Stmt::new(NodeId(0), Span::unknown(), StmtKind::Expression(call_with_const_arg("f", 3))),
                            Stmt::new(NodeId(0), Span::unknown(), StmtKind::Expression(call_with_const_arg("f", 4))),
                        ],
                    },
                    span: Span::unknown(),
                }),
            ],
        };

        let mut ctx = MonomorphizationContext::new();
        ctx.run(&mut program);

        let names: Vec<&str> = program
            .items
            .iter()
            .filter_map(|i| match i {
                Item::Function(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert!(names.contains(&"f_3"));
        assert!(names.contains(&"f_4"));
    }
}
