//! Bidirectional type checker (spec §4.2).

pub mod errors;
pub use errors::TypeError;

use crate::resolver::{Resolver, SymbolKind};
use pyrite_ast::*;
use std::collections::HashMap;

/// Per-expression types, keyed by the immutable AST's `NodeId` rather than
/// stored on the node itself.
#[derive(Debug, Default)]
pub struct TypeTable(HashMap<NodeId, Type>);

impl TypeTable {
    pub fn insert(&mut self, id: NodeId, ty: Type) {
        self.0.insert(id, ty);
    }

    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.0.get(&id)
    }
}

/// `type-name -> trait-name -> impl block`, populated while walking
/// `TraitImpl` items and consulted by method resolution and the borrow
/// checker's Copy-type lookups.
#[derive(Debug, Default)]
pub struct TraitImpls {
    by_type: HashMap<String, HashMap<String, TraitImpl>>,
}

impl TraitImpls {
    pub fn register(&mut self, impl_block: TraitImpl) {
        let type_name = type_name_key(&impl_block.for_type);
        self.by_type
            .entry(type_name)
            .or_default()
            .insert(impl_block.trait_name.clone(), impl_block);
    }

    pub fn implementations_for(&self, type_name: &str) -> Option<&HashMap<String, TraitImpl>> {
        self.by_type.get(type_name)
    }

    pub fn implements(&self, type_name: &str, trait_name: &str) -> bool {
        self.by_type
            .get(type_name)
            .is_some_and(|impls| impls.contains_key(trait_name))
    }
}

fn type_name_key(ty: &Type) -> String {
    match ty {
        Type::Struct { name, .. } | Type::Enum { name, .. } | Type::Opaque { name } => {
            name.clone()
        }
        other => other.to_string(),
    }
}

/// Where a method resolved from, per the order spec §4.2 mandates.
pub enum MethodSource<'a> {
    Inherent(&'a Function),
    Trait { impl_block: &'a TraitImpl, method: &'a Function },
    TraitDefault { trait_def: &'a Trait, method: &'a TraitMethod },
}

pub struct TypeChecker {
    pub resolver: Resolver,
    pub types: TypeTable,
    pub trait_impls: TraitImpls,
    struct_defs: HashMap<String, Struct>,
    enum_defs: HashMap<String, Enum>,
    trait_defs: HashMap<String, Trait>,
    functions: HashMap<String, Function>,
    type_aliases: HashMap<String, TypeAlias>,
    current_self_type: Option<Type>,
    current_return_type: Option<Type>,
    errors: Vec<TypeError>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            resolver: Resolver::new(),
            types: TypeTable::default(),
            trait_impls: TraitImpls::default(),
            struct_defs: HashMap::new(),
            enum_defs: HashMap::new(),
            trait_defs: HashMap::new(),
            functions: HashMap::new(),
            type_aliases: HashMap::new(),
            current_self_type: None,
            current_return_type: None,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    fn report(&mut self, error: TypeError) {
        self.errors.push(error);
    }

    /// Registers every item's declaration shape before checking bodies, so
    /// forward references between items (mutual recursion, a method
    /// calling a function declared later) resolve.
    pub fn check_program(&mut self, program: &Program) {
        for item in &program.items {
            self.register_item_signature(item);
        }
        for item in &program.items {
            self.check_item(item);
        }
    }

    fn register_item_signature(&mut self, item: &Item) {
        match item {
            Item::Function(f) => {
                self.functions.insert(f.name.clone(), f.clone());
            }
            Item::Struct(s) => {
                self.struct_defs.insert(s.name.clone(), s.clone());
                for m in &s.methods {
                    self.functions
                        .insert(format!("{}_{}", s.name, m.name), m.clone());
                }
            }
            Item::Enum(e) => {
                self.enum_defs.insert(e.name.clone(), e.clone());
            }
            Item::Trait(t) => {
                self.trait_defs.insert(t.name.clone(), t.clone());
            }
            Item::TraitImpl(impl_block) => {
                self.trait_impls.register(impl_block.clone());
            }
            Item::TypeAlias(alias) => {
                self.type_aliases.insert(alias.name.clone(), alias.clone());
            }
            Item::Const(_) | Item::ExternBlock(_) => {}
        }
    }

    fn check_item(&mut self, item: &Item) {
        match item {
            Item::Function(f) => self.check_function(f, None),
            Item::Struct(s) => {
                let self_ty = self.struct_as_type(s);
                for m in &s.methods {
                    self.check_function(m, Some(self_ty.clone()));
                }
            }
            Item::TraitImpl(impl_block) => {
                let self_ty = self.resolve_named_type(&impl_block.for_type);
                for m in &impl_block.methods {
                    self.check_function(m, Some(self_ty.clone()));
                }
            }
            Item::Const(c) => {
                self.infer_expr(&c.value);
            }
            Item::Enum(_) | Item::Trait(_) | Item::TypeAlias(_) | Item::ExternBlock(_) => {}
        }
    }

    fn struct_as_type(&self, s: &Struct) -> Type {
        Type::Struct {
            name: s.name.clone(),
            fields: s
                .fields
                .iter()
                .map(|f| (f.name.clone(), self.resolve_named_type(&f.ty)))
                .collect(),
        }
    }

    fn check_function(&mut self, f: &Function, self_type: Option<Type>) {
        self.resolver.enter_scope();
        let previous_self = self.current_self_type.take();
        self.current_self_type = self_type;
        let previous_return = self.current_return_type.take();
        self.current_return_type = f.return_type.as_ref().map(|t| self.resolve_named_type(t));

        if let Some(receiver) = &f.receiver {
            let _ = self.resolver.define(
                "self",
                SymbolKind::Parameter,
                Type::Reference {
                    mutable: receiver.mutable,
                    inner: Box::new(
                        self.current_self_type.clone().unwrap_or(Type::SelfType),
                    ),
                },
                false,
                f.span.clone(),
            );
        }
        for param in &f.params {
            let ty = self.resolve_named_type(&param.ty);
            if let Err(e) = self.resolver.define(
                &param.name,
                SymbolKind::Parameter,
                ty,
                false,
                f.span.clone(),
            ) {
                self.report(TypeError::UndefinedName {
                    name: e.to_string(),
                    span: f.span.clone(),
                });
            }
        }

        for stmt in &f.body.statements {
            self.check_stmt(stmt);
        }

        self.current_self_type = previous_self;
        self.current_return_type = previous_return;
        self.resolver.exit_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { mutable, name, ty, value } => {
                let inferred = self.infer_expr(value);
                let declared = ty.as_ref().map(|t| self.resolve_named_type(t));
                let final_ty = match declared {
                    Some(declared_ty) => {
                        if !types_compatible(&declared_ty, &inferred) {
                            self.report(TypeError::TypeMismatch {
                                expected: declared_ty.to_string(),
                                found: inferred.to_string(),
                                span: stmt.span.clone(),
                            });
                        }
                        declared_ty
                    }
                    None => inferred,
                };
                let _ = self
                    .resolver
                    .define(name, SymbolKind::Variable, final_ty, *mutable, stmt.span.clone());
            }
            StmtKind::Assign { target, value } => {
                self.infer_expr(target);
                self.infer_expr(value);
            }
            StmtKind::CompoundAssign { target, value, .. } => {
                self.infer_expr(target);
                self.infer_expr(value);
            }
            StmtKind::Return(Some(e)) => {
                self.infer_expr(e);
            }
            StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Defer(inner) => self.check_stmt(inner),
            StmtKind::If {
                condition,
                then_block,
                elif_branches,
                else_block,
            } => {
                self.infer_expr(condition);
                self.check_block(then_block);
                for (cond, block) in elif_branches {
                    self.infer_expr(cond);
                    self.check_block(block);
                }
                if let Some(block) = else_block {
                    self.check_block(block);
                }
            }
            StmtKind::While { condition, body } => {
                self.infer_expr(condition);
                self.check_block(body);
            }
            StmtKind::ForRange {
                var, start, end, body, ..
            } => {
                self.infer_expr(start);
                self.infer_expr(end);
                self.resolver.enter_scope();
                let _ = self.resolver.define(
                    var,
                    SymbolKind::Variable,
                    Type::i32(),
                    true,
                    stmt.span.clone(),
                );
                self.check_block(body);
                self.resolver.exit_scope();
            }
            StmtKind::With { resource, body, name } => {
                self.infer_expr(resource);
                self.resolver.enter_scope();
                let _ = self.resolver.define(
                    name,
                    SymbolKind::Variable,
                    Type::Void,
                    false,
                    stmt.span.clone(),
                );
                self.check_block(body);
                self.resolver.exit_scope();
            }
            StmtKind::Unsafe(block) => self.check_block(block),
            StmtKind::Expression(e) => {
                self.infer_expr(e);
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        self.resolver.enter_scope();
        for stmt in &block.statements {
            self.check_stmt(stmt);
        }
        self.resolver.exit_scope();
    }

    /// Resolves a named type reference: primitives pass through unchanged;
    /// `Self` becomes the current impl's target type; everything else is
    /// looked up against the struct/enum/alias tables.
    pub fn resolve_named_type(&self, ty: &Type) -> Type {
        match ty {
            Type::SelfType => self.current_self_type.clone().unwrap_or(Type::SelfType),
            Type::Opaque { name } => {
                if let Some(s) = self.struct_defs.get(name) {
                    self.struct_as_type(s)
                } else if let Some(e) = self.enum_defs.get(name) {
                    Type::Enum {
                        name: e.name.clone(),
                        variants: e
                            .variants
                            .iter()
                            .map(|v| {
                                (
                                    v.name.clone(),
                                    if v.data.is_empty() {
                                        None
                                    } else {
                                        Some(v.data.iter().map(|t| self.resolve_named_type(t)).collect())
                                    },
                                )
                            })
                            .collect(),
                    }
                } else if let Some(alias) = self.type_aliases.get(name) {
                    self.resolve_named_type(&alias.ty)
                } else {
                    ty.clone()
                }
            }
            Type::Reference { mutable, inner } => Type::Reference {
                mutable: *mutable,
                inner: Box::new(self.resolve_named_type(inner)),
            },
            Type::Array { element, size } => Type::Array {
                element: Box::new(self.resolve_named_type(element)),
                size: *size,
            },
            Type::Slice { element } => Type::Slice {
                element: Box::new(self.resolve_named_type(element)),
            },
            other => other.clone(),
        }
    }

    /// Single-pass, first-match unification used for generic argument
    /// inference: a `TypeVariable` binds to whatever concrete type it's
    /// compared against first; two concrete types must already be equal.
    pub fn unify(
        &mut self,
        bindings: &mut HashMap<String, Type>,
        formal: &Type,
        actual: &Type,
        span: &pyrite_diagnostics::Span,
    ) -> bool {
        match formal {
            Type::TypeVariable { name } => {
                match bindings.get(name) {
                    Some(bound) if bound != actual => false,
                    _ => {
                        bindings.insert(name.clone(), actual.clone());
                        true
                    }
                }
            }
            _ => {
                if formal == actual {
                    true
                } else {
                    self.report(TypeError::TypeMismatch {
                        expected: formal.to_string(),
                        found: actual.to_string(),
                        span: span.clone(),
                    });
                    false
                }
            }
        }
    }

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        let ty = self.infer_expr_kind(expr);
        self.types.insert(expr.id, ty.clone());
        ty
    }

    fn infer_expr_kind(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::IntLiteral(_) => Type::i32(),
            ExprKind::FloatLiteral(_) => Type::Float(FloatWidth::W64),
            ExprKind::StringLiteral(_) => Type::String,
            ExprKind::BoolLiteral(_) => Type::Bool,
            ExprKind::CharLiteral(_) => Type::Char,
            ExprKind::Ident(name) => match self.resolver.lookup_variable(name) {
                Some(sym) => sym.ty,
                None => match self.resolver.lookup_function(name) {
                    Some(sym) => sym.ty,
                    None => {
                        self.report(TypeError::UndefinedName {
                            name: name.clone(),
                            span: expr.span.clone(),
                        });
                        Type::Void
                    }
                },
            },
            ExprKind::Binary { left, op, right } => {
                let lt = self.infer_expr(left);
                let rt = self.infer_expr(right);
                if op.is_comparison() {
                    if lt != rt {
                        self.report(TypeError::TypeMismatch {
                            expected: lt.to_string(),
                            found: rt.to_string(),
                            span: expr.span.clone(),
                        });
                    }
                    Type::Bool
                } else if matches!(op, BinaryOp::And | BinaryOp::Or) {
                    Type::Bool
                } else {
                    if lt != rt {
                        self.report(TypeError::TypeMismatch {
                            expected: lt.to_string(),
                            found: rt.to_string(),
                            span: expr.span.clone(),
                        });
                    }
                    lt
                }
            }
            ExprKind::Unary { expr: inner, .. } => self.infer_expr(inner),
            ExprKind::Call { func, args, .. } => {
                for arg in args {
                    self.infer_expr(arg);
                }
                if let ExprKind::Ident(name) = &func.kind {
                    if let Some(f) = self.functions.get(name).cloned() {
                        if f.params.len() != args.len() {
                            self.report(TypeError::WrongArity {
                                expected: f.params.len(),
                                found: args.len(),
                                span: expr.span.clone(),
                            });
                        }
                        return f
                            .return_type
                            .as_ref()
                            .map(|t| self.resolve_named_type(t))
                            .unwrap_or(Type::Void);
                    }
                    self.report(TypeError::NotAFunction {
                        name: name.clone(),
                        span: expr.span.clone(),
                    });
                }
                Type::Void
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.infer_expr(receiver);
                for arg in args {
                    self.infer_expr(arg);
                }
                self.resolve_method(&receiver_ty, method, &expr.span)
            }
            ExprKind::FieldAccess { object, field } => {
                let object_ty = self.infer_expr(object);
                match &object_ty {
                    Type::Struct { fields, name } => fields
                        .iter()
                        .find(|(f, _)| f == field)
                        .map(|(_, t)| t.clone())
                        .unwrap_or_else(|| {
                            self.report(TypeError::NoSuchField {
                                ty: name.clone(),
                                field: field.clone(),
                                span: expr.span.clone(),
                            });
                            Type::Void
                        }),
                    _ => Type::Void,
                }
            }
            ExprKind::Index { object, index } => {
                let object_ty = self.infer_expr(object);
                self.infer_expr(index);
                object_ty.inner_type().cloned().unwrap_or(Type::Void)
            }
            ExprKind::ArrayLiteral(items) => {
                let element = items
                    .first()
                    .map(|e| self.infer_expr(e))
                    .unwrap_or(Type::Void);
                for item in items.iter().skip(1) {
                    self.infer_expr(item);
                }
                Type::Array {
                    element: Box::new(element),
                    size: items.len() as u64,
                }
            }
            ExprKind::TupleLiteral(items) => {
                Type::Tuple(items.iter().map(|e| self.infer_expr(e)).collect())
            }
            ExprKind::StructLiteral { name, fields, .. } => {
                for (_, value) in fields {
                    self.infer_expr(value);
                }
                match self.struct_defs.get(name).cloned() {
                    Some(def) => {
                        for decl in &def.fields {
                            if !fields.iter().any(|(f, _)| f == &decl.name) {
                                self.report(TypeError::NoSuchField {
                                    ty: name.clone(),
                                    field: decl.name.clone(),
                                    span: expr.span.clone(),
                                });
                            }
                        }
                        for (f, _) in fields {
                            if !def.fields.iter().any(|d| &d.name == f) {
                                self.report(TypeError::NoSuchField {
                                    ty: name.clone(),
                                    field: f.clone(),
                                    span: expr.span.clone(),
                                });
                            }
                        }
                        self.struct_as_type(&def)
                    }
                    None => {
                        self.report(TypeError::UndefinedName {
                            name: name.clone(),
                            span: expr.span.clone(),
                        });
                        Type::Void
                    }
                }
            }
            ExprKind::EnumLiteral {
                enum_name,
                variant,
                data,
            } => {
                for d in data {
                    self.infer_expr(d);
                }
                match self.enum_defs.get(enum_name).cloned() {
                    Some(def) => {
                        if !def.variants.iter().any(|v| &v.name == variant) {
                            self.report(TypeError::NoSuchField {
                                ty: enum_name.clone(),
                                field: variant.clone(),
                                span: expr.span.clone(),
                            });
                        }
                        self.resolve_named_type(&Type::Opaque {
                            name: enum_name.clone(),
                        })
                    }
                    None => {
                        self.report(TypeError::UndefinedName {
                            name: enum_name.clone(),
                            span: expr.span.clone(),
                        });
                        Type::Void
                    }
                }
            }
            ExprKind::Reference { mutable, expr: inner } => {
                let inner_ty = self.infer_expr(inner);
                Type::Reference {
                    mutable: *mutable,
                    inner: Box::new(inner_ty),
                }
            }
            ExprKind::Deref(inner) => {
                let inner_ty = self.infer_expr(inner);
                inner_ty.inner_type().cloned().unwrap_or(Type::Void)
            }
            ExprKind::Match { scrutinee, arms } => {
                let scrutinee_ty = self.infer_expr(scrutinee);
                self.check_exhaustiveness(&scrutinee_ty, arms, &expr.span);
                let mut result = Type::Void;
                for (i, arm) in arms.iter().enumerate() {
                    if let Some(guard) = &arm.guard {
                        self.infer_expr(guard);
                    }
                    let arm_ty = self.infer_expr(&arm.body);
                    if i == 0 {
                        result = arm_ty;
                    }
                }
                result
            }
            ExprKind::Block { statements, tail } => {
                self.resolver.enter_scope();
                for stmt in statements {
                    self.check_stmt(stmt);
                }
                let ty = tail
                    .as_ref()
                    .map(|e| self.infer_expr(e))
                    .unwrap_or(Type::Void);
                self.resolver.exit_scope();
                ty
            }
            ExprKind::Cast { expr: inner, target_type } => {
                self.infer_expr(inner);
                self.resolve_named_type(target_type)
            }
            ExprKind::Try(inner) => {
                let result_ty = self.infer_expr(inner);
                let ok_ty = match &result_ty {
                    Type::Generic {
                        name, type_args, ..
                    } if name == "Result" && !type_args.is_empty() => type_args[0].clone(),
                    _ => {
                        self.report(TypeError::TryOnNonResultType {
                            found: result_ty.to_string(),
                            span: expr.span.clone(),
                        });
                        return result_ty;
                    }
                };
                match &self.current_return_type {
                    Some(Type::Generic { name, .. }) if name == "Result" => {}
                    other => {
                        self.report(TypeError::TryOutsideResultFunction {
                            found: other
                                .as_ref()
                                .map(|t| t.to_string())
                                .unwrap_or_else(|| "void".to_string()),
                            span: expr.span.clone(),
                        });
                    }
                }
                ok_ty
            }
            ExprKind::ParamClosure {
                params,
                return_type,
                ..
            }
            | ExprKind::RuntimeClosure {
                params,
                return_type,
                ..
            } => Type::Function {
                param_types: params.iter().map(|p| self.resolve_named_type(&p.ty)).collect(),
                return_type: return_type
                    .as_ref()
                    .map(|t| Box::new(self.resolve_named_type(t))),
            },
        }
    }

    /// Trait method resolution order (spec §4.2): inherent impl first, then
    /// any trait impl declaring the method, falling back to the trait's
    /// default body. Two matching trait impls is `AmbiguousMethod`.
    fn resolve_method(
        &mut self,
        receiver_ty: &Type,
        method: &str,
        span: &pyrite_diagnostics::Span,
    ) -> Type {
        let type_name = type_name_key(receiver_ty);

        if let Some(inherent) = self.functions.get(&format!("{}_{}", type_name, method)) {
            return inherent
                .return_type
                .as_ref()
                .map(|t| self.resolve_named_type(t))
                .unwrap_or(Type::Void);
        }

        let Some(impls) = self.trait_impls.implementations_for(&type_name) else {
            self.report(TypeError::NoSuchMethod {
                ty: type_name,
                method: method.to_string(),
                span: span.clone(),
            });
            return Type::Void;
        };

        let matches: Vec<&TraitImpl> = impls
            .values()
            .filter(|impl_block| impl_block.methods.iter().any(|m| m.name == method))
            .collect();

        match matches.len() {
            0 => {
                // Fall back to a trait default body, if any impl's trait declares one.
                for impl_block in impls.values() {
                    if let Some(trait_def) = self.trait_defs.get(&impl_block.trait_name) {
                        if let Some(tm) = trait_def.methods.iter().find(|m| m.name == method && m.body.is_some())
                        {
                            return tm
                                .return_type
                                .as_ref()
                                .map(|t| self.resolve_named_type(t))
                                .unwrap_or(Type::Void);
                        }
                    }
                }
                self.report(TypeError::NoSuchMethod {
                    ty: type_name,
                    method: method.to_string(),
                    span: span.clone(),
                });
                Type::Void
            }
            1 => matches[0]
                .methods
                .iter()
                .find(|m| m.name == method)
                .and_then(|m| m.return_type.as_ref())
                .map(|t| self.resolve_named_type(t))
                .unwrap_or(Type::Void),
            _ => {
                self.report(TypeError::AmbiguousMethod {
                    ty: type_name,
                    method: method.to_string(),
                    span: span.clone(),
                });
                Type::Void
            }
        }
    }

    /// Every enum variant must be covered, or a wildcard/ident arm must
    /// terminate the list.
    fn check_exhaustiveness(
        &mut self,
        scrutinee_ty: &Type,
        arms: &[MatchArm],
        span: &pyrite_diagnostics::Span,
    ) {
        let Type::Enum { variants, .. } = scrutinee_ty else {
            return;
        };
        let has_catch_all = arms
            .iter()
            .any(|arm| matches!(arm.pattern, Pattern::Wildcard | Pattern::Ident(_)));
        if has_catch_all {
            return;
        }
        let covered: std::collections::HashSet<&str> = arms
            .iter()
            .filter_map(|arm| match &arm.pattern {
                Pattern::Enum { variant, .. } => Some(variant.as_str()),
                _ => None,
            })
            .collect();
        for (name, _) in variants {
            if !covered.contains(name.as_str()) {
                self.report(TypeError::NonExhaustiveMatch {
                    variant: name.clone(),
                    span: span.clone(),
                });
                return;
            }
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn types_compatible(declared: &Type, inferred: &Type) -> bool {
    declared == inferred || matches!(declared, Type::TypeVariable { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_diagnostics::Span;

    fn expr(id: u32, kind: ExprKind) -> Expr {
        Expr::new(NodeId(id), Span::unknown(), kind)
    }

    #[test]
    fn struct_literal_requires_every_field() {
        let mut tc = TypeChecker::new();
        let s = Struct {
            attributes: vec![],
            name: "Point".to_string(),
            type_params: vec![],
            compile_time_params: vec![],
            fields: vec![
                FieldDecl {
                    name: "x".to_string(),
                    ty: Type::i32(),
                },
                FieldDecl {
                    name: "y".to_string(),
                    ty: Type::i32(),
                },
            ],
            methods: vec![],
            span: Span::unknown(),
        };
        tc.register_item_signature(&Item::Struct(s));

        let literal = expr(
            0,
            ExprKind::StructLiteral {
                name: "Point".to_string(),
                type_args: vec![],
                fields: vec![("x".to_string(), expr(1, ExprKind::IntLiteral(1)))],
            },
        );
        tc.infer_expr(&literal);
        assert!(tc
            .errors()
            .iter()
            .any(|e| matches!(e, TypeError::NoSuchField { field, .. } if field == "y")));
    }

    #[test]
    fn match_without_wildcard_must_cover_every_variant() {
        let mut tc = TypeChecker::new();
        let scrutinee_ty = Type::Enum {
            name: "E".to_string(),
            variants: vec![
                ("X".to_string(), None),
                ("Y".to_string(), None),
                ("Z".to_string(), None),
            ],
        };
        let arms = vec![
            MatchArm {
                pattern: Pattern::Enum {
                    name: "E".to_string(),
                    variant: "X".to_string(),
                    data: vec![],
                },
                guard: None,
                body: expr(0, ExprKind::IntLiteral(0)),
            },
            MatchArm {
                pattern: Pattern::Enum {
                    name: "E".to_string(),
                    variant: "Y".to_string(),
                    data: vec![],
                },
                guard: None,
                body: expr(1, ExprKind::IntLiteral(0)),
            },
        ];
        tc.check_exhaustiveness(&scrutinee_ty, &arms, &Span::unknown());
        assert!(matches!(
            tc.errors().first(),
            Some(TypeError::NonExhaustiveMatch { variant, .. }) if variant == "Z"
        ));
    }

    #[test]
    fn empty_enum_match_is_vacuously_exhaustive() {
        let mut tc = TypeChecker::new();
        let scrutinee_ty = Type::Enum {
            name: "Never".to_string(),
            variants: vec![],
        };
        tc.check_exhaustiveness(&scrutinee_ty, &[], &Span::unknown());
        assert!(tc.errors().is_empty());
    }
}
