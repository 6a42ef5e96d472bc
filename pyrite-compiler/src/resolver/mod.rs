//! Symbol resolver (spec §4.1): lexically scoped name resolution.

use pyrite_ast::Type;
use pyrite_diagnostics::{error_codes, Diagnostic, Span};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    Type,
    Const,
    Trait,
    ImplMethod,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub span: Span,
    pub mutable: bool,
}

#[derive(Debug, Default)]
struct ScopeData {
    symbols: HashMap<String, Symbol>,
    parent: Option<Rc<RefCell<ScopeData>>>,
}

/// A lexical scope tree node. Cloning a `Scope` handle clones the `Rc`, not
/// the underlying map — the same pattern the resolver uses throughout to
/// share parent frames between sibling child scopes.
#[derive(Debug, Clone)]
pub struct Scope(Rc<RefCell<ScopeData>>);

impl Scope {
    pub fn root() -> Self {
        Scope(Rc::new(RefCell::new(ScopeData::default())))
    }

    pub fn child(&self) -> Self {
        Scope(Rc::new(RefCell::new(ScopeData {
            symbols: HashMap::new(),
            parent: Some(self.0.clone()),
        })))
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.0.clone();
        loop {
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => {
                    depth += 1;
                    current = p;
                }
                None => return depth,
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot find `{name}` in this scope")]
    UndefinedName { name: String, span: Span },
    #[error("the name `{name}` is defined multiple times")]
    Redeclaration { name: String, span: Span },
    #[error("`{name}` is not a type")]
    NotAType { name: String, span: Span },
    #[error("`{name}` is not callable")]
    NotACallable { name: String, span: Span },
}

impl ResolveError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UndefinedName { name, span } => Diagnostic::error(
                error_codes::UNDEFINED_NAME,
                format!("cannot find `{}` in this scope", name),
                span.clone(),
            ),
            ResolveError::Redeclaration { name, span } => Diagnostic::error(
                error_codes::REDECLARATION,
                format!("the name `{}` is defined multiple times", name),
                span.clone(),
            ),
            ResolveError::NotAType { name, span } => Diagnostic::error(
                error_codes::NOT_A_TYPE,
                format!("`{}` is not a type", name),
                span.clone(),
            ),
            ResolveError::NotACallable { name, span } => Diagnostic::error(
                error_codes::NOT_CALLABLE,
                format!("`{}` is not callable", name),
                span.clone(),
            ),
        }
    }
}

/// Drives scope push/pop and name definition/lookup over a single function
/// or program walk. Functions may not shadow an existing function in the
/// same scope; variables may shadow anything (inner binding wins).
pub struct Resolver {
    current: Scope,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            current: Scope::root(),
        }
    }

    pub fn enter_scope(&mut self) {
        self.current = self.current.child();
    }

    pub fn exit_scope(&mut self) {
        let parent = self.current.0.borrow().parent.clone();
        if let Some(parent) = parent {
            self.current = Scope(parent);
        }
    }

    pub fn current_depth(&self) -> usize {
        self.current.depth()
    }

    pub fn define(
        &mut self,
        name: &str,
        kind: SymbolKind,
        ty: Type,
        mutable: bool,
        span: Span,
    ) -> Result<(), ResolveError> {
        let mut scope = self.current.0.borrow_mut();
        if let Some(existing) = scope.symbols.get(name) {
            let shadowing_allowed = matches!(kind, SymbolKind::Variable | SymbolKind::Parameter)
                && matches!(existing.kind, SymbolKind::Variable | SymbolKind::Parameter);
            if !shadowing_allowed {
                return Err(ResolveError::Redeclaration {
                    name: name.to_string(),
                    span,
                });
            }
        }
        scope.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind,
                ty,
                span,
                mutable,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let mut frame = Some(self.current.0.clone());
        while let Some(scope) = frame {
            let borrowed = scope.borrow();
            if let Some(symbol) = borrowed.symbols.get(name) {
                return Some(symbol.clone());
            }
            frame = borrowed.parent.clone();
        }
        None
    }

    pub fn lookup_kind(&self, name: &str, kind: SymbolKind) -> Option<Symbol> {
        self.lookup(name).filter(|s| s.kind == kind)
    }

    pub fn lookup_type(&self, name: &str) -> Option<Symbol> {
        self.lookup_kind(name, SymbolKind::Type)
    }

    pub fn lookup_variable(&self, name: &str) -> Option<Symbol> {
        self.lookup(name)
            .filter(|s| matches!(s.kind, SymbolKind::Variable | SymbolKind::Parameter))
    }

    pub fn lookup_function(&self, name: &str) -> Option<Symbol> {
        self.lookup_kind(name, SymbolKind::Function)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut r = Resolver::new();
        r.define(
            "x",
            SymbolKind::Variable,
            Type::i32(),
            false,
            Span::unknown(),
        )
        .unwrap();
        r.enter_scope();
        r.define(
            "x",
            SymbolKind::Variable,
            Type::String,
            true,
            Span::unknown(),
        )
        .unwrap();
        assert_eq!(r.lookup("x").unwrap().ty, Type::String);
        r.exit_scope();
        assert_eq!(r.lookup("x").unwrap().ty, Type::i32());
    }

    #[test]
    fn redeclaring_a_function_in_the_same_scope_errors() {
        let mut r = Resolver::new();
        r.define(
            "f",
            SymbolKind::Function,
            Type::Function {
                param_types: vec![],
                return_type: None,
            },
            false,
            Span::unknown(),
        )
        .unwrap();
        let err = r.define(
            "f",
            SymbolKind::Function,
            Type::Function {
                param_types: vec![],
                return_type: None,
            },
            false,
            Span::unknown(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn undefined_lookup_returns_none() {
        let r = Resolver::new();
        assert!(r.lookup("nope").is_none());
    }
}
