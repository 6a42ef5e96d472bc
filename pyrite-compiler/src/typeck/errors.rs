use pyrite_diagnostics::{error_codes, Diagnostic, Span};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("mismatched types: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("cannot find `{name}` in this scope")]
    UndefinedName { name: String, span: Span },
    #[error("`{name}` is not a function")]
    NotAFunction { name: String, span: Span },
    #[error("expected {expected} argument(s), found {found}")]
    WrongArity {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("no field `{field}` on type `{ty}`")]
    NoSuchField {
        ty: String,
        field: String,
        span: Span,
    },
    #[error("no method `{method}` on type `{ty}`")]
    NoSuchMethod {
        ty: String,
        method: String,
        span: Span,
    },
    #[error("multiple applicable trait implementations provide `{method}` for `{ty}`")]
    AmbiguousMethod {
        ty: String,
        method: String,
        span: Span,
    },
    #[error("match is not exhaustive: missing variant `{variant}`")]
    NonExhaustiveMatch { variant: String, span: Span },
    #[error("the trait bound `{ty}: {trait_name}` is not satisfied")]
    TraitBoundUnsatisfied {
        ty: String,
        trait_name: String,
        span: Span,
    },
    #[error("cycle detected while resolving type alias `{name}`")]
    CycleInTypeAlias { name: String, span: Span },
    #[error("the `?` operator can only be used on a value of type `Result<T, E>`, found `{found}`")]
    TryOnNonResultType { found: String, span: Span },
    #[error("the `?` operator can only be used in a function that returns `Result<_, E>`, found `{found}`")]
    TryOutsideResultFunction { found: String, span: Span },
}

impl TypeError {
    pub fn span(&self) -> &Span {
        match self {
            TypeError::TypeMismatch { span, .. }
            | TypeError::UndefinedName { span, .. }
            | TypeError::NotAFunction { span, .. }
            | TypeError::WrongArity { span, .. }
            | TypeError::NoSuchField { span, .. }
            | TypeError::NoSuchMethod { span, .. }
            | TypeError::AmbiguousMethod { span, .. }
            | TypeError::NonExhaustiveMatch { span, .. }
            | TypeError::TraitBoundUnsatisfied { span, .. }
            | TypeError::CycleInTypeAlias { span, .. }
            | TypeError::TryOnNonResultType { span, .. }
            | TypeError::TryOutsideResultFunction { span, .. } => span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let span = self.span().clone();
        match self {
            TypeError::TypeMismatch {
                expected, found, ..
            } => Diagnostic::error(
                error_codes::TYPE_MISMATCH,
                "mismatched types".to_string(),
                span,
            )
            .with_note(format!("expected `{}`, found `{}`", expected, found)),
            TypeError::UndefinedName { name, .. } => Diagnostic::error(
                error_codes::UNDEFINED_NAME,
                format!("cannot find `{}` in this scope", name),
                span,
            ),
            TypeError::NotAFunction { name, .. } => Diagnostic::error(
                error_codes::NOT_CALLABLE,
                format!("`{}` is not callable", name),
                span,
            ),
            TypeError::WrongArity {
                expected, found, ..
            } => Diagnostic::error(
                error_codes::WRONG_ARITY,
                format!(
                    "this call takes {} argument(s) but {} were supplied",
                    expected, found
                ),
                span,
            ),
            TypeError::NoSuchField { ty, field, .. } => Diagnostic::error(
                error_codes::NO_SUCH_FIELD,
                format!("no field `{}` on type `{}`", field, ty),
                span,
            ),
            TypeError::NoSuchMethod { ty, method, .. } => Diagnostic::error(
                error_codes::NO_SUCH_METHOD,
                format!("no method `{}` on type `{}`", method, ty),
                span,
            ),
            TypeError::AmbiguousMethod { ty, method, .. } => Diagnostic::error(
                error_codes::AMBIGUOUS_METHOD,
                format!(
                    "multiple trait implementations provide `{}` for `{}`",
                    method, ty
                ),
                span,
            ),
            TypeError::NonExhaustiveMatch { variant, .. } => Diagnostic::error(
                error_codes::NON_EXHAUSTIVE,
                "match is not exhaustive".to_string(),
                span,
            )
            .with_note(format!("variant `{}` is not covered", variant)),
            TypeError::TraitBoundUnsatisfied {
                ty, trait_name, ..
            } => Diagnostic::error(
                error_codes::TRAIT_BOUNDS_NOT_MET,
                format!("the trait bound `{}: {}` is not satisfied", ty, trait_name),
                span,
            ),
            TypeError::CycleInTypeAlias { name, .. } => Diagnostic::error(
                error_codes::CYCLE_IN_TYPE_ALIAS,
                format!("cycle detected while resolving type alias `{}`", name),
                span,
            ),
            TypeError::TryOnNonResultType { found, .. } => Diagnostic::error(
                error_codes::TYPE_MISMATCH,
                "the `?` operator can only be used on a `Result<T, E>`".to_string(),
                span,
            )
            .with_note(format!("found `{}`", found)),
            TypeError::TryOutsideResultFunction { found, .. } => Diagnostic::error(
                error_codes::RETURN_TYPE,
                "the `?` operator can only be used in a function returning `Result<_, E>`".to_string(),
                span,
            )
            .with_note(format!("this function returns `{}`", found)),
        }
    }
}
