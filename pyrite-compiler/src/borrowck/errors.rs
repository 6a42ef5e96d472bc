use pyrite_diagnostics::{error_codes, Diagnostic, Span};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BorrowError {
    #[error("cannot borrow `{name}` as shared because it is also borrowed as exclusive")]
    BorrowWhileExclusivelyBorrowed {
        name: String,
        span: Span,
        exclusive_span: Span,
    },
    #[error("cannot borrow `{name}` as exclusive because it is also borrowed as shared")]
    ExclusiveBorrowWhileAliased {
        name: String,
        span: Span,
        shared_span: Span,
    },
    #[error("`{name}`'s referent does not live long enough")]
    ReferenceOutlivesReferent { name: String, span: Span },
}

impl BorrowError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BorrowError::BorrowWhileExclusivelyBorrowed {
                name,
                span,
                exclusive_span,
            } => Diagnostic::error(
                error_codes::BORROW_WHILE_EXCLUSIVE,
                format!(
                    "cannot borrow `{}` as shared because it is also borrowed as exclusive",
                    name
                ),
                span.clone(),
            )
            .with_related(exclusive_span.clone(), "exclusive borrow occurs here".to_string()),
            BorrowError::ExclusiveBorrowWhileAliased {
                name,
                span,
                shared_span,
            } => Diagnostic::error(
                error_codes::EXCLUSIVE_BORROW_WHILE_ALIASED,
                format!(
                    "cannot borrow `{}` as exclusive because it is also borrowed as shared",
                    name
                ),
                span.clone(),
            )
            .with_related(shared_span.clone(), "shared borrow occurs here".to_string()),
            BorrowError::ReferenceOutlivesReferent { name, span } => Diagnostic::error(
                error_codes::REFERENCE_OUTLIVES_REFERENT,
                format!("`{}`'s referent does not live long enough", name),
                span.clone(),
            ),
        }
    }
}
