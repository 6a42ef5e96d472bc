use pyrite_diagnostics::{error_codes, Diagnostic, Span};

#[derive(Debug, Clone, thiserror::Error)]
pub enum OwnershipError {
    #[error("use of moved value: `{name}`")]
    UseAfterMove {
        name: String,
        moved_into: Option<String>,
        use_span: Span,
        move_span: Span,
    },
    #[error("cannot assign to immutable variable `{name}`")]
    AssignToImmutable { name: String, span: Span },
    #[error("cannot move `{name}` out of a borrowed value")]
    MoveOutOfBorrowed { name: String, span: Span },
}

impl OwnershipError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            OwnershipError::UseAfterMove {
                name,
                moved_into,
                use_span,
                move_span,
            } => {
                let mut diag = Diagnostic::error(
                    error_codes::USE_AFTER_MOVE,
                    format!("use of moved value: `{}`", name),
                    use_span.clone(),
                )
                .with_related(move_span.clone(), "value moved here".to_string());
                if let Some(target) = moved_into {
                    diag = diag.with_note(format!("value moved into `{}` here", target));
                }
                diag
            }
            OwnershipError::AssignToImmutable { name, span } => Diagnostic::error(
                error_codes::IMMUTABLE_ASSIGN,
                format!("cannot assign to immutable variable `{}`", name),
                span.clone(),
            ),
            OwnershipError::MoveOutOfBorrowed { name, span } => Diagnostic::error(
                error_codes::MOVE_OUT_OF_BORROWED,
                format!("cannot move `{}` out of a borrowed value", name),
                span.clone(),
            ),
        }
    }
}
