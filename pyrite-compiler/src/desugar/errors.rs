use pyrite_diagnostics::{error_codes, Diagnostic, Span};

#[derive(Debug, Clone, thiserror::Error)]
pub enum DesugarError {
    #[error("inlining `{closure}` exceeded the closure inline budget")]
    ClosureInlineBudget { closure: String, span: Span },
}

impl DesugarError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DesugarError::ClosureInlineBudget { closure, span } => Diagnostic::error(
                error_codes::CLOSURE_INLINE_BUDGET,
                format!(
                    "inlining `{}` exceeded the maximum inline depth or body size",
                    closure
                ),
                span.clone(),
            ),
        }
    }
}
