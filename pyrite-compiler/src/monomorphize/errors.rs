use pyrite_diagnostics::{error_codes, Diagnostic, Span};

#[derive(Debug, Clone, thiserror::Error)]
pub enum MonoError {
    #[error("compile-time argument to `{function}` is not a literal")]
    NonLiteralCompileTimeArgument { function: String, span: Span },
    #[error("monomorphization of `{function}` did not terminate")]
    MonomorphizationNonTermination { function: String, span: Span },
}

impl MonoError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            MonoError::NonLiteralCompileTimeArgument { function, span } => Diagnostic::error(
                error_codes::NON_LITERAL_COMPILE_TIME_ARG,
                format!(
                    "compile-time argument to `{}` is not a literal integer or boolean",
                    function
                ),
                span.clone(),
            ),
            MonoError::MonomorphizationNonTermination { function, span } => Diagnostic::error(
                error_codes::MONOMORPHIZATION_NON_TERMINATION,
                format!("monomorphization of `{}` did not terminate", function),
                span.clone(),
            ),
        }
    }
}
