/// Internal-compiler-error type: every failure here means an earlier stage
/// let through an ill-typed or ownership-invalid program (spec §4.7 — "a
/// well-typed, ownership-valid program must generate without error").
#[derive(Debug, Clone, thiserror::Error)]
#[error("internal compiler error: {0}")]
pub struct CodegenError(pub String);

impl CodegenError {
    pub fn new(message: impl Into<String>) -> Self {
        CodegenError(message.into())
    }
}

impl From<String> for CodegenError {
    fn from(message: String) -> Self {
        CodegenError(message)
    }
}
