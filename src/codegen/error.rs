//! Codegen-time diagnostics. Every condition here is one the semantic
//! analyzer is already expected to have ruled out; reaching one means an
//! internal invariant between `crate::semantic` and `crate::codegen` was
//! violated, not a user-facing mistake in the source program.

use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenError {
    pub message: String,
}

impl Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal codegen error: {}", self.message)
    }
}

impl std::error::Error for CodegenError {}

impl CodegenError {
    pub fn new(message: impl Into<String>) -> Self {
        CodegenError {
            message: message.into(),
        }
    }
}
