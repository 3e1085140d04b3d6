//! Error taxonomy and eager structural validation.

use serde::{Deserialize, Serialize};

use crate::ast::{Program, SourceLocation, Span, Statement};
use crate::codegen::CodegenError;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_EXPORT_WITH_VIEW: &str = "V-ERR-EXPORT";
pub const ERR_NESTED_VIEW: &str = "V-ERR-NESTED-VIEW";
pub const ERR_DUPLICATE_STYLE: &str = "V-ERR-DUP-STYLE";
pub const ERR_DUPLICATE_STYLE_PROP: &str = "V-ERR-DUP-STYLE-PROP";
pub const ERR_CODEGEN: &str = "V-ERR-CODEGEN";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Structural,
    DuplicateStyleName,
    DuplicateStyleProperty,
    /// The rewritten tree can't be printed as JavaScript.
    Unprintable,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Any failure aborts the whole file; the caller decides whether the build goes on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message} ({file}:{line}:{column})")]
pub struct CompilerError {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl CompilerError {
    pub fn new(
        code: &str,
        kind: ErrorKind,
        message: &str,
        file: &str,
        location: SourceLocation,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            kind,
            message: message.to_string(),
            file: file.to_string(),
            line: location.line,
            column: location.column,
        }
    }

    pub fn export_with_view(file: &str, span: Span) -> Self {
        Self::new(
            ERR_EXPORT_WITH_VIEW,
            ErrorKind::Structural,
            "Views don't need to be exported! Put your exports into files without views.",
            file,
            span.start,
        )
    }

    pub fn nested_view(file: &str, outer: &str, inner: &str, span: Span) -> Self {
        Self::new(
            ERR_NESTED_VIEW,
            ErrorKind::Structural,
            &format!("Views can't be nested! view {} {{ view {} }}", outer, inner),
            file,
            span.start,
        )
    }

    pub fn duplicate_style(file: &str, view: &str, style: &str, span: Span) -> Self {
        Self::new(
            ERR_DUPLICATE_STYLE,
            ErrorKind::DuplicateStyleName,
            &format!("Duplicate style! view {} {{ {} }}", view, style),
            file,
            span.start,
        )
    }

    pub fn duplicate_style_prop(
        file: &str,
        view: &str,
        style: &str,
        prop: &str,
        span: Span,
    ) -> Self {
        Self::new(
            ERR_DUPLICATE_STYLE_PROP,
            ErrorKind::DuplicateStyleProperty,
            &format!("Duplicate style prop! view {} {{ {}.{} }}", view, style, prop),
            file,
            span.start,
        )
    }

    pub fn codegen(file: &str, err: &CodegenError, span: Span) -> Self {
        Self::new(
            ERR_CODEGEN,
            ErrorKind::Unprintable,
            &err.to_string(),
            file,
            span.start,
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURAL VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Rejects files that mix views with exports before anything is rewritten.
pub fn validate_program(file: &str, program: &Program) -> Result<(), CompilerError> {
    let has_view = program
        .body
        .iter()
        .any(|statement| matches!(statement, Statement::View(_)));

    if !has_view {
        return Ok(());
    }

    for statement in &program.body {
        if let Statement::Export { span, .. } = statement {
            return Err(CompilerError::export_with_view(file, *span));
        }
    }

    Ok(())
}
