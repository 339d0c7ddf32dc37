//! Diagnostic codes and severities produced by the frontend.

use std::path::PathBuf;

/// Every diagnostic the frontend can emit. The names double as the stable
/// code strings surfaced to suppression lists and the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagCode {
    MissingInclude,
    UnknownDirective,
    DuplicateDefinition,
    UnknownModule,
    UnbalancedConditional,
}

impl DiagCode {
    pub fn name(self) -> &'static str {
        match self {
            DiagCode::MissingInclude => "MissingInclude",
            DiagCode::UnknownDirective => "UnknownDirective",
            DiagCode::DuplicateDefinition => "DuplicateDefinition",
            DiagCode::UnknownModule => "UnknownModule",
            DiagCode::UnbalancedConditional => "UnbalancedConditional",
        }
    }

    pub fn default_severity(self) -> DiagSeverity {
        match self {
            DiagCode::MissingInclude
            | DiagCode::UnknownDirective
            | DiagCode::DuplicateDefinition
            | DiagCode::UnbalancedConditional => DiagSeverity::Error,
            DiagCode::UnknownModule => DiagSeverity::Warning,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MissingInclude" => Some(DiagCode::MissingInclude),
            "UnknownDirective" => Some(DiagCode::UnknownDirective),
            "DuplicateDefinition" => Some(DiagCode::DuplicateDefinition),
            "UnknownModule" => Some(DiagCode::UnknownModule),
            "UnbalancedConditional" => Some(DiagCode::UnbalancedConditional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagSeverity {
    Error,
    Fatal,
    Warning,
    Note,
    Ignored,
}

/// A frontend diagnostic. Line and column are 1-based; a line of 0 marks a
/// diagnostic without a usable source location.
#[derive(Debug, Clone)]
pub struct Diag {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub code: DiagCode,
    pub message: String,
}

impl Diag {
    pub fn new(
        path: PathBuf,
        line: usize,
        column: usize,
        code: DiagCode,
        message: String,
    ) -> Self {
        Self {
            path,
            line,
            column,
            code,
            message,
        }
    }
}

/// A suppression directive collected from source comments: the named code is
/// dropped on the directive's line (line scope) or anywhere in its file
/// (file scope).
#[derive(Debug, Clone)]
pub struct SuppressionDirective {
    pub path: PathBuf,
    pub line: usize,
    pub code: DiagCode,
}
