use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Message templates for the diagnostics produced by the type core.
///
/// The numeric code of a template never changes once released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagCode {
    UndefinedSymbol,
    AmbiguousSymbol,
    BadId,
    DuplicateDefinition,
    NoMembers,
    Cancelled,
}

impl DiagCode {
    pub fn number(self) -> u32 {
        match self {
            DiagCode::UndefinedSymbol => 101,
            DiagCode::AmbiguousSymbol => 102,
            DiagCode::BadId => 103,
            DiagCode::DuplicateDefinition => 104,
            DiagCode::NoMembers => 105,
            DiagCode::Cancelled => 106,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::UndefinedSymbol => "E-UNDEFINED",
            DiagCode::AmbiguousSymbol => "E-AMBIGUOUS",
            DiagCode::BadId => "E-BAD-ID",
            DiagCode::DuplicateDefinition => "E-DUPLICATE",
            DiagCode::NoMembers => "E-NO-MEMBERS",
            DiagCode::Cancelled => "E-CANCELLED",
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub message: String,
    pub span: Option<Span>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagCode, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            source: None,
        }
    }

    pub fn undefined_symbol(name: &str, span: Option<Span>) -> Self {
        Self::new(
            DiagCode::UndefinedSymbol,
            format!("undefined symbol: {name}"),
            span,
        )
    }

    pub fn ambiguous_symbol(name: &str, candidates: &[String], span: Option<Span>) -> Self {
        Self::new(
            DiagCode::AmbiguousSymbol,
            format!(
                "ambiguous symbol: {name} could be {}",
                candidates.join(" or ")
            ),
            span,
        )
    }

    pub fn bad_id(name: &str, detail: &str, span: Option<Span>) -> Self {
        Self::new(DiagCode::BadId, format!("bad identifier {name}: {detail}"), span)
    }

    pub fn duplicate_definition(name: &str, span: Option<Span>) -> Self {
        Self::new(
            DiagCode::DuplicateDefinition,
            format!("duplicate or conflicting type definition: {name}"),
            span,
        )
    }

    pub fn no_members(name: &str, span: Option<Span>) -> Self {
        Self::new(
            DiagCode::NoMembers,
            format!("type has no members: {name}"),
            span,
        )
    }

    pub fn cancelled(span: Option<Span>) -> Self {
        Self::new(DiagCode::Cancelled, "canonization was cancelled", span)
    }

    pub fn hint(&self) -> Option<&'static str> {
        hint_for_code(self.code)
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = self.hint();
        if let Some(source) = self.source() {
            write!(f, "{}: ", source)?;
        }
        write!(f, "error[{}] {}: {}", self.code.number(), self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}:{}", span.line, span.column)?;
        }
        if let Some(hint) = hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

pub fn hint_for_code(code: DiagCode) -> Option<&'static str> {
    match code {
        DiagCode::UndefinedSymbol => Some("check that the type or constant is declared"),
        DiagCode::AmbiguousSymbol => Some("qualify the name with its namespace"),
        DiagCode::BadId => Some("enumerations accept constants and ranges only"),
        DiagCode::DuplicateDefinition => Some("rename one of the conflicting declarations"),
        DiagCode::NoMembers => Some("a type must contain at least one value"),
        DiagCode::Cancelled => None,
    }
}
