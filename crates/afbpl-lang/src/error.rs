use thiserror::Error;

/// Error codes prefixed by phase: B = startup, X = syntax, S = semantic,
/// C = control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Startup
    B001, // start marker count is not exactly one
    B002, // first non-blank line after the start marker is not indented

    // Syntax
    X001, // output argument is not a single double-quoted string
    X002, // output variable not separated from the keyword by one space
    X003, // input destination variable missing
    X004, // declaration is not of the form `нека <име> {е|=} <стойност>`
    X005, // declaration value is neither a variable, a string, nor a number
    X006, // conditional phrase has no comparison operator
    X007, // goto without a label name

    // Semantic
    S001, // unknown variable
    S002, // literal does not match the compared variable's type
    S003, // neither comparison operand is a known variable
    S004, // unknown label

    // Control
    C001, // reached `начало` again before `край`
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B001 => "B001",
            Self::B002 => "B002",
            Self::X001 => "X001",
            Self::X002 => "X002",
            Self::X003 => "X003",
            Self::X004 => "X004",
            Self::X005 => "X005",
            Self::X006 => "X006",
            Self::X007 => "X007",
            Self::S001 => "S001",
            Self::S002 => "S002",
            Self::S003 => "S003",
            Self::S004 => "S004",
            Self::C001 => "C001",
        }
    }

    /// Startup errors are reported before any instruction runs; the engine
    /// never reaches the ready state.
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::B001 | Self::B002)
    }
}

/// A fatal diagnostic. `line` is a zero-based instruction index; `span` is a
/// byte range within that line, when the offending text can be pinpointed.
#[derive(Debug, Clone, Error)]
#[error("[{}] ред {}: {message}", .code.as_str(), .line + 1)]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub span: Option<(usize, usize)>,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, message: impl Into<String>) -> Self {
        Self { code, line, span: None, message: message.into() }
    }

    pub fn with_span(code: ErrorCode, line: usize, span: (usize, usize), message: impl Into<String>) -> Self {
        Self { code, line, span: Some(span), message: message.into() }
    }
}
