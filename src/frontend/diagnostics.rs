use crate::frontend::token::Pos;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Phase::Lexical => "lexical",
            Phase::Syntax => "syntax",
            Phase::Semantic => "semantic",
        };
        write!(f, "{}", text)
    }
}

/// A single compiler diagnostic. The front-end returns it instead of exiting;
/// the driver decides what to do with it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{path}:{line}:{column}: {phase} error: {message}")]
pub struct Diagnostic {
    pub path: String,
    pub line: usize,
    pub column: usize,
    pub phase: Phase,
    pub message: String,
}

impl Diagnostic {
    pub fn new(phase: Phase, path: &str, at: Pos, message: impl Into<String>) -> Self {
        Diagnostic {
            path: path.to_string(),
            line: at.line,
            column: at.column,
            phase,
            message: message.into(),
        }
    }

    pub fn lexical(path: &str, at: Pos, message: impl Into<String>) -> Self {
        Diagnostic::new(Phase::Lexical, path, at, message)
    }

    pub fn syntax(path: &str, at: Pos, message: impl Into<String>) -> Self {
        Diagnostic::new(Phase::Syntax, path, at, message)
    }

    pub fn semantic(path: &str, at: Pos, message: impl Into<String>) -> Self {
        Diagnostic::new(Phase::Semantic, path, at, message)
    }
}
