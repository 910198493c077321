//! Fatal per-file errors. Either one means the file is left unmodified.

use serde::Serialize;

use crate::span::TypeSpanKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated template literal")]
    UnterminatedTemplate,
    #[error("unterminated regular expression")]
    UnterminatedRegex,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} at {line}:{column} (offset {offset})")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum TransformError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("unterminated {kind} starting at {line}:{column} (offset {start_offset})")]
    UnterminatedConstruct {
        kind: TypeSpanKind,
        start_offset: usize,
        line: u32,
        column: u32,
    },
}

impl TransformError {
    /// Byte offset the error points at.
    pub fn offset(&self) -> usize {
        match self {
            TransformError::Lex(err) => err.offset,
            TransformError::UnterminatedConstruct { start_offset, .. } => *start_offset,
        }
    }
}
