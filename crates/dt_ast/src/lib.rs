//! Shared data model for detype.
//!
//! - [`token`]: classified lexemes produced by the lexer
//! - [`span`]: type-only token ranges found by the stripper, and their counts
//! - [`warning`]: constructs the stripper refused to guess at
//! - [`error`]: fatal per-file errors
//! - [`DtSyntax`]: dialect flags derived from the file name

pub mod error;
pub mod span;
pub mod token;
pub mod warning;

pub use error::{LexError, LexErrorKind, TransformError};
pub use span::{SpanCounts, TypeSpan, TypeSpanKind};
pub use token::{is_keyword, Punct, TemplatePart, Token, TokenKind};
pub use warning::{AmbiguityReason, AmbiguousConstruct};

use serde::{Deserialize, Serialize};

/// Dialect flags controlling how the lexer treats `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DtSyntax {
    /// Recognise JSX elements in expression position (`.tsx`/`.jsx`).
    pub jsx: bool,
}

impl DtSyntax {
    /// Pick the dialect from a file name hint.
    pub fn for_filename(filename: &str) -> Self {
        let lower = filename.to_ascii_lowercase();
        Self {
            jsx: lower.ends_with(".tsx") || lower.ends_with(".jsx"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_follows_extension() {
        assert!(DtSyntax::for_filename("src/App.tsx").jsx);
        assert!(DtSyntax::for_filename("Page.JSX").jsx);
        assert!(!DtSyntax::for_filename("lib/api.ts").jsx);
        assert!(!DtSyntax::for_filename("types.d.ts").jsx);
    }
}
