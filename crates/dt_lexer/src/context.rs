//! Bracket context tracked by the lexer.

use serde::Serialize;

/// Kind of an open bracket on the lexer's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bracket {
    Paren,
    Brace,
    Square,
    AngleTypeArgs,
    /// Inside `<name ...>` or `</name>`.
    JsxTag { closing: bool },
    /// Between an opening and a closing tag.
    JsxChildren,
    /// `{...}` inside a tag or between tags.
    JsxExpr,
    /// `${...}` inside a template literal.
    TemplateSubst,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub bracket: Bracket,
    /// Everything lexed in this frame is type syntax, so `<` always opens
    /// type arguments and JSX is never recognised.
    pub type_context: bool,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

/// A bracket still open at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnclosedBracket {
    pub bracket: Bracket,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl From<&Frame> for UnclosedBracket {
    fn from(frame: &Frame) -> Self {
        Self {
            bracket: frame.bracket,
            offset: frame.offset,
            line: frame.line,
            column: frame.column,
        }
    }
}
