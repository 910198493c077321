//! TypeScript/TSX lexer for detype.
//!
//! Produces a lossless stream of classified tokens: whitespace, newlines and
//! comments are tokens, so the stripper can rebuild output by concatenating
//! the tokens it keeps. The lexer resolves the ambiguities that text-level
//! rewriting cannot:
//!
//! - `<` as type-argument bracket vs. relational operator vs. JSX tag
//! - postfix `!` (non-null assertion) vs. negation
//! - `/` as division vs. regular expression
//! - template literals, whose interpolations are lexed as code

mod context;
mod lexer;
mod scan;

#[cfg(test)]
mod tests;

pub use context::{Bracket, UnclosedBracket};
pub use lexer::{lex, tokenize, Lexed, Lexer};
