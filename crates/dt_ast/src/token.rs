//! Token types for the detype lexer.

use serde::Serialize;

/// Every lexeme class the lexer produces.
///
/// Whitespace, newlines and comments are tokens too, so concatenating the
/// text of every token reproduces the source exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuator(Punct),
    StringLiteral,
    TemplateLiteral(TemplatePart),
    RegexLiteral,
    NumberLiteral,
    Comment,
    Whitespace,
    Newline,
    /// Text between JSX tags.
    JsxText,
    /// Anything lexed inside a JSX tag, plus the braces of `{...}` containers.
    JsxTag,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    pub fn is_jsx(self) -> bool {
        matches!(self, TokenKind::JsxText | TokenKind::JsxTag)
    }
}

/// Refinement of punctuator tokens the lexer can decide on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Punct {
    /// Any operator or delimiter, including relational `<` and `>`.
    Operator,
    /// `<` opening a type parameter/argument list.
    TypeArgsOpen,
    /// `>` closing a type parameter/argument list.
    TypeArgsClose,
    /// Postfix `!` on an operand (`a!.b`).
    NonNullAssertion,
}

/// Position of a literal chunk inside a template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TemplatePart {
    /// `` `abc` ``
    NoSubstitution,
    /// `` `abc${ ``
    Head,
    /// `}abc${`
    Middle,
    /// `` }abc` ``
    Tail,
}

/// A single classified lexeme. `text` borrows the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
    /// 1-based line of `start`.
    pub line: u32,
    /// 1-based column (in chars) of `start`.
    pub column: u32,
}

impl<'src> Token<'src> {
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Punctuator with exactly this text (any [`Punct`] refinement).
    pub fn is_punct(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Punctuator(_)) && self.text == text
    }

    /// Plain operator punctuator with exactly this text.
    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuator(Punct::Operator) && self.text == text
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    /// Identifier or keyword with exactly this text.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword) && self.text == word
    }

    pub fn is_type_args_open(&self) -> bool {
        self.kind == TokenKind::Punctuator(Punct::TypeArgsOpen)
    }

    pub fn is_type_args_close(&self) -> bool {
        self.kind == TokenKind::Punctuator(Punct::TypeArgsClose)
    }

    pub fn is_non_null(&self) -> bool {
        self.kind == TokenKind::Punctuator(Punct::NonNullAssertion)
    }

    /// Whether this token can be the last token of an operand, so that a
    /// following `/` divides and a following `<` compares.
    pub fn ends_operand(&self) -> bool {
        match self.kind {
            TokenKind::Identifier
            | TokenKind::NumberLiteral
            | TokenKind::StringLiteral
            | TokenKind::RegexLiteral => true,
            // Only the `>` or `/>` that ends an element; `{` opens a container.
            TokenKind::JsxTag => matches!(self.text, ">" | "/>"),
            TokenKind::TemplateLiteral(part) => {
                matches!(part, TemplatePart::NoSubstitution | TemplatePart::Tail)
            }
            TokenKind::Keyword => {
                matches!(self.text, "this" | "super" | "true" | "false" | "null")
            }
            TokenKind::Punctuator(Punct::Operator) => matches!(self.text, ")" | "]" | "}"),
            TokenKind::Punctuator(Punct::NonNullAssertion | Punct::TypeArgsClose) => true,
            TokenKind::Punctuator(Punct::TypeArgsOpen) => false,
            TokenKind::Comment | TokenKind::Whitespace | TokenKind::Newline | TokenKind::JsxText => {
                false
            }
        }
    }
}

/// Reserved words classified as [`TokenKind::Keyword`].
///
/// Contextual TypeScript words (`type`, `as`, `satisfies`, `declare`,
/// `readonly`, `keyof`, ...) stay identifiers; the stripper matches them by
/// text where their position makes them keywords.
const KEYWORDS: &[&str] = &[
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}
