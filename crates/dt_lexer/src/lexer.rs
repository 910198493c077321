//! Core lexer implementation.
//!
//! The lexer keeps a stack of open brackets so that it knows which mode it
//! is in (code, JSX tag, JSX children) and whether the current position is
//! type syntax. An ambiguous `<` is resolved by lexing ahead speculatively
//! as a type-argument list: if the lookahead stays type-shaped and the list
//! closes with a plausible follower, the buffered tokens are committed;
//! otherwise the lexer rewinds and treats `<` as an operator or JSX tag.

use std::collections::VecDeque;

use dt_ast::{is_keyword, DtSyntax, LexError, LexErrorKind, Punct, TemplatePart, Token, TokenKind};
use tracing::trace;

use crate::context::{Bracket, Frame, UnclosedBracket};
use crate::scan::{is_ident_continue, is_ident_start, skip_trivia, word_at};

/// Multi-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", "**=", "<<=", ">>=", ">>>", "...", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Reserved words that may appear inside a type-argument list.
const TYPE_KEYWORDS: &[&str] = &[
    "extends", "typeof", "this", "new", "void", "null", "true", "false", "import", "in",
];

/// Words that keep a type alias going onto the next line.
const TYPE_CONTINUATION_WORDS: &[&str] = &["extends", "keyof", "typeof", "infer", "readonly", "unique", "new"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    JsxTag,
    JsxChildren,
}

/// How a speculative type-argument list is validated.
#[derive(Debug, Clone, Copy)]
struct AngleSite {
    /// Declaration site: defaults (`<T = X>`) are allowed and the follower
    /// is not checked.
    declaration: bool,
    check_follower: bool,
    /// Generic arrow in TSX: the list must be followed by `(`.
    require_paren: bool,
}

#[derive(Clone)]
struct Checkpoint<'src> {
    pos: usize,
    line: u32,
    column: u32,
    stack: Vec<Frame>,
    recent: [Option<Token<'src>>; 3],
    trivia_since_sig: bool,
    pending_type_body: bool,
    alias_depth: Option<usize>,
}

/// Streaming lexer over a TypeScript/TSX source string.
///
/// Yields every token, trivia included. After the iterator is exhausted,
/// [`Lexer::unclosed`] lists brackets still open at end of input.
pub struct Lexer<'src> {
    source: &'src str,
    syntax: DtSyntax,
    pos: usize,
    line: u32,
    column: u32,
    stack: Vec<Frame>,
    /// The last three significant tokens, newest last.
    recent: [Option<Token<'src>>; 3],
    trivia_since_sig: bool,
    /// Tokens lexed ahead during a committed speculation.
    pending: VecDeque<Token<'src>>,
    /// Set by `interface`; the next `{` opens a type body.
    pending_type_body: bool,
    /// Stack depth of an active `type X = ...` alias.
    alias_depth: Option<usize>,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, syntax: DtSyntax) -> Self {
        Self {
            source,
            syntax,
            pos: 0,
            line: 1,
            column: 1,
            stack: Vec::new(),
            recent: [None, None, None],
            trivia_since_sig: false,
            pending: VecDeque::new(),
            pending_type_body: false,
            alias_depth: None,
            done: false,
        }
    }

    /// Brackets still open at the current position, outermost first.
    pub fn unclosed(&self) -> Vec<UnclosedBracket> {
        self.stack.iter().map(UnclosedBracket::from).collect()
    }

    // ---- character cursor ----

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' || (c == '\r' && self.peek() != Some('\n')) {
            self.line += 1;
            self.column = 1;
        } else if c != '\r' {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    // ---- token bookkeeping ----

    fn prev(&self) -> Option<&Token<'src>> {
        self.recent[2].as_ref()
    }

    fn finish(&mut self, kind: TokenKind, start: usize, line: u32, column: u32) -> Token<'src> {
        let token = Token {
            kind,
            text: &self.source[start..self.pos],
            start,
            end: self.pos,
            line,
            column,
        };
        self.note(&token);
        token
    }

    fn note(&mut self, token: &Token<'src>) {
        if token.is_trivia() {
            self.trivia_since_sig = true;
            if token.kind == TokenKind::Newline
                && self.alias_depth == Some(self.stack.len())
                && !self.alias_continues()
            {
                self.alias_depth = None;
            }
            return;
        }

        if token.is_op(";") && self.alias_depth == Some(self.stack.len()) {
            self.alias_depth = None;
        }
        self.recent.rotate_left(1);
        self.recent[2] = Some(token.clone());
        self.trivia_since_sig = false;
    }

    fn error(&self, kind: LexErrorKind, offset: usize, line: u32, column: u32) -> LexError {
        LexError {
            kind,
            offset,
            line,
            column,
        }
    }

    fn mode(&self) -> Mode {
        match self.stack.last().map(|f| f.bracket) {
            Some(Bracket::JsxTag { .. }) => Mode::JsxTag,
            Some(Bracket::JsxChildren) => Mode::JsxChildren,
            _ => Mode::Code,
        }
    }

    fn top_is(&self, bracket: Bracket) -> bool {
        self.stack.last().is_some_and(|f| f.bracket == bracket)
    }

    fn push(&mut self, bracket: Bracket, offset: usize, line: u32, column: u32) {
        let inherited =
            self.stack.last().is_some_and(|f| f.type_context) || self.alias_depth.is_some();
        let type_context = match bracket {
            Bracket::AngleTypeArgs => true,
            Bracket::Brace if self.pending_type_body && !self.top_is(Bracket::AngleTypeArgs) => {
                self.pending_type_body = false;
                true
            }
            Bracket::JsxTag { .. } | Bracket::JsxChildren | Bracket::JsxExpr => false,
            _ => inherited,
        };
        self.stack.push(Frame {
            bracket,
            type_context,
            offset,
            line,
            column,
        });
    }

    fn pop(
        &mut self,
        expected: impl Fn(Bracket) -> bool,
        offset: usize,
        line: u32,
        column: u32,
    ) -> Result<Frame, LexError> {
        match self.stack.last() {
            Some(frame) if expected(frame.bracket) => {
                let frame = *frame;
                self.stack.pop();
                if self.alias_depth.is_some_and(|depth| self.stack.len() < depth) {
                    self.alias_depth = None;
                }
                Ok(frame)
            }
            _ => Err(self.error(LexErrorKind::UnbalancedBrackets, offset, line, column)),
        }
    }

    fn checkpoint(&self) -> Checkpoint<'src> {
        Checkpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
            stack: self.stack.clone(),
            recent: self.recent.clone(),
            trivia_since_sig: self.trivia_since_sig,
            pending_type_body: self.pending_type_body,
            alias_depth: self.alias_depth,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<'src>) {
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.stack = checkpoint.stack;
        self.recent = checkpoint.recent;
        self.trivia_since_sig = checkpoint.trivia_since_sig;
        self.pending_type_body = checkpoint.pending_type_body;
        self.alias_depth = checkpoint.alias_depth;
    }

    // ---- type context ----

    fn in_type_context(&self) -> bool {
        self.alias_depth.is_some()
            || self.pending_type_body
            || self.stack.last().is_some_and(|f| f.type_context)
            || self.after_var_annotation_colon()
    }

    /// `const name :` / `let name :` / `var name :`
    fn after_var_annotation_colon(&self) -> bool {
        match &self.recent {
            [Some(decl), Some(name), Some(colon)] => {
                colon.is_op(":")
                    && name.kind == TokenKind::Identifier
                    && (decl.is_keyword("const") || decl.is_keyword("let") || decl.is_keyword("var"))
            }
            _ => false,
        }
    }

    fn at_statement_start(&self) -> bool {
        match self.prev() {
            None => true,
            Some(prev) => {
                prev.is_op(";")
                    || prev.is_op("{")
                    || prev.is_op("}")
                    || prev.is_keyword("export")
                    || prev.is_keyword("default")
                    || prev.is_ident("declare")
                    || self.newline_since_prev()
            }
        }
    }

    fn newline_since_prev(&self) -> bool {
        let from = self.prev().map_or(0, |t| t.end);
        self.source[from..self.pos].contains('\n')
    }

    /// After `type`: `Name =` or `Name<`.
    fn alias_follows(&self) -> bool {
        let (p, _) = skip_trivia(self.source, self.pos);
        let name = word_at(self.source, p);
        if name.is_empty() || is_keyword(name) {
            return false;
        }
        let (q, _) = skip_trivia(self.source, p + name.len());
        let rest = &self.source[q..];
        rest.starts_with('<') || (rest.starts_with('=') && !rest.starts_with("==") && !rest.starts_with("=>"))
    }

    fn alias_continues(&self) -> bool {
        if let Some(prev) = self.prev() {
            let dangling = prev.is_type_args_open()
                || ["=", "|", "&", ",", "=>", "?", ":", "."].iter().any(|op| prev.is_op(op))
                || TYPE_CONTINUATION_WORDS.iter().any(|w| prev.is_word(w));
            if dangling {
                return true;
            }
        }
        let (p, _) = skip_trivia(self.source, self.pos);
        let rest = &self.source[p..];
        rest.starts_with(['|', '&', '?', ':', '.'])
            || rest.starts_with("=>")
            || word_at(self.source, p) == "extends"
    }

    // ---- entry ----

    fn next_raw(&mut self) -> Result<Option<Token<'src>>, LexError> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(Some(token));
        }
        self.lex_token()
    }

    fn lex_token(&mut self) -> Result<Option<Token<'src>>, LexError> {
        if self.pos >= self.source.len() {
            return Ok(None);
        }
        let token = match self.mode() {
            Mode::Code => self.lex_code()?,
            Mode::JsxTag => self.lex_jsx_tag()?,
            Mode::JsxChildren => self.lex_jsx_children()?,
        };
        Ok(Some(token))
    }

    fn lex_code(&mut self) -> Result<Token<'src>, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let Some(c) = self.peek() else {
            return Err(self.error(LexErrorKind::UnbalancedBrackets, start, line, column));
        };

        if let Some(token) = self.lex_trivia(c, start, line, column)? {
            return Ok(token);
        }

        if start == 0 && self.rest().starts_with("#!") {
            while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                self.bump();
            }
            return Ok(self.finish(TokenKind::Comment, start, line, column));
        }

        match c {
            '"' | '\'' => return self.lex_string(c, start, line, column),
            '`' => return self.lex_template(false, start, line, column),
            '0'..='9' => return Ok(self.lex_number(start, line, column)),
            '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                return Ok(self.lex_number(start, line, column))
            }
            '#' if self.peek_at(1).is_some_and(is_ident_start) => {
                self.bump();
                return Ok(self.lex_word(start, line, column));
            }
            c if is_ident_start(c) || (c == '\\' && self.peek_at(1) == Some('u')) => {
                return Ok(self.lex_word(start, line, column))
            }
            _ => {}
        }

        match c {
            '(' | '[' | '{' => {
                self.bump();
                let bracket = match c {
                    '(' => Bracket::Paren,
                    '[' => Bracket::Square,
                    _ => Bracket::Brace,
                };
                self.push(bracket, start, line, column);
                Ok(self.finish(TokenKind::Punctuator(Punct::Operator), start, line, column))
            }
            ')' => {
                self.pop(|b| b == Bracket::Paren, start, line, column)?;
                self.bump();
                Ok(self.finish(TokenKind::Punctuator(Punct::Operator), start, line, column))
            }
            ']' => {
                self.pop(|b| b == Bracket::Square, start, line, column)?;
                self.bump();
                Ok(self.finish(TokenKind::Punctuator(Punct::Operator), start, line, column))
            }
            '}' => self.lex_close_brace(start, line, column),
            '<' => Ok(self.lex_angle(start, line, column)),
            '>' if self.top_is(Bracket::AngleTypeArgs) => {
                self.pop(|b| b == Bracket::AngleTypeArgs, start, line, column)?;
                self.bump();
                Ok(self.finish(TokenKind::Punctuator(Punct::TypeArgsClose), start, line, column))
            }
            '/' => {
                if self.prev().is_some_and(|t| t.ends_operand()) {
                    Ok(self.lex_operator(start, line, column))
                } else {
                    self.lex_regex(start, line, column)
                }
            }
            '!' if !self.rest().starts_with("!=") && self.can_assert_non_null() => {
                self.bump();
                Ok(self.finish(TokenKind::Punctuator(Punct::NonNullAssertion), start, line, column))
            }
            _ => Ok(self.lex_operator(start, line, column)),
        }
    }

    /// Whitespace, newlines and comments, in any mode that allows them.
    fn lex_trivia(
        &mut self,
        c: char,
        start: usize,
        line: u32,
        column: u32,
    ) -> Result<Option<Token<'src>>, LexError> {
        match c {
            '\n' => {
                self.bump();
                Ok(Some(self.finish(TokenKind::Newline, start, line, column)))
            }
            '\r' => {
                self.bump();
                if self.peek() == Some('\n') {
                    self.bump();
                }
                Ok(Some(self.finish(TokenKind::Newline, start, line, column)))
            }
            c if c.is_whitespace() || c == '\u{feff}' => {
                while self
                    .peek()
                    .is_some_and(|c| (c.is_whitespace() || c == '\u{feff}') && c != '\n' && c != '\r')
                {
                    self.bump();
                }
                Ok(Some(self.finish(TokenKind::Whitespace, start, line, column)))
            }
            '/' if self.peek_at(1) == Some('/') => {
                while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                    self.bump();
                }
                Ok(Some(self.finish(TokenKind::Comment, start, line, column)))
            }
            '/' if self.peek_at(1) == Some('*') => {
                self.bump_n(2);
                loop {
                    if self.rest().starts_with("*/") {
                        self.bump_n(2);
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(self.error(LexErrorKind::UnterminatedComment, start, line, column));
                    }
                }
                Ok(Some(self.finish(TokenKind::Comment, start, line, column)))
            }
            _ => Ok(None),
        }
    }

    fn lex_word(&mut self, start: usize, line: u32, column: u32) -> Token<'src> {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else if c == '\\' && self.peek_at(1) == Some('u') {
                self.bump_n(2);
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        let after_dot = self.prev().is_some_and(|t| t.is_op(".") || t.is_op("?."));
        let kind = if !after_dot && !text.starts_with('#') && is_keyword(text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };

        if kind == TokenKind::Keyword && text == "interface" {
            self.pending_type_body = true;
        }
        if kind == TokenKind::Identifier
            && text == "type"
            && !after_dot
            && self.alias_depth.is_none()
            && self.at_statement_start()
            && self.alias_follows()
        {
            self.alias_depth = Some(self.stack.len());
        }

        self.finish(kind, start, line, column)
    }

    fn lex_number(&mut self, start: usize, line: u32, column: u32) -> Token<'src> {
        let radix_prefix = self.peek() == Some('0')
            && self.peek_at(1).is_some_and(|c| matches!(c, 'x' | 'X' | 'o' | 'O' | 'b' | 'B'));
        if radix_prefix {
            self.bump_n(2);
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
        } else {
            self.eat_digits();
            if self.peek() == Some('.') {
                self.bump();
                self.eat_digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let signed = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if signed { 2 } else { 1 };
                if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    self.bump_n(digit_at);
                    self.eat_digits();
                }
            }
            if self.peek() == Some('n') {
                self.bump();
            }
        }
        self.finish(TokenKind::NumberLiteral, start, line, column)
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn lex_string(
        &mut self,
        quote: char,
        start: usize,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error(LexErrorKind::UnterminatedString, start, line, column))
                }
                Some('\\') => {
                    self.bump();
                    if self.peek() == Some('\r') && self.peek_at(1) == Some('\n') {
                        self.bump();
                    }
                    self.bump();
                }
                Some(c) => {
                    self.bump();
                    if c == quote {
                        break;
                    }
                }
            }
        }
        Ok(self.finish(TokenKind::StringLiteral, start, line, column))
    }

    /// Template chunk starting at `` ` `` (or at the `}` ending a substitution).
    fn lex_template(
        &mut self,
        after_substitution: bool,
        start: usize,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        self.bump();
        loop {
            match self.peek() {
                None => return Err(self.error(LexErrorKind::UnterminatedTemplate, start, line, column)),
                Some('\\') => self.bump_n(2),
                Some('`') => {
                    self.bump();
                    let part = if after_substitution {
                        TemplatePart::Tail
                    } else {
                        TemplatePart::NoSubstitution
                    };
                    return Ok(self.finish(TokenKind::TemplateLiteral(part), start, line, column));
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    let (brace, brace_line, brace_column) = (self.pos + 1, self.line, self.column + 1);
                    self.bump_n(2);
                    self.push(Bracket::TemplateSubst, brace, brace_line, brace_column);
                    let part = if after_substitution {
                        TemplatePart::Middle
                    } else {
                        TemplatePart::Head
                    };
                    return Ok(self.finish(TokenKind::TemplateLiteral(part), start, line, column));
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_regex(&mut self, start: usize, line: u32, column: u32) -> Result<Token<'src>, LexError> {
        self.bump();
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error(LexErrorKind::UnterminatedRegex, start, line, column))
                }
                Some('\\') => {
                    self.bump();
                    if !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                        self.bump();
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.bump();
                }
                Some(']') => {
                    in_class = false;
                    self.bump();
                }
                Some('/') if !in_class => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        Ok(self.finish(TokenKind::RegexLiteral, start, line, column))
    }

    fn lex_close_brace(&mut self, start: usize, line: u32, column: u32) -> Result<Token<'src>, LexError> {
        match self.stack.last().map(|f| f.bracket) {
            Some(Bracket::TemplateSubst) => {
                self.pop(|b| b == Bracket::TemplateSubst, start, line, column)?;
                self.lex_template(true, start, line, column)
            }
            Some(Bracket::JsxExpr) => {
                self.pop(|b| b == Bracket::JsxExpr, start, line, column)?;
                self.bump();
                Ok(self.finish(TokenKind::JsxTag, start, line, column))
            }
            _ => {
                self.pop(|b| b == Bracket::Brace, start, line, column)?;
                self.bump();
                Ok(self.finish(TokenKind::Punctuator(Punct::Operator), start, line, column))
            }
        }
    }

    fn lex_operator(&mut self, start: usize, line: u32, column: u32) -> Token<'src> {
        let rest = self.rest();
        let in_angle = self.top_is(Bracket::AngleTypeArgs);
        let matched = PUNCTUATORS.iter().find(|p| {
            rest.starts_with(**p)
                && !(in_angle && p.starts_with('>'))
                && !(**p == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()))
        });
        match matched {
            Some(p) => self.bump_n(p.len()),
            None => {
                self.bump();
            }
        }
        self.finish(TokenKind::Punctuator(Punct::Operator), start, line, column)
    }

    fn can_assert_non_null(&self) -> bool {
        if self.trivia_since_sig {
            return false;
        }
        self.prev().is_some_and(|t| match t.kind {
            TokenKind::Identifier | TokenKind::StringLiteral => true,
            TokenKind::TemplateLiteral(part) => {
                matches!(part, TemplatePart::NoSubstitution | TemplatePart::Tail)
            }
            TokenKind::Keyword => t.text == "this",
            TokenKind::Punctuator(Punct::NonNullAssertion) => true,
            TokenKind::Punctuator(Punct::Operator) => t.text == ")" || t.text == "]",
            _ => false,
        })
    }

    // ---- `<` resolution ----

    fn lex_angle(&mut self, start: usize, line: u32, column: u32) -> Token<'src> {
        if self.in_type_context() {
            self.bump();
            self.push(Bracket::AngleTypeArgs, start, line, column);
            return self.finish(TokenKind::Punctuator(Punct::TypeArgsOpen), start, line, column);
        }

        let prev = self.prev();
        let eligible = prev.is_some_and(|t| t.kind == TokenKind::Identifier || t.is_keyword("function"));
        let expression_position = prev.map_or(true, |t| !t.ends_operand());
        if eligible {
            let declaration = self.is_declaration_site();
            let site = AngleSite {
                declaration,
                check_follower: !declaration,
                require_paren: false,
            };
            if let Some(token) = self.speculate(site) {
                return token;
            }
            return self.lex_operator(start, line, column);
        }

        if expression_position {
            if self.syntax.jsx {
                if self.looks_like_generic_arrow() {
                    let site = AngleSite {
                        declaration: true,
                        check_follower: false,
                        require_paren: true,
                    };
                    if let Some(token) = self.speculate(site) {
                        return token;
                    }
                }
                if self.jsx_can_open() {
                    self.bump();
                    self.push(Bracket::JsxTag { closing: false }, start, line, column);
                    return self.finish(TokenKind::JsxTag, start, line, column);
                }
            } else {
                let site = AngleSite {
                    declaration: true,
                    check_follower: false,
                    require_paren: false,
                };
                if let Some(token) = self.speculate(site) {
                    return token;
                }
            }
        }

        self.lex_operator(start, line, column)
    }

    /// `function<`, `function name<`, `class|interface|type Name<`, `*name<`.
    fn is_declaration_site(&self) -> bool {
        let [third, second, Some(prev)] = &self.recent else {
            return false;
        };
        if prev.is_keyword("function") {
            return true;
        }
        match second {
            Some(second) => {
                second.is_keyword("function")
                    || second.is_keyword("class")
                    || second.is_keyword("interface")
                    || second.is_ident("type")
                    || (second.is_op("*") && third.as_ref().is_some_and(|t| t.is_keyword("function")))
            }
            None => false,
        }
    }

    /// `<T,>` or `<T extends ...>` at expression position in TSX.
    fn looks_like_generic_arrow(&self) -> bool {
        let (p, _) = skip_trivia(self.source, self.pos + 1);
        let name = word_at(self.source, p);
        if name.is_empty() {
            return false;
        }
        let (q, _) = skip_trivia(self.source, p + name.len());
        if self.source[q..].starts_with(',') {
            return true;
        }
        if word_at(self.source, q) != "extends" {
            return false;
        }
        let (r, _) = skip_trivia(self.source, q + "extends".len());
        !self.source[r..].starts_with(['=', '>'])
    }

    fn jsx_can_open(&self) -> bool {
        let (p, _) = skip_trivia(self.source, self.pos + 1);
        self.source[p..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || is_ident_start(c))
    }

    fn can_follow_type_args(&self) -> bool {
        let (p, newline) = skip_trivia(self.source, self.pos);
        let rest = &self.source[p..];
        let Some(c) = rest.chars().next() else {
            return true;
        };
        if newline {
            return true;
        }
        match c {
            '(' | '`' | ')' | ']' | ',' | ';' | '}' | '{' | '|' | '&' | '[' | '?' | ':' | '.' => true,
            '=' => !rest.starts_with("=="),
            c if is_ident_start(c) => matches!(word_at(self.source, p), "extends" | "implements"),
            _ => false,
        }
    }

    /// Lex ahead from `<` as a type-argument list. On success the `<` token
    /// is returned and the rest of the list is queued; on failure the lexer
    /// is rewound to the `<`.
    fn speculate(&mut self, site: AngleSite) -> Option<Token<'src>> {
        let checkpoint = self.checkpoint();
        let (start, line, column) = (self.pos, self.line, self.column);

        self.bump();
        self.push(Bracket::AngleTypeArgs, start, line, column);
        let open = self.finish(TokenKind::Punctuator(Punct::TypeArgsOpen), start, line, column);
        let depth = self.stack.len();

        let mut buffered = Vec::new();
        let mut last_significant = open.clone();
        loop {
            let level = self.stack.len();
            let token = match self.lex_token() {
                Ok(Some(token)) => token,
                Ok(None) | Err(_) => {
                    self.restore(checkpoint);
                    return None;
                }
            };
            if !fits_in_type(&token, level == depth, &last_significant, site.declaration) {
                trace!(offset = start, at = token.start, text = token.text, "not a type argument list");
                self.restore(checkpoint);
                return None;
            }
            let closed = token.is_type_args_close() && self.stack.len() < depth;
            if !token.is_trivia() {
                last_significant = token.clone();
            }
            buffered.push(token);
            if closed {
                break;
            }
        }

        let follower_ok = !site.check_follower || self.can_follow_type_args();
        let paren_ok = !site.require_paren || {
            let (p, _) = skip_trivia(self.source, self.pos);
            self.source[p..].starts_with('(')
        };
        if !(follower_ok && paren_ok) {
            trace!(offset = start, "type argument list rejected by its follower");
            self.restore(checkpoint);
            return None;
        }

        trace!(offset = start, tokens = buffered.len(), "type argument list");
        self.pending.extend(buffered);
        Some(open)
    }

    // ---- JSX ----

    fn lex_jsx_tag(&mut self) -> Result<Token<'src>, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let Some(c) = self.peek() else {
            return Err(self.error(LexErrorKind::UnbalancedBrackets, start, line, column));
        };
        if let Some(token) = self.lex_trivia(c, start, line, column)? {
            return Ok(token);
        }

        match c {
            // `</>` closes a fragment: its `/` is not a self-closing `/>`.
            '/' if self.peek_at(1) == Some('>')
                && self.top_is(Bracket::JsxTag { closing: false }) =>
            {
                self.pop(|b| b == Bracket::JsxTag { closing: false }, start, line, column)?;
                self.bump_n(2);
            }
            '<' if self.after_tag_name() => {
                let site = AngleSite {
                    declaration: false,
                    check_follower: false,
                    require_paren: false,
                };
                if let Some(token) = self.speculate(site) {
                    return Ok(token);
                }
                self.bump();
            }
            '>' => {
                let frame = self.pop(|b| matches!(b, Bracket::JsxTag { .. }), start, line, column)?;
                self.bump();
                if matches!(frame.bracket, Bracket::JsxTag { closing: true }) {
                    self.pop(|b| b == Bracket::JsxChildren, start, line, column)?;
                } else {
                    self.push(Bracket::JsxChildren, start, line, column);
                }
            }
            '{' => {
                self.bump();
                self.push(Bracket::JsxExpr, start, line, column);
            }
            '"' | '\'' => {
                self.bump();
                loop {
                    match self.bump() {
                        None => {
                            return Err(self.error(LexErrorKind::UnterminatedString, start, line, column))
                        }
                        Some(q) if q == c => break,
                        Some(_) => {}
                    }
                }
            }
            c if is_ident_start(c) => {
                while self
                    .peek()
                    .is_some_and(|c| is_ident_continue(c) || matches!(c, '-' | ':' | '.'))
                {
                    self.bump();
                }
            }
            _ => {
                self.bump();
            }
        }
        Ok(self.finish(TokenKind::JsxTag, start, line, column))
    }

    /// `<Name` was just lexed inside an opening tag, so a `<` here starts
    /// the element's type arguments (`<Select<Option> ... />`).
    fn after_tag_name(&self) -> bool {
        let [_, Some(open), Some(name)] = &self.recent else {
            return false;
        };
        self.top_is(Bracket::JsxTag { closing: false })
            && open.kind == TokenKind::JsxTag
            && open.text == "<"
            && name.kind == TokenKind::JsxTag
            && name.text.starts_with(is_ident_start)
    }

    fn lex_jsx_children(&mut self) -> Result<Token<'src>, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        match self.peek() {
            Some('<') => {
                let (p, _) = skip_trivia(self.source, self.pos + 1);
                let closing = self.source[p..].starts_with('/');
                self.bump();
                self.push(Bracket::JsxTag { closing }, start, line, column);
                Ok(self.finish(TokenKind::JsxTag, start, line, column))
            }
            Some('{') => {
                self.bump();
                self.push(Bracket::JsxExpr, start, line, column);
                Ok(self.finish(TokenKind::JsxTag, start, line, column))
            }
            _ => {
                while !matches!(self.peek(), None | Some('<') | Some('{')) {
                    self.bump();
                }
                Ok(self.finish(TokenKind::JsxText, start, line, column))
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_raw() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Whether `token` can appear inside a type-argument list.
fn fits_in_type(token: &Token<'_>, at_list_level: bool, prev: &Token<'_>, declaration: bool) -> bool {
    match token.kind {
        TokenKind::Comment | TokenKind::Whitespace | TokenKind::Newline => true,
        TokenKind::Identifier
        | TokenKind::StringLiteral
        | TokenKind::NumberLiteral
        | TokenKind::TemplateLiteral(_) => true,
        TokenKind::Keyword => TYPE_KEYWORDS.contains(&token.text),
        TokenKind::RegexLiteral | TokenKind::JsxText | TokenKind::JsxTag => false,
        TokenKind::Punctuator(Punct::TypeArgsOpen | Punct::TypeArgsClose) => true,
        TokenKind::Punctuator(Punct::NonNullAssertion) => false,
        TokenKind::Punctuator(Punct::Operator) => match token.text {
            "(" | ")" | "[" | "]" | "{" | "}" | "," | "." | "|" | "&" | "?" | ":" | "=>" | "..." => true,
            ";" => !at_list_level,
            "=" => declaration,
            "-" | "+" => !prev.ends_operand(),
            _ => false,
        },
    }
}

/// Lex a whole source, returning every token plus the brackets left open.
#[derive(Debug, Clone)]
pub struct Lexed<'src> {
    pub tokens: Vec<Token<'src>>,
    pub unclosed: Vec<UnclosedBracket>,
}

pub fn lex(source: &str, syntax: DtSyntax) -> Result<Lexed<'_>, LexError> {
    let mut lexer = Lexer::new(source, syntax);
    let tokens = lexer.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok(Lexed {
        tokens,
        unclosed: lexer.unclosed(),
    })
}

/// Lex a whole source; any bracket left open is an error.
pub fn tokenize(source: &str, syntax: DtSyntax) -> Result<Vec<Token<'_>>, LexError> {
    let lexed = lex(source, syntax)?;
    match lexed.unclosed.first() {
        Some(open) => Err(LexError {
            kind: LexErrorKind::UnbalancedBrackets,
            offset: open.offset,
            line: open.line,
            column: open.column,
        }),
        None => Ok(lexed.tokens),
    }
}
