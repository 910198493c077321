//! Depth-bounded type-expression grammar.
//!
//! Finds where a type expression ends without building a tree. Bracketed
//! parts (object types, tuples, parameter lists, type arguments) are skipped
//! whole through the document's match table, so a `,` or `;` inside them can
//! never end the type early.

use dt_ast::{Punct, TemplatePart, TokenKind};

use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeError {
    /// Input ended, or a bracket never closed, before the type was complete.
    Eof,
    /// The token at this index cannot continue the type.
    Unexpected(usize),
}

/// Words that prefix another type operand.
const TYPE_OPERATORS: &[&str] = &["keyof", "unique", "readonly"];

pub(crate) struct TypeParser<'d, 'src> {
    doc: &'d Document<'src>,
    /// Tokens at or after this index are out of reach.
    limit: usize,
}

impl<'d, 'src> TypeParser<'d, 'src> {
    pub(crate) fn new(doc: &'d Document<'src>, limit: usize) -> Self {
        Self {
            doc,
            limit: limit.min(doc.len()),
        }
    }

    /// Parse a type starting at the first significant token at or after
    /// `from`. Returns the index one past its last token.
    pub(crate) fn parse(&self, from: usize) -> Result<usize, TypeError> {
        self.ty(from)
    }

    fn ty(&self, from: usize) -> Result<usize, TypeError> {
        let end = self.union(from)?;
        match self.peek(end) {
            Some(k) if self.doc.token(k).is_keyword("extends") => {
                let check = self.union(k + 1)?;
                let question = self.expect(check, "?")?;
                let then = self.ty(question + 1)?;
                let colon = self.expect(then, ":")?;
                self.ty(colon + 1)
            }
            _ => Ok(end),
        }
    }

    fn union(&self, from: usize) -> Result<usize, TypeError> {
        let mut j = self.first(from)?;
        if self.is_op(j, "|") || self.is_op(j, "&") {
            j = self.first(j + 1)?;
        }
        let mut end = self.operand(j)?;
        while let Some(k) = self.peek(end) {
            if !(self.is_op(k, "|") || self.is_op(k, "&")) {
                break;
            }
            end = self.operand(self.first(k + 1)?)?;
        }
        Ok(end)
    }

    fn operand(&self, j: usize) -> Result<usize, TypeError> {
        let token = self.doc.token(j);

        if TYPE_OPERATORS.iter().any(|w| token.is_ident(w)) && self.starts_type_after(j) {
            return self.operand(self.first(j + 1)?);
        }
        if token.is_ident("infer") && self.starts_type_after(j) {
            let name = self.first(j + 1)?;
            return Ok(self.postfix(name + 1));
        }
        if token.is_ident("asserts") {
            if let Some(subject) = self.peek(j + 1) {
                let target = self.doc.token(subject);
                if !self.doc.newline_between(j, subject)
                    && (target.kind == TokenKind::Identifier || target.is_keyword("this"))
                {
                    return self.predicate(subject + 1);
                }
            }
        }

        let end = if token.is_keyword("typeof") {
            let mut end = self.entity(self.first(j + 1)?)?;
            if let Some(k) = self.peek(end) {
                if self.doc.token(k).is_type_args_open() {
                    end = self.group(k)? + 1;
                }
            }
            end
        } else {
            self.primary(j)?
        };

        let end = self.postfix(end);
        if token.kind == TokenKind::Identifier || token.is_keyword("this") {
            return self.predicate(end);
        }
        Ok(end)
    }

    /// `x is T` after a parameter name or `this`.
    fn predicate(&self, end: usize) -> Result<usize, TypeError> {
        match self.peek(end) {
            Some(k) if self.doc.token(k).is_ident("is") && !self.doc.newline_between(end - 1, k) => {
                self.ty(k + 1)
            }
            _ => Ok(end),
        }
    }

    /// Array and indexed-access suffixes: `T[]`, `T['key']`.
    fn postfix(&self, mut end: usize) -> usize {
        while let Some(k) = self.peek(end) {
            if !self.is_op(k, "[") || self.doc.newline_between(end - 1, k) {
                break;
            }
            match self.doc.matching(k) {
                Some(close) if close < self.limit => end = close + 1,
                _ => break,
            }
        }
        end
    }

    fn primary(&self, j: usize) -> Result<usize, TypeError> {
        let token = self.doc.token(j);
        match token.kind {
            TokenKind::Punctuator(Punct::Operator) => match token.text {
                "(" => {
                    let close = self.group(j)?;
                    match self.peek(close + 1) {
                        Some(k) if self.is_op(k, "=>") => self.ty(k + 1),
                        _ => Ok(close + 1),
                    }
                }
                "{" | "[" => Ok(self.group(j)? + 1),
                "-" => {
                    let number = self.first(j + 1)?;
                    if self.doc.token(number).kind == TokenKind::NumberLiteral {
                        Ok(number + 1)
                    } else {
                        Err(TypeError::Unexpected(number))
                    }
                }
                _ => Err(TypeError::Unexpected(j)),
            },
            TokenKind::Punctuator(Punct::TypeArgsOpen) => {
                let close = self.group(j)?;
                self.function_type(close + 1)
            }
            TokenKind::StringLiteral | TokenKind::NumberLiteral => Ok(j + 1),
            TokenKind::TemplateLiteral(TemplatePart::NoSubstitution) => Ok(j + 1),
            TokenKind::TemplateLiteral(TemplatePart::Head) => {
                let mut chunk = j;
                loop {
                    chunk = self.group(chunk)?;
                    if self.doc.token(chunk).kind == TokenKind::TemplateLiteral(TemplatePart::Tail) {
                        return Ok(chunk + 1);
                    }
                }
            }
            TokenKind::Keyword => match token.text {
                "void" | "null" | "this" | "true" | "false" => Ok(j + 1),
                "new" => {
                    let mut k = self.first(j + 1)?;
                    if self.doc.token(k).is_type_args_open() {
                        k = self.group(k)? + 1;
                    }
                    self.function_type(k)
                }
                "import" => {
                    let open = self.first(j + 1)?;
                    if !self.is_op(open, "(") {
                        return Err(TypeError::Unexpected(open));
                    }
                    let mut end = self.group(open)? + 1;
                    if let Some(dot) = self.peek(end) {
                        if self.is_op(dot, ".") {
                            end = self.entity(self.first(dot + 1)?)?;
                        }
                    }
                    self.type_args_after(end)
                }
                _ => Err(TypeError::Unexpected(j)),
            },
            TokenKind::Identifier if !matches!(token.text, "as" | "satisfies") => {
                let end = self.entity(j)?;
                self.type_args_after(end)
            }
            _ => Err(TypeError::Unexpected(j)),
        }
    }

    /// `(params) => T` starting at the `(`.
    fn function_type(&self, from: usize) -> Result<usize, TypeError> {
        let open = self.first(from)?;
        if !self.is_op(open, "(") {
            return Err(TypeError::Unexpected(open));
        }
        let close = self.group(open)?;
        let arrow = self.first(close + 1)?;
        if !self.is_op(arrow, "=>") {
            return Err(TypeError::Unexpected(arrow));
        }
        self.ty(arrow + 1)
    }

    /// Dotted name: `A`, `React.FC`, `JSX.Element`.
    fn entity(&self, j: usize) -> Result<usize, TypeError> {
        let token = self.doc.token(j);
        if token.kind != TokenKind::Identifier && !token.is_keyword("this") {
            return Err(TypeError::Unexpected(j));
        }
        let mut end = j + 1;
        while let Some(dot) = self.peek(end) {
            if !self.is_op(dot, ".") {
                break;
            }
            let name = self.first(dot + 1)?;
            if self.doc.token(name).kind != TokenKind::Identifier {
                return Err(TypeError::Unexpected(name));
            }
            end = name + 1;
        }
        Ok(end)
    }

    fn type_args_after(&self, end: usize) -> Result<usize, TypeError> {
        match self.peek(end) {
            Some(k) if self.doc.token(k).is_type_args_open() => Ok(self.group(k)? + 1),
            _ => Ok(end),
        }
    }

    fn starts_type_after(&self, j: usize) -> bool {
        self.peek(j + 1).is_some_and(|k| {
            let token = self.doc.token(k);
            match token.kind {
                TokenKind::Punctuator(Punct::Operator) => matches!(token.text, "(" | "{" | "[" | "-"),
                TokenKind::Punctuator(Punct::TypeArgsOpen) => true,
                TokenKind::Punctuator(_) => false,
                TokenKind::Keyword => token.text != "extends" && token.text != "in",
                TokenKind::Identifier => !matches!(token.text, "is" | "as" | "satisfies"),
                _ => !token.kind.is_jsx(),
            }
        })
    }

    fn group(&self, open: usize) -> Result<usize, TypeError> {
        match self.doc.matching(open) {
            Some(close) if close > open && close < self.limit => Ok(close),
            Some(close) if close > open => Err(TypeError::Unexpected(self.limit)),
            _ => Err(TypeError::Eof),
        }
    }

    fn expect(&self, from: usize, text: &str) -> Result<usize, TypeError> {
        let k = self.first(from)?;
        if self.is_op(k, text) {
            Ok(k)
        } else {
            Err(TypeError::Unexpected(k))
        }
    }

    /// Next significant token, erroring at the limit.
    fn first(&self, from: usize) -> Result<usize, TypeError> {
        match self.doc.next_sig(from, self.limit) {
            Some(k) => Ok(k),
            None if self.limit >= self.doc.len() => Err(TypeError::Eof),
            None => Err(TypeError::Unexpected(self.limit)),
        }
    }

    fn peek(&self, from: usize) -> Option<usize> {
        self.doc.next_sig(from, self.limit)
    }

    fn is_op(&self, index: usize, text: &str) -> bool {
        self.doc.token(index).is_op(text)
    }
}
