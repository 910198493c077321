//! Declaration-shaped constructs: statements that are wholly type syntax,
//! and the annotation sites of functions, classes, parameters and variables.

use dt_ast::{AmbiguityReason, TokenKind, TransformError, TypeSpanKind};

use crate::stripper::{Frame, Stripper};
use crate::types::TypeError;

/// Words that may precede a class member name.
const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "override", "abstract", "declare", "static",
    "async", "get", "set", "accessor",
];

/// Modifiers that turn a constructor parameter into a class field.
const PARAM_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Where a call signature leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Follow {
    /// A `{` body at this index.
    Body(usize),
    /// No body: the signature ends before this index.
    Terminator(usize),
    /// Something else; resume here.
    Other(usize),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Signature {
    /// `(colon, end)` of a return annotation.
    pub(crate) annotation: Option<(usize, usize)>,
    pub(crate) follow: Follow,
}

impl<'d, 'src> Stripper<'d, 'src> {
    /// Statement-level recognisers. `Some(resume)` when one of them consumed
    /// the statement (or its `export`/`declare` prefix).
    pub(crate) fn statement(
        &mut self,
        i: usize,
        to: usize,
        prev: Option<usize>,
    ) -> Result<Option<usize>, TransformError> {
        let token = self.tok(i);
        if token.is_keyword("import") {
            let dynamic = self
                .next(i + 1, to)
                .is_some_and(|j| self.tok(j).is_op("(") || self.tok(j).is_op("."));
            if dynamic {
                return Ok(None);
            }
            return self.import_statement(i, to).map(Some);
        }
        if token.is_keyword("export") {
            if let Some(resume) = self.export_statement(i, to)? {
                return Ok(Some(resume));
            }
        }
        if !self.at_statement_start(i, prev) {
            return Ok(None);
        }

        let mut head = i;
        let mut declared = false;
        loop {
            let word = self.tok(head);
            let prefix = word.is_keyword("export")
                || (word.is_keyword("default") && head != i)
                || (word.is_ident("declare") && self.word_follows(head, to));
            if !prefix {
                break;
            }
            declared |= word.is_ident("declare");
            match self.next(head + 1, to) {
                Some(n) => head = n,
                None => return Ok(None),
            }
        }

        let word = self.tok(head);
        let following = self.next(head + 1, to);
        let named = following.is_some_and(|n| {
            self.tok(n).kind == TokenKind::Identifier && !self.doc.newline_between(head, n)
        });

        if word.is_keyword("interface") && named {
            return self.interface(i, head, to).map(Some);
        }
        if word.is_ident("type") && named {
            if let Some(resume) = self.type_alias(i, head, to)? {
                return Ok(Some(resume));
            }
        }
        if declared {
            self.warn(None, AmbiguityReason::Declare, i);
            return Ok(Some(self.statement_end(head, to, true)));
        }
        let const_enum = word.is_keyword("const")
            && following.is_some_and(|n| self.tok(n).is_keyword("enum"));
        if word.is_keyword("enum") || const_enum {
            self.warn(None, AmbiguityReason::Enum, head);
            return Ok(Some(self.statement_end(head, to, true)));
        }
        let namespace = (word.is_ident("namespace") || word.is_ident("module"))
            && following.is_some_and(|n| {
                matches!(self.tok(n).kind, TokenKind::Identifier | TokenKind::StringLiteral)
                    && !self.doc.newline_between(head, n)
            });
        if namespace {
            self.warn(None, AmbiguityReason::Namespace, head);
            return Ok(Some(self.statement_end(head, to, true)));
        }
        if word.is_ident("abstract") && following.is_some_and(|n| self.tok(n).is_keyword("class")) {
            self.warn(None, AmbiguityReason::Abstract, head);
            return Ok(following);
        }
        if head != i {
            return Ok(Some(head));
        }
        Ok(None)
    }

    fn at_statement_start(&self, i: usize, prev: Option<usize>) -> bool {
        let Some(p) = prev else { return true };
        let token = self.tok(p);
        token.is_op(";")
            || token.is_op("{")
            || token.is_op("}")
            || (self.doc.newline_between(p, i) && !self.continues_line(p, i))
    }

    /// Whether a word follows `i` on the same line.
    fn word_follows(&self, i: usize, to: usize) -> bool {
        self.next(i + 1, to).is_some_and(|n| {
            matches!(self.tok(n).kind, TokenKind::Identifier | TokenKind::Keyword)
                && !self.doc.newline_between(i, n)
        })
    }

    /// `interface Name<T> extends A, B { ... }`, removed whole.
    fn interface(&mut self, start: usize, head: usize, to: usize) -> Result<usize, TransformError> {
        let kind = TypeSpanKind::InterfaceDecl;
        let mut j = head + 1;
        let brace = loop {
            let Some(k) = self.next(j, to) else {
                return Err(self.unterminated(kind, start));
            };
            let token = self.tok(k);
            if token.is_op("{") {
                break k;
            }
            if token.is_op(";") {
                self.warn(Some(kind), AmbiguityReason::UnrecognizedType, start);
                return Ok(k + 1);
            }
            j = match self.group_end(k) {
                Some(close) => close + 1,
                None if token.is_type_args_open() || token.is_op("(") || token.is_op("[") => {
                    return Err(self.unterminated(kind, start));
                }
                None => k + 1,
            };
        };
        let Some(close) = self.group_end(brace) else {
            return Err(self.unterminated(kind, start));
        };
        self.plan_statement(kind, start, close + 1);
        Ok(close + 1)
    }

    /// `type Name<T> = ...;`, removed whole. `None` when the words only
    /// looked like an alias.
    fn type_alias(
        &mut self,
        start: usize,
        head: usize,
        to: usize,
    ) -> Result<Option<usize>, TransformError> {
        let kind = TypeSpanKind::TypeAliasDecl;
        let Some(name) = self.next(head + 1, to) else {
            return Ok(None);
        };
        let mut k = self.next(name + 1, to);
        if let Some(open) = k.filter(|&o| self.tok(o).is_type_args_open()) {
            let Some(close) = self.doc.matching(open).filter(|&c| c > open) else {
                return Err(self.unterminated(kind, start));
            };
            k = self.next(close + 1, to);
        }
        let Some(eq) = k.filter(|&e| self.tok(e).is_op("=")) else {
            if k.is_none() && to >= self.doc.len() {
                return Err(self.unterminated(kind, start));
            }
            return Ok(None);
        };

        match self.parse_type(eq + 1, to) {
            Ok(end) => {
                let end = match self.next(end, to) {
                    Some(semi) if self.tok(semi).is_op(";") && !self.doc.newline_between(end - 1, semi) => {
                        semi + 1
                    }
                    _ => end,
                };
                self.plan_statement(kind, start, end);
                Ok(Some(end))
            }
            Err(TypeError::Eof) => Err(self.unterminated(kind, start)),
            Err(TypeError::Unexpected(_)) => {
                self.warn(Some(kind), AmbiguityReason::UnrecognizedType, start);
                Ok(Some(self.statement_end(head, to, false)))
            }
        }
    }

    pub(crate) fn var_decl(&mut self, i: usize, to: usize) -> Result<usize, TransformError> {
        let Some(j) = self.next(i + 1, to) else {
            return Ok(i + 1);
        };
        if self.tok(j).is_keyword("enum") {
            self.warn(None, AmbiguityReason::Enum, i);
            return Ok(self.statement_end(j, to, true));
        }
        self.declarator(j, to)
    }

    /// One `name: T` or `{ ... }: T` binding; resumes before its initializer.
    pub(crate) fn declarator(&mut self, j: usize, to: usize) -> Result<usize, TransformError> {
        let token = self.tok(j);
        let binding_end = match token.kind {
            TokenKind::Identifier => j + 1,
            _ if token.is_op("{") || token.is_op("[") => {
                let close = self.closer(j, to);
                self.walk(j + 1, close, Frame::Pattern)?;
                close + 1
            }
            _ => return Ok(j),
        };
        let Some(mut k) = self.next(binding_end, to) else {
            return Ok(binding_end);
        };
        if self.tok(k).is_non_null() {
            self.plan(TypeSpanKind::NonNullAssertion, k, k + 1);
            match self.next(k + 1, to) {
                Some(n) => k = n,
                None => return Ok(k + 1),
            }
        }
        if !self.tok(k).is_op(":") {
            return Ok(k);
        }

        let kind = TypeSpanKind::VarAnnotation;
        let Some(end) = self.type_end(kind, k, k + 1, to)? else {
            return Ok(k + 1);
        };
        let delimited = self.next(end, to).map_or(true, |f| {
            let follower = self.tok(f);
            self.doc.newline_between(end - 1, f)
                || [",", "=", ";", ")", "}"].iter().any(|op| follower.is_op(op))
                || follower.is_keyword("in")
                || follower.is_ident("of")
        });
        if delimited {
            self.plan(kind, k, end);
        } else {
            self.warn(Some(kind), AmbiguityReason::UnexpectedTerminator, k);
        }
        Ok(end)
    }

    /// `class Name<T> extends Base<T> implements I { ... }`.
    pub(crate) fn class(&mut self, i: usize, to: usize) -> Result<usize, TransformError> {
        let Some(mut j) = self.next(i + 1, to) else {
            return Ok(i + 1);
        };
        if self.tok(j).kind == TokenKind::Identifier {
            match self.next(j + 1, to) {
                Some(n) => j = n,
                None => return Ok(j + 1),
            }
        }
        if self.tok(j).is_type_args_open() {
            let Some(close) = self.doc.matching(j).filter(|&c| c > j) else {
                return Err(self.unterminated(TypeSpanKind::GenericParamList, j));
            };
            self.plan(TypeSpanKind::GenericParamList, j, close + 1);
            match self.next(close + 1, to) {
                Some(n) => j = n,
                None => return Ok(close + 1),
            }
        }
        if self.tok(j).is_keyword("extends") {
            let end = self.heritage_end(j + 1, to);
            self.walk(j + 1, end, Frame::Expr)?;
            if end >= to {
                return Ok(to);
            }
            j = end;
        }
        if self.tok(j).is_keyword("implements") {
            let brace = self.heritage_end(j + 1, to);
            if brace >= to {
                return Err(self.unterminated(TypeSpanKind::ImplementsClause, j));
            }
            self.plan(TypeSpanKind::ImplementsClause, j, brace);
            j = brace;
        }
        if self.tok(j).is_op("{") {
            let close = self.closer(j, to);
            self.walk(j + 1, close, Frame::ClassBody)?;
            return Ok(close + 1);
        }
        Ok(j)
    }

    /// The `{` or `implements` ending a heritage clause.
    fn heritage_end(&self, from: usize, to: usize) -> usize {
        let mut j = from;
        while let Some(k) = self.next(j, to) {
            let token = self.tok(k);
            if token.is_op("{") || token.is_keyword("implements") {
                return k;
            }
            j = self.group_end(k).map_or(k + 1, |close| close + 1);
        }
        to
    }

    pub(crate) fn class_body(&mut self, from: usize, to: usize) -> Result<(), TransformError> {
        let mut next = self.next(from, to);
        while let Some(m) = next {
            let resume = self.member(m, to)?;
            next = self.next(resume.max(m + 1), to);
        }
        Ok(())
    }

    fn member(&mut self, m: usize, to: usize) -> Result<usize, TransformError> {
        let first = self.tok(m);
        if first.is_op(";") {
            return Ok(m + 1);
        }
        if first.is_op("@") {
            self.warn(None, AmbiguityReason::Decorator, m);
            return Ok(self.skip_decorator(m, to));
        }

        let mut j = m;
        loop {
            let word = self.tok(j);
            if !MEMBER_MODIFIERS.iter().any(|w| word.is_word(w)) {
                break;
            }
            let Some(n) = self.next(j + 1, to) else { break };
            if !self.names_member(j, n) {
                break;
            }
            match word.text {
                "public" | "private" | "protected" | "readonly" | "override" => {
                    self.plan(TypeSpanKind::AccessModifier, j, n);
                }
                "abstract" => self.warn(None, AmbiguityReason::Abstract, j),
                "declare" => self.warn(None, AmbiguityReason::Declare, j),
                _ => {}
            }
            j = n;
        }

        let head = self.tok(j);
        if head.is_op("[") {
            let index_signature = self.next(j + 1, to).is_some_and(|a| {
                self.tok(a).kind == TokenKind::Identifier && self.next_is(a + 1, to, ":").is_some()
            });
            if index_signature {
                self.warn(None, AmbiguityReason::IndexSignature, j);
                return Ok(self.statement_end(j, to, false));
            }
        }
        if head.is_keyword("static") {
            if let Some(brace) = self.next_is(j + 1, to, "{") {
                let close = self.closer(brace, to);
                self.walk(brace + 1, close, Frame::Block)?;
                return Ok(close + 1);
            }
        }
        if head.is_op("*") {
            match self.next(j + 1, to) {
                Some(n) => j = n,
                None => return Ok(to),
            }
        }

        let key = self.tok(j);
        let name_end = if key.is_op("[") {
            let close = self.closer(j, to);
            self.walk(j + 1, close, Frame::Expr)?;
            close + 1
        } else if matches!(
            key.kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::StringLiteral | TokenKind::NumberLiteral
        ) {
            j + 1
        } else {
            return Ok(j + 1);
        };

        let mut k = self.next(name_end, to);
        if let Some(q) = k.filter(|&q| self.tok(q).is_op("?") || self.tok(q).is_non_null()) {
            let kind = if self.tok(q).is_non_null() {
                TypeSpanKind::NonNullAssertion
            } else {
                TypeSpanKind::OptionalMarker
            };
            self.plan(kind, q, q + 1);
            k = self.next(q + 1, to);
        }
        let mut type_params = None;
        if let Some(open) = k.filter(|&o| self.tok(o).is_type_args_open()) {
            let Some(close) = self.doc.matching(open).filter(|&c| c > open) else {
                return Err(self.unterminated(TypeSpanKind::GenericParamList, open));
            };
            type_params = Some((open, close + 1));
            k = self.next(close + 1, to);
        }
        let Some(k) = k else { return Ok(to) };

        if self.tok(k).is_op("(") {
            let Some(close) = self.doc.matching(k).filter(|&c| c > k && c < to) else {
                self.walk(k + 1, to, Frame::Params)?;
                return Ok(to);
            };
            let signature = self.signature(close, to)?;
            if let Follow::Terminator(end) = signature.follow {
                self.plan_statement(TypeSpanKind::OverloadSignature, m, end);
                return Ok(end);
            }
            return self.callable(type_params, k, close, signature, to);
        }

        let mut next = Some(k);
        if self.tok(k).is_op(":") {
            let kind = TypeSpanKind::MemberAnnotation;
            let Some(end) = self.type_end(kind, k, k + 1, to)? else {
                return Ok(self.statement_end(k, to, false));
            };
            let follower = self.next(end, to);
            let delimited = follower.map_or(true, |f| {
                let t = self.tok(f);
                t.is_op("=") || t.is_op(";") || t.is_op("}") || self.doc.newline_between(end - 1, f)
            });
            if delimited {
                self.plan(kind, k, end);
            } else {
                self.warn(Some(kind), AmbiguityReason::UnexpectedTerminator, k);
            }
            next = follower;
        }

        match next {
            Some(eq) if self.tok(eq).is_op("=") => {
                let end = self.statement_end(eq + 1, to, false);
                self.walk(eq + 1, end, Frame::Expr)?;
                Ok(end)
            }
            Some(semi) if self.tok(semi).is_op(";") => Ok(semi + 1),
            Some(n) => Ok(n),
            None => Ok(to),
        }
    }

    /// Whether the token at `n`, after modifier `j`, still belongs to the
    /// member's head (so `j` really is a modifier and not the member name).
    fn names_member(&self, j: usize, n: usize) -> bool {
        let token = self.tok(n);
        !self.doc.newline_between(j, n)
            && (matches!(
                token.kind,
                TokenKind::Identifier
                    | TokenKind::Keyword
                    | TokenKind::StringLiteral
                    | TokenKind::NumberLiteral
            ) || token.is_op("[")
                || token.is_op("*"))
    }

    /// `@name`, `@a.b`, `@call(args)`; returns the index after it.
    pub(crate) fn skip_decorator(&self, at: usize, to: usize) -> usize {
        let Some(mut j) = self.next(at + 1, to).map(|n| n + 1) else {
            return to;
        };
        while let Some(dot) = self.next_is(j, to, ".") {
            match self.next(dot + 1, to) {
                Some(n) => j = n + 1,
                None => return to,
            }
        }
        if let Some(open) = self.next(j, to).filter(|&o| self.tok(o).is_type_args_open()) {
            j = self.group_end(open).map_or(to, |close| close + 1);
        }
        if let Some(open) = self.next_is(j, to, "(") {
            j = self.group_end(open).map_or(to, |close| close + 1);
        }
        j
    }

    /// `function [*] [name] [<T>] (params) [: R] { ... }`, or an overload
    /// signature without a body.
    pub(crate) fn function(&mut self, i: usize, from: usize, to: usize) -> Result<usize, TransformError> {
        let Some(mut j) = self.next(i + 1, to) else {
            return Ok(i + 1);
        };
        if self.tok(j).is_op("*") {
            match self.next(j + 1, to) {
                Some(n) => j = n,
                None => return Ok(j + 1),
            }
        }
        if self.tok(j).kind == TokenKind::Identifier {
            match self.next(j + 1, to) {
                Some(n) => j = n,
                None => return Ok(j + 1),
            }
        }
        let mut type_params = None;
        if self.tok(j).is_type_args_open() {
            let Some(close) = self.doc.matching(j).filter(|&c| c > j) else {
                return Err(self.unterminated(TypeSpanKind::GenericParamList, j));
            };
            type_params = Some((j, close + 1));
            match self.next(close + 1, to) {
                Some(n) => j = n,
                None => return Ok(close + 1),
            }
        }
        if !self.tok(j).is_op("(") {
            return Ok(j);
        }
        let Some(close) = self.doc.matching(j).filter(|&c| c > j && c < to) else {
            self.walk(j + 1, to, Frame::Params)?;
            return Ok(to);
        };

        let signature = self.signature(close, to)?;
        if let Follow::Terminator(end) = signature.follow {
            let start = self.prefix_start(i, from);
            self.plan_statement(TypeSpanKind::OverloadSignature, start, end);
            return Ok(end);
        }
        self.callable(type_params, j, close, signature, to)
    }

    /// Strip a function or method that has a body (or is followed by
    /// something else): type parameters, parameters, return annotation.
    fn callable(
        &mut self,
        type_params: Option<(usize, usize)>,
        open: usize,
        close: usize,
        signature: Signature,
        to: usize,
    ) -> Result<usize, TransformError> {
        if let Some((start, end)) = type_params {
            self.plan(TypeSpanKind::GenericParamList, start, end);
        }
        self.walk(open + 1, close, Frame::Params)?;
        if let Some((colon, end)) = signature.annotation {
            self.plan(TypeSpanKind::ReturnAnnotation, colon, end);
        }
        match signature.follow {
            Follow::Body(brace) => {
                let end = self.closer(brace, to);
                self.walk(brace + 1, end, Frame::Block)?;
                Ok(end + 1)
            }
            Follow::Terminator(end) | Follow::Other(end) => Ok(end),
        }
    }

    /// The return annotation and what follows the parameter list closing at
    /// `close`.
    pub(crate) fn signature(&mut self, close: usize, to: usize) -> Result<Signature, TransformError> {
        let mut after = close + 1;
        let mut annotation = None;
        let mut k = self.next(after, to);
        if let Some(colon) = k.filter(|&c| self.tok(c).is_op(":")) {
            match self.type_end(TypeSpanKind::ReturnAnnotation, colon, colon + 1, to)? {
                Some(end) => {
                    annotation = Some((colon, end));
                    after = end;
                    k = self.next(end, to);
                }
                None => {
                    return Ok(Signature {
                        annotation: None,
                        follow: Follow::Other(colon + 1),
                    })
                }
            }
        }
        let follow = match k {
            None => Follow::Terminator(after),
            Some(f) if self.tok(f).is_op("{") => Follow::Body(f),
            Some(f) if self.tok(f).is_op(";") => Follow::Terminator(f + 1),
            Some(f) if self.doc.newline_between(after - 1, f) => Follow::Terminator(after),
            Some(f) => Follow::Other(f),
        };
        Ok(Signature { annotation, follow })
    }

    /// Walk back over `export`, `default`, `declare` and `async` before `i`.
    fn prefix_start(&self, i: usize, from: usize) -> usize {
        let mut start = i;
        while let Some(p) = self.retained_before(start, from) {
            let token = self.tok(p);
            let prefix = token.is_keyword("export")
                || token.is_keyword("default")
                || token.is_ident("declare")
                || token.is_ident("async");
            if !prefix {
                break;
            }
            start = p;
        }
        start
    }

    /// A parameter list between `from` and its `)` at `to`.
    pub(crate) fn params(&mut self, from: usize, to: usize) -> Result<(), TransformError> {
        let mut items = Vec::new();
        let mut item_start = from;
        let mut j = from;
        while let Some(k) = self.next(j, to) {
            if self.tok(k).is_op(",") {
                items.push((item_start, k));
                item_start = k + 1;
                j = k + 1;
                continue;
            }
            j = self.group_end(k).map_or(k + 1, |close| close + 1);
        }
        items.push((item_start, to));

        let count = items.len();
        for (n, &(start, end)) in items.iter().enumerate() {
            let next_item = (n + 1 < count).then(|| items[n + 1].0);
            self.param(start, end, next_item, to)?;
        }
        Ok(())
    }

    /// One parameter in `start..end`; `end` is its `,` or the list end.
    fn param(
        &mut self,
        start: usize,
        end: usize,
        next_item: Option<usize>,
        to: usize,
    ) -> Result<(), TransformError> {
        let Some(mut j) = self.next(start, end) else {
            return Ok(());
        };
        while self.tok(j).is_op("@") {
            self.warn(None, AmbiguityReason::Decorator, j);
            match self.next(self.skip_decorator(j, end), end) {
                Some(n) => j = n,
                None => return Ok(()),
            }
        }
        if PARAM_MODIFIERS.iter().any(|w| self.tok(j).is_word(w))
            && self.next(j + 1, end).is_some_and(|n| self.names_member(j, n))
        {
            self.warn(None, AmbiguityReason::ParameterProperty, j);
            return Ok(());
        }

        if self.tok(j).is_keyword("this") {
            let after = self.next(j + 1, end);
            if after.is_none() || after.is_some_and(|a| self.tok(a).is_op(":")) {
                let stop = match next_item {
                    Some(item) => self.next(item, to).unwrap_or(end + 1),
                    None => end,
                };
                self.plan(TypeSpanKind::ParamAnnotation, j, stop);
                return Ok(());
            }
        }

        if self.tok(j).is_op("...") {
            match self.next(j + 1, end) {
                Some(n) => j = n,
                None => return Ok(()),
            }
        }
        let token = self.tok(j);
        let binding_end = match token.kind {
            TokenKind::Identifier | TokenKind::Keyword => j + 1,
            _ if token.is_op("{") || token.is_op("[") => {
                let close = self.closer(j, end);
                self.walk(j + 1, close, Frame::Pattern)?;
                close + 1
            }
            _ => return self.walk(j, end, Frame::Expr),
        };

        let mut k = self.next(binding_end, end);
        if let Some(q) = k.filter(|&q| self.tok(q).is_op("?")) {
            self.plan(TypeSpanKind::OptionalMarker, q, q + 1);
            k = self.next(q + 1, end);
        }
        if let Some(colon) = k.filter(|&c| self.tok(c).is_op(":")) {
            let kind = TypeSpanKind::ParamAnnotation;
            match self.type_end(kind, colon, colon + 1, end)? {
                Some(type_end) => {
                    let follower = self.next(type_end, end);
                    if follower.map_or(true, |f| self.tok(f).is_op("=")) {
                        self.plan(kind, colon, type_end);
                    } else {
                        self.warn(Some(kind), AmbiguityReason::UnexpectedTerminator, colon);
                    }
                    k = follower;
                }
                None => return Ok(()),
            }
        }
        if let Some(eq) = k.filter(|&e| self.tok(e).is_op("=")) {
            self.walk(eq + 1, end, Frame::Expr)?;
        }
        Ok(())
    }
}
