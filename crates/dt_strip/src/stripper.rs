//! The stripping pass.
//!
//! A single walk over the token arena. Each region (file, block, class body,
//! parameter list, expression group, JSX container, template interpolation)
//! is walked with a [`Frame`] naming what it is, and a small set of
//! recognisers decides which token ranges are pure type syntax. Ranges are
//! collected as [`TypeSpan`]s; nothing is removed until rendering.

use std::collections::BTreeMap;

use dt_ast::{
    AmbiguityReason, AmbiguousConstruct, Punct, TemplatePart, Token, TokenKind, TransformError,
    TypeSpan, TypeSpanKind,
};
use tracing::{debug, warn};

use crate::document::Document;
use crate::emit::{Rewrite, Stripped};
use crate::imports::rewrite_specifier;
use crate::types::{TypeError, TypeParser};

/// What kind of region a walk is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Frame {
    TopLevel,
    Block,
    ClassBody,
    Object,
    Pattern,
    Params,
    Expr,
    Bracket,
    JsxExpr,
    Template,
}

/// Keywords that begin a new statement and so end a `const a, b` list.
const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "for", "while", "do", "return", "throw", "switch", "try", "break", "continue", "export",
    "import",
];

/// Knobs for the stripping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripOptions {
    /// Rewrite `.ts`/`.tsx`/`.mts`/`.cts` extensions in relative and
    /// aliased import specifiers.
    pub rewrite_import_paths: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            rewrite_import_paths: true,
        }
    }
}

/// Find every type span in `doc`.
///
/// Returns an error when a construct that is unambiguously type syntax runs
/// into the end of input; the file must then be left untouched.
pub fn strip(doc: &Document<'_>, options: &StripOptions) -> Result<Stripped, TransformError> {
    let mut stripper = Stripper::new(doc, *options);
    stripper.walk(0, doc.len(), Frame::TopLevel)?;
    Ok(stripper.finish())
}

#[derive(Debug, Default)]
struct Cursor {
    /// Inside `const a = 1, b: T = 2`, where a `,` starts another declarator.
    decl_list: bool,
}

pub(crate) struct Stripper<'d, 'src> {
    pub(crate) doc: &'d Document<'src>,
    options: StripOptions,
    plan: BTreeMap<usize, TypeSpan>,
    rewrites: BTreeMap<usize, String>,
    warnings: Vec<AmbiguousConstruct>,
}

impl<'d, 'src> Stripper<'d, 'src> {
    fn new(doc: &'d Document<'src>, options: StripOptions) -> Self {
        Self {
            doc,
            options,
            plan: BTreeMap::new(),
            rewrites: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(self) -> Stripped {
        let doc = self.doc;
        Stripped {
            spans: self.plan.into_values().collect(),
            rewrites: self
                .rewrites
                .into_iter()
                .map(|(index, replacement)| Rewrite {
                    index,
                    offset: doc.token(index).start,
                    original: doc.token(index).text.to_string(),
                    replacement,
                })
                .collect(),
            warnings: self.warnings,
        }
    }

    // ---- token helpers ----

    pub(crate) fn tok(&self, index: usize) -> &'d Token<'src> {
        &self.doc.tokens[index]
    }

    pub(crate) fn next(&self, from: usize, to: usize) -> Option<usize> {
        self.doc.next_sig(from, to)
    }

    /// Whether the significant token at `index` is the operator `text`.
    pub(crate) fn next_is(&self, from: usize, to: usize, text: &str) -> Option<usize> {
        self.next(from, to).filter(|&k| self.tok(k).is_op(text))
    }

    /// Partner of an opener, or `to` when it never closes.
    pub(crate) fn closer(&self, open: usize, to: usize) -> usize {
        match self.doc.matching(open) {
            Some(close) if close > open => close.min(to),
            _ => to,
        }
    }

    /// For any opener, the index of the token that finally closes it: a
    /// template head resolves to its tail. `None` for non-openers and
    /// openers that never close.
    pub(crate) fn group_end(&self, index: usize) -> Option<usize> {
        let token = self.tok(index);
        let opener = match token.kind {
            TokenKind::Punctuator(Punct::Operator) => matches!(token.text, "(" | "[" | "{"),
            TokenKind::Punctuator(Punct::TypeArgsOpen) => true,
            TokenKind::JsxTag => token.text == "{",
            TokenKind::TemplateLiteral(TemplatePart::Head) => true,
            _ => false,
        };
        if !opener {
            return None;
        }
        let mut close = self.doc.matching(index).filter(|&c| c > index)?;
        while self.tok(close).kind == TokenKind::TemplateLiteral(TemplatePart::Middle) {
            close = self.doc.matching(close).filter(|&c| c > close)?;
        }
        Some(close)
    }

    fn span_covering(&self, index: usize) -> Option<&TypeSpan> {
        self.plan
            .range(..=index)
            .next_back()
            .map(|(_, span)| span)
            .filter(|span| span.end > index)
    }

    pub(crate) fn covered(&self, index: usize) -> bool {
        self.span_covering(index).is_some()
    }

    /// The last significant token before `index` (and at or after `from`)
    /// that survives the spans planned so far.
    pub(crate) fn retained_before(&self, index: usize, from: usize) -> Option<usize> {
        let mut j = index;
        while j > from {
            j -= 1;
            if let Some(span) = self.span_covering(j) {
                j = span.start;
                continue;
            }
            if !self.tok(j).is_trivia() {
                return Some(j);
            }
        }
        None
    }

    // ---- planning ----

    /// Record `start..end` as a span of `kind`. Refuses spans that would
    /// remove JSX or overlap an earlier span.
    pub(crate) fn plan(&mut self, kind: TypeSpanKind, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        if let Some(offset) = self.doc.tokens[start..end]
            .iter()
            .position(|t| t.kind.is_jsx())
        {
            self.warn(Some(kind), AmbiguityReason::CrossesJsx, start + offset);
            return false;
        }
        if let Some((_, earlier)) = self.plan.range(..end).next_back() {
            if earlier.end > start {
                debug!(%kind, start, end, "overlapping span dropped");
                return false;
            }
        }
        let first = self.doc.next_sig(start, end).unwrap_or(start);
        let span = TypeSpan {
            kind,
            start,
            end,
            start_offset: self.tok(first).start,
        };
        debug!(%kind, offset = span.start_offset, tokens = end - start, "type span");
        self.plan.insert(start, span);
        true
    }

    /// Plan a whole statement, taking its indentation and line break along
    /// when it is the only thing on its line. Spans already planned inside
    /// the range are superseded.
    pub(crate) fn plan_statement(&mut self, kind: TypeSpanKind, start: usize, end: usize) -> bool {
        let tokens = &self.doc.tokens;
        let mut lead = start;
        while lead > 0 && tokens[lead - 1].kind == TokenKind::Whitespace && !self.covered(lead - 1) {
            lead -= 1;
        }
        let line_start = lead == 0 || tokens[lead - 1].kind == TokenKind::Newline;

        let mut trail = end;
        while trail < tokens.len() && tokens[trail].kind == TokenKind::Whitespace {
            trail += 1;
        }
        let line_end = trail == tokens.len() || tokens[trail].kind == TokenKind::Newline;

        let (from, to) = match (line_start, line_end) {
            (true, true) => (lead, (trail + 1).min(tokens.len())),
            (true, false) => (start, trail),
            _ => (lead, end),
        };
        self.unplan_within(from, to);
        self.plan(kind, from, to)
    }

    fn unplan_within(&mut self, from: usize, to: usize) {
        let inner: Vec<usize> = self
            .plan
            .range(from..to)
            .filter(|(_, span)| span.end <= to)
            .map(|(&start, _)| start)
            .collect();
        for start in inner {
            self.plan.remove(&start);
        }
    }

    pub(crate) fn warn(&mut self, kind: Option<TypeSpanKind>, reason: AmbiguityReason, index: usize) {
        let token = self.tok(index);
        let construct = AmbiguousConstruct {
            kind,
            reason,
            offset: token.start,
            line: token.line,
            column: token.column,
        };
        warn!(%construct, "left untouched");
        self.warnings.push(construct);
    }

    pub(crate) fn unterminated(&self, kind: TypeSpanKind, index: usize) -> TransformError {
        let token = self.tok(index);
        TransformError::UnterminatedConstruct {
            kind,
            start_offset: token.start,
            line: token.line,
            column: token.column,
        }
    }

    pub(crate) fn rewrite(&mut self, index: usize) {
        if !self.options.rewrite_import_paths {
            return;
        }
        let token = self.tok(index);
        if token.kind != TokenKind::StringLiteral {
            return;
        }
        if let Some(replacement) = rewrite_specifier(token.text) {
            debug!(from = token.text, to = %replacement, "import path rewritten");
            self.rewrites.insert(index, replacement);
        }
    }

    // ---- type expressions ----

    pub(crate) fn parse_type(&self, from: usize, limit: usize) -> Result<usize, TypeError> {
        TypeParser::new(self.doc, limit).parse(from)
    }

    /// End of the type starting after `from`. Running out of input is fatal;
    /// anything else unparseable is reported and yields `None`.
    pub(crate) fn type_end(
        &mut self,
        kind: TypeSpanKind,
        anchor: usize,
        from: usize,
        limit: usize,
    ) -> Result<Option<usize>, TransformError> {
        match self.parse_type(from, limit) {
            Ok(end) => Ok(Some(end)),
            Err(TypeError::Eof) => Err(self.unterminated(kind, anchor)),
            Err(TypeError::Unexpected(_)) => {
                self.warn(Some(kind), AmbiguityReason::UnrecognizedType, anchor);
                Ok(None)
            }
        }
    }

    // ---- the walk ----

    pub(crate) fn walk(&mut self, from: usize, to: usize, frame: Frame) -> Result<(), TransformError> {
        match frame {
            Frame::ClassBody => return self.class_body(from, to),
            Frame::Params => return self.params(from, to),
            _ => {}
        }
        let mut cursor = Cursor::default();
        let mut next = self.next(from, to);
        while let Some(i) = next {
            let resume = self.step(i, from, to, frame, &mut cursor)?;
            next = self.next(resume.max(i + 1), to);
        }
        Ok(())
    }

    /// Handle the construct starting at token `i`; returns where to resume.
    fn step(
        &mut self,
        i: usize,
        from: usize,
        to: usize,
        frame: Frame,
        cursor: &mut Cursor,
    ) -> Result<usize, TransformError> {
        let token = self.tok(i);
        match token.kind {
            TokenKind::JsxText => return Ok(i + 1),
            TokenKind::JsxTag => {
                if token.text == "{" {
                    let close = self.closer(i, to);
                    self.walk(i + 1, close, Frame::JsxExpr)?;
                    return Ok(close + 1);
                }
                return Ok(i + 1);
            }
            TokenKind::TemplateLiteral(TemplatePart::Head | TemplatePart::Middle) => {
                let chunk = self.closer(i, to);
                self.walk(i + 1, chunk, Frame::Template)?;
                return Ok(chunk);
            }
            _ => {}
        }

        let prev = self.retained_before(i, from);

        if matches!(frame, Frame::TopLevel | Frame::Block) {
            if let Some(resume) = self.statement(i, to, prev)? {
                cursor.decl_list = false;
                return Ok(resume);
            }
        }

        match token.kind {
            TokenKind::Keyword => match token.text {
                "const" | "let" | "var" => {
                    cursor.decl_list = true;
                    return self.var_decl(i, to);
                }
                "class" => return self.class(i, to),
                "function" => return self.function(i, from, to),
                "import" => self.dynamic_import(i, to),
                word if STATEMENT_KEYWORDS.contains(&word) => cursor.decl_list = false,
                _ => {}
            },
            TokenKind::Identifier if token.text == "as" || token.text == "satisfies" => {
                return self.cast(i, to, prev);
            }
            TokenKind::Punctuator(Punct::TypeArgsOpen) => return self.type_args(i, to, prev),
            TokenKind::Punctuator(Punct::NonNullAssertion) => return Ok(self.non_null(i, to)),
            TokenKind::Punctuator(Punct::Operator) => match token.text {
                ";" => cursor.decl_list = false,
                "," if cursor.decl_list => {
                    if let Some(j) = self.next(i + 1, to) {
                        return self.declarator(j, to);
                    }
                }
                "?" => self.optional_marker(i, to),
                "@" => self.warn(None, AmbiguityReason::Decorator, i),
                "(" => return self.paren(i, from, to, frame, prev),
                "[" => {
                    let close = self.closer(i, to);
                    self.walk(i + 1, close, Frame::Bracket)?;
                    return Ok(close + 1);
                }
                "{" => {
                    let close = self.closer(i, to);
                    let inner = self.brace_frame(frame, prev);
                    self.walk(i + 1, close, inner)?;
                    return Ok(close + 1);
                }
                _ => {}
            },
            _ => {}
        }
        Ok(i + 1)
    }

    /// What a `{` opens, judged from the token before it.
    fn brace_frame(&self, frame: Frame, prev: Option<usize>) -> Frame {
        let Some(p) = prev else {
            return match frame {
                Frame::TopLevel | Frame::Block => Frame::Block,
                Frame::Pattern => Frame::Pattern,
                _ => Frame::Object,
            };
        };
        let token = self.tok(p);
        match token.kind {
            TokenKind::Punctuator(Punct::Operator) => match token.text {
                "=>" | ")" | ";" | "{" | "}" => Frame::Block,
                ":" if matches!(frame, Frame::TopLevel | Frame::Block) => Frame::Block,
                _ if frame == Frame::Pattern => Frame::Pattern,
                _ => Frame::Object,
            },
            TokenKind::Keyword => match token.text {
                "else" | "do" | "try" | "finally" => Frame::Block,
                _ => Frame::Object,
            },
            _ if matches!(frame, Frame::TopLevel | Frame::Block) => Frame::Block,
            _ => Frame::Object,
        }
    }

    /// A parenthesised group: arrow or method parameters, or an expression.
    fn paren(
        &mut self,
        i: usize,
        from: usize,
        to: usize,
        frame: Frame,
        prev: Option<usize>,
    ) -> Result<usize, TransformError> {
        let Some(close) = self.doc.matching(i).filter(|&c| c > i && c < to) else {
            self.walk(i + 1, to, Frame::Expr)?;
            return Ok(to);
        };
        if prev.is_some_and(|p| self.tok(p).is_keyword("catch")) {
            self.walk(i + 1, close, Frame::Params)?;
            return Ok(close + 1);
        }

        if let Some(after) = self.next(close + 1, to) {
            if self.tok(after).is_op("=>") {
                self.walk(i + 1, close, Frame::Params)?;
                return Ok(close + 1);
            }
            if self.tok(after).is_op(":") {
                if let Ok(end) = self.parse_type(after + 1, to) {
                    let in_branch = prev.is_some_and(|p| self.tok(p).is_op("?"));
                    let arrow = self.next_is(end, to, "=>");
                    if arrow.is_some_and(|a| !in_branch || self.branch_colon_follows(a, to)) {
                        self.walk(i + 1, close, Frame::Params)?;
                        self.plan(TypeSpanKind::ReturnAnnotation, after, end);
                        return Ok(end);
                    }
                }
            }
            if frame == Frame::Object && self.is_method_key(prev, from) {
                if let Some(body) = self.body_after(close, to) {
                    self.walk(i + 1, close, Frame::Params)?;
                    if body.annotation_end > 0 {
                        self.plan(TypeSpanKind::ReturnAnnotation, after, body.annotation_end);
                    }
                    let end = self.closer(body.brace, to);
                    self.walk(body.brace + 1, end, Frame::Block)?;
                    return Ok(end + 1);
                }
            }
        }

        self.walk(i + 1, close, Frame::Expr)?;
        Ok(close + 1)
    }

    /// In `c ? (a): T => b`, the `:` is the conditional's own unless the
    /// arrow body is followed by another `:` for the false branch.
    fn branch_colon_follows(&self, arrow: usize, to: usize) -> bool {
        let mut open_conditionals = 0usize;
        let mut next = self.next(arrow + 1, to);
        while let Some(k) = next {
            if let Some(close) = self.group_end(k) {
                next = self.next(close + 1, to);
                continue;
            }
            let token = self.tok(k);
            if token.is_op("?") {
                open_conditionals += 1;
            } else if token.is_op(":") {
                if open_conditionals == 0 {
                    return true;
                }
                open_conditionals -= 1;
            } else if token.is_op(",") || token.is_op(";") {
                return false;
            }
            next = self.next(k + 1, to);
        }
        false
    }

    /// Whether the token before a `(` in an object literal names a
    /// shorthand method (`foo(`, `get foo(`, `*gen(`, `[key](`).
    fn is_method_key(&self, prev: Option<usize>, from: usize) -> bool {
        let Some(p) = prev else { return false };
        let token = self.tok(p);
        let key_start = match token.kind {
            TokenKind::Identifier
            | TokenKind::Keyword
            | TokenKind::StringLiteral
            | TokenKind::NumberLiteral => p,
            TokenKind::Punctuator(Punct::Operator) if token.text == "]" => {
                match self.doc.matching(p) {
                    Some(open) if open < p => open,
                    _ => return false,
                }
            }
            _ => return false,
        };
        match self.retained_before(key_start, from) {
            None => true,
            Some(q) => {
                let before = self.tok(q);
                before.is_op(",") || before.is_op("*") || ["get", "set", "async"].iter().any(|w| before.is_ident(w))
            }
        }
    }

    /// `{` (optionally after `: ReturnType`) following a parameter list.
    fn body_after(&self, close: usize, to: usize) -> Option<Body> {
        let k = self.next(close + 1, to)?;
        if self.tok(k).is_op("{") {
            return Some(Body {
                brace: k,
                annotation_end: 0,
            });
        }
        if self.tok(k).is_op(":") {
            let end = self.parse_type(k + 1, to).ok()?;
            let brace = self.next_is(end, to, "{")?;
            return Some(Body {
                brace,
                annotation_end: end,
            });
        }
        None
    }

    /// Whether the `(` at `open` starts a parameter list: it is followed by
    /// a body or an arrow, possibly after a return annotation.
    fn declares_params(&self, open: usize, to: usize) -> bool {
        let Some(close) = self.doc.matching(open).filter(|&c| c > open && c < to) else {
            return false;
        };
        let Some(k) = self.next(close + 1, to) else {
            return false;
        };
        let token = self.tok(k);
        if token.is_op("{") || token.is_op("=>") {
            return true;
        }
        token.is_op(":")
            && self.parse_type(k + 1, to).is_ok_and(|end| {
                self.next(end, to)
                    .is_some_and(|f| self.tok(f).is_op("{") || self.tok(f).is_op("=>"))
            })
    }

    /// A `<...>` list seen by the lexer.
    fn type_args(&mut self, i: usize, to: usize, prev: Option<usize>) -> Result<usize, TransformError> {
        let Some(close) = self.doc.matching(i).filter(|&c| c > i) else {
            return Err(self.unterminated(TypeSpanKind::GenericArgList, i));
        };
        // A JSX tag name takes type arguments like a call does.
        let after_operand = prev.is_some_and(|p| {
            let token = self.tok(p);
            token.ends_operand() || token.kind == TokenKind::JsxTag
        });
        let params_follow = self
            .next_is(close + 1, to, "(")
            .is_some_and(|open| self.declares_params(open, to));
        let kind = if params_follow {
            TypeSpanKind::GenericParamList
        } else if after_operand {
            TypeSpanKind::GenericArgList
        } else {
            TypeSpanKind::AsCast
        };
        self.plan(kind, i, close + 1);
        Ok(close + 1)
    }

    /// `x as T`, `x as const`, `x satisfies T`.
    fn cast(&mut self, i: usize, to: usize, prev: Option<usize>) -> Result<usize, TransformError> {
        let Some(p) = prev else { return Ok(i + 1) };
        if !self.tok(p).ends_operand() || self.doc.newline_between(p, i) {
            return Ok(i + 1);
        }
        let kind = if self.tok(i).text == "as" {
            TypeSpanKind::AsCast
        } else {
            TypeSpanKind::SatisfiesCast
        };
        let Some(t) = self.next(i + 1, to) else {
            if to >= self.doc.len() {
                return Err(self.unterminated(kind, i));
            }
            return Ok(i + 1);
        };
        let end = if kind == TypeSpanKind::AsCast && self.tok(t).is_keyword("const") {
            t + 1
        } else {
            match self.type_end(kind, i, t, to)? {
                Some(end) => end,
                None => return Ok(i + 1),
            }
        };

        let mut start = i;
        while start > p + 1 && self.tok(start - 1).is_trivia() && !self.covered(start - 1) {
            start -= 1;
        }
        self.plan(kind, start, end);
        Ok(end)
    }

    fn non_null(&mut self, i: usize, to: usize) -> usize {
        if let Some(n) = self.next(i + 1, to) {
            if !self.doc.newline_between(i, n) && starts_operand(self.tok(n)) {
                self.warn(
                    Some(TypeSpanKind::NonNullAssertion),
                    AmbiguityReason::AssertionBeforeOperand,
                    i,
                );
                return i + 1;
            }
        }
        self.plan(TypeSpanKind::NonNullAssertion, i, i + 1);
        i + 1
    }

    /// `name?:` in object types that slipped into value position.
    ///
    /// This is lexical: `let o = { x?: number }` becomes `{ x: number }`,
    /// an object literal whose `x` is the value of a variable named
    /// `number`. The marker goes, but the type that follows is not removed
    /// because an object literal cannot be told apart from an object type
    /// by its tokens alone.
    pub(crate) fn optional_marker(&mut self, i: usize, to: usize) {
        if i == 0 {
            return;
        }
        let before = self.tok(i - 1);
        let named = matches!(
            before.kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::StringLiteral | TokenKind::NumberLiteral
        ) || before.is_op("]");
        if named && !self.covered(i - 1) && self.next_is(i + 1, to, ":").is_some() {
            self.plan(TypeSpanKind::OptionalMarker, i, i + 1);
        }
    }

    /// `import('./x.ts')`.
    fn dynamic_import(&mut self, i: usize, to: usize) {
        let Some(open) = self.next_is(i + 1, to, "(") else {
            return;
        };
        if let Some(spec) = self.next(open + 1, to) {
            self.rewrite(spec);
        }
    }

    /// Whether the line break between `last` and `next` continues the
    /// current statement instead of ending it.
    pub(crate) fn continues_line(&self, last: usize, next: usize) -> bool {
        let a = self.tok(last);
        let b = self.tok(next);
        let dangling = match a.kind {
            TokenKind::Punctuator(Punct::Operator) => !matches!(a.text, ")" | "]" | "}" | "++" | "--"),
            TokenKind::Punctuator(Punct::TypeArgsOpen) => true,
            TokenKind::Keyword => matches!(
                a.text,
                "extends" | "implements" | "new" | "typeof" | "in" | "instanceof" | "return" | "void"
            ),
            _ => false,
        };
        let leading = match b.kind {
            TokenKind::Punctuator(Punct::Operator) => {
                !matches!(b.text, "(" | "[" | "{" | "!" | "~" | "++" | "--" | "@" | "}")
            }
            TokenKind::Keyword => matches!(b.text, "extends" | "implements" | "in" | "instanceof"),
            TokenKind::Identifier => matches!(b.text, "as" | "satisfies" | "is"),
            _ => false,
        };
        dangling || leading
    }

    /// One past the end of the statement starting at `from`: after its `;`,
    /// after a body block when `bodies` is set, or before a line break that
    /// does not continue it.
    pub(crate) fn statement_end(&self, from: usize, to: usize, bodies: bool) -> usize {
        let mut j = from;
        let mut last: Option<usize> = None;
        loop {
            let Some(k) = self.next(j, to) else {
                return last.map_or(to, |l| l + 1);
            };
            if let Some(l) = last {
                if self.doc.newline_between(l, k) && !self.continues_line(l, k) {
                    return l + 1;
                }
            }
            let token = self.tok(k);
            if token.is_op(";") {
                return k + 1;
            }
            if let Some(close) = self.group_end(k) {
                if bodies && token.is_op("{") && self.opens_body(last) {
                    return close + 1;
                }
                last = Some(close);
                j = close + 1;
                continue;
            }
            if self.doc.matching(k).is_none() && (token.is_op("(") || token.is_op("{") || token.is_op("[")) {
                return to;
            }
            last = Some(k);
            j = k + 1;
        }
    }

    /// Whether a `{` after `last` opens a declaration body rather than an
    /// object type or literal.
    fn opens_body(&self, last: Option<usize>) -> bool {
        last.map_or(true, |l| {
            let token = self.tok(l);
            token.kind != TokenKind::Punctuator(Punct::Operator)
                || matches!(token.text, ")" | "]" | "}")
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    brace: usize,
    /// End of the return annotation, or 0 when there is none.
    annotation_end: usize,
}

/// Whether `token` can begin an operand, making a `!` before it a prefix
/// negation of that operand rather than a postfix assertion.
fn starts_operand(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier => !matches!(token.text, "as" | "satisfies" | "of"),
        TokenKind::NumberLiteral | TokenKind::StringLiteral | TokenKind::RegexLiteral => true,
        TokenKind::TemplateLiteral(part) => {
            matches!(part, TemplatePart::NoSubstitution | TemplatePart::Head)
        }
        TokenKind::Keyword => matches!(
            token.text,
            "this" | "true" | "false" | "null" | "new" | "function" | "class" | "typeof" | "void"
                | "delete" | "await" | "yield" | "super"
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use dt_ast::{DtSyntax, TypeSpanKind};

    use super::*;

    fn run(source: &str, jsx: bool) -> (String, Stripped) {
        let doc = Document::parse(source, DtSyntax { jsx }).unwrap();
        let stripped = strip(&doc, &StripOptions::default()).unwrap();
        (stripped.render(&doc), stripped)
    }

    fn ts(source: &str) -> String {
        run(source, false).0
    }

    fn tsx(source: &str) -> String {
        run(source, true).0
    }

    fn kinds(source: &str) -> Vec<TypeSpanKind> {
        run(source, false).1.spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn variable_annotations() {
        assert_eq!(ts("let a: string = 'x';"), "let a = 'x';");
        assert_eq!(ts("const a: number = 1, b: string = '';"), "const a = 1, b = '';");
        assert_eq!(ts("let x: Map<string, number[]>;"), "let x;");
        assert_eq!(ts("const { a, b }: Props = props;"), "const { a, b } = props;");
    }

    #[test]
    fn generic_arrow_in_tsx() {
        assert_eq!(
            tsx("const Foo = <T,>(x: T) => <div>{x}</div>;"),
            "const Foo = (x) => <div>{x}</div>;"
        );
    }

    #[test]
    fn arrow_return_annotations() {
        assert_eq!(
            ts("const f = (a: number, b?: string): void => {};"),
            "const f = (a, b) => {};"
        );
        assert_eq!(ts("const g = async (x: T): Promise<T> => x;"), "const g = async (x) => x;");
    }

    #[test]
    fn arrow_in_conditional_branch() {
        assert_eq!(ts("const x = cond ? (a): b => c;"), "const x = cond ? (a): b => c;");
        assert!(kinds("const x = cond ? (a): b => c;").is_empty());
        assert_eq!(
            ts("const x = cond ? (a): b => c : d;"),
            "const x = cond ? (a) => c : d;"
        );
        assert_eq!(
            ts("const x = p ? (a): T => (q ? 1 : 2) : d;"),
            "const x = p ? (a) => (q ? 1 : 2) : d;"
        );
    }

    #[test]
    fn jsx_element_type_arguments() {
        let (out, stripped) = run("const el = <Select<Option> value={v} />;", true);
        assert_eq!(out, "const el = <Select value={v} />;");
        assert_eq!(stripped.counts().get(TypeSpanKind::GenericArgList), 1);
    }

    #[test]
    fn casts() {
        assert_eq!(ts("const n = value as number;"), "const n = value;");
        assert_eq!(ts("const c = [1, 2] as const;"), "const c = [1, 2];");
        assert_eq!(ts("const s = (x as any).y;"), "const s = (x).y;");
        assert_eq!(
            ts("const cfg = { a: 1 } satisfies Config;"),
            "const cfg = { a: 1 };"
        );
        assert_eq!(ts("const n = <number>value;"), "const n = value;");
        assert_eq!(ts("const as = 1; f(as);"), "const as = 1; f(as);");
    }

    #[test]
    fn non_null() {
        assert_eq!(ts("a!.b;"), "a.b;");
        assert_eq!(ts("const el = document.getElementById('x')!;"), "const el = document.getElementById('x');");
        assert_eq!(ts("if (a !== b && !c) {}"), "if (a !== b && !c) {}");
    }

    #[test]
    fn optional_marker_in_value_position() {
        assert_eq!(ts("let o = { x?: number };"), "let o = { x: number };");
        assert_eq!(ts("const t = a ? b : c;"), "const t = a ? b : c;");
    }

    #[test]
    fn generic_calls() {
        assert_eq!(
            ts("const [v, setV] = useState<string | null>(null);"),
            "const [v, setV] = useState(null);"
        );
        assert_eq!(ts("if (a < b && c > d) {}"), "if (a < b && c > d) {}");
        assert_eq!(kinds("f<T>(x);"), vec![TypeSpanKind::GenericArgList]);
    }

    #[test]
    fn object_methods() {
        assert_eq!(
            ts("const o = { run(x: number): string { return ''; }, y: 1 };"),
            "const o = { run(x) { return ''; }, y: 1 };"
        );
        assert_eq!(
            ts("const o = { get v(): number { return 1; } };"),
            "const o = { get v() { return 1; } };"
        );
    }

    #[test]
    fn catch_clause() {
        assert_eq!(ts("try { f(); } catch (e: unknown) {}"), "try { f(); } catch (e) {}");
    }

    #[test]
    fn template_interpolation_is_code() {
        assert_eq!(ts("const s = `id ${x as string}!`;"), "const s = `id ${x}!`;");
    }

    #[test]
    fn jsx_containers() {
        assert_eq!(
            tsx("const a = <Button onClick={(e: MouseEvent) => go(e!)}>Go!</Button>;"),
            "const a = <Button onClick={(e) => go(e)}>Go!</Button>;"
        );
    }

    #[test]
    fn assertion_before_operand_is_flagged() {
        let (out, stripped) = run("a! b", false);
        assert_eq!(out, "a! b");
        assert_eq!(stripped.warnings.len(), 1);
        assert_eq!(stripped.warnings[0].reason, AmbiguityReason::AssertionBeforeOperand);
    }

    #[test]
    fn dangling_cast_is_fatal() {
        let doc = Document::parse("const x = y as", DtSyntax::default()).unwrap();
        let err = strip(&doc, &StripOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnterminatedConstruct { kind: TypeSpanKind::AsCast, start_offset: 12, .. }
        ));
    }

    #[test]
    fn statement_end_follows_continuations() {
        let doc = Document::parse("enum A {\n  B\n}\nx", DtSyntax::default()).unwrap();
        let stripper = Stripper::new(&doc, StripOptions::default());
        let end = stripper.statement_end(0, doc.len(), true);
        assert_eq!(doc.token(end - 1).text, "}");

        let doc = Document::parse("declare const a:\n  string\nb", DtSyntax::default()).unwrap();
        let stripper = Stripper::new(&doc, StripOptions::default());
        let end = stripper.statement_end(0, doc.len(), true);
        assert_eq!(doc.token(end - 1).text, "string");
    }
}
