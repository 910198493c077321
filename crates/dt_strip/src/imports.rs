//! Import and export clauses.

use dt_ast::{AmbiguityReason, TokenKind, TransformError, TypeSpanKind};

use crate::stripper::Stripper;

/// Specifier prefixes that name project files rather than packages.
const LOCAL_PREFIXES: &[&str] = &["./", "../", "/", "@/", "~/"];

/// Source extension to emitted extension. `.tsx` must be tried before `.ts`.
const EXTENSIONS: &[(&str, &str)] = &[
    (".tsx", ".jsx"),
    (".mts", ".mjs"),
    (".cts", ".cjs"),
    (".ts", ".js"),
];

/// Rewrite a quoted module specifier that points at a TypeScript source file
/// to the extension it will have once converted. Returns `None` when the
/// literal should stay as it is.
///
/// ```
/// use dt_strip::rewrite_specifier;
///
/// assert_eq!(rewrite_specifier("'./App.tsx'").as_deref(), Some("'./App.jsx'"));
/// assert_eq!(rewrite_specifier("\"react\""), None);
/// ```
pub fn rewrite_specifier(literal: &str) -> Option<String> {
    let quote = literal.chars().next().filter(|q| *q == '\'' || *q == '"')?;
    if literal.len() < 2 || !literal.ends_with(quote) {
        return None;
    }
    let path = &literal[1..literal.len() - 1];
    if !LOCAL_PREFIXES.iter().any(|p| path.starts_with(p)) || path.ends_with(".d.ts") {
        return None;
    }
    let (from, to) = EXTENSIONS.iter().find(|(from, _)| path.ends_with(from))?;
    let stem = &path[..path.len() - from.len()];
    Some(format!("{quote}{stem}{to}{quote}"))
}

impl<'d, 'src> Stripper<'d, 'src> {
    pub(crate) fn import_statement(&mut self, i: usize, to: usize) -> Result<usize, TransformError> {
        let kind = TypeSpanKind::TypeOnlyImportClause;
        let Some(j) = self.next(i + 1, to) else {
            return Err(self.unterminated(kind, i));
        };
        let token = self.tok(j);

        if token.kind == TokenKind::StringLiteral {
            self.rewrite(j);
            return Ok(self.with_semicolon(j + 1, to));
        }
        if token.is_ident("type") {
            if let Some(k) = self.next(j + 1, to) {
                let after = self.tok(k);
                // `import type from './x'` binds a default named `type`.
                let default_named_type = after.is_ident("from")
                    && self
                        .next(k + 1, to)
                        .is_some_and(|s| self.tok(s).kind == TokenKind::StringLiteral);
                let type_only = after.is_op("{")
                    || after.is_op("*")
                    || (after.kind == TokenKind::Identifier && !default_named_type);
                if type_only {
                    let end = self.clause_statement_end(k, to, kind, i)?;
                    self.plan_statement(kind, i, end);
                    return Ok(end);
                }
            }
        }
        if token.kind == TokenKind::Identifier && self.next_is(j + 1, to, "=").is_some() {
            self.warn(None, AmbiguityReason::ImportRequire, i);
            return Ok(self.statement_end(j, to, false));
        }

        let mut k = j;
        let mut default_comma = None;
        if token.kind == TokenKind::Identifier {
            match self.next_is(j + 1, to, ",") {
                Some(comma) => {
                    default_comma = Some(comma);
                    match self.next(comma + 1, to) {
                        Some(n) => k = n,
                        None => return Err(self.unterminated(kind, i)),
                    }
                }
                None => return self.from_clause(i, j + 1, to, kind),
            }
        }
        if self.tok(k).is_op("{") {
            return self.named_clause(i, k, to, kind, default_comma);
        }
        self.from_clause(i, k, to, kind)
    }

    /// `export type {...}`, `export {...} [from]`, `export * from`; `None`
    /// for exports of declarations, which the statement walk handles.
    pub(crate) fn export_statement(
        &mut self,
        i: usize,
        to: usize,
    ) -> Result<Option<usize>, TransformError> {
        let kind = TypeSpanKind::TypeOnlyExportClause;
        let Some(j) = self.next(i + 1, to) else {
            return Ok(None);
        };
        let token = self.tok(j);

        if token.is_ident("type") {
            let clause = self
                .next_is(j + 1, to, "{")
                .or_else(|| self.next_is(j + 1, to, "*"));
            if let Some(k) = clause {
                let end = self.clause_statement_end(k, to, kind, i)?;
                self.plan_statement(kind, i, end);
                return Ok(Some(end));
            }
            return Ok(None);
        }
        if token.is_op("{") {
            return self.named_clause(i, j, to, kind, None).map(Some);
        }
        if token.is_op("*") {
            return self.from_clause(i, j + 1, to, kind).map(Some);
        }
        if token.is_op("=") {
            self.warn(None, AmbiguityReason::ExportAssignment, i);
            return Ok(Some(self.statement_end(j, to, false)));
        }
        if token.is_keyword("import") {
            self.warn(None, AmbiguityReason::ImportRequire, i);
            return Ok(Some(self.statement_end(j, to, false)));
        }
        Ok(None)
    }

    /// End of a type-only import/export statement whose clause starts at
    /// `from`: after its module specifier (and `;`), or after the clause
    /// when there is no `from`.
    fn clause_statement_end(
        &self,
        from: usize,
        to: usize,
        kind: TypeSpanKind,
        anchor: usize,
    ) -> Result<usize, TransformError> {
        let mut j = from;
        let mut last: Option<usize> = None;
        loop {
            let Some(k) = self.next(j, to) else {
                return last.map(|l| l + 1).ok_or_else(|| self.unterminated(kind, anchor));
            };
            let token = self.tok(k);
            if token.is_op(";") {
                return Ok(k + 1);
            }
            if let Some(l) = last {
                let after_from = self.tok(l).is_ident("from");
                if self.doc.newline_between(l, k) && !after_from && !token.is_ident("from") {
                    return Ok(l + 1);
                }
                if after_from && token.kind == TokenKind::StringLiteral {
                    return Ok(self.with_semicolon(k + 1, to));
                }
            }
            if let Some(close) = self.group_end(k) {
                last = Some(close);
                j = close + 1;
                continue;
            }
            if token.is_op("{") || token.is_op("(") || token.is_op("[") {
                return Err(self.unterminated(kind, anchor));
            }
            last = Some(k);
            j = k + 1;
        }
    }

    /// A `{ a, type B, c as d }` clause opening at `open`.
    fn named_clause(
        &mut self,
        stmt: usize,
        open: usize,
        to: usize,
        kind: TypeSpanKind,
        default_comma: Option<usize>,
    ) -> Result<usize, TransformError> {
        let Some(close) = self.group_end(open) else {
            return Err(self.unterminated(kind, stmt));
        };
        let specifiers = self.specifiers(open, close);
        let typed: Vec<bool> = specifiers
            .iter()
            .map(|&(first, end)| self.is_type_specifier(first, end))
            .collect();

        let mut source = None;
        let mut end = close + 1;
        if let Some(f) = self.next(close + 1, to).filter(|&f| self.tok(f).is_ident("from")) {
            match self.next(f + 1, to) {
                Some(s) if self.tok(s).kind == TokenKind::StringLiteral => {
                    source = Some(s);
                    end = s + 1;
                }
                _ => return Err(self.unterminated(kind, stmt)),
            }
        } else if kind == TypeSpanKind::TypeOnlyImportClause {
            return Err(self.unterminated(kind, stmt));
        }
        let end = self.with_semicolon(end, to);

        if !typed.is_empty() && typed.iter().all(|&t| t) {
            match default_comma {
                None => {
                    self.plan_statement(kind, stmt, end);
                    return Ok(end);
                }
                Some(comma) => {
                    self.plan(kind, comma, close + 1);
                }
            }
        } else if let Some(last_kept) = typed.iter().rposition(|&t| !t) {
            for (n, &(first, _)) in specifiers.iter().enumerate() {
                if typed[n] && n < last_kept {
                    self.plan(kind, first, specifiers[n + 1].0);
                }
            }
            if last_kept + 1 < specifiers.len() {
                let trailing_end = specifiers[specifiers.len() - 1].1;
                self.plan(kind, specifiers[last_kept].1, trailing_end);
            }
        }
        if let Some(s) = source {
            self.rewrite(s);
        }
        Ok(end)
    }

    /// `(first token, one past last token)` of each specifier in a clause.
    fn specifiers(&self, open: usize, close: usize) -> Vec<(usize, usize)> {
        let mut specifiers = Vec::new();
        let mut first = None;
        let mut last = open;
        let mut j = open + 1;
        while let Some(k) = self.next(j, close) {
            if self.tok(k).is_op(",") {
                if let Some(f) = first.take() {
                    specifiers.push((f, last + 1));
                }
            } else {
                first.get_or_insert(k);
                last = k;
            }
            j = k + 1;
        }
        if let Some(f) = first {
            specifiers.push((f, last + 1));
        }
        specifiers
    }

    /// `type A`, `type A as B`, but not `type as B` (a value named `type`).
    fn is_type_specifier(&self, first: usize, end: usize) -> bool {
        if !self.tok(first).is_ident("type") {
            return false;
        }
        let Some(n) = self.next(first + 1, end) else {
            return false;
        };
        let name = self.tok(n);
        if name.is_ident("as") {
            return self
                .next(n + 1, end)
                .map_or(true, |m| self.tok(m).is_ident("as"));
        }
        matches!(
            name.kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::StringLiteral
        )
    }

    /// Find and rewrite the `from '...'` of a statement whose bindings start
    /// at `from`. Resumes after the specifier.
    fn from_clause(
        &mut self,
        stmt: usize,
        from: usize,
        to: usize,
        kind: TypeSpanKind,
    ) -> Result<usize, TransformError> {
        let mut j = from;
        while let Some(k) = self.next(j, to) {
            let token = self.tok(k);
            if token.is_op(";") || token.kind == TokenKind::Keyword {
                return Ok(k);
            }
            if token.is_ident("from") {
                if let Some(s) = self.next(k + 1, to) {
                    if self.tok(s).kind == TokenKind::StringLiteral {
                        self.rewrite(s);
                        return Ok(self.with_semicolon(s + 1, to));
                    }
                }
            }
            j = self.group_end(k).map_or(k + 1, |close| close + 1);
        }
        if to >= self.doc.len() {
            return Err(self.unterminated(kind, stmt));
        }
        Ok(to)
    }

    /// `end`, or one past a `;` that follows on the same line.
    fn with_semicolon(&self, end: usize, to: usize) -> usize {
        match self.next_is(end, to, ";") {
            Some(semi) if !self.doc.newline_between(end - 1, semi) => semi + 1,
            _ => end,
        }
    }
}
