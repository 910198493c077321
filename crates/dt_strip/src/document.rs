//! Per-file token arena with a bracket match table.

use dt_ast::{DtSyntax, LexError, Punct, TemplatePart, Token, TokenKind};
use dt_lexer::UnclosedBracket;

/// The token vector for one file plus the index of every bracket's partner.
///
/// Matched pairs are `(`/`)`, `[`/`]`, `{`/`}`, type-argument `<`/`>`, the
/// braces of JSX expression containers, and consecutive template chunks
/// (`Head` -> `Middle` -> ... -> `Tail`).
#[derive(Debug, Clone)]
pub struct Document<'src> {
    pub source: &'src str,
    pub syntax: DtSyntax,
    pub tokens: Vec<Token<'src>>,
    matching: Vec<Option<usize>>,
    /// Brackets the lexer saw open at end of input.
    pub unclosed: Vec<UnclosedBracket>,
}

impl<'src> Document<'src> {
    pub fn parse(source: &'src str, syntax: DtSyntax) -> Result<Self, LexError> {
        let lexed = dt_lexer::lex(source, syntax)?;
        let matching = match_brackets(&lexed.tokens);
        Ok(Self {
            source,
            syntax,
            tokens: lexed.tokens,
            matching,
            unclosed: lexed.unclosed,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> &Token<'src> {
        &self.tokens[index]
    }

    /// Partner of the bracket at `index`, if it has one.
    pub fn matching(&self, index: usize) -> Option<usize> {
        self.matching.get(index).copied().flatten()
    }

    /// First significant token in `from..limit`.
    pub fn next_sig(&self, from: usize, limit: usize) -> Option<usize> {
        let limit = limit.min(self.tokens.len());
        (from..limit).find(|&i| !self.tokens[i].is_trivia())
    }

    /// Last significant token before `index`.
    pub fn prev_sig(&self, index: usize) -> Option<usize> {
        (0..index.min(self.tokens.len()))
            .rev()
            .find(|&i| !self.tokens[i].is_trivia())
    }

    /// Whether a line break occurs strictly between tokens `a` and `b`.
    pub fn newline_between(&self, a: usize, b: usize) -> bool {
        if b <= a + 1 {
            return false;
        }
        self.tokens[a + 1..b.min(self.tokens.len())].iter().any(|t| {
            t.kind == TokenKind::Newline || (t.kind == TokenKind::Comment && t.text.contains('\n'))
        })
    }
}

fn match_brackets(tokens: &[Token<'_>]) -> Vec<Option<usize>> {
    let mut matching = vec![None; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punctuator(Punct::Operator) => match token.text {
                "(" | "[" | "{" => stack.push(index),
                ")" | "]" | "}" => close(&mut stack, &mut matching, index),
                _ => {}
            },
            TokenKind::Punctuator(Punct::TypeArgsOpen) => stack.push(index),
            TokenKind::Punctuator(Punct::TypeArgsClose) => close(&mut stack, &mut matching, index),
            TokenKind::JsxTag if token.text == "{" => stack.push(index),
            TokenKind::JsxTag if token.text == "}" => close(&mut stack, &mut matching, index),
            TokenKind::TemplateLiteral(TemplatePart::Head) => stack.push(index),
            TokenKind::TemplateLiteral(TemplatePart::Middle) => {
                close(&mut stack, &mut matching, index);
                stack.push(index);
            }
            TokenKind::TemplateLiteral(TemplatePart::Tail) => close(&mut stack, &mut matching, index),
            _ => {}
        }
    }

    matching
}

fn close(stack: &mut Vec<usize>, matching: &mut [Option<usize>], index: usize) {
    if let Some(open) = stack.pop() {
        matching[open] = Some(index);
        matching[index] = Some(open);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_nested_brackets() {
        let doc = Document::parse("f(a[1], { b: `x${c}y${d}` })", DtSyntax::default()).unwrap();
        let text = |i: usize| doc.token(i).text;
        let open_paren = doc.tokens.iter().position(|t| t.text == "(").unwrap();
        let close_paren = doc.matching(open_paren).unwrap();
        assert_eq!(text(close_paren), ")");
        assert_eq!(close_paren, doc.len() - 1);

        let head = doc.tokens.iter().position(|t| t.text == "`x${").unwrap();
        let middle = doc.matching(head).unwrap();
        assert_eq!(text(middle), "}y${");
        assert_eq!(text(doc.matching(middle).unwrap()), "}`");
    }

    #[test]
    fn significant_neighbours() {
        let doc = Document::parse("a /* c */\n  b", DtSyntax::default()).unwrap();
        let a = 0;
        let b = doc.next_sig(1, doc.len()).unwrap();
        assert_eq!(doc.token(b).text, "b");
        assert_eq!(doc.prev_sig(b), Some(a));
        assert!(doc.newline_between(a, b));
        assert!(!doc.newline_between(a, 2));
    }

    #[test]
    fn unclosed_openers_are_kept() {
        let doc = Document::parse("interface Foo { a: string", DtSyntax::default()).unwrap();
        assert_eq!(doc.unclosed.len(), 1);
        let brace = doc.tokens.iter().position(|t| t.text == "{").unwrap();
        assert_eq!(doc.matching(brace), None);
    }
}
