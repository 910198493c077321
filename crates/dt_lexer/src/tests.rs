use dt_ast::{DtSyntax, LexErrorKind, Punct, TemplatePart, TokenKind};

use crate::{lex, tokenize, Bracket};

const OP: TokenKind = TokenKind::Punctuator(Punct::Operator);
const OPEN: TokenKind = TokenKind::Punctuator(Punct::TypeArgsOpen);
const CLOSE: TokenKind = TokenKind::Punctuator(Punct::TypeArgsClose);
const NON_NULL: TokenKind = TokenKind::Punctuator(Punct::NonNullAssertion);
const IDENT: TokenKind = TokenKind::Identifier;
const KW: TokenKind = TokenKind::Keyword;
const JSX: TokenKind = TokenKind::JsxTag;

fn ts() -> DtSyntax {
    DtSyntax { jsx: false }
}

fn tsx() -> DtSyntax {
    DtSyntax { jsx: true }
}

/// Significant tokens as `(kind, text)`.
fn sig(source: &str, syntax: DtSyntax) -> Vec<(TokenKind, &str)> {
    tokenize(source, syntax)
        .unwrap()
        .into_iter()
        .filter(|t| !t.is_trivia())
        .map(|t| (t.kind, t.text))
        .collect()
}

/// Kinds of every significant token with this text, in order.
fn kinds_of(source: &str, syntax: DtSyntax, text: &str) -> Vec<TokenKind> {
    sig(source, syntax)
        .into_iter()
        .filter(|(_, t)| *t == text)
        .map(|(k, _)| k)
        .collect()
}

#[test]
fn tokens_cover_the_source() {
    let src = "// header\r\nimport type { A } from './a';\nexport const App = (p: A): JSX.Element => {\n  const [v, setV] = useState<string>(`x${p.id}`);\n  return <div className=\"app\">{v!} &amp; text</div>;\n};\n";
    let tokens = tokenize(src, tsx()).unwrap();
    let rebuilt: String = tokens.iter().map(|t| t.text).collect();
    assert_eq!(rebuilt, src);
    for pair in tokens.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}

#[test]
fn generic_call_arguments() {
    let src = "const [value, setValue] = useState<string>('');";
    assert_eq!(kinds_of(src, ts(), "<"), vec![OPEN]);
    assert_eq!(kinds_of(src, ts(), ">"), vec![CLOSE]);
}

#[test]
fn relational_operators_stay_operators() {
    assert_eq!(kinds_of("if (a < b && c > d) {}", ts(), "<"), vec![OP]);
    assert_eq!(kinds_of("if (a < b && c > d) {}", ts(), ">"), vec![OP]);
    assert_eq!(kinds_of("for (let i = 0; i < n; i++) {}", ts(), "<"), vec![OP]);
    assert_eq!(kinds_of("if (a < b) { return c > d; }", ts(), "<"), vec![OP]);
    assert_eq!(kinds_of("const ok = a < b > c;", ts(), "<"), vec![OP]);
}

#[test]
fn nested_type_arguments_close_separately() {
    let src = "let m: Map<string, Array<number>> = new Map();";
    assert_eq!(kinds_of(src, ts(), ">"), vec![CLOSE, CLOSE]);
    assert!(kinds_of(src, ts(), ">>").is_empty());
}

#[test]
fn shift_operators() {
    let src = "x >>= 1; y = a >> 2; z = b >>> 3;";
    assert_eq!(kinds_of(src, ts(), ">>="), vec![OP]);
    assert_eq!(kinds_of(src, ts(), ">>"), vec![OP]);
    assert_eq!(kinds_of(src, ts(), ">>>"), vec![OP]);
}

#[test]
fn non_null_assertions() {
    let src = "a!.b; x = y!; if (a !== b && !c) {}";
    assert_eq!(kinds_of(src, ts(), "!"), vec![NON_NULL, NON_NULL, OP]);
    assert_eq!(kinds_of(src, ts(), "!=="), vec![OP]);
}

#[test]
fn generic_arrow_then_jsx() {
    let src = "const Foo = <T,>(x: T) => <div>{x}</div>;";
    assert_eq!(
        sig(src, tsx()),
        vec![
            (KW, "const"),
            (IDENT, "Foo"),
            (OP, "="),
            (OPEN, "<"),
            (IDENT, "T"),
            (OP, ","),
            (CLOSE, ">"),
            (OP, "("),
            (IDENT, "x"),
            (OP, ":"),
            (IDENT, "T"),
            (OP, ")"),
            (OP, "=>"),
            (JSX, "<"),
            (JSX, "div"),
            (JSX, ">"),
            (JSX, "{"),
            (IDENT, "x"),
            (JSX, "}"),
            (JSX, "<"),
            (JSX, "/"),
            (JSX, "div"),
            (JSX, ">"),
            (OP, ";"),
        ]
    );
}

#[test]
fn jsx_text_is_opaque() {
    let src = "const el = <p className=\"greeting\">Hello, {name}!</p>;";
    let tokens = sig(src, tsx());
    assert!(tokens.contains(&(TokenKind::JsxText, "Hello, ")));
    assert!(tokens.contains(&(TokenKind::JsxText, "!")));
    assert!(tokens.contains(&(JSX, "\"greeting\"")));
}

#[test]
fn fragments_balance() {
    let src = "const f = <><Item key={1} /><br/></>;\nconst g = 1;";
    let lexed = lex(src, tsx()).unwrap();
    assert!(lexed.unclosed.is_empty());
    assert_eq!(kinds_of(src, tsx(), "g"), vec![IDENT]);
}

#[test]
fn closing_fragment_is_not_self_closing() {
    let src = "const a = <>hi</>;";
    assert_eq!(
        sig(src, tsx()),
        vec![
            (KW, "const"),
            (IDENT, "a"),
            (OP, "="),
            (JSX, "<"),
            (JSX, ">"),
            (TokenKind::JsxText, "hi"),
            (JSX, "<"),
            (JSX, "/"),
            (JSX, ">"),
            (OP, ";"),
        ]
    );

    let nested = "const b = (\n  <>\n    <><i /></>\n  </>\n);\n";
    assert!(lex(nested, tsx()).unwrap().unclosed.is_empty());
}

#[test]
fn element_type_arguments() {
    let src = "const el = <Select<Option> value={v} />;";
    assert_eq!(kinds_of(src, tsx(), "<"), vec![JSX, OPEN]);
    assert_eq!(kinds_of(src, tsx(), ">"), vec![CLOSE]);
    assert_eq!(kinds_of(src, tsx(), "Option"), vec![IDENT]);
    assert_eq!(kinds_of(src, tsx(), "/>"), vec![JSX]);
}

#[test]
fn regex_and_division() {
    let src = "const r = /ab+c/g.test(s) ? a / b : c;";
    assert_eq!(kinds_of(src, ts(), "/ab+c/g"), vec![TokenKind::RegexLiteral]);
    assert_eq!(kinds_of(src, ts(), "/"), vec![OP]);
    assert_eq!(kinds_of("x = /[/]/.source;", ts(), "/[/]/"), vec![TokenKind::RegexLiteral]);
}

#[test]
fn template_interpolations_are_code() {
    let src = "const s = `id: ${user.id as string}!`;";
    let tokens = sig(src, ts());
    assert!(tokens.contains(&(TokenKind::TemplateLiteral(TemplatePart::Head), "`id: ${")));
    assert!(tokens.contains(&(IDENT, "as")));
    assert!(tokens.contains(&(TokenKind::TemplateLiteral(TemplatePart::Tail), "}!`")));
}

#[test]
fn words_after_dot_are_identifiers() {
    assert_eq!(kinds_of("a.default.class", ts(), "default"), vec![IDENT]);
    assert_eq!(kinds_of("a?.class", ts(), "class"), vec![IDENT]);
    assert_eq!(kinds_of("export default a", ts(), "default"), vec![KW]);
}

#[test]
fn interface_bodies_are_type_context() {
    let src = "interface Api { map: <T>(x: T) => T; }";
    assert_eq!(kinds_of(src, tsx(), "<"), vec![OPEN]);
    assert!(sig(src, tsx()).iter().all(|(k, _)| *k != JSX));
}

#[test]
fn type_alias_ends_at_line_break() {
    let src = "type Fn = <T>(x: T) => T\nconst el = <div />;";
    assert_eq!(kinds_of(src, tsx(), "<"), vec![OPEN, JSX]);
}

#[test]
fn multi_line_union_alias() {
    let src = "type State =\n  | 'idle'\n  | Array<Item>\nconst el = <div />;";
    assert_eq!(kinds_of(src, tsx(), "<"), vec![OPEN, JSX]);
}

#[test]
fn angle_assertion_in_ts() {
    assert_eq!(kinds_of("const n = <number>value;", ts(), "<"), vec![OPEN]);
}

#[test]
fn declaration_sites() {
    assert_eq!(kinds_of("function id<T>(x: T): T { return x; }", ts(), "<"), vec![OPEN]);
    assert_eq!(kinds_of("class Box<T = string> {}", ts(), "<"), vec![OPEN]);
    assert_eq!(kinds_of("function* gen<T>() {}", ts(), "<"), vec![OPEN]);
}

#[test]
fn question_dot_before_digit() {
    assert_eq!(
        sig("a?.5:1", ts()),
        vec![
            (IDENT, "a"),
            (OP, "?"),
            (TokenKind::NumberLiteral, ".5"),
            (OP, ":"),
            (TokenKind::NumberLiteral, "1"),
        ]
    );
}

#[test]
fn hashbang_is_a_comment() {
    let tokens = tokenize("#!/usr/bin/env node\nconst a = 1;", ts()).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Comment);
    assert_eq!(tokens[0].text, "#!/usr/bin/env node");
}

#[test]
fn private_names() {
    assert_eq!(kinds_of("this.#count += 1;", ts(), "#count"), vec![IDENT]);
}

#[test]
fn positions() {
    let tokens = tokenize("a\n  bb", ts()).unwrap();
    let b = tokens.iter().find(|t| t.text == "bb").unwrap();
    assert_eq!((b.line, b.column, b.start, b.end), (2, 3, 4, 6));
}

#[test]
fn unterminated_string() {
    let err = tokenize("const s = \"abc\n", ts()).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    assert_eq!((err.offset, err.line, err.column), (10, 1, 11));
}

#[test]
fn unterminated_template_and_comment() {
    let err = tokenize("const s = `abc", ts()).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedTemplate);
    let err = tokenize("a /* b", ts()).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
}

#[test]
fn mismatched_closer() {
    let err = tokenize("foo(]", ts()).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnbalancedBrackets);
    assert_eq!(err.offset, 4);
}

#[test]
fn unclosed_brace_is_reported() {
    let src = "interface Foo { a: string";
    let lexed = lex(src, ts()).unwrap();
    assert_eq!(lexed.unclosed.len(), 1);
    assert_eq!(lexed.unclosed[0].bracket, Bracket::Brace);
    assert_eq!(lexed.unclosed[0].offset, 14);

    let err = tokenize(src, ts()).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnbalancedBrackets);
    assert_eq!(err.offset, 14);
}
