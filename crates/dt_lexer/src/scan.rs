//! Character-level lookahead helpers.
//!
//! The lexer uses these to peek past trivia without producing tokens, e.g.
//! to see what follows a candidate type-argument list.

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

/// Skip whitespace, newlines and comments starting at byte `pos`.
///
/// Returns the byte offset of the next code character (or `source.len()`)
/// and whether a line break was crossed. An unterminated block comment
/// skips to the end of input; the real lexing pass reports it.
pub(crate) fn skip_trivia(source: &str, pos: usize) -> (usize, bool) {
    let bytes = source.as_bytes();
    let mut i = pos;
    let mut newline = false;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' | b'\r' => {
                newline = true;
                i += 1;
            }
            b' ' | b'\t' | 0x0b | 0x0c => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => match source[i + 2..].find("*/") {
                Some(end) => {
                    if source[i + 2..i + 2 + end].contains('\n') {
                        newline = true;
                    }
                    i += end + 4;
                }
                None => return (bytes.len(), newline),
            },
            b if b >= 0x80 => match source[i..].chars().next() {
                Some(c) if c.is_whitespace() => i += c.len_utf8(),
                _ => break,
            },
            _ => break,
        }
    }

    (i, newline)
}

/// The identifier starting at byte `pos`, or `""`.
pub(crate) fn word_at(source: &str, pos: usize) -> &str {
    let rest = &source[pos..];
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return "",
    }
    let end = chars
        .find(|(_, c)| !is_ident_continue(*c))
        .map_or(rest.len(), |(i, _)| i);
    &rest[..end]
}
