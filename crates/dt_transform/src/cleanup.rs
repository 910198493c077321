//! Cosmetic cleanup of the blank lines removals leave behind.
//!
//! Only blank runs that touch a cut are changed, so text the stripper did
//! not remove anything from comes back byte-identical.

/// Drop the blank lines a removal left at the top of the file, then collapse
/// every run of three or more line breaks containing a cut to one blank line.
pub(crate) fn tidy(text: &str, cuts: &[usize]) -> String {
    if cuts.is_empty() {
        return text.to_string();
    }
    let lead = leading_blank_lines(text);
    if lead > 0 && cuts.iter().any(|&c| c <= lead) {
        let shifted: Vec<usize> = cuts.iter().map(|&c| c.saturating_sub(lead)).collect();
        return collapse(&text[lead..], &shifted);
    }
    collapse(text, cuts)
}

/// Length of the prefix made of whole whitespace-only lines.
fn leading_blank_lines(text: &str) -> usize {
    let mut end = 0;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'\n' => end = i + 1,
            b' ' | b'\t' | b'\r' => {}
            _ => break,
        }
    }
    end
}

fn collapse(text: &str, cuts: &[usize]) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\n' {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i + 1;
        let mut breaks = 1;
        loop {
            let mut k = end;
            while k < bytes.len() && matches!(bytes[k], b' ' | b'\t' | b'\r') {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'\n' {
                breaks += 1;
                end = k + 1;
            } else {
                break;
            }
        }

        if breaks >= 3 && cuts.iter().any(|&c| start <= c && c <= end) {
            let crlf = start > 0 && bytes[start - 1] == b'\r';
            out.push_str(&text[copied..start]);
            out.push_str(if crlf { "\n\r\n" } else { "\n\n" });
            copied = end;
        }
        i = end;
    }
    out.push_str(&text[copied..]);
    out
}
