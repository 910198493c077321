//! Rendering the retained tokens back to text.

use std::collections::BTreeMap;

use dt_ast::{AmbiguousConstruct, SpanCounts, TypeSpan};
use serde::Serialize;

use crate::document::Document;

/// A module specifier replaced during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    /// Token index of the string literal.
    pub index: usize,
    pub offset: usize,
    pub original: String,
    pub replacement: String,
}

/// Everything the stripping pass decided for one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stripped {
    /// Removed ranges, sorted and non-overlapping.
    pub spans: Vec<TypeSpan>,
    pub rewrites: Vec<Rewrite>,
    pub warnings: Vec<AmbiguousConstruct>,
}

/// Rendered text plus the output offsets where something was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Byte offsets into `text`, ascending; one per removed span.
    pub cuts: Vec<usize>,
}

impl Stripped {
    /// Concatenate every token outside a span, substituting rewritten
    /// specifiers.
    pub fn render(&self, doc: &Document<'_>) -> String {
        self.render_marked(doc).text
    }

    pub fn render_marked(&self, doc: &Document<'_>) -> Rendered {
        let replacements: BTreeMap<usize, &str> = self
            .rewrites
            .iter()
            .map(|r| (r.index, r.replacement.as_str()))
            .collect();
        let mut rendered = Rendered {
            text: String::with_capacity(doc.source.len()),
            cuts: Vec::with_capacity(self.spans.len()),
        };
        let mut spans = self.spans.iter().peekable();
        let mut index = 0;
        while index < doc.len() {
            if let Some(span) = spans.next_if(|s| s.start <= index) {
                rendered.cuts.push(rendered.text.len());
                index = index.max(span.end);
                continue;
            }
            match replacements.get(&index) {
                Some(replacement) => rendered.text.push_str(replacement),
                None => rendered.text.push_str(doc.token(index).text),
            }
            index += 1;
        }
        rendered
    }

    pub fn counts(&self) -> SpanCounts {
        self.spans.iter().collect()
    }
}
