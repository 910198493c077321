//! Per-file TypeScript to JavaScript transform.
//!
//! ```
//! let out = dt_transform::transform("let n: number = 1;\n", "a.ts").unwrap();
//! assert_eq!(out.output_text, "let n = 1;\n");
//! assert_eq!(out.new_extension.as_str(), Some(".js"));
//! ```

mod cleanup;

use dt_ast::{AmbiguousConstruct, DtSyntax, LexError, LexErrorKind, SpanCounts, TransformError};
use dt_strip::{strip, Document, StripOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Switches for the optional parts of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub rewrite_import_paths: bool,
    pub collapse_blank_lines: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            rewrite_import_paths: true,
            collapse_blank_lines: true,
        }
    }
}

/// Extension a converted file should be renamed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NewExtension {
    Js,
    Jsx,
    Mjs,
    Cjs,
    Unchanged,
}

impl NewExtension {
    pub fn for_filename(filename: &str) -> Self {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".d.ts") || lower.ends_with(".d.mts") || lower.ends_with(".d.cts") {
            NewExtension::Unchanged
        } else if lower.ends_with(".tsx") {
            NewExtension::Jsx
        } else if lower.ends_with(".mts") {
            NewExtension::Mjs
        } else if lower.ends_with(".cts") {
            NewExtension::Cjs
        } else if lower.ends_with(".ts") {
            NewExtension::Js
        } else {
            NewExtension::Unchanged
        }
    }

    /// The extension with its leading dot, or `None` when unchanged.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            NewExtension::Js => Some(".js"),
            NewExtension::Jsx => Some(".jsx"),
            NewExtension::Mjs => Some(".mjs"),
            NewExtension::Cjs => Some(".cjs"),
            NewExtension::Unchanged => None,
        }
    }
}

/// Result of transforming one file.
#[derive(Debug, Clone, Serialize)]
pub struct TransformOutput {
    pub output_text: String,
    pub new_extension: NewExtension,
    pub spans_removed: SpanCounts,
    pub imports_rewritten: usize,
    pub warnings: Vec<AmbiguousConstruct>,
}

/// Transform with default options.
pub fn transform(source: &str, filename_hint: &str) -> Result<TransformOutput, TransformError> {
    transform_with(source, filename_hint, &TransformOptions::default())
}

/// Strip every type-only construct from `source`.
///
/// `filename_hint` picks the dialect (`.tsx`/`.jsx` enable JSX) and the new
/// extension. On error nothing is produced; callers keep the original.
pub fn transform_with(
    source: &str,
    filename_hint: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    let syntax = DtSyntax::for_filename(filename_hint);
    let doc = Document::parse(source, syntax)?;
    let stripped = strip(
        &doc,
        &StripOptions {
            rewrite_import_paths: options.rewrite_import_paths,
        },
    )?;
    if let Some(open) = doc.unclosed.first() {
        return Err(LexError {
            kind: LexErrorKind::UnbalancedBrackets,
            offset: open.offset,
            line: open.line,
            column: open.column,
        }
        .into());
    }

    let rendered = stripped.render_marked(&doc);
    let output_text = if options.collapse_blank_lines {
        cleanup::tidy(&rendered.text, &rendered.cuts)
    } else {
        rendered.text
    };
    let spans_removed = stripped.counts();
    debug!(
        file = filename_hint,
        spans = spans_removed.total(),
        warnings = stripped.warnings.len(),
        "transformed"
    );

    Ok(TransformOutput {
        output_text,
        new_extension: NewExtension::for_filename(filename_hint),
        spans_removed,
        imports_rewritten: stripped.rewrites.len(),
        warnings: stripped.warnings,
    })
}

#[cfg(test)]
mod tests {
    use dt_ast::{AmbiguityReason, TypeSpanKind};

    use super::*;

    #[test]
    fn greet_component() {
        let src = "interface Props { name: string; age?: number }\nexport function Greet(props: Props): JSX.Element { return <p>{props.name}</p>; }";
        let out = transform(src, "Greet.tsx").unwrap();
        assert_eq!(
            out.output_text,
            "export function Greet(props) { return <p>{props.name}</p>; }"
        );
        assert_eq!(out.spans_removed.get(TypeSpanKind::InterfaceDecl), 1);
        assert_eq!(out.spans_removed.get(TypeSpanKind::ParamAnnotation), 1);
        assert_eq!(out.spans_removed.get(TypeSpanKind::ReturnAnnotation), 1);
        assert_eq!(out.spans_removed.total(), 3);
        assert_eq!(out.new_extension, NewExtension::Jsx);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn generic_arrow_keeps_jsx() {
        let out = transform("const Foo = <T,>(x: T) => <div>{x}</div>;", "Foo.tsx").unwrap();
        assert_eq!(out.output_text, "const Foo = (x) => <div>{x}</div>;");
    }

    #[test]
    fn fragments() {
        let out = transform("const a = <>hi</>;", "a.tsx").unwrap();
        assert_eq!(out.output_text, "const a = <>hi</>;");

        let src = "const List = (props: Props) => (\n  <>\n    <h1>Items</h1>\n    <>{props.items.map((i: Item) => <li key={i.id}>{i.name!}</li>)}</>\n  </>\n);\nconst n: number = 1;\n";
        let out = transform(src, "List.tsx").unwrap();
        assert_eq!(
            out.output_text,
            "const List = (props) => (\n  <>\n    <h1>Items</h1>\n    <>{props.items.map((i) => <li key={i.id}>{i.name}</li>)}</>\n  </>\n);\nconst n = 1;\n"
        );
        assert_eq!(out.spans_removed.get(TypeSpanKind::ParamAnnotation), 2);
        assert_eq!(out.spans_removed.get(TypeSpanKind::NonNullAssertion), 1);
        assert_eq!(out.spans_removed.get(TypeSpanKind::VarAnnotation), 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn jsx_element_type_arguments() {
        let out = transform("const el = <Select<Option> value={v} />;", "a.tsx").unwrap();
        assert_eq!(out.output_text, "const el = <Select value={v} />;");
        assert_eq!(out.spans_removed.get(TypeSpanKind::GenericArgList), 1);
    }

    #[test]
    fn arrow_return_type_in_conditional() {
        let src = "const x = cond ? (a): b => c;\n";
        let out = transform(src, "a.ts").unwrap();
        assert_eq!(out.output_text, src);
        assert!(out.spans_removed.is_empty());

        let out = transform("const x = cond ? (a): b => c : d;\n", "a.ts").unwrap();
        assert_eq!(out.output_text, "const x = cond ? (a) => c : d;\n");
        assert_eq!(out.spans_removed.get(TypeSpanKind::ReturnAnnotation), 1);
    }

    #[test]
    fn non_null_and_inequality() {
        assert_eq!(transform("a!.b;", "a.ts").unwrap().output_text, "a.b;");
        let src = "if (a !== b && !cond) { go(); }";
        assert_eq!(transform(src, "a.ts").unwrap().output_text, src);
    }

    #[test]
    fn optional_marker_and_chaining() {
        assert_eq!(
            transform("let o = { x?: number };", "a.ts").unwrap().output_text,
            "let o = { x: number };"
        );
        let src = "const v = a?.b ?? c?.[0];";
        assert_eq!(transform(src, "a.ts").unwrap().output_text, src);
    }

    #[test]
    fn unterminated_interface_is_fatal() {
        let err = transform("interface Foo { a: string", "a.ts").unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnterminatedConstruct {
                kind: TypeSpanKind::InterfaceDecl,
                start_offset: 0,
                ..
            }
        ));
    }

    #[test]
    fn unclaimed_unclosed_bracket_is_a_lex_error() {
        let err = transform("function f() {\n  return 1;\n", "a.ts").unwrap_err();
        assert_eq!(
            err,
            TransformError::Lex(LexError {
                kind: LexErrorKind::UnbalancedBrackets,
                offset: 13,
                line: 1,
                column: 14,
            })
        );
    }

    #[test]
    fn plain_javascript_is_byte_identical() {
        let src = "// util\r\nimport x from './x.js';\n\n\n\nexport const f = (a, b) => a < b ? a : 2;\n";
        let out = transform(src, "util.ts").unwrap();
        assert_eq!(out.output_text, src);
        assert!(out.spans_removed.is_empty());
    }

    #[test]
    fn idempotent() {
        let src = "import type { A } from './a';\n\n\ninterface B { b: A }\n\n\nexport const c = (d: B): number => d.b as number;\n";
        let first = transform(src, "c.ts").unwrap();
        assert_eq!(first.output_text, "export const c = (d) => d.b;\n");
        let second = transform(&first.output_text, "c.ts").unwrap();
        assert_eq!(second.output_text, first.output_text);
        assert!(second.spans_removed.is_empty());
    }

    #[test]
    fn blank_lines_collapse_only_where_something_was_removed() {
        let src = "const a = 1;\n\ntype T = string;\n\n\nconst b = 2;\n\n\n\nconst c = 3;\n";
        let out = transform(src, "a.ts").unwrap();
        assert_eq!(out.output_text, "const a = 1;\n\nconst b = 2;\n\n\n\nconst c = 3;\n");

        let raw = transform_with(
            src,
            "a.ts",
            &TransformOptions {
                collapse_blank_lines: false,
                ..TransformOptions::default()
            },
        )
        .unwrap();
        assert_eq!(raw.output_text, "const a = 1;\n\n\n\nconst b = 2;\n\n\n\nconst c = 3;\n");
    }

    #[test]
    fn import_rewrites_are_counted() {
        let out = transform("import App from './App.tsx';\nimport 'react';\n", "main.tsx").unwrap();
        assert_eq!(out.output_text, "import App from './App.jsx';\nimport 'react';\n");
        assert_eq!(out.imports_rewritten, 1);
    }

    #[test]
    fn warnings_are_reported() {
        let out = transform("enum Dir { Up, Down }\n", "a.ts").unwrap();
        assert_eq!(out.output_text, "enum Dir { Up, Down }\n");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].reason, AmbiguityReason::Enum);
    }

    #[test]
    fn extensions() {
        assert_eq!(NewExtension::for_filename("a.ts"), NewExtension::Js);
        assert_eq!(NewExtension::for_filename("A.TSX"), NewExtension::Jsx);
        assert_eq!(NewExtension::for_filename("m.mts"), NewExtension::Mjs);
        assert_eq!(NewExtension::for_filename("c.cts"), NewExtension::Cjs);
        assert_eq!(NewExtension::for_filename("types.d.ts"), NewExtension::Unchanged);
        assert_eq!(NewExtension::for_filename("x.js"), NewExtension::Unchanged);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: TransformOptions =
            serde_json::from_str(r#"{ "collapse_blank_lines": false }"#).unwrap();
        assert!(options.rewrite_import_paths);
        assert!(!options.collapse_blank_lines);
    }
}
