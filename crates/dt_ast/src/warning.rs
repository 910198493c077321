//! Non-fatal diagnostics: constructs left untouched instead of guessed at.

use std::fmt;

use serde::Serialize;

use crate::span::TypeSpanKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AmbiguityReason {
    /// The candidate span would include JSX tokens.
    CrossesJsx,
    /// No type expression could be parsed where one was expected.
    UnrecognizedType,
    /// A type parsed, but the token after it is not a sibling delimiter.
    UnexpectedTerminator,
    /// A `!` directly followed by something that looks like an operand.
    AssertionBeforeOperand,
    Enum,
    Namespace,
    Declare,
    Abstract,
    Decorator,
    ParameterProperty,
    IndexSignature,
    ImportRequire,
    ExportAssignment,
}

impl AmbiguityReason {
    fn describe(self) -> &'static str {
        match self {
            AmbiguityReason::CrossesJsx => "span would cross JSX",
            AmbiguityReason::UnrecognizedType => "no type expression found",
            AmbiguityReason::UnexpectedTerminator => "type is not followed by a delimiter",
            AmbiguityReason::AssertionBeforeOperand => "`!` is followed by an operand",
            AmbiguityReason::Enum => "enums have runtime semantics",
            AmbiguityReason::Namespace => "namespaces have runtime semantics",
            AmbiguityReason::Declare => "ambient declarations are not rewritten",
            AmbiguityReason::Abstract => "abstract members are not rewritten",
            AmbiguityReason::Decorator => "decorators are not rewritten",
            AmbiguityReason::ParameterProperty => "parameter properties have runtime semantics",
            AmbiguityReason::IndexSignature => "class index signatures are not rewritten",
            AmbiguityReason::ImportRequire => "`import x = require()` is not rewritten",
            AmbiguityReason::ExportAssignment => "`export =` is not rewritten",
        }
    }
}

impl fmt::Display for AmbiguityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A construct the stripper found but could not safely resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousConstruct {
    /// The span kind that was being recognised, if any.
    pub kind: Option<TypeSpanKind>,
    pub reason: AmbiguityReason,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for AmbiguousConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: ", self.line, self.column)?;
        if let Some(kind) = self.kind {
            write!(f, "{kind} left untouched: ")?;
        }
        write!(f, "{}", self.reason)
    }
}
