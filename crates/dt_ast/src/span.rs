//! Type-only token ranges and per-kind counts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What a removed span was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeSpanKind {
    InterfaceDecl,
    TypeAliasDecl,
    GenericParamList,
    GenericArgList,
    ParamAnnotation,
    ReturnAnnotation,
    VarAnnotation,
    /// `name: Type` on a class field.
    MemberAnnotation,
    AsCast,
    SatisfiesCast,
    NonNullAssertion,
    OptionalMarker,
    TypeOnlyImportClause,
    TypeOnlyExportClause,
    ImplementsClause,
    /// `public`, `private`, `protected`, `readonly`, `override` on a class member.
    AccessModifier,
    /// A function or method signature without a body.
    OverloadSignature,
}

impl TypeSpanKind {
    pub const ALL: [TypeSpanKind; 17] = [
        TypeSpanKind::InterfaceDecl,
        TypeSpanKind::TypeAliasDecl,
        TypeSpanKind::GenericParamList,
        TypeSpanKind::GenericArgList,
        TypeSpanKind::ParamAnnotation,
        TypeSpanKind::ReturnAnnotation,
        TypeSpanKind::VarAnnotation,
        TypeSpanKind::MemberAnnotation,
        TypeSpanKind::AsCast,
        TypeSpanKind::SatisfiesCast,
        TypeSpanKind::NonNullAssertion,
        TypeSpanKind::OptionalMarker,
        TypeSpanKind::TypeOnlyImportClause,
        TypeSpanKind::TypeOnlyExportClause,
        TypeSpanKind::ImplementsClause,
        TypeSpanKind::AccessModifier,
        TypeSpanKind::OverloadSignature,
    ];

    /// Plural label used in summary reports.
    pub fn label(self) -> &'static str {
        match self {
            TypeSpanKind::InterfaceDecl => "Interfaces",
            TypeSpanKind::TypeAliasDecl => "Type aliases",
            TypeSpanKind::GenericParamList => "Generic parameter lists",
            TypeSpanKind::GenericArgList => "Generic argument lists",
            TypeSpanKind::ParamAnnotation => "Parameter annotations",
            TypeSpanKind::ReturnAnnotation => "Return annotations",
            TypeSpanKind::VarAnnotation => "Variable annotations",
            TypeSpanKind::MemberAnnotation => "Class member annotations",
            TypeSpanKind::AsCast => "Type casts (as)",
            TypeSpanKind::SatisfiesCast => "Satisfies clauses",
            TypeSpanKind::NonNullAssertion => "Non-null assertions (!)",
            TypeSpanKind::OptionalMarker => "Optional markers (?)",
            TypeSpanKind::TypeOnlyImportClause => "Type-only imports",
            TypeSpanKind::TypeOnlyExportClause => "Type-only exports",
            TypeSpanKind::ImplementsClause => "Implements clauses",
            TypeSpanKind::AccessModifier => "Access modifiers",
            TypeSpanKind::OverloadSignature => "Overload signatures",
        }
    }

    /// Whether spans of this kind are whole statements (or class members)
    /// that take their line with them when removed.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            TypeSpanKind::InterfaceDecl
                | TypeSpanKind::TypeAliasDecl
                | TypeSpanKind::TypeOnlyImportClause
                | TypeSpanKind::TypeOnlyExportClause
                | TypeSpanKind::OverloadSignature
        )
    }
}

impl fmt::Display for TypeSpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeSpanKind::InterfaceDecl => "interface declaration",
            TypeSpanKind::TypeAliasDecl => "type alias",
            TypeSpanKind::GenericParamList => "generic parameter list",
            TypeSpanKind::GenericArgList => "generic argument list",
            TypeSpanKind::ParamAnnotation => "parameter annotation",
            TypeSpanKind::ReturnAnnotation => "return type annotation",
            TypeSpanKind::VarAnnotation => "variable annotation",
            TypeSpanKind::MemberAnnotation => "class member annotation",
            TypeSpanKind::AsCast => "`as` cast",
            TypeSpanKind::SatisfiesCast => "`satisfies` clause",
            TypeSpanKind::NonNullAssertion => "non-null assertion",
            TypeSpanKind::OptionalMarker => "optional marker",
            TypeSpanKind::TypeOnlyImportClause => "type-only import",
            TypeSpanKind::TypeOnlyExportClause => "type-only export",
            TypeSpanKind::ImplementsClause => "implements clause",
            TypeSpanKind::AccessModifier => "access modifier",
            TypeSpanKind::OverloadSignature => "overload signature",
        };
        f.write_str(name)
    }
}

/// A token range identified as pure type syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeSpan {
    pub kind: TypeSpanKind,
    /// First token index (inclusive).
    pub start: usize,
    /// Last token index (exclusive).
    pub end: usize,
    /// Byte offset of the first significant token of the construct.
    pub start_offset: usize,
}

impl TypeSpan {
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn overlaps(&self, other: &TypeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Number of spans removed, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanCounts(BTreeMap<TypeSpanKind, usize>);

impl SpanCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: TypeSpanKind) {
        *self.0.entry(kind).or_insert(0) += 1;
    }

    pub fn get(&self, kind: TypeSpanKind) -> usize {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &SpanCounts) {
        for (kind, count) in &other.0 {
            *self.0.entry(*kind).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeSpanKind, usize)> + '_ {
        self.0.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl<'a> FromIterator<&'a TypeSpan> for SpanCounts {
    fn from_iter<I: IntoIterator<Item = &'a TypeSpan>>(iter: I) -> Self {
        let mut counts = SpanCounts::new();
        for span in iter {
            counts.record(span.kind);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_merge_and_total() {
        let mut a = SpanCounts::new();
        a.record(TypeSpanKind::InterfaceDecl);
        a.record(TypeSpanKind::AsCast);
        let mut b = SpanCounts::new();
        b.record(TypeSpanKind::AsCast);
        a.merge(&b);
        assert_eq!(a.get(TypeSpanKind::AsCast), 2);
        assert_eq!(a.get(TypeSpanKind::VarAnnotation), 0);
        assert_eq!(a.total(), 3);
    }

    #[test]
    fn counts_serialize_as_map() {
        let mut counts = SpanCounts::new();
        counts.record(TypeSpanKind::NonNullAssertion);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"NonNullAssertion":1}"#);
    }

    #[test]
    fn span_overlap() {
        let a = TypeSpan {
            kind: TypeSpanKind::AsCast,
            start: 2,
            end: 5,
            start_offset: 0,
        };
        let b = TypeSpan { start: 5, end: 7, ..a };
        let c = TypeSpan { start: 4, end: 6, ..a };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(a.contains(4));
        assert!(!a.contains(5));
    }
}
