//! Per-file results of a `convert` run and their text/JSON rendering.

use std::io::{self, Write};
use std::path::PathBuf;

use dt_ast::{AmbiguousConstruct, SpanCounts, TypeSpanKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path relative to the converted root.
    pub path: PathBuf,
    /// Where the converted file was (or would be) written.
    pub new_path: Option<PathBuf>,
    pub status: FileStatus,
    pub spans_removed: SpanCounts,
    pub imports_rewritten: usize,
    pub warnings: Vec<AmbiguousConstruct>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(path: PathBuf, error: String) -> Self {
        Self {
            path,
            new_path: None,
            status: FileStatus::Failed,
            spans_removed: SpanCounts::new(),
            imports_rewritten: 0,
            warnings: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_converted: usize,
    pub files_failed: usize,
    pub spans_removed: SpanCounts,
    pub imports_rewritten: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl Report {
    pub fn new(files: Vec<FileReport>, dry_run: bool) -> Self {
        let mut summary = Summary {
            files_processed: files.len(),
            ..Summary::default()
        };
        for file in &files {
            match file.status {
                FileStatus::Converted => summary.files_converted += 1,
                FileStatus::Failed => summary.files_failed += 1,
            }
            summary.spans_removed.merge(&file.spans_removed);
            summary.imports_rewritten += file.imports_rewritten;
            summary.warnings += file.warnings.len();
        }
        Self {
            dry_run,
            files,
            summary,
        }
    }

    pub fn write_json(&self, out: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }

    pub fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "\nFound {} files to process\n", self.summary.files_processed)?;
        for file in &self.files {
            match (&file.status, &file.new_path) {
                (FileStatus::Converted, Some(new_path)) => writeln!(
                    out,
                    "✓ {} -> {}",
                    file.path.display(),
                    new_path.display()
                )?,
                (FileStatus::Converted, None) => writeln!(out, "✓ {}", file.path.display())?,
                (FileStatus::Failed, _) => writeln!(
                    out,
                    "✗ {}: {}",
                    file.path.display(),
                    file.error.as_deref().unwrap_or("failed")
                )?,
            }
            for warning in &file.warnings {
                writeln!(out, "    warning: {warning}")?;
            }
        }
        self.write_summary(out)
    }

    fn write_summary(&self, out: &mut impl Write) -> io::Result<()> {
        let summary = &self.summary;
        let rule = "=".repeat(70);
        writeln!(out, "\n{rule}")?;
        if self.dry_run {
            writeln!(out, "CONVERSION SUMMARY (dry run)")?;
        } else {
            writeln!(out, "CONVERSION SUMMARY")?;
        }
        writeln!(out, "{rule}")?;
        row(out, "Files processed", summary.files_processed, 0)?;
        row(out, "Files converted", summary.files_converted, 0)?;
        row(out, "Files failed", summary.files_failed, 0)?;
        writeln!(out, "\nRemoved:")?;
        for kind in TypeSpanKind::ALL {
            let count = summary.spans_removed.get(kind);
            if count > 0 {
                row(out, kind.label(), count, 2)?;
            }
        }
        row(out, "Import paths updated", summary.imports_rewritten, 0)?;
        row(out, "Warnings", summary.warnings, 0)?;
        writeln!(out, "{rule}\n")
    }
}

fn row(out: &mut impl Write, label: &str, count: usize, indent: usize) -> io::Result<()> {
    let label = format!("{label}:");
    writeln!(out, "{:indent$}{label:<width$}{count}", "", width = 30 - indent)
}

#[cfg(test)]
mod tests {
    use dt_ast::AmbiguityReason;

    use super::*;

    fn converted(path: &str, kinds: &[TypeSpanKind]) -> FileReport {
        let mut spans_removed = SpanCounts::new();
        for &kind in kinds {
            spans_removed.record(kind);
        }
        FileReport {
            path: PathBuf::from(path),
            new_path: Some(PathBuf::from(path.replace(".ts", ".js"))),
            status: FileStatus::Converted,
            spans_removed,
            imports_rewritten: 1,
            warnings: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn summary_adds_up_per_file_results() {
        let mut b = converted("b.ts", &[TypeSpanKind::AsCast]);
        b.warnings.push(AmbiguousConstruct {
            kind: None,
            reason: AmbiguityReason::Enum,
            offset: 0,
            line: 1,
            column: 1,
        });
        let report = Report::new(
            vec![
                converted("a.ts", &[TypeSpanKind::AsCast, TypeSpanKind::InterfaceDecl]),
                b,
                FileReport::failed(PathBuf::from("c.ts"), "boom".to_string()),
            ],
            false,
        );
        let summary = &report.summary;
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_converted, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.spans_removed.get(TypeSpanKind::AsCast), 2);
        assert_eq!(summary.spans_removed.total(), 3);
        assert_eq!(summary.imports_rewritten, 2);
        assert_eq!(summary.warnings, 1);
    }

    #[test]
    fn text_report() {
        let report = Report::new(
            vec![
                converted("a.ts", &[TypeSpanKind::InterfaceDecl]),
                FileReport::failed(PathBuf::from("c.ts"), "unterminated".to_string()),
            ],
            true,
        );
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✓ a.ts -> a.js\n"));
        assert!(text.contains("✗ c.ts: unterminated\n"));
        assert!(text.contains("CONVERSION SUMMARY (dry run)"));
        assert!(text.contains("\nFiles processed:              2\n"));
        assert!(text.contains("\n  Interfaces:                 1\n"));
        assert!(!text.contains("Type casts"));
    }

    #[test]
    fn json_report() {
        let report = Report::new(vec![converted("a.ts", &[TypeSpanKind::AsCast])], false);
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["files_converted"], 1);
        assert_eq!(value["summary"]["spans_removed"]["AsCast"], 1);
        assert_eq!(value["files"][0]["status"], "converted");
        assert_eq!(value["files"][0]["new_path"], "a.js");
    }
}
