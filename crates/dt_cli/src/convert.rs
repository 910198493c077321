//! `detype convert`: find every TypeScript file under a directory, transform
//! them in parallel and swap each one for its JavaScript counterpart.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dt_transform::{transform_with, NewExtension, TransformOptions};
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::report::{FileReport, FileStatus, Report};

/// Directories never descended into.
const ALWAYS_EXCLUDED: &[&str] = &["node_modules", ".git"];

#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub root: PathBuf,
    pub dry_run: bool,
    pub keep_originals: bool,
    /// Worker count; `None` lets rayon pick.
    pub jobs: Option<usize>,
    /// Extra file or directory names to skip.
    pub exclude: Vec<String>,
    pub options: TransformOptions,
}

pub fn run(args: &ConvertArgs) -> Result<Report> {
    if !args.root.is_dir() {
        bail!("{} is not a directory", args.root.display());
    }
    let files = discover(&args.root, &args.exclude);
    info!(root = %args.root.display(), files = files.len(), "converting");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("failed to start worker pool")?;
    let reports = pool.install(|| {
        files
            .par_iter()
            .map(|path| convert_file(path, args))
            .collect::<Vec<_>>()
    });
    Ok(Report::new(reports, args.dry_run))
}

/// Every convertible file under `root`, sorted by path.
pub fn discover(root: &Path, exclude: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry, exclude))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_convertible(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    let always = entry.file_type().is_dir() && ALWAYS_EXCLUDED.contains(&&*name);
    always || exclude.iter().any(|e| *e == name)
}

/// `.ts`, `.tsx`, `.mts` and `.cts` files that are not declaration files.
pub fn is_convertible(path: &Path) -> bool {
    path.file_name()
        .map(|name| NewExtension::for_filename(&name.to_string_lossy()) != NewExtension::Unchanged)
        .unwrap_or(false)
}

fn convert_file(path: &Path, args: &ConvertArgs) -> FileReport {
    let relative = path.strip_prefix(&args.root).unwrap_or(path).to_path_buf();
    match convert_one(path, args) {
        Ok(mut report) => {
            report.path = relative;
            report
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "conversion failed");
            FileReport::failed(relative, format!("{err:#}"))
        }
    }
}

fn convert_one(path: &Path, args: &ConvertArgs) -> Result<FileReport> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = match NewExtension::for_filename(&name).as_str() {
        Some(ext) => path.with_extension(ext.trim_start_matches('.')),
        None => path.to_path_buf(),
    };
    if target != path && target.exists() {
        bail!("{} already exists", target.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let output = transform_with(&source, &name, &args.options)?;

    if !args.dry_run {
        write_atomically(&target, &output.output_text)?;
        if target != path && !args.keep_originals {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        new_path: Some(
            target
                .strip_prefix(&args.root)
                .unwrap_or(&target)
                .to_path_buf(),
        ),
        status: FileStatus::Converted,
        spans_removed: output.spans_removed,
        imports_rewritten: output.imports_rewritten,
        warnings: output.warnings,
        error: None,
    })
}

/// Write through a temporary file in the target's directory so the target is
/// either fully written or not touched.
fn write_atomically(target: &Path, text: &str) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", target.display()))?;
    file.persist(target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn convertible_files() {
        assert!(is_convertible(Path::new("src/a.ts")));
        assert!(is_convertible(Path::new("src/App.tsx")));
        assert!(is_convertible(Path::new("lib/m.mts")));
        assert!(!is_convertible(Path::new("types/env.d.ts")));
        assert!(!is_convertible(Path::new("src/a.js")));
    }

    #[test]
    fn discovery_skips_excluded_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/b.ts", "");
        touch(root, "src/a.tsx", "");
        touch(root, "src/env.d.ts", "");
        touch(root, "node_modules/pkg/index.ts", "");
        touch(root, "dist/out.ts", "");
        touch(root, "readme.md", "");

        let found: Vec<PathBuf> = discover(root, &["dist".to_string()])
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(found, vec![PathBuf::from("src/a.tsx"), PathBuf::from("src/b.ts")]);
    }

    #[test]
    fn converts_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.ts", "let a: number = 1;\n");
        touch(root, "bad.ts", "interface A {\n");

        let report = run(&ConvertArgs {
            root: root.to_path_buf(),
            jobs: Some(2),
            ..ConvertArgs::default()
        })
        .unwrap();

        assert_eq!(fs::read_to_string(root.join("a.js")).unwrap(), "let a = 1;\n");
        assert!(!root.join("a.ts").exists());
        assert_eq!(fs::read_to_string(root.join("bad.ts")).unwrap(), "interface A {\n");
        assert!(!root.join("bad.js").exists());
        assert_eq!(report.summary.files_converted, 1);
        assert_eq!(report.summary.files_failed, 1);
        let failed = report.files.iter().find(|f| f.status == FileStatus::Failed).unwrap();
        assert_eq!(failed.path, PathBuf::from("bad.ts"));
    }

    #[test]
    fn dry_run_and_keep_originals() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.ts", "let a: number = 1;\n");

        let mut args = ConvertArgs {
            root: root.to_path_buf(),
            dry_run: true,
            ..ConvertArgs::default()
        };
        let report = run(&args).unwrap();
        assert_eq!(report.summary.files_converted, 1);
        assert!(!root.join("a.js").exists());

        args.dry_run = false;
        args.keep_originals = true;
        run(&args).unwrap();
        assert!(root.join("a.js").exists());
        assert!(root.join("a.ts").exists());
    }

    #[test]
    fn existing_target_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.ts", "let a: number = 1;\n");
        touch(root, "a.js", "hand written\n");

        let report = run(&ConvertArgs {
            root: root.to_path_buf(),
            ..ConvertArgs::default()
        })
        .unwrap();
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(fs::read_to_string(root.join("a.js")).unwrap(), "hand written\n");
        assert!(root.join("a.ts").exists());
    }
}
