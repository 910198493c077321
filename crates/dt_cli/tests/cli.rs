use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn detype(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_detype"))
        .args(args)
        .current_dir(cwd)
        .env_remove("DETYPE_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run detype")
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

const APP: &str = "import type { User } from './types';\nimport { load } from './api.ts';\n\nexport function App(props: { user: User }): JSX.Element {\n  const data = load(props.user.id)!;\n  return <div>{data as string}</div>;\n}\n";

const APP_JS: &str = "import { load } from './api.js';\n\nexport function App(props) {\n  const data = load(props.user.id);\n  return <div>{data}</div>;\n}\n";

#[test]
fn convert_replaces_typescript_sources() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "src/App.tsx", APP);
    write(root, "src/api.ts", "export const load = (id: string): Promise<string> => fetch(id).then(r => r.text());\n");
    write(root, "src/types.d.ts", "export interface User { id: string }\n");
    write(root, "node_modules/lib/index.ts", "export const x: number = 1;\n");

    let out = detype(&["convert", "src"], root);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(fs::read_to_string(root.join("src/App.jsx")).unwrap(), APP_JS);
    assert_eq!(
        fs::read_to_string(root.join("src/api.js")).unwrap(),
        "export const load = (id) => fetch(id).then(r => r.text());\n"
    );
    assert!(!root.join("src/App.tsx").exists());
    assert!(!root.join("src/api.ts").exists());
    assert!(root.join("src/types.d.ts").exists());
    assert!(root.join("node_modules/lib/index.ts").exists());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("CONVERSION SUMMARY"));
    assert!(stdout.contains("Files converted:              2"));
}

#[test]
fn convert_json_report_and_dry_run() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "a.ts", "let a: number = 1;\n");
    write(root, "b.ts", "interface B {\n  b: string;\n");

    let out = detype(&["convert", ".", "--dry-run", "--json"], root);
    assert_eq!(out.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["summary"]["files_processed"], 2);
    assert_eq!(report["summary"]["files_converted"], 1);
    assert_eq!(report["summary"]["files_failed"], 1);
    assert_eq!(report["summary"]["spans_removed"]["VarAnnotation"], 1);

    assert!(root.join("a.ts").exists());
    assert!(!root.join("a.js").exists());
    assert_eq!(fs::read_to_string(root.join("b.ts")).unwrap(), "interface B {\n  b: string;\n");
}

#[test]
fn convert_reads_config_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "src/main.ts", "import x from './x.ts';\n");
    write(root, "src/legacy/old.ts", "let o: number = 0;\n");
    write(
        root,
        "detype.json",
        r#"{ "transform": { "rewrite_import_paths": false }, "exclude": ["legacy"], "jobs": 1 }"#,
    );

    let out = detype(&["convert", "src", "--config", "detype.json", "--keep-originals"], root);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        fs::read_to_string(root.join("src/main.js")).unwrap(),
        "import x from './x.ts';\n"
    );
    assert!(root.join("src/main.ts").exists());
    assert!(!root.join("src/legacy/old.js").exists());
}

#[test]
fn strip_prints_to_stdout_or_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "App.tsx", APP);

    let out = detype(&["strip", "App.tsx"], root);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), APP_JS);

    let out = detype(&["strip", "App.tsx", "-o", "out.jsx"], root);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert_eq!(fs::read_to_string(root.join("out.jsx")).unwrap(), APP_JS);
}

#[test]
fn check_fails_on_unterminated_constructs() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "ok.ts", "enum E { A }\nconst e: E = E.A;\n");
    write(root, "bad.ts", "type T = {\n");

    let out = detype(&["check", "ok.ts", "--json"], root);
    assert!(out.status.success());
    let result: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["new_extension"], "js");
    assert_eq!(result["spans_removed"]["VarAnnotation"], 1);
    assert_eq!(result["warnings"][0]["reason"], "Enum");

    let out = detype(&["check", "bad.ts"], root);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("bad.ts"), "{stderr}");
}

#[test]
fn tokens_dumps_json() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "a.ts", "a!.b");

    let out = detype(&["tokens", "a.ts"], root);
    assert!(out.status.success());
    let tokens: Value = serde_json::from_slice(&out.stdout).unwrap();
    let texts: Vec<&str> = tokens
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["a", "!", ".", "b"]);
    assert_eq!(tokens[1]["kind"]["Punctuator"], "NonNullAssertion");
}
