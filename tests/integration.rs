use std::path::Path;
use std::process::{Command, Output};

fn run_docxref(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_docxref"));
    cmd.args(args);
    cmd.env_remove("DOCXREF_LOG");
    return cmd.output().unwrap();
}

fn fixture(name: &str) -> String {
    return Path::new("tests/fixtures").join(name).to_string_lossy().into_owned();
}

#[test]
fn check_passes_on_clean_tree() {
    let out = run_docxref(&["check", "--root", &fixture("clean")]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "check failed: {stdout}\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(stdout.contains("All 2 documents resolved"), "drafts not excluded: {stdout}");
}

#[test]
fn check_reports_every_failure() {
    let out = run_docxref(&["check", "--root", &fixture("broken")]);
    assert_eq!(out.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let expected = [
        "INVALID  /index.json  More than one link target with id 'dup' in path /index.json",
        "INVALID  /index.json  circular link reference: b",
        "INVALID  /index.json  unresolved link id reference: missing",
        "INVALID  /index.json  too many anonymous link references",
    ];
    for line in expected {
        assert!(stdout.contains(line), "missing `{line}` in:\n{stdout}");
    }
    assert_eq!(
        stdout.matches("More than one link target with id 'dup'").count(),
        2,
        "both duplicates should be reported:\n{stdout}"
    );
    assert!(stdout.contains("5 invalid"), "wrong summary:\n{stdout}");
}

#[test]
fn resolve_writes_links_to_stdout() {
    let out = run_docxref(&["resolve", "--root", &fixture("clean")]);
    assert!(out.status.success(), "resolve failed: {}", String::from_utf8_lossy(&out.stderr));

    let tree: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let index = tree.get("/index.json").unwrap().to_string();
    assert!(index.contains("/guide/setup.json#install"), "path link missing: {index}");
    assert!(index.contains("https://example.com"), "alias link missing: {index}");
    assert!(index.contains("https://forum.example.com"), "anonymous link missing: {index}");
    assert!(index.contains("__fn-1"), "footnote link missing: {index}");
    assert!(!index.contains("link_definition"), "definitions not removed: {index}");
    assert!(!index.contains("link_alias"), "aliases not removed: {index}");

    let setup = tree.get("/guide/setup.json").unwrap().to_string();
    assert!(setup.contains("/index.json#welcome"), "derived header link missing: {setup}");
}

#[test]
fn resolve_writes_one_file_per_document() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().to_string_lossy().into_owned();
    let out = run_docxref(&["resolve", "--root", &fixture("clean"), "--out", &out_dir]);
    assert!(out.status.success(), "resolve failed: {}", String::from_utf8_lossy(&out.stderr));

    let written = std::fs::read_to_string(dir.path().join("guide/setup.json")).unwrap();
    let document: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(document.get("content").is_some_and(serde_json::Value::is_array), "unexpected shape: {written}");
    assert!(!dir.path().join("drafts").exists(), "excluded document written");
}

#[test]
fn targets_lists_selectors() {
    let out = run_docxref(&["targets", "--root", &fixture("clean")]);
    assert!(out.status.success(), "targets failed: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("link target with id 'welcome'"), "header id missing:\n{stdout}");
    assert!(stdout.contains("link definition with id 'docs'"), "alias missing:\n{stdout}");
    assert!(stdout.contains("anonymous link"), "anonymous definition missing:\n{stdout}");
    assert!(stdout.contains("link target with path '/guide/setup.json#install'"), "path missing:\n{stdout}");
}

#[test]
fn malformed_document_is_a_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.json"), "{\"content\": 3}").unwrap();

    let out = run_docxref(&["check", "--root", &dir.path().to_string_lossy()]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid Document"), "unexpected stderr: {stderr}");
}

#[test]
fn missing_root_is_a_hard_error() {
    let out = run_docxref(&["check", "--root", "tests/fixtures/does-not-exist"]);
    assert_eq!(out.status.code(), Some(2));
}
