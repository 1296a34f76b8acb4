//! Integration tests for the shared CLI entry point.

#![allow(clippy::unwrap_used)]

use flowtrace::entry_point::run_with_args_to;

fn run(args: Vec<String>) -> (i32, String) {
    let mut output = Vec::new();
    let code = run_with_args_to(args, &mut output).unwrap();
    (code, String::from_utf8(output).unwrap())
}

#[test]
fn json_output_lists_findings() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("vuln.py");
    std::fs::write(&file, "data = input()\neval(data)\n").unwrap();

    let (code, output) = run(vec![file.display().to_string(), "--json".to_owned()]);
    assert_eq!(code, 0);

    let findings: serde_json::Value = serde_json::from_str(&output).unwrap();
    let list = findings.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["rule_id"], "FT-CODE-001");
    assert_eq!(list[0]["sink_line"], 2);
}

#[test]
fn strict_mode_fails_on_findings() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("vuln.py");
    std::fs::write(&file, "data = input()\neval(data)\n").unwrap();

    let (code, _) = run(vec![
        file.display().to_string(),
        "--json".to_owned(),
        "--strict".to_owned(),
    ]);
    assert_eq!(code, 1);
}

#[test]
fn clean_directory_reports_no_flows() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ok.py"), "x = 1\nprint(x)\n").unwrap();

    let (code, output) = run(vec![dir.path().display().to_string()]);
    assert_eq!(code, 0);
    assert!(output.contains("0 flow(s) reported"));
}

#[test]
fn excluded_folders_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let vendored = dir.path().join("vendor");
    std::fs::create_dir(&vendored).unwrap();
    std::fs::write(vendored.join("vuln.py"), "eval(input())\n").unwrap();

    let (_, output) = run(vec![
        dir.path().display().to_string(),
        "--json".to_owned(),
        "--exclude-folder".to_owned(),
        "vendor".to_owned(),
    ]);
    let findings: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(findings.as_array().unwrap().is_empty());
}

#[test]
fn custom_sink_flag_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("custom.py");
    std::fs::write(&file, "data = input()\nmylib.run(data)\n").unwrap();

    let (_, output) = run(vec![
        file.display().to_string(),
        "--json".to_owned(),
        "--sink".to_owned(),
        "mylib.run".to_owned(),
    ]);
    let findings: serde_json::Value = serde_json::from_str(&output).unwrap();
    let list = findings.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["rule_id"], "FT-CUSTOM-SINK");
}

#[test]
fn help_exits_cleanly() {
    let (code, output) = run(vec!["--help".to_owned()]);
    assert_eq!(code, 0);
    assert!(output.contains("flowtrace"));
}
