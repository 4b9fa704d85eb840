//! Integration tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn run(args: &[&str]) -> i32 {
    let mut argv = vec!["sdkgen".to_string()];
    argv.extend(args.iter().map(|a| (*a).to_string()));
    sdkgen_cli::run(argv)
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn test_usage_error_exits_2() {
    assert_eq!(run(&["generate", "--source"]), 2);
    assert_eq!(run(&["no-such-command"]), 2);
}

#[test]
fn test_no_command_prints_help() {
    assert_eq!(run(&[]), 0);
}

#[test]
fn test_generate_success() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("decls");
    let output = dir.path().join("out");
    write(&source, "device.d.ts", "export declare function getDeviceId(): string;\n");

    let code = run(&[
        "generate",
        "--source",
        path(&source),
        "--output",
        path(&output),
        "--no-format",
        "--tag",
        "1.2.3",
    ]);
    assert_eq!(code, 0);
    assert!(output.join("AIT.SystemInfo.cs").is_file());
    assert!(output.join("AIT.SystemInfo.cs.meta").is_file());
    assert!(output.join("Plugins/AppsInToss-SystemInfo.jslib").is_file());
    assert!(output.join("unity-bridge.ts").is_file());
    let main = fs::read_to_string(output.join("AIT.cs")).unwrap();
    assert!(main.contains("1.2.3"));
}

#[test]
fn test_generate_unresolvable_type_exits_1() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("decls");
    let output = dir.path().join("out");
    write(
        &source,
        "media.d.ts",
        "export declare function openCamera(options: CameraOptions): Promise<void>;\n",
    );

    let code = run(&["generate", "--source", path(&source), "--output", path(&output), "--no-format"]);
    assert_eq!(code, 1);
    assert!(!output.exists());
}

#[test]
fn test_generate_missing_source_exits_1() {
    let dir = TempDir::new().unwrap();
    let code = run(&[
        "generate",
        "--source",
        path(&dir.path().join("absent")),
        "--output",
        path(&dir.path().join("out")),
        "--no-format",
    ]);
    assert_eq!(code, 1);
}

#[test]
fn test_update_golden_round_trip() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");
    let fixtures = dir.path().join("fixtures");
    write(&output, "AITCore.cs", "class AITCore { }\n");

    let base = ["update-golden", "--output", path(&output), "--fixtures", path(&fixtures), "--file", "AITCore.cs"];
    assert_eq!(run(&base), 0);
    assert!(fixtures.join("AITCore.cs.golden").is_file());

    let mut check = base.to_vec();
    check.push("--check");
    assert_eq!(run(&check), 0);

    write(&output, "AITCore.cs", "class AITCore { int x; }\n");
    assert_eq!(run(&check), 1);
}

#[test]
fn test_update_golden_missing_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let code = run(&[
        "update-golden",
        "--output",
        path(dir.path()),
        "--fixtures",
        path(&dir.path().join("fixtures")),
        "--file",
        "AIT.Types.cs",
    ]);
    assert_eq!(code, 1);
}

#[test]
fn test_format_missing_directory_exits_1() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run(&["format", path(&dir.path().join("absent"))]), 1);
}
