//! End-to-end tests of the `ridgeprint` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const MINUTIAE: &str = "12.5 30.0 1.57 1 0.9\n200.0 10.0 0.0 2 0.5\n";

fn ridgeprint(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ridgeprint").unwrap();
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

fn minutiae_dir(root: &Path, files: &[&str]) -> std::path::PathBuf {
    let dir = root.join("minutiae_txt");
    fs::create_dir_all(&dir).unwrap();
    for name in files {
        fs::write(dir.join(name), MINUTIAE).unwrap();
    }
    dir
}

// === Argument handling ===

#[test]
fn help_lists_subcommands() {
    let tmp = tempfile::tempdir().unwrap();
    ridgeprint(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("full")
                .and(predicate::str::contains("preprocess"))
                .and(predicate::str::contains("extract"))
                .and(predicate::str::contains("render")),
        );
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    ridgeprint(tmp.path()).assert().failure();
}

#[test]
fn bad_template_size_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    ridgeprint(tmp.path())
        .args(["render", "in", "out", "--template-size", "wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WIDTHxHEIGHT"));
}

// === Render ===

#[test]
fn render_writes_one_template_per_file() {
    let tmp = tempfile::tempdir().unwrap();
    let input = minutiae_dir(tmp.path(), &["a.txt", "b.txt"]);
    let out = tmp.path().join("templates");

    ridgeprint(tmp.path())
        .arg("render")
        .arg(&input)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 images, 2 reached template_rendering"));

    for name in ["a.png", "b.png"] {
        let template = image::open(out.join(name)).unwrap();
        assert_eq!((template.width(), template.height()), (256, 256));
    }
}

#[test]
fn json_stats_are_machine_readable() {
    let tmp = tempfile::tempdir().unwrap();
    let input = minutiae_dir(tmp.path(), &["a.txt"]);
    let out = tmp.path().join("templates");

    let output = ridgeprint(tmp.path())
        .arg("--json")
        .arg("render")
        .arg(&input)
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["images"], 1);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["final_stage"], "template_rendering");
    assert_eq!(stats["results"][0]["status"], "SUCCESS");
}

#[test]
fn template_size_flag_overrides_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let input = minutiae_dir(tmp.path(), &["a.txt"]);
    fs::write(
        tmp.path().join("ridgeprint.toml"),
        "[run]\ntemplate_size = { width = 64, height = 32 }\n",
    )
    .unwrap();

    let from_file = tmp.path().join("from_file");
    ridgeprint(tmp.path())
        .arg("render")
        .arg(&input)
        .arg(&from_file)
        .assert()
        .success();
    let template = image::open(from_file.join("a.png")).unwrap();
    assert_eq!((template.width(), template.height()), (64, 32));

    let from_flag = tmp.path().join("from_flag");
    ridgeprint(tmp.path())
        .arg("render")
        .arg(&input)
        .arg(&from_flag)
        .args(["--template-size", "40x20"])
        .assert()
        .success();
    let template = image::open(from_flag.join("a.png")).unwrap();
    assert_eq!((template.width(), template.height()), (40, 20));
}

// === Startup failures exit 1 ===

#[test]
fn invalid_config_file_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let input = minutiae_dir(tmp.path(), &["a.txt"]);
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "[batch]\nnfiq_threshold = 9\n").unwrap();

    ridgeprint(tmp.path())
        .arg("--config")
        .arg(&config)
        .arg("render")
        .arg(&input)
        .arg(tmp.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nfiq_threshold"));
}

#[test]
fn missing_tool_exits_1_before_writing_output() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("raw");
    fs::create_dir(&input).unwrap();
    let out = tmp.path().join("out");

    ridgeprint(tmp.path())
        .arg("full")
        .arg(&input)
        .arg(&out)
        .arg("--minutiae-tool")
        .arg(tmp.path().join("no-such-tool"))
        .arg("--no-quality-filter")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not available"));
    assert!(!out.exists());
}

#[test]
fn oversized_timeout_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let input = minutiae_dir(tmp.path(), &["a.txt"]);
    ridgeprint(tmp.path())
        .arg("render")
        .arg(&input)
        .arg(tmp.path().join("out"))
        .args(["--timeout", "18446744073709551615"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn missing_input_directory_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    ridgeprint(tmp.path())
        .arg("render")
        .arg(tmp.path().join("absent"))
        .arg(tmp.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read input directory"));
}

// === Full pipeline with stand-in tools ===

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
fn scan_png() -> Vec<u8> {
    let img = image::GrayImage::from_fn(240, 200, |x, y| {
        let inked = (60..180).contains(&x) && (50..150).contains(&y);
        if inked && (x + y) % 9 < 4 {
            image::Luma([35])
        } else {
            image::Luma([245])
        }
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[cfg(unix)]
#[test]
fn full_pipeline_with_stand_in_tools() {
    let tmp = tempfile::tempdir().unwrap();
    let tools = tmp.path().join("tools");
    fs::create_dir(&tools).unwrap();
    write_script(&tools.join("nfiq"), "echo 2");
    write_script(
        &tools.join("mindtct"),
        &format!("printf '{}' > \"$2.min\"", MINUTIAE.replace('\n', "\\n")),
    );

    let input = tmp.path().join("raw");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("f001.png"), scan_png()).unwrap();
    fs::write(input.join("broken.png"), b"not a png").unwrap();
    let out = tmp.path().join("out");

    ridgeprint(tmp.path())
        .arg("full")
        .arg(&input)
        .arg(&out)
        .arg("--quality-tool")
        .arg(tools.join("nfiq"))
        .arg("--minutiae-tool")
        .arg(tools.join("mindtct"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 images, 1 reached template_rendering"));

    assert!(out.join("processed/f001.png").is_file());
    let minutiae = fs::read_to_string(out.join("minutiae_txt/f001.txt")).unwrap();
    assert_eq!(minutiae.lines().count(), 3);
    assert!(out.join("templates/f001.png").is_file());
    assert!(!out.join("templates/broken.png").exists());
}
