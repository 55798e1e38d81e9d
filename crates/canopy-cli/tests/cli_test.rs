use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn scenario() -> PathBuf {
    let fixture = repo_root().join("fixtures").join("scenario.json");
    assert!(fixture.exists(), "fixture missing: {}", fixture.display());
    fixture
}

fn run_json(args: &[&str]) -> Value {
    let exe = assert_cmd::cargo_bin!("canopy-cli");
    let assert = Command::new(exe)
        .current_dir(repo_root())
        .args(args)
        .assert()
        .success();
    serde_json::from_slice(&assert.get_output().stdout).expect("stdout is JSON")
}

fn keys(nodes: &Value) -> Vec<String> {
    nodes
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["key"].to_string().trim_matches('"').to_string())
        .collect()
}

#[test]
fn layout_prints_visible_nodes() {
    let fixture = scenario();
    let out = run_json(&["layout", fixture.to_string_lossy().as_ref()]);

    assert_eq!(out["strategy"], "TOP_CENTER");
    assert_eq!(out["scaleRatio"], 1.0);
    assert_eq!(keys(&out["nodes"]), ["O", "E", "F", "N"]);

    let root = &out["nodes"][0];
    assert_eq!(root["level"], 0);
    assert_eq!(root["final"], -30.0);
    assert_eq!(root["expanded"], true);
    assert!(root["style"]["node"].is_object());
    assert!(root["style"]["junctionLine"].is_object());
    assert!(root["style"].get("customLine").is_none());
    assert!(out["nodes"][1]["style"]["customLine"].is_object());
}

#[test]
fn options_file_and_flags_combine() {
    let fixture = scenario();
    let options = repo_root().join("fixtures").join("expand_all_small.json");
    let out = run_json(&[
        "--options",
        options.to_string_lossy().as_ref(),
        fixture.to_string_lossy().as_ref(),
    ]);
    assert_eq!(out["strategy"], "CENTER_LEFT");
    assert_eq!(out["nodes"].as_array().map(Vec::len), Some(15));
    assert_eq!(out["nodes"][0]["style"]["node"]["width"], 50.0);

    let out = run_json(&[
        "--options",
        options.to_string_lossy().as_ref(),
        "--strategy",
        "top-left-align-top",
        "--toggle",
        "N",
        fixture.to_string_lossy().as_ref(),
    ]);
    assert_eq!(out["strategy"], "TOP_LEFT_ALIGN_TOP");
    assert_eq!(out["nodes"].as_array().map(Vec::len), Some(8));
}

#[test]
fn reads_the_tree_from_stdin() {
    let data = fs::read_to_string(scenario()).expect("read fixture");
    let exe = assert_cmd::cargo_bin!("canopy-cli");
    let assert = assert_cmd::Command::new(exe)
        .args(["--expand-all", "-"])
        .write_stdin(data)
        .assert()
        .success();
    let out: Value = serde_json::from_slice(&assert.get_output().stdout).expect("stdout is JSON");
    assert_eq!(out["nodes"].as_array().map(Vec::len), Some(15));
}

#[test]
fn scrolling_and_culling_use_the_viewport() {
    let fixture = scenario();
    let out = run_json(&[
        "--expand-all",
        "--viewport",
        "100x100",
        "--scroll-to",
        "O",
        "--virtual",
        fixture.to_string_lossy().as_ref(),
    ]);

    assert_eq!(out["anchor"]["top"], 50.0);
    assert_eq!(out["anchor"]["left"], 50.0);

    let nodes = out["nodes"].as_array().expect("array");
    assert_eq!(nodes.len(), 15);
    assert!(nodes[0]["style"]["node"].is_object());
    assert!(nodes.iter().any(|n| n["style"].get("node").is_none()));
}

#[test]
fn frames_interpolate_the_last_toggle() {
    let fixture = scenario();
    let out = run_json(&[
        "frames",
        "--toggle",
        "O",
        "--frames",
        "2",
        fixture.to_string_lossy().as_ref(),
    ]);

    let frames = out["frames"].as_array().expect("frames");
    let progress: Vec<f64> = frames
        .iter()
        .map(|f| f["progress"].as_f64().expect("progress"))
        .collect();
    assert_eq!(progress, [0.0, 0.5, 1.0]);
    for frame in frames {
        assert_eq!(keys(&frame["nodes"]), ["O", "E", "F", "N"]);
    }

    // E shrinks into the root.
    let root_left = frames[2]["nodes"][0]["style"]["node"]["left"].as_f64();
    let e_left = frames[2]["nodes"][1]["style"]["node"]["left"].as_f64();
    assert_eq!(root_left, Some(-30.0));
    assert!(matches!(e_left, Some(left) if (left + 30.0).abs() < 1e-9));
}

#[test]
fn usage_errors_exit_with_2() {
    let exe = assert_cmd::cargo_bin!("canopy-cli");
    Command::new(exe)
        .args(["--strategy", "sideways"])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("canopy-cli");
    let assert = Command::new(exe).arg("--help").assert().code(2);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("USAGE"), "{stderr}");
}

#[test]
fn invalid_trees_exit_with_1() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("bad.json");
    fs::write(&input, r#"{ "key": "O", "children": 3 }"#).expect("write input");

    let exe = assert_cmd::cargo_bin!("canopy-cli");
    let assert = Command::new(exe)
        .arg(input.to_string_lossy().as_ref())
        .assert()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("invalid tree"), "{stderr}");
    assert!(stderr.contains("children"), "{stderr}");

    fs::write(&input, "{ not json").expect("write input");
    let exe = assert_cmd::cargo_bin!("canopy-cli");
    Command::new(exe)
        .arg(input.to_string_lossy().as_ref())
        .assert()
        .code(1);
}
