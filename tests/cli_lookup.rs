use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use clap::CommandFactory;
use doxygen_search::Cli;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/search")
        .join(name)
}

fn base_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dxs"));
    // Keep user config and environment out of the way.
    cmd.env("DXS_CONFIG", "/nonexistent/dxs-config.toml")
        .env_remove("DXS_MATCH_MODE")
        .env_remove("DXS_LIMIT")
        .env_remove("DXS_COLOR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn clap_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn lookup_prints_matching_entries() {
    base_cmd()
        .args(["--color", "never", "lookup"])
        .arg(fixture("all_a.js"))
        .arg("po")
        .assert()
        .success()
        .stdout(contains("point2d"))
        .stdout(contains("Point3D::Point3D(float x=0, float y=0, float z=0)"))
        .stdout(contains("pave3d").not());
}

#[test]
fn lookup_json_has_contract_fields() {
    let output = base_cmd()
        .args(["lookup", "--json"])
        .arg(fixture("all_a.js"))
        .arg("Pave")
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid lookup json");

    assert_eq!(json["query"], "Pave");
    assert_eq!(json["mode"], "prefix");
    assert_eq!(json["section"], "all");
    assert_eq!(json["count"], 1);
    assert_eq!(json["hits"][0]["key"]["term"], "pave3d");
    assert_eq!(json["hits"][0]["references"].as_array().unwrap().len(), 6);
}

#[test]
fn no_hits_exits_with_one() {
    base_cmd()
        .args(["lookup"])
        .arg(fixture("all_a.js"))
        .arg("quad")
        .assert()
        .code(1);
}

#[test]
fn substring_mode_from_env() {
    base_cmd()
        .env("DXS_MATCH_MODE", "substring")
        .args(["--color", "never", "lookup"])
        .arg(fixture("all_a.js"))
        .arg("meter")
        .assert()
        .success()
        .stdout(contains("Triangle2D::perimeter()"));
}

#[test]
fn flag_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    fs::write(&config, "match_mode = \"substring\"\nlimit = 1\n").unwrap();

    // Config alone: substring match, limited to one hit.
    base_cmd()
        .args(["--color", "never", "--config"])
        .arg(&config)
        .arg("lookup")
        .arg(fixture("all_a.js"))
        .arg("3d")
        .assert()
        .success()
        .stdout(contains("pave3d"))
        .stdout(contains("... 1 more"));

    // Flag wins over the file.
    base_cmd()
        .args(["--color", "never", "--config"])
        .arg(&config)
        .arg("lookup")
        .arg(fixture("all_a.js"))
        .arg("3d")
        .args(["--mode", "prefix"])
        .assert()
        .code(1);
}

#[test]
fn malformed_index_exits_with_two() {
    let tmp = TempDir::new().unwrap();
    let bad = tmp.path().join("all_0.js");
    fs::write(&bad, "var searchData=[['pave3d_0',['pave3d',['../classPave3D.html',1,").unwrap();

    base_cmd()
        .arg("check")
        .arg(&bad)
        .assert()
        .code(2)
        .stderr(contains("malformed search index"));
}

#[test]
fn truncated_json_export_exits_with_two() {
    let tmp = TempDir::new().unwrap();
    let exported = tmp.path().join("index.json");
    fs::write(&exported, r#"[{"key":{"term":"pave3d","suffix_index":0},"label":"#).unwrap();

    base_cmd()
        .arg("check")
        .arg(&exported)
        .assert()
        .code(2)
        .stderr(contains("malformed search index at line 1"))
        .stderr(contains("index.json"));
}

#[test]
fn missing_index_exits_with_three() {
    base_cmd()
        .arg("check")
        .arg(fixture("does_not_exist.js"))
        .assert()
        .code(3)
        .stderr(contains("Failed to read search index"));
}

#[test]
fn check_reports_sections_for_directory() {
    let dir = fixture("all_a.js");
    let dir = dir.parent().unwrap();
    base_cmd()
        .arg("check")
        .arg(dir)
        .assert()
        .success()
        .stdout(contains("ok: 9 entries, 20 references (all=5, classes=4)"));
}

#[test]
fn export_round_trips_through_lookup() {
    let tmp = TempDir::new().unwrap();
    let output = base_cmd()
        .arg("export")
        .arg(fixture("all_a.js"))
        .assert()
        .success()
        .get_output()
        .clone();
    let exported = tmp.path().join("index.json");
    fs::write(&exported, &output.stdout).unwrap();

    base_cmd()
        .args(["--color", "never", "lookup"])
        .arg(&exported)
        .arg("present")
        .assert()
        .success()
        .stdout(contains("present (Renderer)"));
}

#[test]
fn list_section_of_directory() {
    let dir = fixture("all_a.js");
    base_cmd()
        .args(["--color", "never", "list", "--section", "classes"])
        .arg(dir.parent().unwrap())
        .assert()
        .success()
        .stdout(contains("Renderer"))
        .stdout(contains("perimeter").not());
}

#[test]
fn repl_reads_queries_from_stdin() {
    base_cmd()
        .args(["--color", "never", "repl"])
        .arg(fixture("all_a.js"))
        .write_stdin("pres\nzzz\n")
        .assert()
        .success()
        .stdout(contains("present (Renderer)"))
        .stdout(contains("no results"));
}

#[test]
fn color_never_emits_no_ansi() {
    let output = base_cmd()
        .args(["--color", "never", "lookup"])
        .arg(fixture("all_a.js"))
        .arg("p")
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(!String::from_utf8_lossy(&output.stdout).contains('\u{1b}'));
}

#[test]
fn version_json_reports_package_version() {
    let output = base_cmd()
        .args(["version", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn completions_generate_for_bash() {
    base_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(contains("dxs"));
}
