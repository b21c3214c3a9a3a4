//! Binary start-up and file round trips.
//!
//! Inputs here carry websites only, so runs never reach the network.

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::fixtures::fixture_path;
use predicates::prelude::*;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn leadclean() -> assert_cmd::Command {
    cargo_bin_cmd!("leadclean")
}

/// Copy the shipped config into `tmp/config/` so the binary finds it from its working directory
fn setup_config_dir(tmp: &TempDir) {
    let src = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
    let dst = tmp.path().join("config");
    fs::create_dir_all(&dst).unwrap();
    fs::copy(src.join("leadclean.toml"), dst.join("leadclean.toml")).unwrap();
}

fn write_websites_csv(tmp: &TempDir) -> std::path::PathBuf {
    let input = tmp.path().join("leads.csv");
    fs::write(
        &input,
        "company,url,Notes\nAcme,https://www.acme.com/about,first\nAcme Again,acme.com,dup\nGlobex,globex.io,\n",
    )
    .unwrap();
    input
}

#[test]
fn test_init_writes_default_config() {
    let tmp = TempDir::new().unwrap();

    leadclean()
        .current_dir(tmp.path())
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created default configuration file"));

    let written = fs::read_to_string(tmp.path().join("config").join("leadclean.toml")).unwrap();
    assert!(written.contains("[[providers]]"));
}

#[test]
fn test_missing_config_exits_fast_not_hangs() {
    let tmp = TempDir::new().unwrap();
    let input = write_websites_csv(&tmp);

    leadclean()
        .current_dir(tmp.path())
        .arg("--input")
        .arg(&input)
        .timeout(Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("--init"));
}

#[test]
fn test_missing_input_is_rejected() {
    let tmp = TempDir::new().unwrap();
    setup_config_dir(&tmp);

    leadclean()
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file is required"));
}

#[test]
fn test_unsupported_output_extension_is_rejected() {
    let tmp = TempDir::new().unwrap();
    setup_config_dir(&tmp);
    let input = write_websites_csv(&tmp);

    leadclean()
        .current_dir(tmp.path())
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg("out.xlsx")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));
}

#[test]
fn test_invalid_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("broken.toml");
    fs::write(&config, "[http\nuser_agent = ").unwrap();
    let input = write_websites_csv(&tmp);

    leadclean()
        .current_dir(tmp.path())
        .arg("-i")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_header_only_csv_fails_with_invalid_data() {
    let tmp = TempDir::new().unwrap();
    setup_config_dir(&tmp);
    let input = tmp.path().join("empty.csv");
    fs::write(&input, "email,website\n").unwrap();

    leadclean()
        .current_dir(tmp.path())
        .arg("-i")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid CSV data"));
}

#[test]
fn test_csv_run_writes_default_output() {
    let tmp = TempDir::new().unwrap();
    setup_config_dir(&tmp);
    let input = write_websites_csv(&tmp);

    leadclean()
        .current_dir(tmp.path())
        .arg("-i")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("PROCESSING SUMMARY"))
        .stdout(predicate::str::contains("Output Rows: 2"));

    let output = fs::read_to_string(tmp.path().join("leads_cleaned.csv")).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines, vec!["website,company,Notes", "acme.com,Acme,first", "globex.io,Globex,"]);
}

#[test]
fn test_json_fixture_to_json_output() {
    let tmp = TempDir::new().unwrap();
    setup_config_dir(&tmp);
    let input = tmp.path().join("sites.json");
    fs::write(
        &input,
        r#"[{"website": "WWW.Acme.com", "company": "Acme"}, {"site": "globex.io"}, {"company": "none"}]"#,
    )
    .unwrap();
    let out = tmp.path().join("reports").join("sites.json");

    leadclean()
        .current_dir(tmp.path())
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .arg("--batch-size")
        .arg("3")
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["summary"]["output_rows"], 2);
    assert_eq!(value["rows"][0]["website"], "acme.com");
    assert_eq!(value["rows"][1]["website"], "globex.io");
}

#[test]
fn test_fixture_path_points_into_repo() {
    assert!(fixture_path("contacts.csv").exists());
}
