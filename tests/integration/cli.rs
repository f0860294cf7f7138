//! Runs of the `update-dependencies` binary.
//!
//! Every run here is answered from a local checksums file, so no test touches the
//! network.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::{MANIFEST_9_0, TestProject};

const X64_DIGEST: &str = "1111111111111111111111111111111111111111111111111111111111111111";
const ARM64_DIGEST: &str = "2222222222222222222222222222222222222222222222222222222222222222";
const X64_URL: &str =
    "https://dotnetcli.azureedge.net/dotnet/Runtime/9.0.1/dotnet-runtime-9.0.1-linux-x64.tar.gz";

fn project_with_checksums() -> (TestProject, String) {
    let project = TestProject::new().unwrap();
    project.write_manifest(MANIFEST_9_0).unwrap();

    let checksums = project.project_path().join("checksums.txt");
    std::fs::write(
        &checksums,
        format!(
            "Hash: SHA512\n\
             {X64_DIGEST} dotnet-runtime-9.0.1-linux-x64.tar.gz\n\
             {ARM64_DIGEST} dotnet-runtime-9.0.1-linux-arm64.tar.gz\n"
        ),
    )
    .unwrap();
    let checksums = checksums.display().to_string();
    (project, checksums)
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("update-dependencies")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("specific"))
        .stdout(predicate::str::contains("checksum"));
}

#[test]
fn test_specific_updates_manifest() {
    let (project, checksums) = project_with_checksums();

    let output = project
        .run(&[
            "specific",
            "-p",
            "runtime=9.0.1",
            "--checksums-file",
            &checksums,
            "--no-compute-shas",
        ])
        .unwrap();

    output
        .assert_success()
        .assert_stdout_contains("Updated 4 variable(s)")
        .assert_stdout_contains("Update runtime to 9.0.1");

    let manifest = project.read_manifest().unwrap();
    assert!(manifest.contains(r#""runtime|9.0|build-version": "9.0.1","#));
    assert!(manifest.contains(X64_DIGEST));
    assert!(manifest.contains(ARM64_DIGEST));
    assert!(manifest.contains(r#""chisel|9.0|ref": "v1.0.0","#));
}

#[test]
fn test_specific_dry_run_keeps_file() {
    let (project, checksums) = project_with_checksums();

    project
        .run(&["specific", "-p", "runtime=9.0.1", "--checksums-file", &checksums, "--dry-run"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("Would update");

    assert_eq!(project.read_manifest().unwrap(), MANIFEST_9_0);
}

#[test]
fn test_specific_json_report() {
    let (project, checksums) = project_with_checksums();

    let output = project
        .run(&["specific", "-p", "runtime=9.0.1", "--checksums-file", &checksums, "--json"])
        .unwrap();
    output.assert_success();

    let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let updates = report["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[0]["variable_name"], "runtime|9.0|build-version");
    assert_eq!(updates[0]["old_value"], "9.0.0");
    assert_eq!(updates[0]["new_value"], "9.0.1");
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn test_config_file_is_honoured() {
    let (project, checksums) = project_with_checksums();
    project.write_config("dockerfile_version = \"8.0\"\n").unwrap();

    project
        .run(&["specific", "-p", "runtime=9.0.1", "--checksums-file", &checksums])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("No updates required");

    assert_eq!(project.read_manifest().unwrap(), MANIFEST_9_0);
}

#[test]
fn test_malformed_product_version_is_rejected() {
    let project = TestProject::new().unwrap();
    project.write_manifest(MANIFEST_9_0).unwrap();

    let output = project.run(&["specific", "-p", "runtime"]).unwrap();
    assert!(!output.success);
    output.assert_stderr_contains("NAME=VERSION");
}

#[test]
fn test_missing_manifest_fails() {
    let project = TestProject::new().unwrap();

    let output = project.run(&["specific", "-p", "runtime=9.0.1"]).unwrap();
    assert!(!output.success);
    assert_eq!(output.code, Some(1));
    output.assert_stderr_contains("manifest.versions.json");
}

#[test]
fn test_checksum_command_uses_local_file() {
    let (project, checksums) = project_with_checksums();

    project
        .run(&["checksum", X64_URL, "--checksums-file", &checksums, "--build-version", "9.0.1"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains(&format!("{X64_DIGEST}  {X64_URL}"));
}
