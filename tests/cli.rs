mod common;

use assert_cmd::Command;
use common::write_knowledge_base;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// `sbo` running inside `dir` with `dir` as home, so no user config is picked up.
fn sbo(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sbo").unwrap();
    cmd.current_dir(dir).env("HOME", dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_no_subcommand_prints_usage() {
    let dir = TempDir::new().unwrap();
    sbo(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_tiers_as_json() {
    let dir = TempDir::new().unwrap();
    let kb = write_knowledge_base(dir.path());
    let output = sbo(dir.path())
        .args(["tiers", "--format", "json", "--knowledge-base"])
        .arg(&kb)
        .output()
        .unwrap();
    assert!(output.status.success());

    let tiers: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tiers[0]["tools"], serde_json::json!(["mythril"]));
    assert_eq!(tiers[0]["coverage"], serde_json::json!(2));
    assert_eq!(tiers[1]["tools"], serde_json::json!(["slither", "oyente"]));
}

#[test]
fn test_missing_knowledge_base_is_fatal() {
    let dir = TempDir::new().unwrap();
    sbo(dir.path())
        .args(["tiers", "-k", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:").and(predicate::str::contains("missing.json")));
}

#[test]
fn test_inspect_reports_blind_relations() {
    let dir = TempDir::new().unwrap();
    let kb = write_knowledge_base(dir.path());
    let output = sbo(dir.path())
        .args(["inspect", "Reentrancy", "--format", "json", "-k"])
        .arg(&kb)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["id"], "V1");
    assert_eq!(report["relations"]["enabled_by"][0]["name"], "Gas griefing");
    assert_eq!(report["relations"]["enabled_by"][0]["detectable"], false);
    assert_eq!(report["relations"]["children"][0]["detectable"], true);
}

#[test]
fn test_run_without_matching_files_fails() {
    let dir = TempDir::new().unwrap();
    let kb = write_knowledge_base(dir.path());
    sbo(dir.path())
        .args(["-q", "run", "-f", "contracts/*.sol", "-k"])
        .arg(&kb)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files match"));
}

#[test]
fn test_run_rejects_bad_memory_limit() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Bank.sol"), "contract Bank {}").unwrap();
    sbo(dir.path())
        .args(["-q", "run", "-f", "*.sol", "--mem-limit", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mem_limit"));
}

/// Stands in for SmartBugs: writes one SARIF file per requested tool, slither reports V1.
#[cfg(unix)]
const FAKE_SMARTBUGS: &str = r#"
tools=""
results=""
mode=""
while [ $# -gt 0 ]; do
  case "$1" in
    -t) mode=tools ;;
    -f) mode=files ;;
    --results) shift; results="$1"; mode="" ;;
    -*) mode="" ;;
    *) if [ "$mode" = tools ]; then tools="$tools $1"; fi ;;
  esac
  shift
done
base=$(dirname "$(dirname "$(dirname "$results")")")
for tool in $tools; do
  out="$base/$tool/sbo/Bank.sol"
  mkdir -p "$out"
  if [ "$tool" = slither ]; then
    echo '{"runs":[{"results":[{"ruleId":"reentrancy-eth","sbo":["V1"],"locations":[{"physicalLocation":{"artifactLocation":{"uri":"Bank.sol"}}}]}]}]}' > "$out/result.sarif"
  else
    echo '{"runs":[{"results":[]}]}' > "$out/result.sarif"
  fi
done
"#;

#[cfg(unix)]
#[test]
fn test_run_writes_enriched_report() {
    let dir = TempDir::new().unwrap();
    let kb = write_knowledge_base(dir.path());
    let script = dir.path().join("fake-smartbugs.sh");
    fs::write(&script, FAKE_SMARTBUGS).unwrap();
    fs::write(dir.path().join("Bank.sol"), "contract Bank {}").unwrap();
    let config = dir.path().join("sbo.toml");
    fs::write(
        &config,
        format!(
            "[knowledge_base]\npath = '{}'\n\n[smartbugs]\ncommand = 'sh {}'\n\n[tools]\nsupported = ['slither', 'mythril', 'oyente']\n",
            kb.display(),
            script.display()
        ),
    )
    .unwrap();

    sbo(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["-q", "run", "-f", "*.sol", "-o", "out/data.json"])
        .assert()
        .success();

    let report: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/data.json")).unwrap())
            .unwrap();
    let finding = &report["slither"][0];
    assert_eq!(finding["ruleId"], "reentrancy-eth");
    assert_eq!(finding["sbo"][0]["name"], "Reentrancy");
    assert_eq!(finding["sbo"][0]["level"], "High");
    assert_eq!(report["mythril"], serde_json::json!([]));
}
