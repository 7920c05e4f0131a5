//! Integration tests for the `ednn` commands.

use assert_cmd::Command;
use ednn_training::{DriverConfig, EnsembleConfig};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a checkpoint one epoch past the resume point (or at epoch 1).
const DRIVER_SCRIPT: &str = r#"
start=${EDNN_RESUME_EPOCH:-0}
next=$((start + 1))
echo "{\"epoch\":$next,\"train_loss\":1.0,\"val_loss\":1.2}"
printf '{"epoch":%d,"model_state":{},"optimizer_state":{}}' "$next" > "$EDNN_CHECKPOINT_PATH"
"#;

fn write_dataset(dir: &Path) -> PathBuf {
    let mut csv = (0..13).map(|c| format!("f{c}")).collect::<Vec<_>>().join(",");
    csv.push_str(",medv\n");
    for r in 0..12 {
        let row: Vec<String> = (0..14).map(|c| format!("{}.25", r + c)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    let path = dir.join("boston.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

/// Writes a config pointing at a temp dataset and model directory.
fn write_config(temp: &TempDir) -> PathBuf {
    let mut config = EnsembleConfig::default();
    config.dataset.csv_path = write_dataset(temp.path());
    config.output.model_save_base = temp.path().join("models");
    config.device = ednn_training::Device::Cpu;
    config.driver = DriverConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), DRIVER_SCRIPT.to_string(), "ednn-driver".to_string()],
    };
    let path = temp.path().join("ednn.toml");
    config.save_to_file(&path).unwrap();
    path
}

fn ednn() -> Command {
    Command::cargo_bin("ednn").unwrap()
}

#[test]
fn test_metrics_lists_tokens() {
    ednn()
        .arg("metrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("regression").and(predicate::str::contains("uq")));
}

#[test]
fn test_metrics_json() {
    let output = ednn().arg("metrics").arg("--json").output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["regression"][0], "mse");
    assert!(value["uq"].as_array().unwrap().iter().any(|m| m == "nll"));
}

#[test]
fn test_plan_json_lists_every_member() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp);

    let output = ednn().arg("--config").arg(&config).arg("plan").arg("--json").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let planned: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(planned.len(), 5);
    for (i, member) in planned.iter().enumerate() {
        assert_eq!(member["index"], i);
        assert_eq!(member["seed"], 42 + i);
        assert_eq!(member["loss_mode"], "mse");
        assert_eq!(member["metrics_token"], "regression");
        assert!(member["resume_epoch"].is_null());
        assert!(member["checkpoint_path"].as_str().unwrap().ends_with(&format!("mse/model_{i}.pth")));
    }
    assert!(!temp.path().join("models").exists());
}

#[cfg(unix)]
#[test]
fn test_train_then_resume() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp);

    ednn()
        .arg("--config")
        .arg(&config)
        .arg("train")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Available tokens")
                .and(predicate::str::contains("[MSE] Training model 1/5..."))
                .and(predicate::str::contains("[MSE] Training model 5/5...")),
        );

    let mode_dir = temp.path().join("models").join("mse");
    for i in 0..5 {
        assert!(mode_dir.join(format!("model_{i}.pth")).exists());
    }
    assert!(mode_dir.join("ensemble_manifest.json").exists());

    let output = ednn().arg("--config").arg(&config).arg("train").arg("--json").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let members = summary["members"].as_array().unwrap();
    assert_eq!(members.len(), 5);
    assert!(members.iter().all(|m| m["resumed_from"] == 1));
    assert!(members.iter().all(|m| m["outcome"]["final_epoch"] == 2));

    ednn()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("mse").and(predicate::str::contains("5/5")));
}

#[test]
fn test_train_fails_on_missing_dataset() {
    let temp = TempDir::new().unwrap();
    let mut config = EnsembleConfig::default();
    config.dataset.csv_path = temp.path().join("missing.csv");
    config.output.model_save_base = temp.path().join("models");
    config.device = ednn_training::Device::Cpu;
    let path = temp.path().join("ednn.toml");
    config.save_to_file(&path).unwrap();

    ednn()
        .arg("--config")
        .arg(&path)
        .arg("train")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dataset"));
}

#[test]
fn test_unknown_loss_mode_in_config_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ednn.toml");
    std::fs::write(&path, "[ensemble]\nloss_modes = [\"foo\"]\n").unwrap();

    ednn().arg("--config").arg(&path).arg("plan").assert().failure();
}

#[test]
fn test_init_config_writes_loadable_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ednn.toml");

    ednn().arg("init-config").arg(&path).assert().success();
    assert_eq!(EnsembleConfig::load_from_file(&path).unwrap(), EnsembleConfig::default());

    ednn().arg("init-config").arg(&path).assert().failure();
    ednn().arg("init-config").arg(&path).arg("--force").assert().success();
}

#[test]
fn test_list_with_no_ensembles() {
    let temp = TempDir::new().unwrap();
    let mut config = EnsembleConfig::default();
    config.output.model_save_base = temp.path().join("models");
    let path = temp.path().join("ednn.toml");
    config.save_to_file(&path).unwrap();

    ednn()
        .arg("--config")
        .arg(&path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trained Ensembles (0)"));
}
