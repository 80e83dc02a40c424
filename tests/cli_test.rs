//! End-to-end tests for command dispatch against temp data directories

use std::fs;
use std::path::Path;

use clap::Parser;
use tempfile::TempDir;

use rfpweights::cli::{execute_command, Cli, CliError};
use rfpweights::config::local_config_path;
use rfpweights::domain::{NodeId, PersistedWeights};
use rfpweights::exitcode;

const TREE: &str = r#"[
  {"id": "A", "type": "category", "code": "1", "level": 1, "children": [
    {"id": "r1", "type": "requirement", "code": "1.1", "level": 2},
    {"id": "r2", "type": "requirement", "code": "1.2", "level": 2}
  ]},
  {"id": "B", "type": "requirement", "code": "2", "level": 1}
]"#;

fn data_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tree.json"), TREE).unwrap();
    temp
}

fn run(dir: &Path, args: &[&str]) -> Result<(), CliError> {
    let dir = dir.to_string_lossy().to_string();
    let mut argv = vec!["rfpweights", "-C", dir.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    execute_command(&cli)
}

fn saved(dir: &Path) -> PersistedWeights {
    let content = fs::read_to_string(dir.join("weights.json")).expect("weights written");
    serde_json::from_str(&content).expect("weights parse")
}

#[test]
fn given_tree_when_set_then_weights_file_written() {
    let temp = data_dir();

    run(temp.path(), &["set", "B", "25"]).unwrap();

    let weights = saved(temp.path());
    assert_eq!(weights.requirements[&NodeId::from("B")], 0.25);
    assert_eq!(weights.categories[&NodeId::from("A")], 1.0);
}

#[test]
fn given_root_level_when_equalized_then_roots_share_evenly() {
    let temp = data_dir();

    run(temp.path(), &["equalize"]).unwrap();

    let weights = saved(temp.path());
    assert_eq!(weights.categories[&NodeId::from("A")], 0.75);
    assert_eq!(weights.requirements[&NodeId::from("B")], 0.75);
}

#[test]
fn given_unknown_node_when_set_then_dataerr() {
    let temp = data_dir();

    let err = run(temp.path(), &["set", "missing", "10"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert!(!temp.path().join("weights.json").exists());
}

#[test]
fn given_default_weights_when_check_then_unbalanced_roots_reported() {
    let temp = data_dir();

    let err = run(temp.path(), &["check"]).unwrap_err();

    assert!(matches!(err, CliError::Unbalanced(1)));
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_balanced_weights_when_check_then_ok() {
    let temp = data_dir();
    run(temp.path(), &["set", "A", "50"]).unwrap();
    run(temp.path(), &["set", "B", "50"]).unwrap();

    run(temp.path(), &["check"]).unwrap();
}

#[test]
fn given_missing_tree_when_show_then_noinput() {
    let temp = TempDir::new().unwrap();

    let err = run(temp.path(), &["show"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_no_command_when_executing_then_usage() {
    let cli = Cli::try_parse_from(["rfpweights"]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_data_dir_when_config_init_twice_then_second_fails_with_config() {
    let temp = TempDir::new().unwrap();

    run(temp.path(), &["config", "init"]).unwrap();
    let err = run(temp.path(), &["config", "init"]).unwrap_err();

    let content = fs::read_to_string(local_config_path(temp.path())).unwrap();
    assert!(content.contains("rfpweights configuration"));
    assert_eq!(err.exit_code(), exitcode::CONFIG);
}
