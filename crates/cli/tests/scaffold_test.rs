use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn run_quarry(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_quarry"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run quarry: {error}"))
}

#[test]
fn migration_command_scaffolds_a_file_implementing_the_migration_trait() {
    let dir = tempdir().unwrap();
    let migrations_dir = dir.path().join("migrations");
    let output = run_quarry(&[
        "migration",
        "create_widgets",
        "--directory",
        migrations_dir.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));

    let entries: Vec<_> = fs::read_dir(&migrations_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let contents = fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
    assert!(contents.contains("impl Migration for"));
    assert!(contents.contains("create_widgets"));
}

#[test]
fn model_command_scaffolds_a_file_implementing_the_model_trait() {
    let dir = tempdir().unwrap();
    let models_dir = dir.path().join("models");
    let output = run_quarry(&["model", "Widget", "--directory", models_dir.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let path = models_dir.join("widget.rs");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("impl Model for Widget"));
}
