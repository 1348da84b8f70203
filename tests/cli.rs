use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Runs the binary with a throwaway settings path so the user's own settings
/// never leak into a test.
fn cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("jsonsweep").unwrap();
    cmd.arg("--config")
        .arg(tmp.path().join("settings.json"))
        .arg("--no-progress");
    cmd
}

fn data_dir(tmp: &TempDir) -> std::path::PathBuf {
    let dir = tmp.path().join("data");
    fs::create_dir(&dir).unwrap();
    dir
}

fn write_at(dir: &Path, name: &str, position: &str) {
    fs::write(
        dir.join(name),
        format!(r#"{{"name": "{}", "position": {}}}"#, name, position),
    )
    .unwrap();
}

#[test]
fn rename_assigns_sequential_names() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "tree.json", "[0, 0, 0]");
    write_at(&dir, "rock.json", "[1, 0, 1]");

    cmd(&tmp)
        .arg("rename")
        .arg(&dir)
        .arg("prop")
        .assert()
        .success()
        .stdout(contains("Updated and renamed file"))
        .stdout(contains("Processing complete!"));

    // rock.json sorts before tree.json
    let first: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("prop_100.json")).unwrap()).unwrap();
    assert_eq!(first["name"], "prop_100");
    assert_eq!(first["description"], "new_description");
    assert_eq!(first["position"][0], 1);
    assert!(dir.join("prop_101.json").exists());
    assert!(!dir.join("tree.json").exists());
    assert!(dir.join(".history.jsonl").exists());
}

#[test]
fn rename_uses_base_name_from_settings() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "tree.json", "[0, 0, 0]");
    fs::write(tmp.path().join("settings.json"), r#"{"base_name": "obj"}"#).unwrap();

    cmd(&tmp).arg("rename").arg(&dir).assert().success();
    assert!(dir.join("obj_100.json").exists());
}

#[test]
fn rename_without_base_name_fails() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "tree.json", "[0, 0, 0]");

    cmd(&tmp)
        .arg("rename")
        .arg(&dir)
        .assert()
        .failure()
        .stderr(contains("No base name"));
    assert!(dir.join("tree.json").exists());
}

#[test]
fn dedup_range_boundary_is_exclusive() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "a.json", "[0, 0, 0]");
    write_at(&dir, "b.json", "[3, 0, 4]");

    cmd(&tmp)
        .args(["dedup-range"])
        .arg(&dir)
        .arg("5")
        .assert()
        .success()
        .stdout(contains("No files found within 5.0 units"));
    assert!(dir.join("b.json").exists());

    cmd(&tmp)
        .args(["dedup-range"])
        .arg(&dir)
        .arg("6")
        .assert()
        .success()
        .stdout(contains("Deleted 1 files"))
        .stdout(contains("Total files checked: 2"));
    assert!(dir.join("a.json").exists());
    assert!(!dir.join("b.json").exists());
}

#[test]
fn dedup_range_rejects_non_positive_range() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);

    cmd(&tmp)
        .arg("dedup-range")
        .arg(&dir)
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("range must be a positive number"));
}

#[test]
fn dedup_exact_then_history() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "a.json", "[1.001, 2, 3]");
    write_at(&dir, "b.json", "[1.004, 2, 3]");
    write_at(&dir, "c.json", "[9, 9, 9]");

    cmd(&tmp)
        .arg("dedup-exact")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("Duplicate position found: 1.00,2.00,3.00"))
        .stdout(contains("Deleted: b.json"));
    assert!(!dir.join("b.json").exists());
    assert!(dir.join("c.json").exists());

    cmd(&tmp)
        .arg("dedup-exact")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("No exact duplicate positions found!"));

    cmd(&tmp)
        .arg("history")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("dedup-exact"))
        .stdout(contains("b.json"));
}

#[test]
fn dry_run_and_no_history_leave_directory_alone() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "a.json", "[1, 2, 3]");
    write_at(&dir, "b.json", "[1, 2, 3]");

    cmd(&tmp)
        .args(["dedup-exact", "--dry-run"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("[dry-run] Would delete: b.json"))
        .stdout(contains("Dry-run only"));
    assert!(dir.join("b.json").exists());
    assert!(!dir.join(".history.jsonl").exists());

    cmd(&tmp)
        .args(["--no-history", "dedup-exact"])
        .arg(&dir)
        .assert()
        .success();
    assert!(!dir.join("b.json").exists());
    assert!(!dir.join(".history.jsonl").exists());
}

#[test]
fn file_errors_do_not_fail_the_run() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    fs::write(dir.join("broken.json"), "{").unwrap();
    write_at(&dir, "a.json", "[1, 2, 3]");

    cmd(&tmp)
        .arg("dedup-exact")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("Error reading file"));
    assert!(dir.join("broken.json").exists());
}

#[test]
fn missing_directory_fails_for_every_operation() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing");

    for args in [
        vec!["rename", "prop"],
        vec!["dedup-range", "10"],
        vec!["dedup-exact"],
    ] {
        let mut command = cmd(&tmp);
        command.arg(args[0]).arg(&missing).args(&args[1..]);
        command
            .assert()
            .failure()
            .stderr(contains("Error accessing directory"));
    }
    assert!(!missing.exists());
}

#[test]
fn config_init_and_show() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("Wrote default settings"));
    assert!(tmp.path().join("settings.json").exists());

    cmd(&tmp)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(contains("already exists"));

    cmd(&tmp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("\"range\": 40.0").and(contains("\"scan_order\": \"sorted\"")));
}

#[test]
fn dedup_range_defaults_to_forty_units() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "a.json", "[0, 0, 0]");
    write_at(&dir, "b.json", "[100, 0, 0]");

    cmd(&tmp)
        .arg("dedup-range")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("Checking for positions within 40.0 units of each other"))
        .stdout(contains("No files found within 40.0 units of each other (XZ plane)"));
}

#[test]
fn filesystem_order_finds_the_same_files() {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    write_at(&dir, "a.json", "[1, 2, 3]");
    write_at(&dir, "b.json", "[1, 2, 3]");
    write_at(&dir, "c.json", "[7, 8, 9]");

    cmd(&tmp)
        .args(["--order", "filesystem", "dedup-exact"])
        .arg(&dir)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("Duplicate position found: 1.00,2.00,3.00"))
        .stdout(contains("Total files checked: 3"));

    cmd(&tmp)
        .args(["--order", "filesystem", "dedup-exact"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("Deleted 1 of 1 duplicate file(s)"));

    let remaining = fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .count();
    assert_eq!(remaining, 2);
    assert!(dir.join("c.json").exists());
}
