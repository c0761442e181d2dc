//! CLI integration tests for the routedoc binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("routedoc"))
}

// Helper to create a temp fixture file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const BASIC_INVENTORY: &str = r#"{
    "routes": [
        {
            "method": "get",
            "path": "/users",
            "handler": "UserController",
            "action": "index"
        },
        {
            "method": "post",
            "path": "/users",
            "handler": "UserController",
            "action": "store",
            "rules": { "email": "required|email" }
        }
    ]
}"#;

mod scan_command {
    use super::*;

    #[test]
    fn lists_routes() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);

        cmd()
            .args(["scan", inventory.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Scanned 2 routes"))
            .stdout(predicate::str::contains("GET"))
            .stdout(predicate::str::contains("/users"))
            .stdout(predicate::str::contains("UserController::index"));
    }

    #[test]
    fn json_output_round_trips() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);

        let output = cmd()
            .args(["scan", inventory.to_str().unwrap(), "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["routes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn missing_file_is_exit_3() {
        cmd()
            .args(["scan", "/nonexistent/routes.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_json_is_exit_2() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", "not json");

        cmd()
            .args(["scan", inventory.to_str().unwrap()])
            .assert()
            .code(2);
    }

    #[test]
    fn structurally_invalid_inventory_is_exit_2() {
        let dir = TempDir::new().unwrap();
        // Valid JSON, wrong shape.
        let inventory = write_temp_file(&dir, "routes.json", r#"{ "routes": 42 }"#);

        cmd()
            .args(["scan", inventory.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid route inventory"));
    }
}

mod generate_command {
    use super::*;

    #[test]
    fn emits_document_to_stdout() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);

        cmd()
            .args(["generate", inventory.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""openapi":"3.0.3""#))
            .stdout(predicate::str::contains(r#""operationId":"userStore""#))
            .stdout(predicate::str::contains("UserStoreRequest"));
    }

    #[test]
    fn pretty_output_is_indented() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);

        cmd()
            .args(["generate", inventory.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn writes_output_file_and_reports_stats() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let output = dir.path().join("openapi.json");

        cmd()
            .args([
                "generate",
                inventory.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("2 operations"));

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(document["paths"]["/users"]["get"].is_object());
    }

    #[test]
    fn store_overrides_are_applied() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = write_temp_file(
            &dir,
            "store.json",
            r#"{
                "operations": [
                    {
                        "method": "get",
                        "path": "/users",
                        "summary": "List every account"
                    }
                ],
                "schemas": {}
            }"#,
        );

        cmd()
            .args([
                "generate",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("List every account"));
    }

    #[test]
    fn unreadable_store_reports_error_but_succeeds() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = write_temp_file(&dir, "store.json", "not json");

        cmd()
            .args([
                "generate",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""openapi":"3.0.3""#))
            .stderr(predicate::str::contains("error: override store unavailable"));
    }

    #[test]
    fn unwritable_output_is_exit_3() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);

        cmd()
            .args([
                "generate",
                inventory.to_str().unwrap(),
                "--output",
                // A directory is never a writable output file.
                dir.path().to_str().unwrap(),
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("cannot write"));
    }

    #[test]
    fn config_file_sets_info_block() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let config = write_temp_file(
            &dir,
            "config.json",
            r#"{ "title": "Billing API", "version": "2.4.0" }"#,
        );

        cmd()
            .args([
                "generate",
                inventory.to_str().unwrap(),
                "--config",
                config.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Billing API"))
            .stdout(predicate::str::contains("2.4.0"));
    }

    #[test]
    fn duplicate_route_warns_on_stderr() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(
            &dir,
            "routes.json",
            r#"{
                "routes": [
                    { "method": "get", "path": "/users", "name": "users.a" },
                    { "method": "get", "path": "/users", "name": "users.b" }
                ]
            }"#,
        );

        cmd()
            .args(["generate", inventory.to_str().unwrap()])
            .assert()
            .success()
            .stderr(predicate::str::contains("warning"));
    }

    #[test]
    fn missing_config_is_exit_3() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);

        cmd()
            .args([
                "generate",
                inventory.to_str().unwrap(),
                "--config",
                "/nonexistent/config.json",
            ])
            .assert()
            .code(3);
    }
}

mod sync_command {
    use super::*;

    #[test]
    fn reports_new_routes() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = dir.path().join("store.json");

        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 new"))
            .stdout(predicate::str::contains("0 removed"));
    }

    #[test]
    fn json_report_is_parseable() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = dir.path().join("store.json");

        let output = cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(report["new"].as_array().unwrap().len(), 2);
        assert!(report["removed"].as_array().unwrap().is_empty());
    }

    #[test]
    fn apply_then_resync_is_clean() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = dir.path().join("store.json");

        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--apply",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("Store updated"));

        // The store now matches the inventory exactly.
        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--check",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 unchanged"));
    }

    #[test]
    fn check_fails_when_dirty() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = dir.path().join("store.json");

        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--check",
            ])
            .assert()
            .code(1);
    }

    #[test]
    fn apply_marks_orphans() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = write_temp_file(
            &dir,
            "store.json",
            r#"{
                "operations": [
                    { "method": "delete", "path": "/legacy", "summary": "Old endpoint" }
                ],
                "schemas": {}
            }"#,
        );

        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--apply",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 removed"));

        let data: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
        let legacy = data["operations"]
            .as_array()
            .unwrap()
            .iter()
            .find(|op| op["path"] == "/legacy")
            .expect("orphaned record kept");
        assert_eq!(legacy["orphaned"], serde_json::json!(true));
        // Hand-written fields survive the sync.
        assert_eq!(legacy["summary"], serde_json::json!("Old endpoint"));
    }

    #[test]
    fn apply_with_prune_deletes_orphans() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = write_temp_file(
            &dir,
            "store.json",
            r#"{
                "operations": [
                    { "method": "delete", "path": "/legacy" }
                ],
                "schemas": {}
            }"#,
        );

        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--apply",
                "--prune",
            ])
            .assert()
            .success();

        let data: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
        let paths: Vec<&str> = data["operations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|op| op["path"].as_str().unwrap())
            .collect();
        assert!(!paths.contains(&"/legacy"));
        assert!(paths.contains(&"/users"));
    }

    #[test]
    fn prune_requires_apply() {
        let dir = TempDir::new().unwrap();
        let inventory = write_temp_file(&dir, "routes.json", BASIC_INVENTORY);
        let store = dir.path().join("store.json");

        cmd()
            .args([
                "sync",
                inventory.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
                "--prune",
            ])
            .assert()
            .failure();
    }

    #[test]
    fn missing_inventory_is_exit_3() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("store.json");

        cmd()
            .args([
                "sync",
                "/nonexistent/routes.json",
                "--store",
                store.to_str().unwrap(),
            ])
            .assert()
            .code(3);
    }
}
