mod common;
use common::cli::{ConfigWorkspace, run_ecfg};
use serde_json::json;

fn init_workspace() -> ConfigWorkspace {
    let workspace = ConfigWorkspace::new();
    let output = run_ecfg(&workspace, ["init"], "init");
    assert!(output.status.success(), "init failed: {}", output.stderr);
    workspace
}

#[test]
fn test_init_creates_database_once() {
    let workspace = init_workspace();
    assert!(workspace.db_path().exists());
    assert!(workspace.root.join(".easyconfig/config.yaml").exists());

    let again = run_ecfg(&workspace, ["init"], "init_again");
    assert!(!again.status.success());
    assert!(again.stderr.contains("Already initialized"));

    let forced = run_ecfg(&workspace, ["init", "--force"], "init_force");
    assert!(forced.status.success(), "{}", forced.stderr);
}

#[test]
fn test_commands_require_init() {
    let workspace = ConfigWorkspace::new();
    let output = run_ecfg(&workspace, ["get", "app.name"], "get_uninit");
    assert!(!output.status.success());
    assert!(output.stderr.contains("Not initialized"));
}

#[test]
fn test_set_and_get_value() {
    let workspace = init_workspace();

    let set = run_ecfg(&workspace, ["set", "app.port", "8080", "--type", "int"], "set");
    assert!(set.status.success(), "{}", set.stderr);
    assert!(set.stdout.contains("Set app.port = 8080"));

    let get = run_ecfg(&workspace, ["get", "app.port"], "get");
    assert_eq!(get.stdout.trim(), "8080");

    let get_json = run_ecfg(&workspace, ["--json", "get", "app.port", "--entry"], "get_entry");
    let entry = get_json.json();
    assert_eq!(entry["id"], "app.port");
    assert_eq!(entry["value"], 8080);
    assert_eq!(entry["type"], "int");
}

#[test]
fn test_missing_key_is_not_an_error() {
    let workspace = init_workspace();
    let get = run_ecfg(&workspace, ["--json", "get", "app.none"], "get_missing");
    assert!(get.status.success());
    assert_eq!(get.json(), json!(null));
}

#[test]
fn test_locked_entry_needs_force() {
    let workspace = init_workspace();
    run_ecfg(&workspace, ["set", "app.mode", "safe", "--locked"], "set_locked");

    let skipped = run_ecfg(&workspace, ["set", "app.mode", "fast"], "set_skip");
    assert!(skipped.status.success(), "lock skip must not fail");
    assert!(skipped.stdout.contains("Skipped app.mode"));
    let get = run_ecfg(&workspace, ["get", "app.mode"], "get_after_skip");
    assert_eq!(get.stdout.trim(), "safe");

    let forced = run_ecfg(
        &workspace,
        ["--json", "set", "app.mode", "fast", "--force"],
        "set_force",
    );
    assert_eq!(forced.json()["written"], true);
    let get = run_ecfg(&workspace, ["get", "app.mode"], "get_after_force");
    assert_eq!(get.stdout.trim(), "fast");
}

#[test]
fn test_set_many_skips_locked_keys() {
    let workspace = init_workspace();
    run_ecfg(&workspace, ["set", "app.b", "0", "--locked"], "lock_b");

    let output = run_ecfg(
        &workspace,
        ["--json", "set-many", "app", "a=1", "b=2", "--type", "a=int"],
        "set_many",
    );
    assert!(output.status.success(), "{}", output.stderr);
    let report = output.json();
    assert_eq!(report["written"], json!(["app.a"]));
    assert_eq!(report["skipped_locked"], json!(["app.b"]));

    let group = run_ecfg(&workspace, ["--json", "group", "app"], "group");
    assert_eq!(group.json(), json!({"a": 1, "b": 0}));
}

#[test]
fn test_set_many_rejects_bad_pair() {
    let workspace = init_workspace();
    let output = run_ecfg(&workspace, ["set-many", "app", "novalue"], "bad_pair");
    assert!(!output.status.success());
    assert!(output.stderr.contains("expected KEY=VALUE"));
}

#[test]
fn test_group_empty_values_vs_entries() {
    let workspace = init_workspace();

    let values = run_ecfg(&workspace, ["--json", "group", "theme"], "values");
    assert_eq!(values.json(), json!({}));

    let entries = run_ecfg(&workspace, ["--json", "group", "theme", "--entries"], "entries");
    assert_eq!(entries.json(), json!(null));

    run_ecfg(&workspace, ["set", "theme.color", "red"], "set_color");
    let entries = run_ecfg(&workspace, ["--json", "group", "theme", "--entries"], "entries2");
    assert_eq!(entries.json()[0]["leaf"], "color");
}

#[test]
fn test_user_group_falls_back_to_globals() {
    let workspace = init_workspace();
    run_ecfg(&workspace, ["set", "bob.theme.color", "red"], "bob_color");
    run_ecfg(&workspace, ["set", "theme.font", "sans"], "font");
    run_ecfg(&workspace, ["global", "theme.font"], "font_global");

    let bob = run_ecfg(&workspace, ["--json", "user-group", "bob", "theme"], "bob");
    let ids: Vec<String> = bob.json().as_array().unwrap().iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["bob.theme.color", "theme.font"]);

    let alice = run_ecfg(&workspace, ["--json", "user-group", "alice", "theme"], "alice");
    assert_eq!(alice.json().as_array().unwrap().len(), 1);

    run_ecfg(&workspace, ["global", "theme.font", "--unset"], "font_unglobal");
    let alice = run_ecfg(&workspace, ["--json", "user-group", "alice", "theme"], "alice2");
    assert_eq!(alice.json(), json!([]));
}

#[test]
fn test_user_key_returns_both_scopes() {
    let workspace = init_workspace();
    run_ecfg(&workspace, ["set", "bob.theme", "dark"], "bob_theme");
    run_ecfg(&workspace, ["set", "theme", "light"], "theme");

    let output = run_ecfg(&workspace, ["user-key", "bob", "theme"], "user_key");
    assert!(output.stdout.contains("bob.theme = dark"));
    assert!(output.stdout.contains("theme = light"));
}

#[test]
fn test_remove_is_idempotent() {
    let workspace = init_workspace();
    run_ecfg(&workspace, ["set", "app.mode", "safe", "--locked"], "set");

    let removed = run_ecfg(&workspace, ["--json", "rm", "app.mode"], "rm");
    assert_eq!(removed.json()["removed"], true);

    let again = run_ecfg(&workspace, ["--json", "rm", "app.mode"], "rm_again");
    assert!(again.status.success());
    assert_eq!(again.json()["removed"], false);

    let list = run_ecfg(&workspace, ["list"], "list");
    assert!(list.stdout.contains("No entries"));
}

#[test]
fn test_invalid_key_reported() {
    let workspace = init_workspace();
    let output = run_ecfg(&workspace, ["set", "app..name", "x"], "bad_key");
    assert!(!output.status.success());
    assert!(output.stderr.contains("Invalid key"));
}

#[test]
fn test_db_flag_overrides_config() {
    let workspace = init_workspace();
    let other = workspace.root.join("other.db");
    let other_str = other.to_str().unwrap();

    let init = run_ecfg(&workspace, ["--db", other_str, "init"], "init_other");
    assert!(init.status.success(), "{}", init.stderr);
    run_ecfg(&workspace, ["--db", other_str, "set", "app.name", "other"], "set_other");

    let default_db = run_ecfg(&workspace, ["--json", "get", "app.name"], "get_default");
    assert_eq!(default_db.json(), json!(null));
    let other_db = run_ecfg(&workspace, ["--db", other_str, "get", "app.name"], "get_other");
    assert_eq!(other_db.stdout.trim(), "other");
}
