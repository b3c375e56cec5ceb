//! Integration tests for the per-command action log.

mod common;

use common::TestEnv;

fn read_log(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_commands_are_logged() {
    let env = TestEnv::init();
    env.json(&["add", "Bug", "-e", "2"]);
    env.ditto().args(["show", "zz9"]).assert().failure();

    let entries = read_log(&env.storage_path().join("actions.jsonl"));
    let commands: Vec<&str> = entries.iter().map(|e| e["command"].as_str().unwrap()).collect();
    assert_eq!(commands, vec!["init", "add", "show"]);

    assert_eq!(entries[1]["args"]["title"], "Bug");
    assert_eq!(entries[1]["args"]["estimate"], "2");
    assert_eq!(entries[1]["success"], true);
    assert_eq!(entries[2]["success"], false);
    assert!(entries[2]["error"].as_str().unwrap().contains("zz9"));
    assert_eq!(entries[1]["user"], "tester (Test User) <tester@example.com>");
}

#[test]
fn test_action_log_disabled() {
    let env = TestEnv::init();
    let log = env.storage_path().join("actions.jsonl");
    std::fs::remove_file(&log).unwrap();

    let marker = env.path().join(".ditto.kdl");
    let content = std::fs::read_to_string(&marker).unwrap();
    std::fs::write(&marker, format!("{}\naction-log #false\n", content)).unwrap();

    env.json(&["add", "Bug"]);
    assert!(!log.exists());
}

#[test]
fn test_action_log_custom_path() {
    let env = TestEnv::init();
    let marker = env.path().join(".ditto.kdl");
    let content = std::fs::read_to_string(&marker).unwrap();
    std::fs::write(&marker, format!("{}\naction-log-path \"logs/ditto.jsonl\"\n", content)).unwrap();

    env.json(&["add", "Bug"]);
    let entries = read_log(&env.path().join("logs").join("ditto.jsonl"));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["command"], "add");
}

#[test]
fn test_action_log_is_not_a_record() {
    let env = TestEnv::init();
    env.json(&["add", "Bug"]);
    assert!(env.storage_path().join("actions.jsonl").is_file());
    assert_eq!(env.json(&["list"])["count"], 1);
}
