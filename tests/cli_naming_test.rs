//! Integration tests for master name arbitration via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_master_names_not_authorized() {
    let env = TestEnv::init();
    env.json(&["add", "Bug"]);

    env.ditto()
        .arg("master-names")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not authorized"));
    assert_eq!(env.json(&["show", "1"])["name"], "1");
}

#[test]
fn test_master_names_misconfigured() {
    let env = TestEnv::init();
    let marker = env.path().join(".ditto.kdl");
    let content = std::fs::read_to_string(&marker).unwrap();
    std::fs::write(&marker, format!("{}\nis-master-name-server #true\n", content)).unwrap();
    env.json(&["add", "Bug"]);

    env.ditto()
        .arg("master-names")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Misconfigured"));
}

#[test]
fn test_master_names_granted_and_stable() {
    let env = TestEnv::init_master();
    env.ditto().args(["add-component", "backend"]).assert().success();
    env.json(&["add", "a", "-c", "backend"]);
    env.json(&["add", "b", "-c", "backend"]);

    let json = env.json(&["master-names"]);
    assert_eq!(json["server"], "central");
    let names: Vec<&str> = json["granted"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ditto2", "ditto3"]);

    // Pinned names win over local ones and survive a rerun
    assert_eq!(env.json(&["show", "ditto2"])["title"], "a");
    assert!(env.json(&["master-names"])["granted"].as_array().unwrap().is_empty());

    // A later issue keeps its local name until granted
    assert_eq!(env.json(&["add", "c", "-c", "backend"])["name"], "ba3");
    let json = env.json(&["master-names"]);
    assert_eq!(json["granted"][0]["name"], "ditto4");
}

#[test]
fn test_master_names_human() {
    let env = TestEnv::init_master();
    env.json(&["add", "a"]);

    env.ditto()
        .args(["master-names", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Granted 1 name(s) from central"));
}

#[test]
fn test_master_name_recorded_in_history() {
    let env = TestEnv::init_master();
    env.json(&["add", "a"]);
    env.json(&["master-names"]);

    let shown = env.json(&["show", "ditto1"]);
    let keys: Vec<&str> = shown["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"master_name"));
    assert!(keys.contains(&"master_name_server"));
}

fn listed_names(env: &TestEnv) -> Vec<String> {
    env.json(&["list"])["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_set_cannot_overwrite_master_name() {
    let env = TestEnv::init_master();
    env.json(&["add", "a"]);
    env.json(&["add", "b"]);
    let granted = env.json(&["master-names"]);
    let guid = granted["granted"][0]["guid"].as_str().unwrap().to_string();
    let record = env.storage_path().join(format!("issue-{}.json", guid));
    let before = std::fs::read_to_string(&record).unwrap();

    env.ditto()
        .args(["set", "ditto2", "master_name", "ditto3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
    env.ditto()
        .args(["set", "ditto2", "master_name_server", "elsewhere"])
        .assert()
        .failure();

    assert_eq!(std::fs::read_to_string(&record).unwrap(), before);
    assert_eq!(listed_names(&env), vec!["ditto2", "ditto3"]);
}

#[test]
fn test_set_cannot_claim_taken_master_name() {
    let env = TestEnv::init_master();
    env.json(&["add", "a"]);
    env.json(&["master-names"]);
    env.json(&["add", "b"]);

    env.ditto()
        .args(["set", "2", "master_name", "ditto1"])
        .assert()
        .failure();

    let names = listed_names(&env);
    assert_eq!(names, vec!["ditto1", "2"]);
    let unique: std::collections::BTreeSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
}
