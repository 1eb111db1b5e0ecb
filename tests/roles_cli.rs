mod support;

use predicates::str::contains;
use support::{TestData, MANAGER, MEMBER, PRIMARY};

#[test]
fn manager_cannot_create_tasks() {
    let data = TestData::new();
    data.flow_as(MANAGER)
        .args(["task", "new", "Não deveria"])
        .assert()
        .code(3)
        .stderr(contains("may not create tasks"));
}

#[test]
fn manager_reads_every_store() {
    let data = TestData::new();
    let primary_task = data.new_task(PRIMARY, &["Do Maicon", "--due", "2030-01-01"]);
    let member_task = data.new_task(MEMBER, &["Da Kherolainy", "--due", "2030-01-02"]);

    let list = data.json_as(MANAGER, &["task", "list"]);
    let ids: Vec<i64> = list["data"]["tasks"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|task| task["id"].as_i64())
        .collect();
    assert!(ids.contains(&primary_task));
    assert!(ids.contains(&member_task));
    assert!(!data.path().join("flow_data_GESTAO.json").exists());
}

#[test]
fn manager_feedback_rewrites_owning_store_only() {
    let data = TestData::new();
    data.new_task(PRIMARY, &["Do Maicon", "--due", "2030-01-01"]);
    let member_task = data.new_task(MEMBER, &["Da Kherolainy", "--due", "2030-01-02"]);
    let before = data.read_json("flow_data.json");

    let saved = data.json_as(
        MANAGER,
        &["task", "feedback", &member_task.to_string(), "Bom trabalho"],
    );
    assert_eq!(saved["data"]["task"]["manager_feedback"], "Bom trabalho");

    let member_store = data.read_json("flow_data_2858700.json");
    let record = member_store
        .as_array()
        .expect("array")
        .iter()
        .find(|record| record["id"].as_i64() == Some(member_task))
        .cloned()
        .expect("member task");
    assert_eq!(record["manager_feedback"], "Bom trabalho");
    assert_eq!(data.read_json("flow_data.json"), before);

    let cleared = data.json_as(MANAGER, &["task", "feedback", &member_task.to_string()]);
    assert_eq!(cleared["data"]["task"]["manager_feedback"], "");
}

#[test]
fn only_managers_give_feedback() {
    let data = TestData::new();
    let id = data.new_task(PRIMARY, &["Do Maicon", "--due", "2030-01-01"]);
    data.flow()
        .args(["task", "feedback", &id.to_string(), "auto-elogio"])
        .assert()
        .code(3);
}

#[test]
fn login_persists_session_and_whoami_reports_role() {
    let data = TestData::new();

    data.flow()
        .args(["login", "2791900", "--secret", "Cocal@2025"])
        .assert()
        .success()
        .stdout(contains("signed in as Maria"));
    assert!(data.path().join(".flow/session").is_file());

    let mut whoami = assert_cmd::Command::cargo_bin("flow").expect("binary");
    whoami
        .env_remove("FLOW_USER")
        .env_remove("FLOW_CONFIG")
        .arg("--data-dir")
        .arg(data.path())
        .args(["--json", "whoami"])
        .assert()
        .success()
        .stdout(contains("\"key\": \"2791900\""))
        .stdout(contains("\"role\": \"member\""));

    data.flow().arg("logout").assert().success().stdout(contains("session cleared"));
    assert!(!data.path().join(".flow/session").exists());
}

#[test]
fn manager_alias_logs_in_as_manager() {
    let data = TestData::new();
    let login = data.json(&["login", "Gestao", "--secret", "gestao"]);
    assert_eq!(login["data"]["identity"]["key"], "GESTAO");
    assert_eq!(login["data"]["identity"]["role"], "manager");
}

#[test]
fn wrong_secret_is_rejected() {
    let data = TestData::new();
    data.flow()
        .args(["login", "2791900", "--secret", "nope"])
        .assert()
        .code(2)
        .stderr(contains("Authentication failed"));
    assert!(!data.path().join(".flow/session").exists());
}
