mod support;

use predicates::str::contains;
use serde_json::Value;
use support::{TestData, MEMBER, PRIMARY};

fn find_task(list: &Value, id: i64) -> Value {
    list["data"]["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .find(|task| task["id"].as_i64() == Some(id))
        .cloned()
        .expect("task in list")
}

#[test]
fn first_load_seeds_example_task() {
    let data = TestData::new();
    let list = data.json(&["task", "list"]);

    assert_eq!(list["schema_version"], "flow.v1");
    assert_eq!(list["command"], "task list");
    assert_eq!(list["status"], "success");
    assert_eq!(list["data"]["total"], 1);
    assert_eq!(list["data"]["tasks"][0]["title"], "Exemplo de Tarefa");
    assert!(data.path().join("flow_data.json").exists());
}

#[test]
fn task_new_then_status_persists_stored_shape() {
    let data = TestData::new();
    let id = data.new_task(
        PRIMARY,
        &[
            "Relatório mensal",
            "--priority",
            "alta",
            "--due",
            "15/01/2030",
            "--category",
            "Programa de Estágio",
            "--collaborator",
            "Maria",
        ],
    );

    let list = data.json(&["task", "list"]);
    assert_eq!(list["data"]["total"], 2);
    let task = find_task(&list, id);
    assert_eq!(task["priority"], "Alta");
    assert_eq!(task["status"], "Pendente");
    assert_eq!(task["category"], "💼 Programa de Estágio");
    assert_eq!(task["responsible"], "Maicon");
    assert_eq!(task["collaborators"][0], "Maria");

    let changed = data.json(&["task", "status", &id.to_string(), "done"]);
    assert_eq!(changed["data"]["task"]["status"], "Concluído");

    let stored = data.read_json("flow_data.json");
    let record = stored
        .as_array()
        .expect("array")
        .iter()
        .find(|record| record["id"].as_i64() == Some(id))
        .cloned()
        .expect("stored task");
    assert_eq!(record["dueDate"], "2030-01-15");
    assert_eq!(record["status"], "Concluído");
    assert_eq!(record["manager_feedback"], "");
}

#[test]
fn empty_title_is_a_user_error() {
    let data = TestData::new();
    data.flow()
        .args(["task", "new", "   "])
        .assert()
        .code(2)
        .stderr(contains("Validation failed"));
}

#[test]
fn unknown_task_is_a_user_error() {
    let data = TestData::new();
    data.flow()
        .args(["--json", "task", "status", "12345", "done"])
        .assert()
        .code(2)
        .stdout(contains("\"status\": \"error\""))
        .stdout(contains("flow task list"));
}

#[test]
fn edit_and_delete_task() {
    let data = TestData::new();
    let id = data.new_task(PRIMARY, &["Rascunho", "--due", "2030-02-01"]);
    let id_arg = id.to_string();

    let edited = data.json(&[
        "task",
        "edit",
        &id_arg,
        "--title",
        "Versão final",
        "--due",
        "2030-02-10",
    ]);
    assert_eq!(edited["data"]["task"]["title"], "Versão final");
    assert_eq!(edited["data"]["task"]["due_date"], "2030-02-10");

    data.flow()
        .args(["task", "priority", &id_arg, "urgent"])
        .assert()
        .success()
        .stdout(contains("Urgente"));

    data.flow().args(["task", "delete", &id_arg]).assert().success();
    let list = data.json(&["task", "list"]);
    assert_eq!(list["data"]["total"], 1);
}

#[test]
fn list_filters_by_search_and_priority() {
    let data = TestData::new();
    data.new_task(PRIMARY, &["Comprar cadeiras", "--priority", "low", "--due", "2030-03-01"]);
    let urgent = data.new_task(PRIMARY, &["Auditoria", "--priority", "urgente", "--due", "2030-03-02"]);

    let by_priority = data.json(&["task", "list", "--priority", "urgent"]);
    assert_eq!(by_priority["data"]["total"], 1);
    assert_eq!(by_priority["data"]["tasks"][0]["id"].as_i64(), Some(urgent));

    let by_search = data.json(&["task", "list", "--search", "cadeiras"]);
    assert_eq!(by_search["data"]["total"], 1);
    assert_eq!(by_search["data"]["tasks"][0]["title"], "Comprar cadeiras");
}

#[test]
fn member_tasks_go_to_suffixed_store() {
    let data = TestData::new();
    let id = data.new_task(MEMBER, &["Entrevista", "--due", "2030-04-01"]);

    let stored = data.read_json("flow_data_2858700.json");
    assert!(stored
        .as_array()
        .expect("array")
        .iter()
        .any(|record| record["id"].as_i64() == Some(id)));
    assert!(!data.path().join("flow_data.json").exists());
}

#[test]
fn member_handing_off_stays_as_collaborator() {
    let data = TestData::new();
    let id = data.new_task(
        MEMBER,
        &["Tarefa do Davi", "--responsible", "Davi", "--due", "2030-04-01"],
    );

    let shown = data.json_as(MEMBER, &["task", "show", &id.to_string()]);
    assert_eq!(shown["data"]["task"]["responsible"], "Davi");
    assert_eq!(shown["data"]["task"]["collaborators"][0], "Kherolainy");

    data.flow_as(MEMBER)
        .args(["task", "status", &id.to_string(), "done"])
        .assert()
        .success();
}

#[test]
fn members_cannot_see_other_peoples_tasks() {
    let data = TestData::new();
    let id = data.new_task(MEMBER, &["Tarefa do Davi", "--due", "2030-04-01"]);

    let mut stored = data.read_json("flow_data_2858700.json");
    for record in stored.as_array_mut().expect("array") {
        if record["id"].as_i64() == Some(id) {
            record["responsible"] = Value::from("Davi");
            record["collaborators"] = Value::Array(Vec::new());
        }
    }
    data.write_file(
        "flow_data_2858700.json",
        &serde_json::to_string_pretty(&stored).expect("serialize"),
    )
    .expect("write store");

    let list = data.json_as(MEMBER, &["task", "list"]);
    assert!(list["data"]["tasks"]
        .as_array()
        .expect("array")
        .iter()
        .all(|task| task["id"].as_i64() != Some(id)));

    data.flow_as(MEMBER)
        .args(["task", "show", &id.to_string()])
        .assert()
        .code(2);
}

#[test]
fn attendance_task_composes_title_and_block() {
    let data = TestData::new();
    data.write_file(
        "gestores.json",
        r#"[{"MATRICULA": 12345, "COLABORADOR": "JOANA LIMA", "TELEFONE": "(14) 3333-0000",
             "DIRETORIA": "Industrial", "DESCRIÇÃO CARGO": "Operadora", "EMAIL PARTICULAR": ""}]"#,
    )
    .expect("write directory");

    let id = data.new_task(
        PRIMARY,
        &[
            "Dúvida sobre férias",
            "--attendance",
            "Férias",
            "--person",
            "12345",
            "--due",
            "2030-05-05",
        ],
    );

    let shown = data.json(&["task", "show", &id.to_string()]);
    let task = &shown["data"]["task"];
    assert_eq!(task["title"], "JOANA LIMA (Mat: 12345) - Dúvida sobre férias");
    assert_eq!(task["category"], "👥 Pessoas/Atendimentos");
    let description = task["description"].as_str().expect("description");
    assert!(description.contains("📂 Categoria: Férias"));
    assert!(description.contains("   Diretoria: Industrial"));
    assert!(description.contains("   E-mail: -"));
    assert_eq!(shown["data"]["attendance"]["subcategory"], "Férias");
}

#[test]
fn regular_tasks_reject_attendance_category() {
    let data = TestData::new();
    data.flow()
        .args(["task", "new", "Conversa", "--category", "Pessoas/Atendimentos"])
        .assert()
        .code(2)
        .stderr(contains("--attendance"));
}

#[test]
fn attach_copies_file_and_check_reports_missing() {
    let data = TestData::new();
    let id = data.new_task(PRIMARY, &["Com anexo", "--due", "2030-06-01"]);
    let source = data.write_file("incoming/orcamento.pdf", "pdf").expect("write source");

    let attached = data.json(&[
        "task",
        "attach",
        &id.to_string(),
        source.to_str().expect("utf-8 path"),
    ]);
    let stored = attached["data"]["stored"].as_str().expect("stored").to_string();
    assert!(stored.starts_with("uploads/"));
    assert!(stored.ends_with("_orcamento.pdf"));
    assert!(data.path().join(&stored).is_file());

    let clean = data.json(&["task", "check-attachments"]);
    assert_eq!(clean["data"]["missing"].as_array().map(Vec::len), Some(0));

    std::fs::remove_file(data.path().join(&stored)).expect("remove upload");
    let report = data.json(&["task", "check-attachments", &id.to_string()]);
    assert_eq!(report["data"]["missing"][0]["task_id"].as_i64(), Some(id));
    assert_eq!(report["data"]["missing"][0]["missing"][0], stored.as_str());
}
