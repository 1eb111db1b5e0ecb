mod support;

use predicates::str::contains;
use support::{TestData, MEMBER};

#[test]
fn primary_sees_default_categories() {
    let data = TestData::new();
    let list = data.json(&["category", "list"]);
    let categories = list["data"]["categories"].as_array().expect("array");
    assert_eq!(categories.len(), 9);
    assert_eq!(categories[0]["key"], "📚 Bolsas de Estudos");
    assert!(categories.iter().all(|c| c["deletable"] == false));
}

#[test]
fn member_creates_and_deletes_private_category() {
    let data = TestData::new();
    let added = data.json_as(MEMBER, &["category", "add", "Compras", "--icon", "🛒"]);
    assert_eq!(added["data"]["key"], "🛒 Compras");
    let color = added["data"]["category"]["color"].as_str().expect("color");
    assert_eq!(
        added["data"]["category"]["bg"].as_str(),
        Some(format!("{color}22").as_str())
    );
    assert_eq!(added["data"]["category"]["owner"], "2858700");

    let list = data.json_as(MEMBER, &["category", "list"]);
    let categories = list["data"]["categories"].as_array().expect("array");
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["deletable"], true);

    data.flow_as(MEMBER)
        .args(["category", "add", "Compras", "--icon", "🛒"])
        .assert()
        .code(2)
        .stderr(contains("already exists"));

    data.flow_as(MEMBER)
        .args(["category", "delete", "Compras"])
        .assert()
        .success();
    let stored = data.read_json("flow_categories_2858700.json");
    assert_eq!(stored.as_object().map(|m| m.len()), Some(0));
}

#[test]
fn default_categories_are_protected() {
    let data = TestData::new();
    data.flow()
        .args(["category", "delete", "Outros"])
        .assert()
        .code(3)
        .stderr(contains("default category"));
}

#[test]
fn unknown_category_is_a_user_error() {
    let data = TestData::new();
    data.flow()
        .args(["category", "delete", "Inexistente"])
        .assert()
        .code(2);
}

#[test]
fn private_categories_are_not_selectable_by_other_members() {
    let data = TestData::new();
    data.write_file("flow.toml", "backend = \"sheet\"\n")
        .expect("write config");
    data.json_as(MEMBER, &["category", "add", "Compras", "--icon", "🛒"]);

    data.flow_as("2791900")
        .args(["task", "new", "Cadeiras", "--category", "Compras"])
        .assert()
        .code(2)
        .stderr(contains("Category not found: Compras"));

    let id = data.new_task(
        MEMBER,
        &["Cadeiras", "--category", "Compras", "--due", "2030-01-01"],
    );
    let shown = data.json_as(MEMBER, &["task", "show", &id.to_string()]);
    assert_eq!(shown["data"]["task"]["category"], "🛒 Compras");
}
