mod support;

use support::{TestData, PRIMARY};

#[test]
fn stats_count_visible_tasks() {
    let data = TestData::new();
    let urgent = data.new_task(PRIMARY, &["Prazo hoje", "--priority", "urgente"]);
    data.new_task(PRIMARY, &["Atrasada", "--due", "2020-01-01", "--status", "in-progress"]);
    data.new_task(PRIMARY, &["Feita", "--due", "2020-01-02", "--status", "done"]);

    let report = data.json(&["report", "stats"]);
    let stats = &report["data"];
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["in_progress"], 1);
    assert_eq!(stats["urgent"], 1);
    assert_eq!(stats["overdue"], 1);
    assert_eq!(stats["urgent_today"][0].as_i64(), Some(urgent));
}

#[test]
fn calendar_marks_task_days() {
    let data = TestData::new();
    let id = data.new_task(PRIMARY, &["Evento", "--due", "2031-03-12"]);

    let report = data.json(&["report", "calendar", "--year", "2031", "--month", "3"]);
    let weeks = report["data"]["weeks"].as_array().expect("weeks");
    // March 2031 starts on a Saturday
    assert_eq!(weeks[0][5], 1);
    assert_eq!(weeks[0][4], 0);
    assert_eq!(report["data"]["days"][0]["day"], 12);
    assert_eq!(report["data"]["days"][0]["tasks"][0]["id"].as_i64(), Some(id));
}

#[test]
fn calendar_rejects_invalid_month() {
    let data = TestData::new();
    data.flow()
        .args(["report", "calendar", "--year", "2031", "--month", "13"])
        .assert()
        .code(2);
}

#[test]
fn schedule_groups_by_month() {
    let data = TestData::new();
    data.new_task(PRIMARY, &["Janeiro", "--due", "2031-01-20"]);
    data.new_task(PRIMARY, &["Outubro", "--due", "2031-10-05"]);

    let report = data.json(&["report", "schedule", "--year", "2031"]);
    let months = report["data"]["months"].as_array().expect("months");
    assert_eq!(months.len(), 12);
    assert_eq!(months[0]["tasks"][0]["title"], "Janeiro");
    assert_eq!(months[9]["tasks"][0]["title"], "Outubro");
    assert_eq!(months[5]["tasks"].as_array().map(Vec::len), Some(0));
}

#[test]
fn breakdown_counts_by_category() {
    let data = TestData::new();
    data.new_task(PRIMARY, &["A", "--category", "Deskbee", "--due", "2031-01-01"]);
    data.new_task(PRIMARY, &["B", "--category", "🏢 Deskbee", "--due", "2031-01-02"]);

    let report = data.json(&["report", "breakdown"]);
    let by_category = report["data"]["by_category"].as_array().expect("array");
    assert_eq!(by_category[0]["label"], "🏢 Deskbee");
    assert_eq!(by_category[0]["count"], 2);
    let by_status = report["data"]["by_status"].as_array().expect("array");
    assert_eq!(by_status[0]["label"], "Pendente");
    assert_eq!(by_status[0]["count"], 3);
}

#[test]
fn follow_up_lists_overdue() {
    let data = TestData::new();
    let late = data.new_task(PRIMARY, &["Atrasada", "--due", "2020-01-01"]);
    let report = data.json(&["report", "follow-up"]);
    assert_eq!(report["data"]["overdue"][0]["id"].as_i64(), Some(late));
}
