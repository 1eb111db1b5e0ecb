use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use flow::config::Config;
use flow::identity::Identity;
use flow::sheet::FileWorkbook;
use flow::storage::Storage;
use flow::task::TaskDraft;

fn identity(key: &str) -> Identity {
    Identity::from_key(key, &Config::default())
}

#[test]
fn concurrent_posts_are_not_lost() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Storage::local(dir.path(), identity("2949400"));
    let due = NaiveDate::from_ymd_opt(2030, 1, 1).expect("date");
    let task = storage
        .create_task(TaskDraft::new("Concorrência", "Maicon", due))
        .expect("create");

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let storage = storage.clone();
            thread::spawn(move || {
                for n in 0..5 {
                    storage
                        .post_update(task.id, &format!("worker {worker} note {n}"))
                        .expect("post");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    let updates = storage.get_task_updates(task.id);
    assert_eq!(updates.len(), 40);
    let mut ids: Vec<i64> = updates.iter().map(|u| u.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 40);
}

#[test]
fn identities_share_one_workbook() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workbook =
        Arc::new(FileWorkbook::open(dir.path().join("team.json"), "Team").expect("open workbook"));
    let due = NaiveDate::from_ymd_opt(2030, 2, 1).expect("date");

    let primary = Storage::with_client(dir.path(), identity("2949400"), workbook.clone());
    let member = Storage::with_client(dir.path(), identity("2858700"), workbook);

    primary
        .create_task(TaskDraft::new("Compartilhada", "Kherolainy", due))
        .expect("create");
    let seen = member.load_tasks();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Compartilhada");
    assert_eq!(member.backend_name(), "sheet");
}
