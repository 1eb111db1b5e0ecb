//! flow update command implementation

use crate::cli::Globals;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::policy;
use crate::update::TaskUpdate;

#[derive(serde::Serialize)]
struct UpdateReport<'a> {
    update: &'a TaskUpdate,
}

#[derive(serde::Serialize)]
struct UpdateListReport<'a> {
    task_id: i64,
    updates: &'a [TaskUpdate],
}

pub fn run_add(globals: &Globals, task_id: i64, content: &str) -> Result<()> {
    let ctx = globals.context()?;
    let task = ctx
        .storage
        .find_task(task_id)
        .ok_or(Error::TaskNotFound(task_id))?;
    if !policy::can_view_task(&ctx.identity, &task) {
        return Err(Error::TaskNotFound(task_id));
    }

    let update = ctx.storage.post_update(task_id, content)?;
    let mut human = HumanOutput::new(format!("flow update add: #{} on task #{task_id}", update.id));
    human.push_summary("author", update.user.clone());
    human.push_summary("timestamp", update.timestamp.clone());
    human.push_next_step(format!("flow task show {task_id}"));

    emit_success(globals.output(), "update add", &UpdateReport { update: &update }, Some(&human))
}

pub fn run_list(globals: &Globals, task_id: i64) -> Result<()> {
    let ctx = globals.context()?;
    let mut updates = ctx.storage.get_task_updates(task_id);
    updates.sort_by(|a, b| b.bare_timestamp().cmp(a.bare_timestamp()));

    let mut human = HumanOutput::new(format!(
        "flow update list: {} update(s) on task #{task_id}",
        updates.len()
    ));
    for update in &updates {
        let edited = if update.is_edited() { " edited" } else { "" };
        human.push_detail(format!(
            "[{}] {}{edited} ({}): {}",
            update.id,
            update.bare_timestamp(),
            update.user,
            update.content
        ));
    }

    emit_success(
        globals.output(),
        "update list",
        &UpdateListReport {
            task_id,
            updates: &updates,
        },
        Some(&human),
    )
}

pub fn run_edit(globals: &Globals, id: i64, content: &str) -> Result<()> {
    let ctx = globals.context()?;
    let update = ctx.storage.edit_update(id, content)?;

    let mut human = HumanOutput::new(format!("flow update edit: #{id}"));
    human.push_summary("timestamp", update.timestamp.clone());
    emit_success(globals.output(), "update edit", &UpdateReport { update: &update }, Some(&human))
}

pub fn run_delete(globals: &Globals, id: i64) -> Result<()> {
    let ctx = globals.context()?;
    let removed = ctx.storage.delete_update(id)?;

    let mut human = HumanOutput::new(format!("flow update delete: #{id}"));
    human.push_summary("task", removed.task_id.to_string());
    emit_success(
        globals.output(),
        "update delete",
        &UpdateReport { update: &removed },
        Some(&human),
    )
}
