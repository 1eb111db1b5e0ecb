//! flow task command implementation

use std::path::Path;

use crate::attachments;
use crate::attendance::{self, Attendee, AttendanceView};
use crate::category::{CategoryBook, CategoryKey};
use crate::cli::Globals;
use crate::context::AppContext;
use crate::directory;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::output::{emit_success, HumanOutput};
use crate::query::TaskFilter;
use crate::task::{self, Priority, Status, Task, TaskDraft, TaskEdit};
use crate::update::TaskUpdate;

/// Options for `flow task new`
pub struct NewOptions {
    pub title: String,
    pub responsible: Option<String>,
    pub category: Option<String>,
    pub priority: String,
    pub status: String,
    pub due: Option<String>,
    pub description: Option<String>,
    pub collaborators: Vec<String>,
    pub attendance: Option<String>,
    pub person: Option<String>,
    pub person_name: Option<String>,
    pub person_phone: Option<String>,
    pub person_email: Option<String>,
}

/// Options for `flow task list`
pub struct ListOptions {
    pub category: Option<String>,
    pub responsible: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_today: bool,
    pub search: Option<String>,
}

/// Options for `flow task edit`
pub struct EditOptions {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub category: Option<String>,
    pub responsible: Option<String>,
    pub collaborators: Option<Vec<String>>,
}

#[derive(serde::Serialize)]
struct TaskReport<'a> {
    task: &'a Task,
    category_name: String,
}

#[derive(serde::Serialize)]
struct TaskListReport<'a> {
    total: usize,
    tasks: Vec<&'a Task>,
}

#[derive(serde::Serialize)]
struct TaskShowReport<'a> {
    task: &'a Task,
    category_name: String,
    updates: &'a [TaskUpdate],
    #[serde(skip_serializing_if = "Option::is_none")]
    attendance: Option<AttendanceView>,
    missing_attachments: Vec<String>,
}

#[derive(serde::Serialize)]
struct AttachReport<'a> {
    task: &'a Task,
    stored: String,
}

#[derive(serde::Serialize)]
struct MissingAttachments {
    task_id: i64,
    title: String,
    missing: Vec<String>,
}

#[derive(serde::Serialize)]
struct CheckAttachmentsReport {
    checked: usize,
    missing: Vec<MissingAttachments>,
}

pub fn run_new(globals: &Globals, options: NewOptions) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();

    let priority: Priority = options.priority.parse()?;
    let status: Status = options.status.parse()?;
    let due_date = match options.due.as_deref() {
        Some(raw) => parse_due(raw)?,
        None => ctx.today,
    };
    let responsible = options
        .responsible
        .clone()
        .unwrap_or_else(|| ctx.identity.display_name.clone());
    let base_description = options.description.clone().unwrap_or_default();

    let mut warnings = Vec::new();
    let (title, description, category) = match options.attendance.as_deref() {
        Some(subcategory) => {
            let attendee = resolve_attendee(&ctx, &options, &mut warnings);
            (
                attendance::compose_title(attendee.as_ref(), &options.title),
                attendance::compose_description(&base_description, subcategory, attendee.as_ref()),
                book.attendance_key(),
            )
        }
        None => {
            let category = match options.category.as_deref() {
                Some(reference) => regular_category(&book, &ctx.identity, reference)?,
                None => CategoryKey::other(),
            };
            (options.title.clone(), base_description, category)
        }
    };

    let mut draft = TaskDraft::new(title, responsible, due_date);
    draft.category = category.to_string();
    draft.priority = priority;
    draft.status = status;
    draft.description = description;
    draft.collaborators = options.collaborators;

    let created = ctx.storage.create_task(draft)?;
    tracing::info!(task = created.id, "task created");

    let mut human = HumanOutput::new(format!("flow task new: #{}", created.id));
    push_task_summary(&mut human, &created, &book);
    for warning in warnings {
        human.push_warning(warning);
    }
    human.push_next_step(format!("flow update add {} \"<text>\"", created.id));

    emit_success(
        globals.output(),
        "task new",
        &TaskReport {
            task: &created,
            category_name: book.resolve(&created.category).name,
        },
        Some(&human),
    )
}

pub fn run_list(globals: &Globals, options: ListOptions) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();
    let tasks = ctx.visible_tasks();

    let filter = TaskFilter {
        category: options.category.as_deref().map(|c| book.canonical_key(c)),
        responsible: options.responsible,
        priority: options.priority.as_deref().map(str::parse).transpose()?,
        status: options.status.as_deref().map(str::parse).transpose()?,
        due_today: options.due_today,
        search: options.search,
    };
    let mut selected = filter.apply(&tasks, &book, ctx.today);
    selected.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));

    let mut human = HumanOutput::new(format!("flow task list: {} task(s)", selected.len()));
    for task in &selected {
        human.push_detail(task_line(task, &book));
    }
    if selected.is_empty() {
        human.push_next_step("flow task new \"<title>\"");
    }

    emit_success(
        globals.output(),
        "task list",
        &TaskListReport {
            total: selected.len(),
            tasks: selected,
        },
        Some(&human),
    )
}

pub fn run_show(globals: &Globals, id: i64) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();
    let task = find_visible(&ctx, id)?;

    let mut updates = ctx.storage.get_task_updates(id);
    updates.sort_by(|a, b| b.bare_timestamp().cmp(a.bare_timestamp()));
    let attendance = attendance::parse_sections(&task.description);
    let missing = attachments::missing_attachments(&ctx.data_dir, &task);

    let mut human = HumanOutput::new(format!("flow task show: #{} {}", task.id, task.title));
    push_task_summary(&mut human, &task, &book);
    match &attendance {
        Some(view) => {
            if let Some(subcategory) = &view.subcategory {
                human.push_summary("subcategory", subcategory.clone());
            }
            for section in &view.sections {
                for item in &section.items {
                    human.push_detail(item.clone());
                }
            }
        }
        None if !task.description.trim().is_empty() => {
            human.push_detail(task.description.clone());
        }
        None => {}
    }
    if !task.manager_feedback.is_empty() {
        human.push_summary("feedback", task.manager_feedback.clone());
    }
    for update in &updates {
        human.push_detail(format!(
            "[{}] {} ({}): {}",
            update.id, update.timestamp, update.user, update.content
        ));
    }
    for reference in &missing {
        human.push_warning(format!("attachment missing: {reference}"));
    }

    emit_success(
        globals.output(),
        "task show",
        &TaskShowReport {
            task: &task,
            category_name: book.resolve(&task.category).name,
            updates: &updates,
            attendance,
            missing_attachments: missing,
        },
        Some(&human),
    )
}

pub fn run_status(globals: &Globals, id: i64, status: &str) -> Result<()> {
    let status: Status = status.parse()?;
    mutate(globals, id, "task status", |task| {
        task.status = status;
        Ok(())
    })
}

pub fn run_priority(globals: &Globals, id: i64, priority: &str) -> Result<()> {
    let priority: Priority = priority.parse()?;
    mutate(globals, id, "task priority", |task| {
        task.priority = priority;
        Ok(())
    })
}

pub fn run_edit(globals: &Globals, options: EditOptions) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();

    let edit = TaskEdit {
        title: options.title,
        responsible: options.responsible,
        category: options
            .category
            .as_deref()
            .map(|reference| regular_category(&book, &ctx.identity, reference))
            .transpose()?
            .map(|key| key.to_string()),
        description: options.description,
        due_date: options.due.as_deref().map(parse_due).transpose()?,
        collaborators: options.collaborators,
    };
    if edit.is_empty() {
        return Err(Error::InvalidArgument("nothing to edit".to_string()));
    }

    let updated = ctx.storage.update_task(options.id, |task| task.apply_edit(edit))?;
    let mut human = HumanOutput::new(format!("flow task edit: #{}", updated.id));
    push_task_summary(&mut human, &updated, &book);
    emit_success(
        globals.output(),
        "task edit",
        &TaskReport {
            task: &updated,
            category_name: book.resolve(&updated.category).name,
        },
        Some(&human),
    )
}

pub fn run_delete(globals: &Globals, id: i64) -> Result<()> {
    let ctx = globals.context()?;
    let removed = ctx.storage.delete_task(id)?;
    tracing::info!(task = id, "task deleted");

    let mut human = HumanOutput::new(format!("flow task delete: #{id}"));
    human.push_summary("title", removed.title.clone());
    emit_success(
        globals.output(),
        "task delete",
        &TaskReport {
            category_name: ctx.categories().resolve(&removed.category).name,
            task: &removed,
        },
        Some(&human),
    )
}

pub fn run_feedback(globals: &Globals, id: i64, text: &str) -> Result<()> {
    let ctx = globals.context()?;
    let updated = ctx.storage.set_feedback(id, text)?;

    let header = if updated.manager_feedback.is_empty() {
        format!("flow task feedback: cleared on #{id}")
    } else {
        format!("flow task feedback: saved on #{id}")
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("title", updated.title.clone());
    human.push_summary("responsible", updated.responsible.clone());
    emit_success(
        globals.output(),
        "task feedback",
        &TaskReport {
            category_name: ctx.categories().resolve(&updated.category).name,
            task: &updated,
        },
        Some(&human),
    )
}

pub fn run_attach(globals: &Globals, id: i64, file: &Path) -> Result<()> {
    let ctx = globals.context()?;
    find_visible(&ctx, id)?;

    let unix_secs = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
    let stored =
        attachments::store_attachment(&ctx.data_dir, &ctx.config.uploads.dir, file, unix_secs)?;
    let reference = stored.clone();
    let updated = match ctx.storage.update_task(id, |task| {
        task.attachments.push(reference);
        Ok(())
    }) {
        Ok(task) => task,
        Err(err) => {
            let orphan = attachments::resolve(&ctx.data_dir, &stored);
            if let Err(remove_err) = std::fs::remove_file(&orphan) {
                tracing::warn!(path = %orphan.display(), error = %remove_err, "could not remove orphaned upload");
            }
            return Err(err);
        }
    };

    let mut human = HumanOutput::new(format!("flow task attach: #{id}"));
    human.push_summary("stored", stored.clone());
    human.push_summary("attachments", updated.attachments.len().to_string());
    emit_success(
        globals.output(),
        "task attach",
        &AttachReport {
            task: &updated,
            stored,
        },
        Some(&human),
    )
}

pub fn run_check_attachments(globals: &Globals, id: Option<i64>) -> Result<()> {
    let ctx = globals.context()?;
    let tasks: Vec<Task> = match id {
        Some(id) => vec![find_visible(&ctx, id)?],
        None => ctx.visible_tasks(),
    };

    let missing: Vec<MissingAttachments> = tasks
        .iter()
        .filter_map(|task| {
            let missing = attachments::missing_attachments(&ctx.data_dir, task);
            (!missing.is_empty()).then(|| MissingAttachments {
                task_id: task.id,
                title: task.title.clone(),
                missing,
            })
        })
        .collect();

    let header = if missing.is_empty() {
        "flow task check-attachments: all files present".to_string()
    } else {
        format!(
            "flow task check-attachments: {} task(s) with missing files",
            missing.len()
        )
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("checked", tasks.len().to_string());
    for entry in &missing {
        for reference in &entry.missing {
            human.push_warning(format!("#{} {}: {reference}", entry.task_id, entry.title));
        }
    }

    emit_success(
        globals.output(),
        "task check-attachments",
        &CheckAttachmentsReport {
            checked: tasks.len(),
            missing,
        },
        Some(&human),
    )
}

fn mutate(
    globals: &Globals,
    id: i64,
    command: &str,
    edit: impl FnOnce(&mut Task) -> Result<()>,
) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();
    let updated = ctx.storage.update_task(id, edit)?;

    let mut human = HumanOutput::new(format!("flow {command}: #{id}"));
    push_task_summary(&mut human, &updated, &book);
    emit_success(
        globals.output(),
        command,
        &TaskReport {
            task: &updated,
            category_name: book.resolve(&updated.category).name,
        },
        Some(&human),
    )
}

fn find_visible(ctx: &AppContext, id: i64) -> Result<Task> {
    ctx.visible_tasks()
        .into_iter()
        .find(|task| task.id == id)
        .ok_or(Error::TaskNotFound(id))
}

fn parse_due(raw: &str) -> Result<chrono::NaiveDate> {
    task::parse_date(raw)
        .ok_or_else(|| Error::InvalidArgument(format!("invalid due date '{raw}'")))
}

/// Regular tasks may only use categories the identity can select, and never
/// the attendance category.
fn regular_category(
    book: &CategoryBook,
    identity: &Identity,
    reference: &str,
) -> Result<CategoryKey> {
    let key = book.canonical_key(reference);
    if book.resolve(key.as_str()).is_attendance() {
        return Err(Error::InvalidArgument(
            "use --attendance to create attendance tasks".to_string(),
        ));
    }
    book.pick_for(identity, reference)
        .ok_or_else(|| Error::CategoryNotFound(reference.trim().to_string()))
}

fn resolve_attendee(
    ctx: &AppContext,
    options: &NewOptions,
    warnings: &mut Vec<String>,
) -> Option<Attendee> {
    if let Some(name) = options.person_name.as_deref() {
        return Some(Attendee {
            name: name.trim().to_string(),
            phone: options.person_phone.clone().unwrap_or_default(),
            email: options.person_email.clone().unwrap_or_default(),
            ..Attendee::default()
        });
    }

    let matricula = options.person.as_deref()?;
    match directory::find_person(&ctx.config.directory, &ctx.data_dir, matricula) {
        Some(person) => Some(Attendee::from(person)),
        None => {
            tracing::warn!(matricula, "person not found in directory");
            warnings.push(format!("registration {matricula} not found in the directory"));
            None
        }
    }
}

fn push_task_summary(human: &mut HumanOutput, task: &Task, book: &CategoryBook) {
    let category = book.resolve(&task.category);
    human.push_summary("title", task.title.clone());
    human.push_summary("responsible", task.responsible.clone());
    human.push_summary("category", format!("{} {}", category.icon, category.name));
    human.push_summary("priority", task.priority.label());
    human.push_summary("status", task.status.label());
    human.push_summary("due", task.due_date_string());
    if !task.collaborators.is_empty() {
        human.push_summary("collaborators", task.collaborators.join(", "));
    }
    if !task.attachments.is_empty() {
        human.push_summary("attachments", task.attachments.join(", "));
    }
}

fn task_line(task: &Task, book: &CategoryBook) -> String {
    let category = book.resolve(&task.category);
    format!(
        "#{} [{}] {} | {} | {} {} | {} | due {}",
        task.id,
        task.status.label(),
        task.title,
        task.responsible,
        category.icon,
        category.name,
        task.priority.label(),
        task.due_date_string()
    )
}
