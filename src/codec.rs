//! Wire shapes for every entity.
//!
//! Two encodings exist:
//! - JSON files: one pretty-printed array (or, for categories, one object)
//!   per collection. Tasks rename `due_date`/`created_at` to
//!   `dueDate`/`createdAt`.
//! - Workbook rows: a fixed header per worksheet; list-valued cells hold the
//!   list literal (see [`crate::pylist`]).
//!
//! Decoding a JSON file is all-or-nothing. Decoding workbook rows skips the
//! rows that cannot be used.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::category::{Category, CategoryBook, CategoryKey};
use crate::error::{Error, Result};
use crate::pylist;
use crate::request::RequestRc;
use crate::sheet::Record;
use crate::task::{self, Task, TaskDraft};
use crate::update::{self, TaskUpdate};

/// A list field that may arrive as a native list or as a list literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListField(pub Vec<String>);

impl Serialize for ListField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ListField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(ListField(list_from_value(raw)))
    }
}

fn list_from_value(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(text) => Some(text),
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(text) => pylist::parse_or_empty(&text),
        Value::Null => Vec::new(),
        other => {
            tracing::debug!(value = %other, "unexpected list value, using empty list");
            Vec::new()
        }
    }
}

fn default_category() -> String {
    "Outros".to_string()
}

fn default_priority() -> String {
    task::Priority::Medium.label().to_string()
}

fn default_status() -> String {
    task::Status::Pending.label().to_string()
}

/// Stored form of a [`Task`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub responsible: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attachments: ListField,
    #[serde(default)]
    pub collaborators: ListField,
    #[serde(default)]
    pub manager_feedback: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            responsible: task.responsible.clone(),
            category: task.category.clone(),
            priority: task.priority.label().to_string(),
            status: task.status.label().to_string(),
            description: task.description.clone(),
            attachments: ListField(task.attachments.clone()),
            collaborators: ListField(task.collaborators.clone()),
            manager_feedback: task.manager_feedback.clone(),
            id: Some(task.id),
            due_date: Some(task.due_date_string()),
            created_at: Some(task.created_at.clone()),
        }
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = Error;

    fn try_from(record: TaskRecord) -> Result<Task> {
        let today = task::today();
        let due_date = match record.due_date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(raw) => task::parse_date(raw)
                .ok_or_else(|| Error::Validation(format!("invalid due date '{raw}'")))?,
        };
        let draft = TaskDraft {
            title: record.title,
            responsible: record.responsible,
            category: record.category,
            priority: record.priority.parse()?,
            status: record.status.parse()?,
            due_date,
            description: record.description,
            attachments: record.attachments.0,
            collaborators: record.collaborators.0,
            manager_feedback: record.manager_feedback,
        };
        let id = record
            .id
            .unwrap_or_else(task::fresh_id);
        let created_at = record
            .created_at
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| task::format_date(today));
        Task::build(draft, id, created_at)
    }
}

/// Stored form of a [`TaskUpdate`]; legacy records may lack an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub task_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl From<&TaskUpdate> for UpdateRecord {
    fn from(update: &TaskUpdate) -> Self {
        Self {
            task_id: update.task_id,
            content: update.content.clone(),
            timestamp: update.timestamp.clone(),
            user: update.user.clone(),
            id: Some(update.id),
        }
    }
}

/// Turn stored update records into updates, deriving ids for records
/// that have none. `index` is the record's position in its store.
pub fn updates_from_records(records: Vec<UpdateRecord>) -> Vec<TaskUpdate> {
    let updates: Vec<TaskUpdate> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let id = record.id.unwrap_or_else(|| {
                update::legacy_id(
                    &record.task_id.to_string(),
                    &record.timestamp,
                    &record.content,
                    index,
                )
            });
            TaskUpdate {
                task_id: record.task_id,
                content: record.content,
                timestamp: record.timestamp,
                user: record.user,
                id,
            }
        })
        .collect();
    update::warn_on_duplicate_ids(&updates);
    updates
}

/// Workbook form of one category; the key travels as a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bg: String,
    #[serde(default)]
    pub owner: String,
    pub key: String,
}

pub fn category_rows(book: &CategoryBook) -> Vec<CategoryRow> {
    book.iter()
        .map(|(key, category)| CategoryRow {
            color: category.color.clone(),
            icon: category.icon.clone(),
            name: category.name.clone(),
            bg: category.bg.clone(),
            owner: category.owner.clone().unwrap_or_default(),
            key: key.to_string(),
        })
        .collect()
}

pub fn book_from_rows(rows: Vec<CategoryRow>) -> CategoryBook {
    let mut book = CategoryBook::new();
    for row in rows {
        let owner = Some(row.owner).filter(|owner| !owner.trim().is_empty());
        book.insert(
            CategoryKey::new(row.key),
            Category {
                color: row.color,
                icon: row.icon,
                name: row.name,
                bg: row.bg,
                owner,
            },
        );
    }
    book
}

// ---------------------------------------------------------------------------
// JSON files
// ---------------------------------------------------------------------------

pub fn tasks_to_json(tasks: &[Task]) -> Result<String> {
    let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn tasks_from_json(text: &str) -> Result<Vec<Task>> {
    let records: Vec<TaskRecord> = serde_json::from_str(text)?;
    records.into_iter().map(Task::try_from).collect()
}

pub fn updates_to_json(updates: &[TaskUpdate]) -> Result<String> {
    let records: Vec<UpdateRecord> = updates.iter().map(UpdateRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn updates_from_json(text: &str) -> Result<Vec<TaskUpdate>> {
    let records: Vec<UpdateRecord> = serde_json::from_str(text)?;
    Ok(updates_from_records(records))
}

pub fn categories_to_json(book: &CategoryBook) -> Result<String> {
    Ok(serde_json::to_string_pretty(book)?)
}

pub fn categories_from_json(text: &str) -> Result<CategoryBook> {
    Ok(serde_json::from_str(text)?)
}

pub fn requests_to_json(requests: &[RequestRc]) -> Result<String> {
    Ok(serde_json::to_string_pretty(requests)?)
}

pub fn requests_from_json(text: &str) -> Result<Vec<RequestRc>> {
    Ok(serde_json::from_str(text)?)
}

// ---------------------------------------------------------------------------
// Workbook rows
// ---------------------------------------------------------------------------

/// Column layout of one worksheet
pub trait SheetRecord: Serialize + DeserializeOwned {
    const WORKSHEET: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns holding list literals
    const LIST_COLUMNS: &'static [&'static str] = &[];
    /// Columns read as integers
    const INTEGER_COLUMNS: &'static [&'static str] = &[];
    /// Rows with this column missing or blank are skipped
    const REQUIRED_COLUMN: Option<&'static str> = None;
}

impl SheetRecord for TaskRecord {
    const WORKSHEET: &'static str = "Tasks";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "responsible",
        "category",
        "priority",
        "status",
        "description",
        "attachments",
        "collaborators",
        "manager_feedback",
        "id",
        "dueDate",
        "createdAt",
    ];
    const LIST_COLUMNS: &'static [&'static str] = &["attachments", "collaborators"];
    const INTEGER_COLUMNS: &'static [&'static str] = &["id"];
    const REQUIRED_COLUMN: Option<&'static str> = Some("id");
}

impl SheetRecord for UpdateRecord {
    const WORKSHEET: &'static str = "Updates";
    const COLUMNS: &'static [&'static str] = &["task_id", "content", "timestamp", "user", "id"];
    const INTEGER_COLUMNS: &'static [&'static str] = &["task_id", "id"];
}

impl SheetRecord for CategoryRow {
    const WORKSHEET: &'static str = "Categories";
    const COLUMNS: &'static [&'static str] = &["color", "icon", "name", "bg", "owner", "key"];
    const REQUIRED_COLUMN: Option<&'static str> = Some("key");
}

impl SheetRecord for RequestRc {
    const WORKSHEET: &'static str = "Requests";
    const COLUMNS: &'static [&'static str] = &[
        "subelement",
        "date_opening",
        "description",
        "rc_code",
        "buyer",
        "situation",
        "attachments",
        "po_number",
        "nf_tracking",
        "nf_attachments",
        "id",
        "created_at",
    ];
    const LIST_COLUMNS: &'static [&'static str] = &["attachments", "nf_attachments"];
    const INTEGER_COLUMNS: &'static [&'static str] = &["id"];
}

/// Header plus rows for one worksheet rewrite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Encode a batch. Every row carries every column, so the header always
/// lines up; an empty batch has an empty header.
pub fn to_table<R: SheetRecord>(records: &[R]) -> Result<SheetTable> {
    if records.is_empty() {
        return Ok(SheetTable::default());
    }

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let Value::Object(fields) = serde_json::to_value(record)? else {
            return Err(Error::Sheet(format!(
                "{} record did not encode as an object",
                R::WORKSHEET
            )));
        };
        let row = R::COLUMNS
            .iter()
            .map(|column| encode_cell(fields.get(*column), R::LIST_COLUMNS.contains(column)))
            .collect();
        rows.push(row);
    }

    Ok(SheetTable {
        header: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

fn encode_cell(value: Option<&Value>, list_column: bool) -> Value {
    match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(Value::Array(items)) if list_column => {
            let items: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect();
            Value::String(pylist::render(&items))
        }
        Some(other) => other.clone(),
    }
}

/// Decode worksheet records, skipping the unusable ones.
pub fn from_records<R: SheetRecord>(records: Vec<Record>) -> Vec<R> {
    let mut decoded = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if let Some(column) = R::REQUIRED_COLUMN {
            let present = record.get(column).is_some_and(|value| match value {
                Value::Null => false,
                Value::String(text) => !text.trim().is_empty(),
                _ => true,
            });
            if !present {
                tracing::debug!(worksheet = R::WORKSHEET, row = index + 2, column, "skipping row without key");
                continue;
            }
        }

        let normalized = normalize_record::<R>(record);
        match serde_json::from_value::<R>(Value::Object(normalized)) {
            Ok(item) => decoded.push(item),
            Err(err) => {
                tracing::warn!(worksheet = R::WORKSHEET, row = index + 2, error = %err, "skipping unreadable row");
            }
        }
    }
    decoded
}

/// Cells come back typed by the workbook (numeric text may arrive as a
/// number). Coerce each column to the type its record expects.
fn normalize_record<R: SheetRecord>(record: Record) -> Record {
    let mut out = Record::new();
    for (column, value) in record {
        if R::INTEGER_COLUMNS.contains(&column.as_str()) {
            if let Some(number) = integer_cell(&value) {
                out.insert(column, Value::from(number));
            } else if !is_blank(&value) {
                out.insert(column, value);
            }
        } else if R::LIST_COLUMNS.contains(&column.as_str()) {
            let items = list_from_value(value);
            out.insert(
                column,
                Value::Array(items.into_iter().map(Value::String).collect()),
            );
        } else {
            out.insert(column, Value::String(text_cell(value)));
        }
    }
    out
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn integer_cell(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn text_cell(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Number(number) => match number.as_i64() {
            Some(int) => int.to_string(),
            None => match number.as_f64() {
                Some(f) if f.fract() == 0.0 => (f as i64).to_string(),
                _ => number.to_string(),
            },
        },
        other => other.to_string(),
    }
}

/// Tasks from worksheet records; rows that do not form a valid task are
/// skipped.
pub fn tasks_from_records(records: Vec<Record>) -> Vec<Task> {
    from_records::<TaskRecord>(records)
        .into_iter()
        .filter_map(|record| {
            let id = record.id;
            match Task::try_from(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    tracing::warn!(?id, error = %err, "skipping invalid task row");
                    None
                }
            }
        })
        .collect()
}

pub fn tasks_to_table(tasks: &[Task]) -> Result<SheetTable> {
    let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
    to_table(&records)
}

pub fn updates_to_table(updates: &[TaskUpdate]) -> Result<SheetTable> {
    let records: Vec<UpdateRecord> = updates.iter().map(UpdateRecord::from).collect();
    to_table(&records)
}
