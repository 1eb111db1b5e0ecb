//! Tasks: the unit of work tracked by flow.
//!
//! Every constructor and edit goes through [`Task::build`] /
//! [`Task::apply_edit`], so a `Task` value always has a non-empty,
//! markup-free title and cleaned collaborator names.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sanitize;

/// Storage format for due dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format for update timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Baixa")]
    Low,
    #[serde(rename = "Média")]
    Medium,
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Urgente")]
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Label as persisted in stores
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Baixa",
            Priority::Medium => "Média",
            Priority::High => "Alta",
            Priority::Urgent => "Urgente",
        }
    }

    /// High and Urgent count as urgent in stats.
    pub fn is_high(self) -> bool {
        matches!(self, Priority::High | Priority::Urgent)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "baixa" | "low" => Ok(Priority::Low),
            "média" | "media" | "medium" => Ok(Priority::Medium),
            "alta" | "high" => Ok(Priority::High),
            "urgente" | "urgent" => Ok(Priority::Urgent),
            _ => Err(Error::InvalidArgument(format!(
                "unknown priority '{value}' (expected low, medium, high or urgent)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em Andamento")]
    InProgress,
    #[serde(rename = "Para Revisão")]
    ForReview,
    #[serde(rename = "Concluído")]
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::ForReview,
        Status::Done,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pendente",
            Status::InProgress => "Em Andamento",
            Status::ForReview => "Para Revisão",
            Status::Done => "Concluído",
        }
    }

    pub fn is_done(self) -> bool {
        self == Status::Done
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "pendente" | "pending" | "todo" => Ok(Status::Pending),
            "em-andamento" | "in-progress" | "inprogress" | "doing" => Ok(Status::InProgress),
            "para-revisão" | "para-revisao" | "for-review" | "review" => Ok(Status::ForReview),
            "concluído" | "concluido" | "done" => Ok(Status::Done),
            _ => Err(Error::InvalidArgument(format!(
                "unknown status '{value}' (expected pending, in-progress, review or done)"
            ))),
        }
    }
}

/// Input for a new task. Text fields are cleaned by [`Task::build`].
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub responsible: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: NaiveDate,
    pub description: String,
    pub attachments: Vec<String>,
    pub collaborators: Vec<String>,
    pub manager_feedback: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, responsible: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            responsible: responsible.into(),
            category: "Outros".to_string(),
            priority: Priority::Medium,
            status: Status::Pending,
            due_date,
            description: String::new(),
            attachments: Vec::new(),
            collaborators: Vec::new(),
            manager_feedback: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub title: String,
    pub responsible: String,
    /// Category key or, in older data, a category display name
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(with = "iso_date")]
    pub due_date: NaiveDate,
    pub description: String,
    pub attachments: Vec<String>,
    pub collaborators: Vec<String>,
    pub manager_feedback: String,
    pub id: i64,
    pub created_at: String,
}

/// Partial edit applied by [`Task::apply_edit`]
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub responsible: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub collaborators: Option<Vec<String>>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.responsible.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.collaborators.is_none()
    }
}

impl Task {
    /// Validate and normalize a draft into a task.
    pub fn build(draft: TaskDraft, id: i64, created_at: impl Into<String>) -> Result<Self> {
        let title = clean_title(&draft.title)?;
        Ok(Self {
            title,
            responsible: draft.responsible.trim().to_string(),
            category: draft.category.trim().to_string(),
            priority: draft.priority,
            status: draft.status,
            due_date: draft.due_date,
            description: draft.description,
            attachments: draft
                .attachments
                .into_iter()
                .filter(|path| !path.trim().is_empty())
                .collect(),
            collaborators: sanitize::clean_list(draft.collaborators),
            manager_feedback: draft.manager_feedback,
            id,
            created_at: created_at.into(),
        })
    }

    /// The single example task written into a fresh store.
    pub fn seed(responsible: &str, today: NaiveDate, id: i64) -> Result<Self> {
        let draft = TaskDraft::new("Exemplo de Tarefa", responsible, today);
        Self::build(draft, id, format_date(today))
    }

    pub fn apply_edit(&mut self, edit: TaskEdit) -> Result<()> {
        if let Some(title) = edit.title {
            self.title = clean_title(&title)?;
        }
        if let Some(responsible) = edit.responsible {
            self.responsible = responsible.trim().to_string();
        }
        if let Some(category) = edit.category {
            self.category = category.trim().to_string();
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(due_date) = edit.due_date {
            self.due_date = due_date;
        }
        if let Some(collaborators) = edit.collaborators {
            self.collaborators = sanitize::clean_list(collaborators);
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && !self.is_done()
    }

    /// Urgent, not done, and due exactly today.
    pub fn is_urgent_today(&self, today: NaiveDate) -> bool {
        self.priority == Priority::Urgent && !self.is_done() && self.due_date == today
    }

    pub fn due_date_string(&self) -> String {
        format_date(self.due_date)
    }
}

fn clean_title(raw: &str) -> Result<String> {
    let title = sanitize::clean_text(raw);
    if title.is_empty() {
        return Err(Error::Validation("task title cannot be empty".to_string()));
    }
    Ok(title)
}

/// Id for a record created outside any collection.
pub fn fresh_id() -> i64 {
    Utc::now().timestamp_millis()
}

/// Next id for a collection: current epoch milliseconds, bumped past the
/// largest id already present.
pub fn allocate_id(existing: impl IntoIterator<Item = i64>) -> Result<i64> {
    let now = fresh_id();
    match existing.into_iter().max() {
        Some(max) if max >= now => max.checked_add(1).ok_or_else(|| {
            Error::Validation(format!("no id left after {max}; fix the stored ids"))
        }),
        _ => Ok(now),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored or user-supplied date.
///
/// Accepts `YYYY-MM-DD`, a datetime whose first ten characters are an ISO
/// date, and `DD/MM/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }
    if let Some(prefix) = value.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, DATE_FORMAT) {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(value, "%d/%m/%Y").ok()
}

pub(crate) mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
    }
}
