//! Persistence gateway for flow
//!
//! Four collections (tasks, updates, categories, requests), each stored
//! either in local JSON files or in a shared workbook. The backend is chosen
//! once when the gateway is opened.
//!
//! # Local layout
//!
//! ```text
//! <data-dir>/
//!   flow_data.json              # primary identity's tasks
//!   flow_updates.json
//!   flow_categories.json
//!   flow_requests.json
//!   flow_data_<key>.json        # every other identity, suffixed by key
//!   flow_updates_<key>.json
//!   ...
//!   <file>.lock                 # sidecar locks for read-modify-write
//! ```
//!
//! Reads never fail: a missing or unreadable store yields an empty (or
//! default) collection and a log line. Writes return `Result` and rewrite the
//! whole collection atomically.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::category::{self, Category, CategoryBook, CategoryKey};
use crate::codec::{self, CategoryRow, SheetRecord, SheetTable, TaskRecord, UpdateRecord};
use crate::config::{BackendKind, Config};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::lock;
use crate::policy;
use crate::request::RequestRc;
use crate::sheet::{self, Record, SheetClient};
use crate::task::{self, Task, TaskDraft};
use crate::update::TaskUpdate;

/// Logical collections, one store each per identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tasks,
    Updates,
    Categories,
    Requests,
}

impl Collection {
    /// File name stem of the primary identity's store
    pub fn stem(self) -> &'static str {
        match self {
            Collection::Tasks => "flow_data",
            Collection::Updates => "flow_updates",
            Collection::Categories => "flow_categories",
            Collection::Requests => "flow_requests",
        }
    }

    pub fn worksheet(self) -> &'static str {
        match self {
            Collection::Tasks => TaskRecord::WORKSHEET,
            Collection::Updates => UpdateRecord::WORKSHEET,
            Collection::Categories => CategoryRow::WORKSHEET,
            Collection::Requests => RequestRc::WORKSHEET,
        }
    }
}

/// A whole collection as it is read and written
trait Stored: Sized {
    const COLLECTION: Collection;
    fn from_json(text: &str) -> Result<Self>;
    fn to_json(&self) -> Result<String>;
    fn from_sheet(records: Vec<Record>) -> Self;
    fn to_table(&self) -> Result<SheetTable>;
}

impl Stored for Vec<Task> {
    const COLLECTION: Collection = Collection::Tasks;

    fn from_json(text: &str) -> Result<Self> {
        codec::tasks_from_json(text)
    }

    fn to_json(&self) -> Result<String> {
        codec::tasks_to_json(self)
    }

    fn from_sheet(records: Vec<Record>) -> Self {
        codec::tasks_from_records(records)
    }

    fn to_table(&self) -> Result<SheetTable> {
        codec::tasks_to_table(self)
    }
}

impl Stored for Vec<TaskUpdate> {
    const COLLECTION: Collection = Collection::Updates;

    fn from_json(text: &str) -> Result<Self> {
        codec::updates_from_json(text)
    }

    fn to_json(&self) -> Result<String> {
        codec::updates_to_json(self)
    }

    fn from_sheet(records: Vec<Record>) -> Self {
        codec::updates_from_records(codec::from_records::<UpdateRecord>(records))
    }

    fn to_table(&self) -> Result<SheetTable> {
        codec::updates_to_table(self)
    }
}

impl Stored for Vec<RequestRc> {
    const COLLECTION: Collection = Collection::Requests;

    fn from_json(text: &str) -> Result<Self> {
        codec::requests_from_json(text)
    }

    fn to_json(&self) -> Result<String> {
        codec::requests_to_json(self)
    }

    fn from_sheet(records: Vec<Record>) -> Self {
        codec::from_records::<RequestRc>(records)
    }

    fn to_table(&self) -> Result<SheetTable> {
        codec::to_table(self)
    }
}

impl Stored for CategoryBook {
    const COLLECTION: Collection = Collection::Categories;

    fn from_json(text: &str) -> Result<Self> {
        codec::categories_from_json(text)
    }

    fn to_json(&self) -> Result<String> {
        codec::categories_to_json(self)
    }

    fn from_sheet(records: Vec<Record>) -> Self {
        codec::book_from_rows(codec::from_records::<CategoryRow>(records))
    }

    fn to_table(&self) -> Result<SheetTable> {
        codec::to_table(&codec::category_rows(self))
    }
}

trait HasId {
    fn id(&self) -> i64;
}

impl HasId for Task {
    fn id(&self) -> i64 {
        self.id
    }
}

impl HasId for TaskUpdate {
    fn id(&self) -> i64 {
        self.id
    }
}

impl HasId for RequestRc {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone)]
enum Backend {
    Local,
    Sheet(Arc<dyn SheetClient>),
}

/// Gateway bound to one identity and one backend
#[derive(Clone)]
pub struct Storage {
    data_dir: PathBuf,
    identity: Identity,
    backend: Backend,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("data_dir", &self.data_dir)
            .field("identity", &self.identity.key)
            .field("backend", &self.backend_name())
            .finish()
    }
}

impl Storage {
    /// Pick the backend from config. A workbook that cannot be opened falls
    /// back to local files.
    pub fn open(data_dir: impl Into<PathBuf>, identity: Identity, config: &Config) -> Self {
        let data_dir = data_dir.into();
        let backend = match config.backend {
            BackendKind::Local => Backend::Local,
            BackendKind::Sheet => match sheet::connect(&config.sheet, &data_dir) {
                Some(client) => Backend::Sheet(client),
                None => Backend::Local,
            },
        };
        Self {
            data_dir,
            identity,
            backend,
        }
    }

    pub fn local(data_dir: impl Into<PathBuf>, identity: Identity) -> Self {
        Self {
            data_dir: data_dir.into(),
            identity,
            backend: Backend::Local,
        }
    }

    pub fn with_client(
        data_dir: impl Into<PathBuf>,
        identity: Identity,
        client: Arc<dyn SheetClient>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            identity,
            backend: Backend::Sheet(client),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Local => "local",
            Backend::Sheet(_) => "sheet",
        }
    }

    /// This identity's local store for a collection
    pub fn store_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(format!(
            "{}{}.json",
            collection.stem(),
            self.identity.store_suffix()
        ))
    }

    /// Every identity's local store for a collection, primary first
    pub fn all_store_paths(&self, collection: Collection) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let primary = self.data_dir.join(format!("{}.json", collection.stem()));
        if primary.exists() {
            paths.push(primary);
        }

        let pattern = format!(
            "{}/{}_*.json",
            glob::Pattern::escape(&self.data_dir.to_string_lossy()),
            collection.stem()
        );
        match glob::glob(&pattern) {
            Ok(entries) => {
                let mut others: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
                others.sort();
                paths.extend(others);
            }
            Err(err) => {
                tracing::warn!(pattern, error = %err, "invalid store pattern");
            }
        }
        paths
    }

    // =========================================================================
    // Generic plumbing
    // =========================================================================

    fn ensure_writable(&self, action: &str) -> Result<()> {
        if policy::can_write_collections(&self.identity) {
            Ok(())
        } else {
            Err(Error::denied(&self.identity.key, action))
        }
    }

    /// `Ok(None)` when the local store does not exist yet.
    fn read<S: Stored>(&self) -> Result<Option<S>> {
        match &self.backend {
            Backend::Sheet(client) => {
                let records = client.records(S::COLLECTION.worksheet())?;
                Ok(Some(S::from_sheet(records)))
            }
            Backend::Local => read_file::<S>(&self.store_path(S::COLLECTION)),
        }
    }

    fn write<S: Stored>(&self, value: &S) -> Result<()> {
        let result = match &self.backend {
            Backend::Sheet(client) => {
                let table = value.to_table()?;
                client.replace(S::COLLECTION.worksheet(), &table.header, &table.rows)
            }
            Backend::Local => {
                let path = self.store_path(S::COLLECTION);
                lock::with_lock(&path, || write_file(&path, value))
            }
        };
        report_write(S::COLLECTION, result)
    }

    /// Read, apply `op`, rewrite. Local stores stay locked throughout.
    /// `start` turns the stored value (or its absence) into the collection
    /// `op` sees.
    fn modify<S: Stored, T>(
        &self,
        start: impl FnOnce(Option<S>) -> Result<S>,
        op: impl FnOnce(&mut S) -> Result<T>,
    ) -> Result<T> {
        let result = match &self.backend {
            Backend::Sheet(client) => {
                let worksheet = S::COLLECTION.worksheet();
                let mut value = start(Some(S::from_sheet(client.records(worksheet)?)))?;
                let out = op(&mut value)?;
                let table = value.to_table()?;
                client
                    .replace(worksheet, &table.header, &table.rows)
                    .map(|()| out)
            }
            Backend::Local => {
                let path = self.store_path(S::COLLECTION);
                lock::with_lock(&path, || {
                    let mut value = start(read_file::<S>(&path)?)?;
                    let out = op(&mut value)?;
                    write_file(&path, &value)?;
                    Ok(out)
                })
            }
        };
        report_write(S::COLLECTION, result)
    }

    /// Union of every identity's local store, first occurrence of an id wins.
    fn aggregate<E: HasId>(&self) -> Vec<E>
    where
        Vec<E>: Stored,
    {
        let collection = <Vec<E> as Stored>::COLLECTION;
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for path in self.all_store_paths(collection) {
            match read_file::<Vec<E>>(&path) {
                Ok(Some(items)) => {
                    merged.extend(items.into_iter().filter(|item| seen.insert(item.id())));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable store");
                }
            }
        }
        tracing::debug!(collection = ?collection, count = merged.len(), "aggregated stores");
        merged
    }

    fn load_list<E: HasId>(&self) -> Vec<E>
    where
        Vec<E>: Stored,
    {
        if self.identity.is_manager() && matches!(self.backend, Backend::Local) {
            return self.aggregate();
        }
        match self.read::<Vec<E>>() {
            Ok(items) => items.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(
                    collection = ?<Vec<E> as Stored>::COLLECTION,
                    error = %err,
                    "unreadable store, using empty collection"
                );
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Tasks in scope for this identity. A missing local store is seeded
    /// with one example task, persisted immediately.
    pub fn load_tasks(&self) -> Vec<Task> {
        if self.identity.is_manager() && matches!(self.backend, Backend::Local) {
            return self.aggregate();
        }
        let loaded = match &self.backend {
            Backend::Sheet(_) => self.read::<Vec<Task>>().map(Option::unwrap_or_default),
            Backend::Local => self.load_or_seed_local(),
        };
        loaded.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "unreadable task store, using empty collection");
            Vec::new()
        })
    }

    fn load_or_seed_local(&self) -> Result<Vec<Task>> {
        if let Some(tasks) = self.read::<Vec<Task>>()? {
            return Ok(tasks);
        }
        let path = self.store_path(Collection::Tasks);
        lock::with_lock(&path, || {
            if let Some(tasks) = read_file::<Vec<Task>>(&path)? {
                return Ok(tasks);
            }
            let seed = vec![self.seed_task()?];
            match write_file(&path, &seed) {
                Ok(()) => tracing::info!(path = %path.display(), "seeded new task store"),
                Err(err) => tracing::error!(path = %path.display(), error = %err, "failed to persist seed task"),
            }
            Ok(seed)
        })
    }

    fn seed_task(&self) -> Result<Task> {
        Task::seed(
            &self.identity.display_name,
            task::today(),
            task::fresh_id(),
        )
    }

    fn seed_if_missing(&self, found: Option<Vec<Task>>) -> Result<Vec<Task>> {
        match found {
            Some(tasks) => Ok(tasks),
            None => Ok(vec![self.seed_task()?]),
        }
    }

    /// Overwrite the whole task collection.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.ensure_writable("rewrite the task collection")?;
        self.write(&tasks.to_vec())
    }

    pub fn find_task(&self, id: i64) -> Option<Task> {
        self.load_tasks().into_iter().find(|task| task.id == id)
    }

    pub fn create_task(&self, draft: TaskDraft) -> Result<Task> {
        self.ensure_writable("create tasks")?;
        self.modify(
            |found| self.seed_if_missing(found),
            |tasks: &mut Vec<Task>| {
                let id = task::allocate_id(tasks.iter().map(|t| t.id))?;
                let mut created = Task::build(draft, id, task::format_date(task::today()))?;
                policy::keep_reachable(&self.identity, &mut created);
                tasks.push(created.clone());
                Ok(created)
            },
        )
    }

    /// Apply `edit` to one task and save.
    pub fn update_task(
        &self,
        id: i64,
        edit: impl FnOnce(&mut Task) -> Result<()>,
    ) -> Result<Task> {
        self.ensure_writable("edit tasks")?;
        self.modify(
            |found| self.seed_if_missing(found),
            |tasks: &mut Vec<Task>| {
                let task = tasks
                    .iter_mut()
                    .find(|task| task.id == id)
                    .ok_or(Error::TaskNotFound(id))?;
                if !policy::can_edit_task(&self.identity, task) {
                    return Err(Error::denied(&self.identity.key, format!("edit task {id}")));
                }
                edit(task)?;
                policy::keep_reachable(&self.identity, task);
                Ok(task.clone())
            },
        )
    }

    pub fn delete_task(&self, id: i64) -> Result<Task> {
        self.ensure_writable("delete tasks")?;
        self.modify(
            |found| self.seed_if_missing(found),
            |tasks: &mut Vec<Task>| {
                let idx = tasks
                    .iter()
                    .position(|task| task.id == id)
                    .ok_or(Error::TaskNotFound(id))?;
                if !policy::can_edit_task(&self.identity, &tasks[idx]) {
                    return Err(Error::denied(&self.identity.key, format!("delete task {id}")));
                }
                Ok(tasks.remove(idx))
            },
        )
    }

    /// Set (or clear, with empty text) the manager note on a task. Only the
    /// store that holds the task is rewritten.
    pub fn set_feedback(&self, id: i64, text: &str) -> Result<Task> {
        if !policy::can_set_feedback(&self.identity) {
            return Err(Error::denied(&self.identity.key, "set manager feedback"));
        }
        let feedback = text.trim().to_string();

        if let Backend::Sheet(_) = self.backend {
            return self.modify(
                |found: Option<Vec<Task>>| Ok(found.unwrap_or_default()),
                |tasks| apply_feedback(tasks, id, feedback),
            );
        }

        for path in self.all_store_paths(Collection::Tasks) {
            let updated = lock::with_lock(&path, || {
                let Some(mut tasks) = read_file::<Vec<Task>>(&path)? else {
                    return Ok(None);
                };
                if !tasks.iter().any(|task| task.id == id) {
                    return Ok(None);
                }
                let updated = apply_feedback(&mut tasks, id, feedback.clone())?;
                write_file(&path, &tasks)?;
                Ok(Some(updated))
            });
            if let Some(task) = report_write(Collection::Tasks, updated)? {
                tracing::info!(task = id, path = %path.display(), "manager feedback saved");
                return Ok(task);
            }
        }
        Err(Error::TaskNotFound(id))
    }

    // =========================================================================
    // Updates
    // =========================================================================

    pub fn load_updates(&self) -> Vec<TaskUpdate> {
        self.load_list()
    }

    pub fn save_updates(&self, updates: &[TaskUpdate]) -> Result<()> {
        self.ensure_writable("rewrite the update collection")?;
        self.write(&updates.to_vec())
    }

    pub fn add_update(&self, update: TaskUpdate) -> Result<()> {
        self.ensure_writable("post updates")?;
        self.modify(
            |found: Option<Vec<TaskUpdate>>| Ok(found.unwrap_or_default()),
            |updates| {
                updates.push(update);
                Ok(())
            },
        )
    }

    /// Post a new update as this identity, allocating its id.
    pub fn post_update(&self, task_id: i64, content: &str) -> Result<TaskUpdate> {
        self.ensure_writable("post updates")?;
        let author = self.identity.display_name.clone();
        self.modify(
            |found: Option<Vec<TaskUpdate>>| Ok(found.unwrap_or_default()),
            |updates| {
                let id = task::allocate_id(updates.iter().map(|u| u.id))?;
                let update = TaskUpdate::new(task_id, content, author, task::now_timestamp(), id)?;
                updates.push(update.clone());
                Ok(update)
            },
        )
    }

    pub fn get_task_updates(&self, task_id: i64) -> Vec<TaskUpdate> {
        self.load_updates()
            .into_iter()
            .filter(|update| update.task_id == task_id)
            .collect()
    }

    pub fn delete_update(&self, id: i64) -> Result<TaskUpdate> {
        self.ensure_writable("delete updates")?;
        self.modify(
            |found: Option<Vec<TaskUpdate>>| Ok(found.unwrap_or_default()),
            |updates| {
                let idx = updates
                    .iter()
                    .position(|update| update.id == id)
                    .ok_or(Error::UpdateNotFound(id))?;
                Ok(updates.remove(idx))
            },
        )
    }

    pub fn edit_update(&self, id: i64, content: &str) -> Result<TaskUpdate> {
        self.ensure_writable("edit updates")?;
        self.modify(
            |found: Option<Vec<TaskUpdate>>| Ok(found.unwrap_or_default()),
            |updates| {
                let update = updates
                    .iter_mut()
                    .find(|update| update.id == id)
                    .ok_or(Error::UpdateNotFound(id))?;
                update.edit(content, &task::now_timestamp())?;
                Ok(update.clone())
            },
        )
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Categories for this identity. Privileged identities get the default
    /// set when nothing is stored; others get an empty book.
    pub fn load_categories(&self) -> CategoryBook {
        if self.identity.is_manager() && matches!(self.backend, Backend::Local) {
            return self.aggregate_categories();
        }
        match self.read::<CategoryBook>() {
            Ok(found) => self.category_start(found),
            Err(err) => {
                tracing::warn!(error = %err, "unreadable category store, using defaults");
                self.category_fallback()
            }
        }
    }

    fn category_fallback(&self) -> CategoryBook {
        if self.identity.is_privileged() {
            CategoryBook::defaults()
        } else {
            CategoryBook::new()
        }
    }

    fn category_start(&self, found: Option<CategoryBook>) -> CategoryBook {
        match (found, &self.backend) {
            (Some(book), Backend::Sheet(_)) if book.is_empty() => CategoryBook::defaults(),
            (Some(book), _) => book,
            (None, _) => self.category_fallback(),
        }
    }

    fn aggregate_categories(&self) -> CategoryBook {
        let mut merged = CategoryBook::new();
        for path in self.all_store_paths(Collection::Categories) {
            match read_file::<CategoryBook>(&path) {
                Ok(Some(book)) => merged.merge_missing(book),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable store");
                }
            }
        }
        if merged.is_empty() {
            CategoryBook::defaults()
        } else {
            merged
        }
    }

    pub fn save_categories(&self, book: &CategoryBook) -> Result<()> {
        self.ensure_writable("rewrite categories")?;
        self.write(book)
    }

    /// Create a category owned by this identity.
    pub fn add_category(&self, icon: &str, name: &str) -> Result<CategoryKey> {
        self.ensure_writable("create categories")?;
        let owner = self.identity.key.clone();
        self.modify(
            |found| Ok(self.category_start(found)),
            |book: &mut CategoryBook| book.add(icon, name, &owner, &mut rand::rng()),
        )
    }

    pub fn delete_category(&self, key: &CategoryKey) -> Result<Category> {
        self.ensure_writable("delete categories")?;
        self.modify(
            |found| Ok(self.category_start(found)),
            |book: &mut CategoryBook| {
                let existing = book
                    .get(key)
                    .ok_or_else(|| Error::CategoryNotFound(key.to_string()))?;
                if category::is_default_key(key) {
                    return Err(Error::ProtectedCategory(key.to_string()));
                }
                if !policy::can_delete_category(&self.identity, key, existing) {
                    return Err(Error::denied(
                        &self.identity.key,
                        format!("delete category {key}"),
                    ));
                }
                book.remove(key)
                    .ok_or_else(|| Error::CategoryNotFound(key.to_string()))
            },
        )
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub fn load_requests(&self) -> Vec<RequestRc> {
        self.load_list()
    }

    pub fn save_requests(&self, requests: &[RequestRc]) -> Result<()> {
        self.ensure_writable("rewrite requests")?;
        self.write(&requests.to_vec())
    }

    /// Append a request built by `build` from a freshly allocated id.
    pub fn add_request(&self, build: impl FnOnce(i64) -> Result<RequestRc>) -> Result<RequestRc> {
        self.ensure_writable("create requests")?;
        self.modify(
            |found: Option<Vec<RequestRc>>| Ok(found.unwrap_or_default()),
            |requests| {
                let request = build(task::allocate_id(requests.iter().map(|r| r.id))?)?;
                requests.push(request.clone());
                Ok(request)
            },
        )
    }
}

fn apply_feedback(tasks: &mut [Task], id: i64, feedback: String) -> Result<Task> {
    let task = tasks
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or(Error::TaskNotFound(id))?;
    task.manager_feedback = feedback;
    Ok(task.clone())
}

fn read_file<S: Stored>(path: &Path) -> Result<Option<S>> {
    match lock::read_optional(path)? {
        Some(text) => S::from_json(&text).map(Some),
        None => Ok(None),
    }
}

fn write_file<S: Stored>(path: &Path, value: &S) -> Result<()> {
    let text = value.to_json()?;
    lock::write_atomic(path, text.as_bytes())?;
    tracing::debug!(path = %path.display(), "store written");
    Ok(())
}

fn report_write<T>(collection: Collection, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        tracing::error!(collection = ?collection, error = %err, "write failed");
    }
    result
}
