//! Workbook backend: one shared workbook with a worksheet per collection.
//!
//! The gateway only talks to [`SheetClient`]. [`FileWorkbook`] keeps the
//! whole workbook in one JSON file (each worksheet stored as header row plus
//! value rows). Connections are reused through a process-wide cache for the
//! configured TTL.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SheetConfig;
use crate::error::{Error, Result};
use crate::lock;

/// One worksheet row keyed by header name
pub type Record = serde_json::Map<String, Value>;

/// Worksheet-level operations the gateway needs
pub trait SheetClient: Send + Sync {
    /// Every data row as a header-keyed record. Missing worksheets are
    /// created empty.
    fn records(&self, worksheet: &str) -> Result<Vec<Record>>;

    /// Clear the worksheet and write `header` plus `rows` in one call.
    /// An empty header leaves the worksheet empty.
    fn replace(&self, worksheet: &str, header: &[String], rows: &[Vec<Value>]) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkbookFile {
    title: String,
    #[serde(default)]
    worksheets: BTreeMap<String, Vec<Vec<Value>>>,
}

/// Workbook stored as a single JSON file
#[derive(Debug, Clone)]
pub struct FileWorkbook {
    path: PathBuf,
    title: String,
}

impl FileWorkbook {
    /// Open the workbook, creating it when it does not exist.
    pub fn open(path: impl Into<PathBuf>, title: &str) -> Result<Self> {
        let path = path.into();
        let workbook = Self {
            path,
            title: title.to_string(),
        };
        lock::with_lock(&workbook.path, || {
            if lock::read_optional(&workbook.path)?.is_none() {
                tracing::info!(path = %workbook.path.display(), title, "creating workbook");
                workbook.write(&WorkbookFile {
                    title: workbook.title.clone(),
                    worksheets: BTreeMap::new(),
                })?;
            }
            Ok(())
        })?;
        Ok(workbook)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<WorkbookFile> {
        match lock::read_optional(&self.path)? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|err| Error::Sheet(format!("{}: {err}", self.path.display()))),
            None => Ok(WorkbookFile {
                title: self.title.clone(),
                worksheets: BTreeMap::new(),
            }),
        }
    }

    fn write(&self, file: &WorkbookFile) -> Result<()> {
        let text = serde_json::to_string_pretty(file)?;
        lock::write_atomic(&self.path, text.as_bytes())
    }
}

impl SheetClient for FileWorkbook {
    fn records(&self, worksheet: &str) -> Result<Vec<Record>> {
        let file = self.read()?;
        let Some(rows) = file.worksheets.get(worksheet) else {
            tracing::debug!(worksheet, "creating missing worksheet");
            lock::with_lock(&self.path, || {
                let mut file = self.read()?;
                file.worksheets.entry(worksheet.to_string()).or_default();
                self.write(&file)
            })?;
            return Ok(Vec::new());
        };

        let Some((header, data)) = rows.split_first() else {
            return Ok(Vec::new());
        };
        let header: Vec<String> = header.iter().map(cell_text).collect();

        let records = data
            .iter()
            .filter(|row| row.iter().any(|cell| !is_empty_cell(cell)))
            .map(|row| {
                header
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| !name.is_empty())
                    .map(|(idx, name)| {
                        let value = row
                            .get(idx)
                            .cloned()
                            .unwrap_or_else(|| Value::String(String::new()));
                        (name.clone(), value)
                    })
                    .collect::<Record>()
            })
            .collect();
        Ok(records)
    }

    fn replace(&self, worksheet: &str, header: &[String], rows: &[Vec<Value>]) -> Result<()> {
        lock::with_lock(&self.path, || {
            let mut file = self.read()?;
            let mut table = Vec::with_capacity(rows.len() + 1);
            if !header.is_empty() {
                table.push(header.iter().cloned().map(Value::String).collect());
                table.extend(rows.iter().cloned());
            }
            file.worksheets.insert(worksheet.to_string(), table);
            self.write(&file)
        })?;
        tracing::debug!(worksheet, rows = rows.len(), "worksheet rewritten");
        Ok(())
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_empty_cell(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

struct CachedConnection {
    key: PathBuf,
    opened_at: Instant,
    client: Arc<FileWorkbook>,
}

/// Reuses an opened workbook while it is younger than the TTL
#[derive(Default)]
pub struct ConnectionCache {
    slot: Option<CachedConnection>,
}

impl ConnectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_open(
        &mut self,
        key: &Path,
        ttl: Duration,
        now: Instant,
        open: impl FnOnce() -> Result<FileWorkbook>,
    ) -> Result<Arc<FileWorkbook>> {
        if let Some(cached) = &self.slot {
            if cached.key == key && now.saturating_duration_since(cached.opened_at) < ttl {
                return Ok(Arc::clone(&cached.client));
            }
        }

        let client = Arc::new(open()?);
        self.slot = Some(CachedConnection {
            key: key.to_path_buf(),
            opened_at: now,
            client: Arc::clone(&client),
        });
        Ok(client)
    }
}

fn connection_cache() -> &'static Mutex<ConnectionCache> {
    static CACHE: OnceLock<Mutex<ConnectionCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(ConnectionCache::new()))
}

/// Shared workbook connection for the configured path, or `None` when it
/// cannot be opened (the caller falls back to local files).
pub fn connect(config: &SheetConfig, data_dir: &Path) -> Option<Arc<dyn SheetClient>> {
    let path = if config.path.is_absolute() {
        config.path.clone()
    } else {
        data_dir.join(&config.path)
    };
    let ttl = Duration::from_secs(config.connection_ttl_secs);

    let mut cache = match connection_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match cache.get_or_open(&path, ttl, Instant::now(), || {
        FileWorkbook::open(&path, &config.title)
    }) {
        Ok(client) => {
            tracing::debug!(path = %client.path().display(), "workbook connected");
            Some(client as Arc<dyn SheetClient>)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "workbook unavailable, using local files");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_worksheet_is_created_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workbook = FileWorkbook::open(dir.path().join("book.json"), "FlowData").expect("open");

        assert!(workbook.records("Tasks").expect("records").is_empty());
        let text = std::fs::read_to_string(workbook.path()).expect("read");
        assert!(text.contains("\"Tasks\""));
        assert!(text.contains("FlowData"));
    }

    #[test]
    fn replace_then_read_maps_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workbook = FileWorkbook::open(dir.path().join("book.json"), "FlowData").expect("open");

        let header = strings(&["id", "title"]);
        let rows = vec![
            vec![Value::from(1), Value::from("Primeira")],
            vec![Value::from(""), Value::from("")],
            vec![Value::from(2)],
        ];
        workbook.replace("Tasks", &header, &rows).expect("replace");

        let records = workbook.records("Tasks").expect("records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], Value::from("Primeira"));
        assert_eq!(records[1]["id"], Value::from(2));
        assert_eq!(records[1]["title"], Value::from(""));
    }

    #[test]
    fn empty_header_clears_worksheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workbook = FileWorkbook::open(dir.path().join("book.json"), "FlowData").expect("open");
        workbook
            .replace("Updates", &strings(&["id"]), &[vec![Value::from(1)]])
            .expect("replace");
        workbook.replace("Updates", &[], &[]).expect("clear");
        assert!(workbook.records("Updates").expect("records").is_empty());
    }

    #[test]
    fn cache_reuses_until_ttl_expires() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.json");
        let opens = Cell::new(0);
        let open = || {
            opens.set(opens.get() + 1);
            FileWorkbook::open(&path, "FlowData")
        };

        let mut cache = ConnectionCache::new();
        let ttl = Duration::from_secs(600);
        let start = Instant::now();

        cache.get_or_open(&path, ttl, start, open).expect("first");
        cache
            .get_or_open(&path, ttl, start + Duration::from_secs(599), open)
            .expect("cached");
        assert_eq!(opens.get(), 1);

        cache
            .get_or_open(&path, ttl, start + Duration::from_secs(600), open)
            .expect("expired");
        assert_eq!(opens.get(), 2);
    }

    #[test]
    fn cache_reopens_for_a_different_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        let mut cache = ConnectionCache::new();
        let ttl = Duration::from_secs(600);
        let now = Instant::now();

        let a = cache
            .get_or_open(&first, ttl, now, || FileWorkbook::open(&first, "A"))
            .expect("a");
        let b = cache
            .get_or_open(&second, ttl, now, || FileWorkbook::open(&second, "B"))
            .expect("b");
        assert_eq!(a.path(), first.as_path());
        assert_eq!(b.path(), second.as_path());
    }
}
