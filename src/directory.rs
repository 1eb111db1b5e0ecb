//! Employee directory lookup by registration number ("matrícula").
//!
//! The directory is a JSON export of the HR spreadsheet: an array of rows
//! keyed by the spreadsheet's column titles. Lookups are cached per
//! registration number for the configured TTL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::config::DirectoryConfig;
use crate::error::{Error, Result};
use crate::query::title_case;

const COL_ID: &str = "MATRICULA";
const COL_NAME: &str = "COLABORADOR";
const COL_PHONE: &str = "TELEFONE";
const COL_DEPARTMENT: &str = "DIRETORIA";
const COL_TITLE: &str = "DESCRIÇÃO CARGO";
const COL_EMAIL: &str = "EMAIL PARTICULAR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Person {
    pub matricula: String,
    pub name: String,
    pub phone: String,
    pub department: String,
    pub title: String,
    pub email: String,
}

impl Person {
    /// First name in title case, as shown on task cards.
    pub fn display_name(&self) -> Option<String> {
        self.name
            .split_whitespace()
            .next()
            .map(title_case)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    rows: Vec<serde_json::Map<String, Value>>,
}

impl Directory {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(Error::InvalidArgument(
                "directory export must be a JSON array of rows".to_string(),
            ));
        };
        let rows = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact text match on the id column first, then numeric match.
    pub fn lookup(&self, matricula: &str) -> Option<Person> {
        let wanted = matricula.trim();
        if wanted.is_empty() {
            return None;
        }

        let exact = self
            .rows
            .iter()
            .find(|row| cell(row, COL_ID) == wanted);
        let row = exact.or_else(|| {
            let number = as_integer(wanted)?;
            self.rows
                .iter()
                .find(|row| as_integer(&cell(row, COL_ID)) == Some(number))
        })?;

        Some(Person {
            matricula: wanted.to_string(),
            name: cell(row, COL_NAME),
            phone: cell(row, COL_PHONE),
            department: cell(row, COL_DEPARTMENT),
            title: cell(row, COL_TITLE),
            email: cell(row, COL_EMAIL),
        })
    }
}

fn cell(row: &serde_json::Map<String, Value>, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(int) => int.to_string(),
            None => number.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn as_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

struct CachedLookup {
    at: Instant,
    person: Option<Person>,
}

/// Lookup results keyed by (directory path, matrícula)
#[derive(Default)]
pub struct LookupCache {
    entries: HashMap<(PathBuf, String), CachedLookup>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(
        &mut self,
        path: &Path,
        matricula: &str,
        ttl: Duration,
        now: Instant,
    ) -> Option<Person> {
        let key = (path.to_path_buf(), matricula.trim().to_string());
        if let Some(hit) = self.entries.get(&key) {
            if now.saturating_duration_since(hit.at) < ttl {
                return hit.person.clone();
            }
        }

        let person = match Directory::load(path) {
            Ok(directory) => directory.lookup(matricula),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "directory unavailable");
                None
            }
        };
        self.entries.insert(
            key,
            CachedLookup {
                at: now,
                person: person.clone(),
            },
        );
        person
    }
}

fn lookup_cache() -> &'static Mutex<LookupCache> {
    static CACHE: OnceLock<Mutex<LookupCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(LookupCache::new()))
}

/// Cached lookup against the configured directory. A missing or unreadable
/// directory yields `None`.
pub fn find_person(config: &DirectoryConfig, data_dir: &Path, matricula: &str) -> Option<Person> {
    if matricula.trim().is_empty() {
        return None;
    }
    let path = if config.path.is_absolute() {
        config.path.clone()
    } else {
        data_dir.join(&config.path)
    };
    let mut cache = match lookup_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache.lookup(
        &path,
        matricula,
        Duration::from_secs(config.cache_ttl_secs),
        Instant::now(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"MATRICULA": "0012345", "COLABORADOR": "MARIA APARECIDA SOUZA", "TELEFONE": "(14) 99999-0000",
         "DIRETORIA": "Administrativa", "DESCRIÇÃO CARGO": "Analista", "EMAIL PARTICULAR": "maria@example.com"},
        {"MATRICULA": 2949400, "COLABORADOR": "maicon  ", "TELEFONE": null}
    ]"#;

    #[test]
    fn exact_text_match_wins() {
        let directory = Directory::from_json(EXPORT).expect("parse");
        let person = directory.lookup(" 0012345 ").expect("found");
        assert_eq!(person.name, "MARIA APARECIDA SOUZA");
        assert_eq!(person.department, "Administrativa");
        assert_eq!(person.title, "Analista");
        assert_eq!(person.display_name().as_deref(), Some("Maria"));
    }

    #[test]
    fn numeric_match_is_the_fallback() {
        let directory = Directory::from_json(EXPORT).expect("parse");
        assert_eq!(directory.lookup("12345").expect("found").email, "maria@example.com");

        let maicon = directory.lookup("2949400.0").expect("found");
        assert_eq!(maicon.name, "maicon");
        assert_eq!(maicon.phone, "");
        assert_eq!(maicon.matricula, "2949400.0");
    }

    #[test]
    fn unknown_or_blank_is_none() {
        let directory = Directory::from_json(EXPORT).expect("parse");
        assert!(directory.lookup("999").is_none());
        assert!(directory.lookup("  ").is_none());
    }

    #[test]
    fn cache_holds_results_for_ttl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gestores.json");
        std::fs::write(&path, EXPORT).expect("write");

        let mut cache = LookupCache::new();
        let ttl = Duration::from_secs(3600);
        let start = Instant::now();
        assert!(cache.lookup(&path, "0012345", ttl, start).is_some());

        std::fs::write(&path, "[]").expect("rewrite");
        assert!(cache
            .lookup(&path, "0012345", ttl, start + Duration::from_secs(10))
            .is_some());
        assert!(cache
            .lookup(&path, "0012345", ttl, start + Duration::from_secs(3600))
            .is_none());
    }

    #[test]
    fn missing_directory_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DirectoryConfig {
            path: PathBuf::from("absent.json"),
            cache_ttl_secs: 60,
        };
        assert!(find_person(&config, dir.path(), "1").is_none());
    }
}
