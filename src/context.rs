//! Per-invocation state: config, identity, storage and the current date.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::category::CategoryBook;
use crate::config::{Config, CONFIG_FILENAME};
use crate::error::Result;
use crate::identity::{self, Identity};
use crate::policy;
use crate::storage::Storage;
use crate::task::{self, Task};

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub identity: Identity,
    pub storage: Storage,
    pub today: NaiveDate,
}

impl AppContext {
    /// Resolve the data directory, config and identity, then open storage.
    pub fn load(
        data_dir: Option<PathBuf>,
        config_path: Option<&Path>,
        user: Option<&str>,
    ) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir);
        let config = load_config(&data_dir, config_path)?;
        let key = identity::resolve_key(&data_dir, user, &config)?;
        Ok(Self::for_key(data_dir, config, &key))
    }

    pub fn for_key(data_dir: PathBuf, config: Config, key: &str) -> Self {
        let identity = Identity::from_key(key, &config);
        tracing::debug!(identity = %identity.key, role = ?identity.role, "resolved identity");
        let storage = Storage::open(data_dir.clone(), identity.clone(), &config);
        Self {
            config,
            data_dir,
            identity,
            storage,
            today: task::today(),
        }
    }

    /// Tasks this identity may see.
    pub fn visible_tasks(&self) -> Vec<Task> {
        policy::visible_tasks(&self.identity, self.storage.load_tasks())
    }

    pub fn categories(&self) -> CategoryBook {
        self.storage.load_categories()
    }
}

pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// An explicit config path must load; the implicit lookup falls back to
/// defaults.
pub fn load_config(data_dir: &Path, explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(Config::load_from_dir(data_dir)),
    }
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}
