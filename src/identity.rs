//! Identity resolution and roles.
//!
//! Identity resolution order:
//! 1) CLI --user (explicit)
//! 2) FLOW_USER environment variable
//! 3) Persisted session in `.flow/session`
//! 4) Config primary identity

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock;

const SESSION_DIR: &str = ".flow";
const SESSION_FILENAME: &str = "session";

/// What an identity is allowed to see and touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns the un-suffixed stores and the legacy owner-less categories
    Primary,
    /// Ordinary analyst with identity-suffixed stores
    Member,
    /// Aggregated read access, feedback-only writes
    Manager,
}

/// A resolved identity: login key plus role and display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub key: String,
    pub role: Role,
    pub display_name: String,
    /// May delete categories owned by others
    pub category_admin: bool,
}

impl Identity {
    /// Classify a key against the configured role tables.
    pub fn from_key(key: &str, config: &Config) -> Self {
        let key = key.trim().to_string();
        let role = if config.identity.managers.iter().any(|m| m == &key) {
            Role::Manager
        } else if key == config.identity.primary {
            Role::Primary
        } else {
            Role::Member
        };
        let display_name = match config.user_name(&key) {
            Some(name) => name.to_string(),
            None if role == Role::Manager => "Gestão".to_string(),
            None => key.clone(),
        };
        let category_admin = config.identity.category_admins.iter().any(|a| a == &key);
        Self {
            key,
            role,
            display_name,
            category_admin,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Primary and manager identities see every category and task in scope.
    pub fn is_privileged(&self) -> bool {
        matches!(self.role, Role::Primary | Role::Manager)
    }

    /// Suffix appended to store names; empty for the primary identity.
    pub fn store_suffix(&self) -> String {
        if self.is_primary() {
            String::new()
        } else {
            format!("_{}", self.key)
        }
    }
}

/// Resolve the current identity key using CLI, environment, session and config.
pub fn resolve_key(data_dir: &Path, cli_user: Option<&str>, config: &Config) -> Result<String> {
    if let Some(user) = non_empty(cli_user) {
        return Ok(user.to_string());
    }

    if let Ok(env_user) = std::env::var("FLOW_USER") {
        if let Some(user) = non_empty(Some(env_user.as_str())) {
            return Ok(user.to_string());
        }
    }

    if let Some(user) = load_session(data_dir)? {
        return Ok(user);
    }

    Ok(config.identity.primary.clone())
}

/// Persist the signed-in identity in `.flow/session`.
pub fn persist_session(data_dir: &Path, key: &str) -> Result<()> {
    let key = non_empty(Some(key))
        .ok_or_else(|| Error::InvalidArgument("identity cannot be empty".to_string()))?;

    lock::write_atomic(session_path(data_dir), format!("{key}\n").as_bytes())
}

/// Load the signed-in identity, if present.
pub fn load_session(data_dir: &Path) -> Result<Option<String>> {
    let Some(raw) = lock::read_optional(&session_path(data_dir))? else {
        return Ok(None);
    };
    let key = raw.trim();
    if key.is_empty() {
        return Ok(None);
    }

    Ok(Some(key.to_string()))
}

/// Remove the persisted session. Returns whether one existed.
pub fn clear_session(data_dir: &Path) -> Result<bool> {
    let path = session_path(data_dir);
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    Ok(true)
}

pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_DIR).join(SESSION_FILENAME)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
