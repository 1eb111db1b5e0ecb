//! Configuration loading and management
//!
//! Handles parsing of `flow.toml` configuration files. Every field has a
//! default, so a missing file yields the built-in deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILENAME: &str = "flow.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend selected once per process
    #[serde(default)]
    pub backend: BackendKind,

    /// Identity and role configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Known users and their shared secrets
    #[serde(default = "default_users")]
    pub users: Vec<UserEntry>,

    /// Workbook (spreadsheet) backend configuration
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Employee directory lookup
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Attachment uploads
    #[serde(default)]
    pub uploads: UploadsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            identity: IdentityConfig::default(),
            users: default_users(),
            sheet: SheetConfig::default(),
            directory: DirectoryConfig::default(),
            uploads: UploadsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per collection per identity
    #[default]
    Local,
    /// One shared workbook with a worksheet per collection
    Sheet,
}

/// Identity-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Default identity; owns the un-suffixed files
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Identities with aggregated read access and feedback-only writes
    #[serde(default = "default_managers")]
    pub managers: Vec<String>,

    /// Identities allowed to delete any non-default category
    #[serde(default = "default_category_admins")]
    pub category_admins: Vec<String>,

    /// Login alias that signs in as the privileged identity
    #[serde(default = "default_manager_alias")]
    pub manager_alias: String,

    /// Secret accepted for the manager alias
    #[serde(default = "default_manager_alias_secret")]
    pub manager_alias_secret: String,

    /// Identity the manager alias resolves to
    #[serde(default = "default_manager_identity")]
    pub manager_identity: String,

    /// Author recorded on updates when the identity has no display name
    #[serde(default = "default_author")]
    pub default_author: String,
}

fn default_primary() -> String {
    "2949400".to_string()
}

fn default_managers() -> Vec<String> {
    vec!["2484901".to_string(), "GESTAO".to_string()]
}

fn default_category_admins() -> Vec<String> {
    vec!["2949400".to_string(), "2484901".to_string()]
}

fn default_manager_alias() -> String {
    "gestao".to_string()
}

fn default_manager_alias_secret() -> String {
    "gestao".to_string()
}

fn default_manager_identity() -> String {
    "GESTAO".to_string()
}

fn default_author() -> String {
    "Maicon".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            managers: default_managers(),
            category_admins: default_category_admins(),
            manager_alias: default_manager_alias(),
            manager_alias_secret: default_manager_alias_secret(),
            manager_identity: default_manager_identity(),
            default_author: default_author(),
        }
    }
}

/// A known user: login key, display name and shared secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub secret: String,
}

impl UserEntry {
    fn new(key: &str, name: &str, secret: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            secret: secret.to_string(),
        }
    }
}

fn default_users() -> Vec<UserEntry> {
    vec![
        UserEntry::new("2949400", "Maicon", "Cocal@2025"),
        UserEntry::new("2858700", "Kherolainy", "Cocal@2025"),
        UserEntry::new("2791900", "Maria", "Cocal@2025"),
        UserEntry::new("2944000", "Davi", "Cocal@2025"),
        UserEntry::new("2484901", "Gestora", "gestao@2025"),
    ]
}

/// Workbook backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Workbook file, relative to the data directory
    #[serde(default = "default_sheet_path")]
    pub path: PathBuf,

    /// Workbook title, created on first connection
    #[serde(default = "default_sheet_title")]
    pub title: String,

    /// How long an opened connection is reused
    #[serde(default = "default_connection_ttl")]
    pub connection_ttl_secs: u64,
}

fn default_sheet_path() -> PathBuf {
    PathBuf::from("flow_workbook.json")
}

fn default_sheet_title() -> String {
    "FlowData".to_string()
}

fn default_connection_ttl() -> u64 {
    600
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            path: default_sheet_path(),
            title: default_sheet_title(),
            connection_ttl_secs: default_connection_ttl(),
        }
    }
}

/// Employee directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory export, relative to the data directory
    #[serde(default = "default_directory_path")]
    pub path: PathBuf,

    /// How long a loaded directory is reused
    #[serde(default = "default_directory_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("gestores.json")
}

fn default_directory_ttl() -> u64 {
    3600
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: default_directory_path(),
            cache_ttl_secs: default_directory_ttl(),
        }
    }
}

/// Attachment upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_uploads_dir")]
    pub dir: PathBuf,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `flow.toml` from the data directory, then the per-user config
    /// directory, falling back to defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let local = data_dir.join(CONFIG_FILENAME);
        if local.exists() {
            return Self::load(&local).unwrap_or_else(|err| {
                tracing::warn!(path = %local.display(), error = %err, "ignoring invalid config");
                Self::default()
            });
        }

        if let Some(user_config) = user_config_path() {
            if user_config.exists() {
                return Self::load(&user_config).unwrap_or_default();
            }
        }

        Self::default()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Display name configured for an identity key
    pub fn user_name(&self, key: &str) -> Option<&str> {
        self.users
            .iter()
            .find(|user| user.key == key)
            .map(|user| user.name.as_str())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.identity.primary.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "identity.primary cannot be empty".to_string(),
            ));
        }
        if self.identity.manager_identity.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "identity.manager_identity cannot be empty".to_string(),
            ));
        }
        for user in &self.users {
            if user.key.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "users[].key cannot be empty".to_string(),
                ));
            }
        }
        if self.sheet.connection_ttl_secs == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "sheet.connection_ttl_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "flow")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.backend, BackendKind::Local);
        assert_eq!(cfg.identity.primary, "2949400");
        assert_eq!(
            cfg.identity.managers,
            vec!["2484901".to_string(), "GESTAO".to_string()]
        );
        assert_eq!(cfg.identity.manager_alias, "gestao");
        assert_eq!(cfg.identity.default_author, "Maicon");
        assert_eq!(cfg.users.len(), 5);
        assert_eq!(cfg.user_name("2858700"), Some("Kherolainy"));
        assert_eq!(cfg.sheet.connection_ttl_secs, 600);
        assert_eq!(cfg.directory.cache_ttl_secs, 3600);
        assert_eq!(cfg.uploads.dir, PathBuf::from("uploads"));
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        let content = r#"
backend = "sheet"

[identity]
primary = "100"
managers = ["900"]

[[users]]
key = "100"
name = "Ana"
secret = "s3cret"

[sheet]
path = "team.json"
connection_ttl_secs = 30
"#;
        fs::write(&path, content).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.backend, BackendKind::Sheet);
        assert_eq!(cfg.identity.primary, "100");
        assert_eq!(cfg.identity.managers, vec!["900".to_string()]);
        assert_eq!(cfg.identity.manager_alias, "gestao");
        assert_eq!(cfg.users.len(), 1);
        assert_eq!(cfg.user_name("100"), Some("Ana"));
        assert_eq!(cfg.sheet.path, PathBuf::from("team.json"));
        assert_eq!(cfg.sheet.title, "FlowData");
        assert_eq!(cfg.sheet.connection_ttl_secs, 30);
    }

    #[test]
    fn invalid_identity_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[identity]\nprimary = \"  \"\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid");
        assert!(matches!(err, crate::error::Error::InvalidConfig(_)));
    }

    #[test]
    fn load_from_dir_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILENAME), "backend = \"sheet\"").expect("write config");

        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.backend, BackendKind::Sheet);
    }

    #[test]
    fn load_from_dir_ignores_invalid_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILENAME), "backend = [nope").expect("write config");

        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.backend, BackendKind::Local);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("backend = \"local\""));
        assert!(written.contains("[identity]"));
    }
}
