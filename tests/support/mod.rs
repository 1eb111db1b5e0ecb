#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Primary analyst in the built-in config
pub const PRIMARY: &str = "2949400";
/// Ordinary analyst
pub const MEMBER: &str = "2858700";
/// Manager identity
pub const MANAGER: &str = "GESTAO";

pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_json(&self, rel_path: &str) -> Value {
        let text = fs::read_to_string(self.dir.path().join(rel_path)).expect("read store");
        serde_json::from_str(&text).expect("parse store")
    }

    /// `flow` bound to this data directory, acting as `user`.
    pub fn flow_as(&self, user: &str) -> Command {
        let mut cmd = Command::cargo_bin("flow").expect("binary");
        cmd.env_remove("FLOW_USER")
            .env_remove("FLOW_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.dir.path())
            .arg("--user")
            .arg(user);
        cmd
    }

    pub fn flow(&self) -> Command {
        self.flow_as(PRIMARY)
    }

    /// Run with `--json` and return the envelope.
    pub fn json_as(&self, user: &str, args: &[&str]) -> Value {
        let output = self
            .flow_as(user)
            .arg("--json")
            .args(args)
            .output()
            .expect("run flow");
        assert!(
            output.status.success(),
            "flow {args:?} failed: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    pub fn json(&self, args: &[&str]) -> Value {
        self.json_as(PRIMARY, args)
    }

    /// Create a task as `user` and return its id.
    pub fn new_task(&self, user: &str, args: &[&str]) -> i64 {
        let mut full = vec!["task", "new"];
        full.extend_from_slice(args);
        let envelope = self.json_as(user, &full);
        envelope["data"]["task"]["id"].as_i64().expect("task id")
    }
}
