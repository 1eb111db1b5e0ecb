//! Timestamped comments attached to a task.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Suffix appended to the timestamp of an edited update
pub const EDIT_MARKER: &str = " (editado)";
const EDIT_MARKERS: [&str; 2] = ["(editado)", "(edited)"];

/// Number of content characters that feed a legacy id
const LEGACY_CONTENT_PREFIX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task_id: i64,
    pub content: String,
    pub timestamp: String,
    pub user: String,
    pub id: i64,
}

impl TaskUpdate {
    pub fn new(
        task_id: i64,
        content: &str,
        user: impl Into<String>,
        timestamp: impl Into<String>,
        id: i64,
    ) -> Result<Self> {
        Ok(Self {
            task_id,
            content: clean_content(content)?,
            timestamp: timestamp.into(),
            user: user.into(),
            id,
        })
    }

    /// Replace the content and stamp the edit time with the edit marker.
    pub fn edit(&mut self, content: &str, now: &str) -> Result<()> {
        self.content = clean_content(content)?;
        self.timestamp = format!("{now}{EDIT_MARKER}");
        Ok(())
    }

    pub fn is_edited(&self) -> bool {
        EDIT_MARKERS
            .iter()
            .any(|marker| self.timestamp.contains(marker))
    }

    /// Timestamp with any edit marker removed
    pub fn bare_timestamp(&self) -> &str {
        let mut stamp = self.timestamp.as_str();
        for marker in EDIT_MARKERS {
            stamp = stamp.trim_end().trim_end_matches(marker);
        }
        stamp.trim_end()
    }
}

fn clean_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::Validation("update content cannot be empty".to_string()));
    }
    Ok(content.to_string())
}

/// Derive an id for a stored update that never had one.
///
/// Deterministic for a fixed `(task_id, timestamp, content, index)` and
/// confined to the positive 31-bit range. Collisions are possible.
pub fn legacy_id(task_id: &str, timestamp: &str, content: &str, index: usize) -> i64 {
    let prefix: String = content.chars().take(LEGACY_CONTENT_PREFIX).collect();
    let key = format!("{task_id}_{timestamp}_{prefix}_{index}");
    let digest = Sha256::digest(key.as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    i64::from(word & 0x7FFF_FFFF)
}

/// Log (but keep) duplicate ids within an update collection.
pub fn warn_on_duplicate_ids(updates: &[TaskUpdate]) {
    let mut seen = std::collections::HashSet::new();
    for update in updates {
        if !seen.insert(update.id) {
            tracing::warn!(id = update.id, task_id = update.task_id, "duplicate update id");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_id_is_deterministic_and_index_sensitive() {
        let a = legacy_id("17", "2025-01-02 10:00:00", "Enviado e-mail para a instituição", 0);
        let b = legacy_id("17", "2025-01-02 10:00:00", "Enviado e-mail para a instituição", 0);
        let c = legacy_id("17", "2025-01-02 10:00:00", "Enviado e-mail para a instituição", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a >= 0 && a <= 0x7FFF_FFFF);
    }

    #[test]
    fn legacy_id_only_reads_content_prefix() {
        let a = legacy_id("1", "t", "01234567890123456789-tail-one", 0);
        let b = legacy_id("1", "t", "01234567890123456789-tail-two", 0);
        assert_eq!(a, b);
    }

    #[test]
    fn edit_marks_timestamp() {
        let mut update = TaskUpdate::new(1, "first", "Maicon", "2025-01-02 10:00:00", 5)
            .expect("update");
        assert!(!update.is_edited());

        update.edit("  second  ", "2025-01-03 09:00:00").expect("edit");
        assert_eq!(update.content, "second");
        assert_eq!(update.timestamp, "2025-01-03 09:00:00 (editado)");
        assert!(update.is_edited());
        assert_eq!(update.bare_timestamp(), "2025-01-03 09:00:00");
    }

    #[test]
    fn english_marker_is_recognized() {
        let update = TaskUpdate {
            task_id: 1,
            content: "x".to_string(),
            timestamp: "2025-01-02 10:00:00 (edited)".to_string(),
            user: "Maicon".to_string(),
            id: 1,
        };
        assert!(update.is_edited());
        assert_eq!(update.bare_timestamp(), "2025-01-02 10:00:00");
    }

    #[test]
    fn empty_content_is_rejected() {
        let err = TaskUpdate::new(1, "  ", "Maicon", "now", 1).expect_err("empty");
        assert!(matches!(err, Error::Validation(_)));
    }
}
