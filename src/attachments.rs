//! Attachment files stored under the uploads directory.
//!
//! Tasks reference attachments by path relative to the data directory,
//! e.g. `uploads/1741795200_orcamento.pdf`.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::task::Task;

/// Copy `source` into `data_dir/uploads_rel` as `{secs}_{filename}` and
/// return the stored path relative to `data_dir`.
pub fn store_attachment(
    data_dir: &Path,
    uploads_rel: &Path,
    source: &Path,
    unix_secs: u64,
) -> Result<String> {
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::InvalidArgument(format!("not a file: {}", source.display()))
        })?;
    if !source.is_file() {
        return Err(Error::InvalidArgument(format!(
            "attachment not found: {}",
            source.display()
        )));
    }

    let upload_dir = data_dir.join(uploads_rel);
    std::fs::create_dir_all(&upload_dir)?;

    let mut stored = format!("{unix_secs}_{file_name}");
    let mut attempt = 1;
    while upload_dir.join(&stored).exists() {
        stored = format!("{unix_secs}_{attempt}_{file_name}");
        attempt += 1;
    }

    let target = upload_dir.join(&stored);
    std::fs::copy(source, &target)?;
    tracing::debug!(target = %target.display(), "stored attachment");

    Ok(relative_display(&uploads_rel.join(stored)))
}

/// Attachment references whose file no longer exists.
pub fn missing_attachments(data_dir: &Path, task: &Task) -> Vec<String> {
    task.attachments
        .iter()
        .filter(|reference| !resolve(data_dir, reference).exists())
        .cloned()
        .collect()
}

/// Absolute location of an attachment reference.
pub fn resolve(data_dir: &Path, reference: &str) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

// Stored references always use forward slashes.
fn relative_display(path: &Path) -> String {
    path.components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
