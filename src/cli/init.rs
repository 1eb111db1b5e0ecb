//! flow init command implementation
//!
//! Creates the data directory, a default flow.toml and the session directory.

use std::path::{Path, PathBuf};

use crate::cli::Globals;
use crate::config::Config;
use crate::context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(serde::Serialize)]
struct InitReport {
    data_dir: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    data_dir: bool,
    config: bool,
    session_dir: bool,
    uploads_dir: bool,
}

pub fn run(globals: &Globals, force: bool) -> Result<()> {
    let data_dir = context::resolve_data_dir(globals.data_dir.clone());

    let created_data_dir = ensure_dir(&data_dir)?;
    let config_path = globals
        .config
        .clone()
        .unwrap_or_else(|| context::config_path(&data_dir));
    let created_config = ensure_config(&config_path, force)?;
    let config = context::load_config(&data_dir, Some(&config_path))?;
    let created_session_dir = ensure_dir(&data_dir.join(".flow"))?;
    let created_uploads_dir = ensure_dir(&data_dir.join(&config.uploads.dir))?;

    let report = InitReport {
        data_dir: data_dir.clone(),
        created: InitCreated {
            data_dir: created_data_dir,
            config: created_config,
            session_dir: created_session_dir,
            uploads_dir: created_uploads_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_data_dir {
        created_items.push(data_dir.display().to_string());
    }
    if created_config {
        created_items.push(config_path.display().to_string());
    }
    if created_session_dir {
        created_items.push(".flow/".to_string());
    }
    if created_uploads_dir {
        created_items.push(format!("{}/", config.uploads.dir.display()));
    }

    let header = if created_items.is_empty() {
        "flow init: nothing to do".to_string()
    } else {
        "flow init: initialized data directory".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("data dir", data_dir.display().to_string());
    human.push_summary("backend", format!("{:?}", config.backend).to_lowercase());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("flow login <key> --secret <secret>");
    human.push_next_step("flow task new \"<title>\"");

    emit_success(globals.output(), "init", &report, Some(&human))?;

    Ok(())
}

fn ensure_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Config::default().save(path)?;
    tracing::info!(path = %path.display(), "wrote default config");
    Ok(true)
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    Ok(true)
}
