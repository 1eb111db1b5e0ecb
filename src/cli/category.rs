//! flow category command implementation

use crate::category::{Category, CategoryKey};
use crate::cli::Globals;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::policy;

#[derive(serde::Serialize)]
struct CategoryEntry<'a> {
    key: &'a CategoryKey,
    #[serde(flatten)]
    category: &'a Category,
    deletable: bool,
}

#[derive(serde::Serialize)]
struct CategoryListReport<'a> {
    categories: Vec<CategoryEntry<'a>>,
}

#[derive(serde::Serialize)]
struct CategoryReport<'a> {
    key: &'a CategoryKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a Category>,
}

pub fn run_list(globals: &Globals) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();

    let categories: Vec<CategoryEntry<'_>> = book
        .visible_to(&ctx.identity)
        .into_iter()
        .map(|(key, category)| CategoryEntry {
            key,
            category,
            deletable: policy::can_delete_category(&ctx.identity, key, category),
        })
        .collect();

    let mut human = HumanOutput::new(format!(
        "flow category list: {} categor{}",
        categories.len(),
        if categories.len() == 1 { "y" } else { "ies" }
    ));
    for entry in &categories {
        let owner = entry.category.owner.as_deref().unwrap_or("-");
        human.push_detail(format!(
            "{} ({}, owner {owner}{})",
            entry.key,
            entry.category.color,
            if entry.deletable { ", deletable" } else { "" }
        ));
    }
    if categories.is_empty() {
        human.push_next_step("flow category add <name>");
    }

    emit_success(
        globals.output(),
        "category list",
        &CategoryListReport { categories },
        Some(&human),
    )
}

pub fn run_add(globals: &Globals, icon: &str, name: &str) -> Result<()> {
    let ctx = globals.context()?;
    let key = ctx.storage.add_category(icon, name)?;
    let book = ctx.categories();

    let mut human = HumanOutput::new(format!("flow category add: {key}"));
    if let Some(category) = book.get(&key) {
        human.push_summary("color", category.color.clone());
    }
    emit_success(
        globals.output(),
        "category add",
        &CategoryReport {
            key: &key,
            category: book.get(&key),
        },
        Some(&human),
    )
}

pub fn run_delete(globals: &Globals, reference: &str) -> Result<()> {
    let ctx = globals.context()?;
    let book = ctx.categories();
    let key = book
        .iter()
        .find(|(key, category)| key.as_str() == reference.trim() || category.name == reference.trim())
        .map(|(key, _)| key.clone())
        .ok_or_else(|| Error::CategoryNotFound(reference.to_string()))?;

    let removed = ctx.storage.delete_category(&key)?;
    let mut human = HumanOutput::new(format!("flow category delete: {key}"));
    human.push_summary("name", removed.name.clone());
    emit_success(
        globals.output(),
        "category delete",
        &CategoryReport {
            key: &key,
            category: Some(&removed),
        },
        Some(&human),
    )
}
