//! flow - task tracking for small teams
//!
//! This library provides the core functionality for the flow CLI tool:
//! tasks with per-task update logs, user-owned categories and purchase
//! requests, persisted per identity in JSON files or in a shared workbook.
//!
//! # Core Concepts
//!
//! - **Identities**: a primary analyst, other members, and managers with
//!   aggregated read access and feedback-only writes
//! - **Stores**: one collection file per identity (`flow_data_<key>.json`)
//!   or one worksheet per collection in a workbook
//! - **Categories**: a default set plus private categories owned by their
//!   creator, addressed by a canonical key
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `flow.toml`
//! - `error`: Error types and result aliases
//! - `task`, `update`, `category`, `request`: entity model
//! - `codec`: JSON and worksheet row encodings
//! - `storage`: Persistence gateway over local files or a workbook
//! - `sheet`: Workbook client abstraction and connection cache
//! - `lock`: File locking and atomic writes
//! - `query`: Stats, follow-up, calendar, schedule and filters
//! - `policy`: Visibility and edit rules per identity

pub mod attachments;
pub mod attendance;
pub mod auth;
pub mod category;
pub mod cli;
pub mod codec;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod identity;
pub mod lock;
pub mod output;
pub mod policy;
pub mod pylist;
pub mod query;
pub mod request;
pub mod sanitize;
pub mod sheet;
pub mod storage;
pub mod task;
pub mod update;

pub use error::{Error, Result};
