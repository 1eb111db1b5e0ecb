//! Procurement requests (RC). Independent of tasks.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task;

fn default_subelement() -> String {
    "RC".to_string()
}

fn default_situation() -> String {
    "Pendente".to_string()
}

fn default_nf_tracking() -> String {
    "Aguardando recebimento".to_string()
}

fn default_date() -> String {
    task::format_date(task::today())
}

fn default_id() -> i64 {
    task::fresh_id()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRc {
    #[serde(default = "default_subelement")]
    pub subelement: String,
    #[serde(default = "default_date")]
    pub date_opening: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rc_code: String,
    #[serde(default)]
    pub buyer: String,
    #[serde(default = "default_situation")]
    pub situation: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub po_number: String,
    #[serde(default = "default_nf_tracking")]
    pub nf_tracking: String,
    #[serde(default)]
    pub nf_attachments: Vec<String>,
    #[serde(default = "default_id")]
    pub id: i64,
    #[serde(default = "default_date")]
    pub created_at: String,
}

impl RequestRc {
    /// New request with the stock subelement, situation and tracking text.
    pub fn new(description: &str, id: i64, today: chrono::NaiveDate) -> Result<Self> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::Validation(
                "request description cannot be empty".to_string(),
            ));
        }
        let date = task::format_date(today);
        Ok(Self {
            subelement: default_subelement(),
            date_opening: date.clone(),
            description: description.to_string(),
            rc_code: String::new(),
            buyer: String::new(),
            situation: default_situation(),
            attachments: Vec::new(),
            po_number: String::new(),
            nf_tracking: default_nf_tracking(),
            nf_attachments: Vec::new(),
            id,
            created_at: date,
        })
    }
}
