//! flow request command implementation

use crate::cli::Globals;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::request::RequestRc;

/// Options for `flow request add`
pub struct AddOptions {
    pub description: String,
    pub rc_code: Option<String>,
    pub buyer: Option<String>,
    pub subelement: Option<String>,
}

#[derive(serde::Serialize)]
struct RequestReport<'a> {
    request: &'a RequestRc,
}

#[derive(serde::Serialize)]
struct RequestListReport<'a> {
    requests: &'a [RequestRc],
}

pub fn run_add(globals: &Globals, options: AddOptions) -> Result<()> {
    let ctx = globals.context()?;
    let today = ctx.today;
    let request = ctx.storage.add_request(|id| {
        let mut request = RequestRc::new(&options.description, id, today)?;
        if let Some(code) = options.rc_code {
            request.rc_code = code.trim().to_string();
        }
        if let Some(buyer) = options.buyer {
            request.buyer = buyer.trim().to_string();
        }
        if let Some(subelement) = options.subelement.filter(|s| !s.trim().is_empty()) {
            request.subelement = subelement.trim().to_string();
        }
        Ok(request)
    })?;

    let mut human = HumanOutput::new(format!("flow request add: #{}", request.id));
    human.push_summary("situation", request.situation.clone());
    human.push_summary("tracking", request.nf_tracking.clone());
    emit_success(
        globals.output(),
        "request add",
        &RequestReport { request: &request },
        Some(&human),
    )
}

pub fn run_list(globals: &Globals) -> Result<()> {
    let ctx = globals.context()?;
    let requests = ctx.storage.load_requests();

    let mut human = HumanOutput::new(format!("flow request list: {} request(s)", requests.len()));
    for request in &requests {
        human.push_detail(format!(
            "#{} [{}] {} | {} | opened {}",
            request.id, request.situation, request.description, request.subelement, request.date_opening
        ));
    }
    emit_success(
        globals.output(),
        "request list",
        &RequestListReport {
            requests: &requests,
        },
        Some(&human),
    )
}
