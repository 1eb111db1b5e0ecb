//! flow login / logout / whoami

use crate::auth;
use crate::cli::Globals;
use crate::context::{self, AppContext};
use crate::error::Result;
use crate::identity::{self, Identity, Role};
use crate::output::{emit_success, HumanOutput};

#[derive(serde::Serialize)]
struct SessionReport {
    identity: Identity,
    backend: &'static str,
}

#[derive(serde::Serialize)]
struct LogoutReport {
    cleared: bool,
}

pub fn run_login(globals: &Globals, key: &str, secret: &str) -> Result<()> {
    let data_dir = context::resolve_data_dir(globals.data_dir.clone());
    let config = context::load_config(&data_dir, globals.config.as_deref())?;

    let signed_in = auth::authenticate(&config, key, secret)?;
    identity::persist_session(&data_dir, &signed_in)?;
    tracing::info!(identity = %signed_in, "signed in");

    let ctx = AppContext::for_key(data_dir, config, &signed_in);
    let mut human = HumanOutput::new(format!(
        "flow login: signed in as {}",
        ctx.identity.display_name
    ));
    push_identity(&mut human, &ctx);
    human.push_next_step("flow task list");

    emit_success(
        globals.output(),
        "login",
        &SessionReport {
            identity: ctx.identity.clone(),
            backend: ctx.storage.backend_name(),
        },
        Some(&human),
    )
}

pub fn run_logout(globals: &Globals) -> Result<()> {
    let data_dir = context::resolve_data_dir(globals.data_dir.clone());
    let cleared = identity::clear_session(&data_dir)?;

    let header = if cleared {
        "flow logout: session cleared"
    } else {
        "flow logout: no active session"
    };
    let human = HumanOutput::new(header);
    emit_success(globals.output(), "logout", &LogoutReport { cleared }, Some(&human))
}

pub fn run_whoami(globals: &Globals) -> Result<()> {
    let ctx = globals.context()?;

    let mut human = HumanOutput::new(format!("flow whoami: {}", ctx.identity.display_name));
    push_identity(&mut human, &ctx);
    if ctx.identity.is_manager() {
        human.push_warning("manager identities can only set feedback");
    }

    emit_success(
        globals.output(),
        "whoami",
        &SessionReport {
            identity: ctx.identity.clone(),
            backend: ctx.storage.backend_name(),
        },
        Some(&human),
    )
}

fn push_identity(human: &mut HumanOutput, ctx: &AppContext) {
    let role = match ctx.identity.role {
        Role::Primary => "primary",
        Role::Member => "member",
        Role::Manager => "manager",
    };
    human.push_summary("key", ctx.identity.key.clone());
    human.push_summary("role", role);
    if ctx.identity.category_admin {
        human.push_summary("category admin", "yes");
    }
    human.push_summary("backend", ctx.storage.backend_name());
}
