//! Credential check against the configured user table.
//!
//! Secrets are compared as plain strings; there is no hashing and no
//! external identity provider.

use crate::config::Config;
use crate::error::{Error, Result};

/// Check a login attempt and return the identity key to sign in as.
///
/// The manager alias (case-insensitive) signs in as the configured manager
/// identity; any other key must match an entry in the user table.
pub fn authenticate(config: &Config, key: &str, secret: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidArgument("identity cannot be empty".to_string()));
    }

    let alias = &config.identity.manager_alias;
    if !alias.is_empty()
        && key.eq_ignore_ascii_case(alias)
        && secret == config.identity.manager_alias_secret
    {
        return Ok(config.identity.manager_identity.clone());
    }

    let matched = config
        .users
        .iter()
        .any(|user| user.key == key && !user.secret.is_empty() && user.secret == secret);
    if matched {
        Ok(key.to_string())
    } else {
        tracing::debug!(identity = key, "credential check failed");
        Err(Error::AuthenticationFailed(key.to_string()))
    }
}
