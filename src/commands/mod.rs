// Declarative apply
pub mod apply;

// Settings and session
pub mod configure;
pub mod login;

// Resource commands
pub mod certs;
pub mod events;
pub mod instances;
pub mod integration_keys;
pub mod keys;
pub mod matrix;
pub mod policies;
pub mod service_groups;
pub mod services;

use crate::Context;
use crate::auth::TokenStore;
use crate::config::Settings;
use crate::{paths, ui};
use anyhow::Result;
use provision::Credentials;
use restkit::{Gateway, HttpTransport};
use serde_json::Value;

/// Resolved settings for this invocation
pub fn settings(ctx: &Context) -> Result<Settings> {
    let path = paths::config_file(ctx.config_path.as_deref())?;
    Settings::resolve(&path)
}

/// An authenticated connection to the API
pub struct Session {
    transport: HttpTransport,
    token: String,
}

impl Session {
    /// Load settings and the stored token. Fails when not logged in.
    pub fn open(ctx: &Context) -> Result<Self> {
        let settings = settings(ctx)?;
        let token = TokenStore::default_location()?.token()?;
        log::debug!("Using endpoint {}", settings.endpoint);
        Ok(Self {
            transport: settings.transport(),
            token,
        })
    }

    pub fn gateway(&self) -> Gateway<'_> {
        Gateway::new(&self.transport, &self.token)
    }
}

/// Report a completed action unless `--quiet`
pub fn done(ctx: &Context, msg: &str) {
    if !ctx.quiet {
        ui::success(msg);
    }
}

/// Print a response body; empty bodies print nothing
pub fn show(body: &Value) {
    if !body.is_null() {
        ui::json(body);
    }
}
