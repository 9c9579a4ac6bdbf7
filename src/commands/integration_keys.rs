//! `certfix integration-keys`

use super::{Session, done, show};
use crate::Context;
use crate::cli::IntegrationKeysCommand;
use crate::ui;
use anyhow::{Context as _, Result};
use restkit::types::IntegrationKeyPayload;
use serde_json::Value;

pub fn run(ctx: &Context, cmd: IntegrationKeysCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        IntegrationKeysCommand::List => show(
            &gateway
                .list_integration_keys()
                .context("Failed to list integration keys")?,
        ),
        IntegrationKeysCommand::Create { name, expires_in } => {
            let payload = IntegrationKeyPayload {
                name,
                expires_in_days: expires_in,
            };
            let body = gateway
                .create_integration_key(&payload)
                .context("Failed to create integration key")?;
            done(ctx, "Integration key created");
            ui::fields(&[("name", text(&body["name"])), ("key", text(&body["key"]))]);
            ui::warn("Store this key safely. It will not be shown again.");
        }
        IntegrationKeysCommand::Delete { id } => {
            gateway
                .delete_integration_key(&id)
                .with_context(|| format!("Failed to delete integration key {id}"))?;
            done(ctx, &format!("Integration key {id} deleted"));
        }
    }
    Ok(())
}

/// Display form of a response field; strings lose their quotes
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
