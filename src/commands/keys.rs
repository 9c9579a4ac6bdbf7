//! `certfix keys`

use super::{Session, done, show};
use crate::Context;
use crate::cli::KeysCommand;
use anyhow::{Context as _, Result, bail};
use restkit::types::KeyPayload;
use restkit::{Gateway, list_items};
use serde_json::Value;

pub fn run(ctx: &Context, cmd: KeysCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        KeysCommand::List { service_hash } => show(
            &gateway
                .list_keys(&service_hash)
                .with_context(|| format!("Failed to list keys of {service_hash}"))?,
        ),
        KeysCommand::Get { service_hash } => show(
            &gateway
                .get_keys(&service_hash)
                .with_context(|| format!("Failed to get keys of {service_hash}"))?,
        ),
        KeysCommand::Add {
            service_hash,
            name,
            expiration,
        } => {
            let payload = KeyPayload {
                key_name: name,
                enabled: true,
                expiration_days: Some(expiration),
            };
            let body = gateway
                .create_key(&service_hash, &payload)
                .with_context(|| format!("Failed to add key to {service_hash}"))?;
            done(ctx, &format!("Key '{}' added", payload.key_name));
            show(&body);
        }
        KeysCommand::Toggle {
            service_hash,
            key_id,
        } => {
            let body = gateway
                .toggle_key(&service_hash, &key_id)
                .with_context(|| format!("Failed to toggle key {key_id}"))?;
            done(ctx, &format!("Key {key_id} toggled"));
            show(&body);
        }
        KeysCommand::Enable {
            service_hash,
            key_id,
        } => set_enabled(ctx, &gateway, &service_hash, &key_id, true)?,
        KeysCommand::Disable {
            service_hash,
            key_id,
        } => set_enabled(ctx, &gateway, &service_hash, &key_id, false)?,
        KeysCommand::Delete {
            service_hash,
            key_id,
        } => {
            gateway
                .delete_key(&service_hash, &key_id)
                .with_context(|| format!("Failed to delete key {key_id}"))?;
            done(ctx, &format!("Key {key_id} deleted"));
        }
    }
    Ok(())
}

/// Bring a key to the wanted state. The API only offers a toggle, so the
/// current state is read first and the toggle skipped when it already
/// matches.
fn set_enabled(
    ctx: &Context,
    gateway: &Gateway<'_>,
    service_hash: &str,
    key_id: &str,
    enabled: bool,
) -> Result<()> {
    let state = if enabled { "enabled" } else { "disabled" };
    let body = gateway
        .get_keys(service_hash)
        .with_context(|| format!("Failed to get keys of {service_hash}"))?;

    match key_enabled(&body, key_id) {
        None => bail!("key {key_id} not found on service {service_hash}"),
        Some(current) if current == enabled => {
            done(ctx, &format!("Key {key_id} already {state}"));
        }
        Some(_) => {
            gateway
                .toggle_key(service_hash, key_id)
                .with_context(|| format!("Failed to toggle key {key_id}"))?;
            done(ctx, &format!("Key {key_id} {state}"));
        }
    }
    Ok(())
}

/// The `enabled` flag of `key_id` in a `get_keys` response.
fn key_enabled(body: &Value, key_id: &str) -> Option<bool> {
    list_items(body, "keys")
        .iter()
        .find(|key| match &key["key_id"] {
            Value::String(id) => id == key_id,
            Value::Number(n) => n.to_string() == key_id,
            _ => false,
        })
        .and_then(|key| key["enabled"].as_bool())
}
