//! `certfix instance` and `certfix instances`

use super::{Session, done, show};
use crate::Context;
use crate::cli::{InstanceCommand, InstancesCommand};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Duration, Utc};
use restkit::types::InstancePayload;
use serde_json::Value;

/// An agent silent for longer than this is reported as lost
const LOST_AFTER_MINUTES: i64 = 5;

pub fn instance(ctx: &Context, cmd: InstanceCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        InstanceCommand::Create {
            name,
            instance_type,
            region,
        } => {
            let payload = InstancePayload {
                name,
                instance_type,
                region,
            };
            let body = gateway
                .create_instance(&payload)
                .with_context(|| format!("Failed to create instance {}", payload.name))?;
            done(ctx, &format!("Instance '{}' created", payload.name));
            show(&body);
        }
        InstanceCommand::List => {
            show(&gateway.list_instances().context("Failed to list instances")?);
        }
        InstanceCommand::Delete { id } => {
            gateway
                .delete_instance(&id)
                .with_context(|| format!("Failed to delete instance {id}"))?;
            done(ctx, &format!("Instance '{id}' deleted"));
        }
    }
    Ok(())
}

pub fn by_key(ctx: &Context, cmd: InstancesCommand) -> Result<()> {
    let InstancesCommand::List { key_id } = cmd;
    let session = Session::open(ctx)?;
    let mut body = session
        .gateway()
        .list_instances_by_key(&key_id)
        .with_context(|| format!("Failed to list instances of key {key_id}"))?;

    mark_lost(&mut body, Utc::now());
    show(&body);
    Ok(())
}

/// Set `status` to `Lost` on every instance whose `last_seen_at` is older
/// than the heartbeat window. Unparseable timestamps are left alone.
fn mark_lost(body: &mut Value, now: DateTime<Utc>) {
    let cutoff = now - Duration::minutes(LOST_AFTER_MINUTES);
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get_mut("instances") {
            Some(Value::Array(items)) => items,
            _ => return,
        },
        _ => return,
    };

    for item in items.iter_mut() {
        let last_seen = item["last_seen_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        if let (Some(seen), Value::Object(fields)) = (last_seen, item)
            && seen.with_timezone(&Utc) < cutoff
        {
            fields.insert("status".to_string(), Value::from("Lost"));
        }
    }
}
