//! `certfix policy`

use super::{Session, done, show};
use crate::Context;
use crate::cli::{PolicyCommand, PolicyCreateArgs, Strategy};
use anyhow::{Context as _, Result};
use restkit::types::PolicyPayload;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub fn run(ctx: &Context, cmd: PolicyCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        PolicyCommand::List => show(&gateway.list_policies().context("Failed to list policies")?),
        PolicyCommand::Get { id } => show(
            &gateway
                .get_policy(&id)
                .with_context(|| format!("Failed to get policy {id}"))?,
        ),
        PolicyCommand::Create(args) => {
            let payload = create_payload(args);
            let body = gateway
                .create_policy(&payload)
                .context("Failed to create policy")?;
            done(ctx, &format!("Policy '{}' created", payload.name));
            show(&body);
        }
        PolicyCommand::Delete { id } => {
            gateway
                .delete_policy(&id)
                .with_context(|| format!("Failed to delete policy {id}"))?;
            done(ctx, &format!("Policy {id} deleted"));
        }
        PolicyCommand::Enable { id } => {
            gateway
                .update_policy(&id, &json!({"enabled": true}))
                .with_context(|| format!("Failed to enable policy {id}"))?;
            done(ctx, &format!("Policy {id} enabled"));
        }
        PolicyCommand::Disable { id } => {
            gateway
                .update_policy(&id, &json!({"enabled": false}))
                .with_context(|| format!("Failed to disable policy {id}"))?;
            done(ctx, &format!("Policy {id} disabled"));
        }
    }
    Ok(())
}

/// Only the configuration block that matches the strategy is sent.
fn create_payload(args: PolicyCreateArgs) -> PolicyPayload {
    let (cron_config, event_config) = match args.strategy {
        Strategy::Eventos => {
            let mut config = Map::new();
            if let Some(event_id) = args.event_id {
                config.insert("event_id".to_string(), Value::String(event_id));
            }
            config.insert("event_total".to_string(), json!(args.event_total));
            (None, Some(config))
        }
        Strategy::Gradual | Strategy::JanelaManutencao => {
            let cron: BTreeMap<String, String> = [
                ("minute", args.cron_minute),
                ("hour", args.cron_hour),
                ("day", args.cron_day),
                ("month", args.cron_month),
                ("weekday", args.cron_weekday),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            (Some(cron), None)
        }
    };

    PolicyPayload {
        name: args.name,
        strategy: args.strategy.as_str().to_string(),
        enabled: !args.disabled,
        cron_config,
        event_config,
    }
}
