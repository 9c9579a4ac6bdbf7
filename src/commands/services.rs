//! `certfix services`

use super::{Session, done, show};
use crate::cli::{ServiceUpdateArgs, ServicesCommand};
use crate::{Context, ui};
use anyhow::{Context as _, Result, bail};
use restkit::types::{ServiceFilter, ServicePayload};
use serde_json::{Map, Value, json};

pub fn run(ctx: &Context, cmd: ServicesCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        ServicesCommand::List { active, group } => {
            let filter = match (active, group) {
                (_, Some(group)) => ServiceFilter::Group(group),
                (true, None) => ServiceFilter::Active,
                (false, None) => ServiceFilter::All,
            };
            show(
                &gateway
                    .list_services(&filter)
                    .context("Failed to list services")?,
            );
        }
        ServicesCommand::Get { hash } => show(
            &gateway
                .get_service(&hash)
                .with_context(|| format!("Failed to get service {hash}"))?,
        ),
        ServicesCommand::Create {
            name,
            hash,
            webhook,
            group,
            policy,
            inactive,
        } => {
            let payload = ServicePayload {
                service_hash: hash,
                service_name: name,
                active: !inactive,
                webhook_url: webhook,
                service_group_id: group,
                politica_id: policy,
            };
            let body = gateway
                .create_service(&payload)
                .context("Failed to create service")?;
            done(ctx, &format!("Service '{}' created", payload.service_name));
            show(&body);
        }
        ServicesCommand::Update(args) => {
            let patch = update_patch(&args)?;
            let body = gateway
                .update_service(&args.hash, &patch)
                .with_context(|| format!("Failed to update service {}", args.hash))?;
            done(ctx, &format!("Service {} updated", args.hash));
            show(&body);
        }
        ServicesCommand::Delete { hash } => {
            gateway
                .delete_service(&hash)
                .with_context(|| format!("Failed to delete service {hash}"))?;
            done(ctx, &format!("Service {hash} deleted"));
        }
        ServicesCommand::Activate { hash } => {
            gateway
                .update_service(&hash, &json!({"active": true}))
                .with_context(|| format!("Failed to activate service {hash}"))?;
            done(ctx, &format!("Service {hash} activated"));
        }
        ServicesCommand::Deactivate { hash } => {
            gateway
                .update_service(&hash, &json!({"active": false}))
                .with_context(|| format!("Failed to deactivate service {hash}"))?;
            done(ctx, &format!("Service {hash} deactivated"));
        }
        ServicesCommand::Rotate { hashes } => {
            let hashes: Vec<_> = hashes
                .iter()
                .map(|h| h.trim())
                .filter(|h| !h.is_empty())
                .collect();
            let mut failed = 0;
            for (i, hash) in hashes.iter().enumerate() {
                ui::step(i + 1, hashes.len(), hash);
                match gateway.rotate_certificates(hash) {
                    Ok(_) => done(ctx, &format!("Rotation started for {hash}")),
                    Err(e) => {
                        failed += 1;
                        ui::error(&format!("Failed to rotate {hash}: {e}"));
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} rotations failed", hashes.len());
            }
        }
        ServicesCommand::GenerateHash { name } => show(
            &gateway
                .generate_service_hash(&name)
                .context("Failed to generate service hash")?,
        ),
    }
    Ok(())
}

/// Fields for `PUT /services/{hash}`. A `--clear-*` flag sends an explicit
/// `null` so the remote drops the value.
fn update_patch(args: &ServiceUpdateArgs) -> Result<Value> {
    fn set_or_clear(patch: &mut Map<String, Value>, key: &str, value: &Option<String>, clear: bool) {
        match value {
            Some(v) => {
                patch.insert(key.to_string(), json!(v));
            }
            None if clear => {
                patch.insert(key.to_string(), Value::Null);
            }
            None => {}
        }
    }

    let mut patch = Map::new();
    if let Some(name) = &args.name {
        patch.insert("service_name".into(), json!(name));
    }
    set_or_clear(&mut patch, "webhook_url", &args.webhook, args.clear_webhook);
    set_or_clear(&mut patch, "service_group_id", &args.group, args.clear_group);
    set_or_clear(&mut patch, "politica_id", &args.policy, args.clear_policy);
    if let Some(active) = args.active {
        patch.insert("active".into(), json!(active));
    }

    if patch.is_empty() {
        bail!("no fields to update (use --name, --webhook, --group, --policy, --active or a --clear-* flag)");
    }
    Ok(Value::Object(patch))
}
