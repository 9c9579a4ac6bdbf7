//! `certfix matrix`

use super::{Session, done, show};
use crate::Context;
use crate::cli::MatrixCommand;
use anyhow::{Context as _, Result};
use restkit::types::RelationPayload;

pub fn run(ctx: &Context, cmd: MatrixCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        MatrixCommand::List { service_hash } => show(
            &gateway
                .list_relations(&service_hash)
                .with_context(|| format!("Failed to list relations of {service_hash}"))?,
        ),
        MatrixCommand::Add {
            source_hash,
            target,
            relation_type,
        } => {
            let payload = RelationPayload {
                related_service_hash: target,
                relation_type,
            };
            let body = gateway
                .create_relation(&source_hash, &payload)
                .context("Failed to create relation")?;
            done(
                ctx,
                &format!(
                    "Relation {} -> {} created",
                    source_hash, payload.related_service_hash
                ),
            );
            show(&body);
        }
        MatrixCommand::Toggle {
            service_hash,
            relation_id,
        } => {
            let body = gateway
                .toggle_relation(&service_hash, &relation_id)
                .with_context(|| format!("Failed to toggle relation {relation_id}"))?;
            done(ctx, &format!("Relation {relation_id} toggled"));
            show(&body);
        }
        MatrixCommand::Delete {
            service_hash,
            relation_id,
        } => {
            gateway
                .delete_relation(&service_hash, &relation_id)
                .with_context(|| format!("Failed to delete relation {relation_id}"))?;
            done(ctx, &format!("Relation {relation_id} deleted"));
        }
    }
    Ok(())
}
