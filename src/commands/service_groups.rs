//! `certfix service-groups`

use super::{Session, done, show};
use crate::Context;
use crate::cli::ServiceGroupsCommand;
use anyhow::{Context as _, Result};
use restkit::types::ServiceGroupPayload;

pub fn run(ctx: &Context, cmd: ServiceGroupsCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        ServiceGroupsCommand::List => show(
            &gateway
                .list_service_groups()
                .context("Failed to list service groups")?,
        ),
        ServiceGroupsCommand::Get { id } => show(
            &gateway
                .get_service_group(&id)
                .with_context(|| format!("Failed to get service group {id}"))?,
        ),
        ServiceGroupsCommand::Create {
            name,
            description,
            disabled,
        } => {
            let payload = ServiceGroupPayload {
                name,
                description,
                enabled: !disabled,
            };
            let body = gateway
                .create_service_group(&payload)
                .context("Failed to create service group")?;
            done(ctx, &format!("Service group '{}' created", payload.name));
            show(&body);
        }
        ServiceGroupsCommand::Delete { id } => {
            gateway
                .delete_service_group(&id)
                .with_context(|| format!("Failed to delete service group {id}"))?;
            done(ctx, &format!("Service group {id} deleted"));
        }
    }
    Ok(())
}
