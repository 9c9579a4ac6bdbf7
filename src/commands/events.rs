//! `certfix events`

use super::{Session, done, show};
use crate::Context;
use crate::cli::{EventsCommand, ResetUnit, Severity};
use anyhow::{Context as _, Result, bail};
use restkit::types::{EventFilter, EventPayload};
use serde_json::{Map, Value, json};

pub fn run(ctx: &Context, cmd: EventsCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        EventsCommand::List { enabled, severity } => {
            let filter = match (enabled, severity) {
                (true, _) => EventFilter::Enabled,
                (false, Some(level)) => EventFilter::Severity(level.as_str().to_string()),
                (false, None) => EventFilter::All,
            };
            show(
                &gateway
                    .list_events(&filter)
                    .context("Failed to list events")?,
            );
        }
        EventsCommand::Get { id } => show(
            &gateway
                .get_event(&id)
                .with_context(|| format!("Failed to get event {id}"))?,
        ),
        EventsCommand::Create {
            name,
            severity,
            disabled,
            reset_unit,
            reset_value,
        } => {
            let payload = EventPayload {
                name,
                severity: severity.as_str().to_string(),
                enabled: !disabled,
                reset_time_unit: reset_unit.map(|u| u.as_str().to_string()),
                reset_time_value: reset_value,
            };
            let body = gateway
                .create_event(&payload)
                .context("Failed to create event")?;
            done(ctx, &format!("Event '{}' created", payload.name));
            show(&body);
        }
        EventsCommand::Update {
            id,
            name,
            severity,
            enabled,
            reset_unit,
            reset_value,
        } => {
            let patch = update_patch(name, severity, enabled, reset_unit, reset_value)?;
            let body = gateway
                .update_event(&id, &patch)
                .with_context(|| format!("Failed to update event {id}"))?;
            done(ctx, &format!("Event {id} updated"));
            show(&body);
        }
        EventsCommand::Delete { id } => {
            gateway
                .delete_event(&id)
                .with_context(|| format!("Failed to delete event {id}"))?;
            done(ctx, &format!("Event {id} deleted"));
        }
        EventsCommand::Enable { id } => {
            gateway
                .update_event(&id, &json!({"enabled": true}))
                .with_context(|| format!("Failed to enable event {id}"))?;
            done(ctx, &format!("Event {id} enabled"));
        }
        EventsCommand::Disable { id } => {
            gateway
                .update_event(&id, &json!({"enabled": false}))
                .with_context(|| format!("Failed to disable event {id}"))?;
            done(ctx, &format!("Event {id} disabled"));
        }
    }
    Ok(())
}

/// Fields for `PUT /events/{id}`: only what was given.
fn update_patch(
    name: Option<String>,
    severity: Option<Severity>,
    enabled: Option<bool>,
    reset_unit: Option<ResetUnit>,
    reset_value: Option<i64>,
) -> Result<Value> {
    let mut patch = Map::new();
    if let Some(name) = name {
        patch.insert("name".into(), json!(name));
    }
    if let Some(severity) = severity {
        patch.insert("severity".into(), json!(severity.as_str()));
    }
    if let Some(enabled) = enabled {
        patch.insert("enabled".into(), json!(enabled));
    }
    if let Some(unit) = reset_unit {
        patch.insert("reset_time_unit".into(), json!(unit.as_str()));
    }
    if let Some(value) = reset_value {
        patch.insert("reset_time_value".into(), json!(value));
    }
    if patch.is_empty() {
        bail!(
            "no fields to update (use --name, --severity, --enabled, --reset-unit or --reset-value)"
        );
    }
    Ok(Value::Object(patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_patch_sends_only_given_fields() {
        let patch = update_patch(None, Some(Severity::High), Some(false), None, None).unwrap();
        assert_eq!(patch, json!({"severity": "high", "enabled": false}));
    }

    #[test]
    fn test_update_patch_requires_a_field() {
        let err = update_patch(None, None, None, None, None).unwrap_err();
        assert!(err.to_string().starts_with("no fields to update"));
    }
}
