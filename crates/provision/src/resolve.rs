//! Name-to-ID resolution for soft references.
//!
//! Services refer to groups and policies by display name. These functions
//! turn a name into the remote ID the service payload needs.

use crate::error::{Error, Result};
use crate::ledger::ResourceKind;
use restkit::{Gateway, extract_id, list_items};

/// Look up a service group's remote ID by name.
pub fn resolve_group_id(gateway: &Gateway<'_>, name: &str) -> Result<String> {
    let not_found = || Error::ReferenceNotFound {
        kind: ResourceKind::ServiceGroup,
        name: name.to_string(),
    };

    let body = match gateway.get_service_group_by_name(name) {
        Ok(body) => body,
        Err(e) if e.is_not_found() => return Err(not_found()),
        Err(e) => return Err(Error::transport(format!("look up service group '{name}'"), e)),
    };

    let id = extract_id(&body, "service_group_id").ok_or_else(not_found)?;
    log::debug!("Resolved service group '{}' to {}", name, id);
    Ok(id)
}

/// Look up a policy's remote ID by name.
///
/// There is no lookup-by-name endpoint for policies, so this fetches the
/// full list and scans it for the first matching name.
pub fn resolve_policy_id(gateway: &Gateway<'_>, name: &str) -> Result<String> {
    let body = gateway
        .list_policies()
        .map_err(|e| Error::transport("list policies", e))?;

    let id = list_items(&body, "politicas")
        .iter()
        .find(|policy| policy.get("name").and_then(|n| n.as_str()) == Some(name))
        .and_then(|policy| extract_id(policy, "politica_id"))
        .ok_or_else(|| Error::ReferenceNotFound {
            kind: ResourceKind::Policy,
            name: name.to_string(),
        })?;

    log::debug!("Resolved policy '{}' to {}", name, id);
    Ok(id)
}
