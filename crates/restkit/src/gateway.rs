//! Resource gateways: one method per remote operation.
//!
//! A [`Gateway`] pairs a [`Transport`] with a bearer token and knows the
//! path layout of every resource kind. It does not interpret responses
//! beyond JSON decoding; the helpers at the bottom pull identifiers and
//! lists out of bodies.

use crate::error::Result;
use crate::transport::Transport;
use crate::types::{
    CertificateFilter, CertificatePayload, EventFilter, EventPayload, InstancePayload,
    IntegrationKeyPayload, KeyPayload, PolicyPayload, RelationPayload, Revocation,
    ServiceFilter, ServiceGroupPayload, ServicePayload,
};
use serde::Serialize;
use serde_json::{Value, json};

/// Percent-encode one path segment.
fn seg(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Authenticated access to the management API.
#[derive(Clone, Copy)]
pub struct Gateway<'a> {
    transport: &'a dyn Transport,
    token: &'a str,
}

impl<'a> Gateway<'a> {
    pub fn new(transport: &'a dyn Transport, token: &'a str) -> Self {
        Self { transport, token }
    }

    fn get(&self, path: &str) -> Result<Value> {
        self.transport.get(path, Some(self.token))
    }

    fn post<P: Serialize>(&self, path: &str, payload: &P) -> Result<Value> {
        let body = serde_json::to_value(payload)?;
        self.transport.post(path, &body, Some(self.token))
    }

    fn put<P: Serialize>(&self, path: &str, payload: &P) -> Result<Value> {
        let body = serde_json::to_value(payload)?;
        self.transport.put(path, Some(&body), Some(self.token))
    }

    fn put_empty(&self, path: &str) -> Result<Value> {
        self.transport.put(path, None, Some(self.token))
    }

    fn delete(&self, path: &str) -> Result<Value> {
        self.transport.delete(path, Some(self.token))
    }

    // ---------------------------------------------------------------- events

    pub fn list_events(&self, filter: &EventFilter) -> Result<Value> {
        match filter {
            EventFilter::All => self.get("/events"),
            EventFilter::Enabled => self.get("/events/enabled"),
            EventFilter::Severity(level) => self.get(&format!("/events/severity/{}", seg(level))),
        }
    }

    pub fn get_event(&self, id: &str) -> Result<Value> {
        self.get(&format!("/events/{}", seg(id)))
    }

    pub fn create_event(&self, payload: &EventPayload) -> Result<Value> {
        self.post("/events", payload)
    }

    pub fn update_event(&self, id: &str, patch: &Value) -> Result<Value> {
        self.put(&format!("/events/{}", seg(id)), patch)
    }

    pub fn delete_event(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/events/{}", seg(id)))
    }

    // -------------------------------------------------------------- policies

    pub fn list_policies(&self) -> Result<Value> {
        self.get("/politicas")
    }

    pub fn get_policy(&self, id: &str) -> Result<Value> {
        self.get(&format!("/politicas/{}", seg(id)))
    }

    pub fn create_policy(&self, payload: &PolicyPayload) -> Result<Value> {
        self.post("/politicas", payload)
    }

    pub fn update_policy(&self, id: &str, patch: &Value) -> Result<Value> {
        self.put(&format!("/politicas/{}", seg(id)), patch)
    }

    pub fn delete_policy(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/politicas/{}", seg(id)))
    }

    // -------------------------------------------------------- service groups

    pub fn list_service_groups(&self) -> Result<Value> {
        self.get("/service-groups")
    }

    pub fn get_service_group(&self, id: &str) -> Result<Value> {
        self.get(&format!("/service-groups/{}", seg(id)))
    }

    pub fn get_service_group_by_name(&self, name: &str) -> Result<Value> {
        self.get(&format!("/service-groups/name/{}", seg(name)))
    }

    pub fn create_service_group(&self, payload: &ServiceGroupPayload) -> Result<Value> {
        self.post("/service-groups", payload)
    }

    pub fn update_service_group(&self, id: &str, patch: &Value) -> Result<Value> {
        self.put(&format!("/service-groups/{}", seg(id)), patch)
    }

    pub fn delete_service_group(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/service-groups/{}", seg(id)))
    }

    // -------------------------------------------------------------- services

    pub fn list_services(&self, filter: &ServiceFilter) -> Result<Value> {
        match filter {
            ServiceFilter::All => self.get("/services"),
            ServiceFilter::Active => self.get("/services/active"),
            ServiceFilter::Group(id) => self.get(&format!("/services/group/{}", seg(id))),
        }
    }

    pub fn get_service(&self, hash: &str) -> Result<Value> {
        self.get(&format!("/services/{}", seg(hash)))
    }

    pub fn create_service(&self, payload: &ServicePayload) -> Result<Value> {
        self.post("/services", payload)
    }

    pub fn update_service(&self, hash: &str, patch: &Value) -> Result<Value> {
        self.put(&format!("/services/{}", seg(hash)), patch)
    }

    pub fn delete_service(&self, hash: &str) -> Result<Value> {
        self.delete(&format!("/services/{}", seg(hash)))
    }

    pub fn rotate_certificates(&self, hash: &str) -> Result<Value> {
        self.post(
            &format!("/services/{}/certificates/rotate", seg(hash)),
            &json!({}),
        )
    }

    pub fn generate_service_hash(&self, service_name: &str) -> Result<Value> {
        self.post(
            "/services/generate-hash",
            &json!({ "service_name": service_name }),
        )
    }

    // ------------------------------------------------------------------ keys

    pub fn list_keys(&self, service_hash: &str) -> Result<Value> {
        self.get(&format!("/services/{}/keys/list", seg(service_hash)))
    }

    /// The service together with its keys: `{"service": {...}, "keys": [...]}`.
    pub fn get_keys(&self, service_hash: &str) -> Result<Value> {
        self.get(&format!("/services/{}/keys", seg(service_hash)))
    }

    pub fn create_key(&self, service_hash: &str, payload: &KeyPayload) -> Result<Value> {
        self.post(&format!("/services/{}/keys", seg(service_hash)), payload)
    }

    pub fn toggle_key(&self, service_hash: &str, key_id: &str) -> Result<Value> {
        self.put_empty(&format!(
            "/services/{}/keys/{}/toggle",
            seg(service_hash),
            seg(key_id)
        ))
    }

    pub fn delete_key(&self, service_hash: &str, key_id: &str) -> Result<Value> {
        self.delete(&format!(
            "/services/{}/keys/{}",
            seg(service_hash),
            seg(key_id)
        ))
    }

    // ------------------------------------------------------------- relations

    pub fn list_relations(&self, service_hash: &str) -> Result<Value> {
        self.get(&format!("/services/{}/matriz", seg(service_hash)))
    }

    pub fn create_relation(&self, source_hash: &str, payload: &RelationPayload) -> Result<Value> {
        self.post(&format!("/services/{}/matriz", seg(source_hash)), payload)
    }

    pub fn toggle_relation(&self, service_hash: &str, relation_id: &str) -> Result<Value> {
        self.put_empty(&format!(
            "/services/{}/matriz/relations/{}/toggle",
            seg(service_hash),
            seg(relation_id)
        ))
    }

    pub fn delete_relation(&self, service_hash: &str, relation_id: &str) -> Result<Value> {
        self.delete(&format!(
            "/services/{}/matriz/relations/{}",
            seg(service_hash),
            seg(relation_id)
        ))
    }

    /// Delete the relation between two services without knowing its ID.
    pub fn delete_relation_to(&self, source_hash: &str, target_hash: &str) -> Result<Value> {
        self.delete(&format!(
            "/services/{}/matriz/{}",
            seg(source_hash),
            seg(target_hash)
        ))
    }

    // ---------------------------------------------------------- certificates

    pub fn create_certificate(&self, payload: &CertificatePayload) -> Result<Value> {
        self.post("/certificates", payload)
    }

    pub fn list_certificates(&self, filter: CertificateFilter) -> Result<Value> {
        match filter {
            CertificateFilter::All => self.get("/certificates"),
            CertificateFilter::Valid => self.get("/certificates/valid"),
            CertificateFilter::Revoked => self.get("/certificates/revoked"),
            CertificateFilter::Expiring(days) => {
                self.get(&format!("/certificates/expiring/{days}"))
            }
        }
    }

    pub fn revoke_certificate(&self, id: &str, revocation: &Revocation) -> Result<Value> {
        self.delete(&format!(
            "/certificates/{}?cascade={}&reason={}",
            seg(id),
            revocation.cascade,
            seg(&revocation.reason)
        ))
    }

    pub fn revoke_all_certificates(&self, reason: &str) -> Result<Value> {
        self.post("/certificates/revoke-all", &json!({ "reason": reason }))
    }

    pub fn sync_certificates(&self) -> Result<Value> {
        self.post("/certificates/sync", &json!({}))
    }

    /// Back up the certificate authority: certificates, keys and settings.
    pub fn create_backup(&self) -> Result<Value> {
        self.post("/ca/backup", &json!({}))
    }

    // ------------------------------------------------------ integration keys

    pub fn list_integration_keys(&self) -> Result<Value> {
        self.get("/integration-keys")
    }

    /// The response carries the secret; it is not retrievable later.
    pub fn create_integration_key(&self, payload: &IntegrationKeyPayload) -> Result<Value> {
        self.post("/integration-keys", payload)
    }

    pub fn delete_integration_key(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/integration-keys/{}", seg(id)))
    }

    // ------------------------------------------------------------- instances

    pub fn create_instance(&self, payload: &InstancePayload) -> Result<Value> {
        self.post("/instances", payload)
    }

    pub fn list_instances(&self) -> Result<Value> {
        self.get("/instances")
    }

    /// Agent instances registered with a service key.
    pub fn list_instances_by_key(&self, key_id: &str) -> Result<Value> {
        self.get(&format!("/instances/key/{}", seg(key_id)))
    }

    pub fn delete_instance(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/instances/{}", seg(id)))
    }
}

// =============================================================================
// Response helpers
// =============================================================================

/// Read a string identifier from `field`, falling back to a generic `id`.
///
/// Numeric identifiers are rendered as strings.
pub fn extract_id(body: &Value, field: &str) -> Option<String> {
    [field, "id"].iter().find_map(|key| match body.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Items of a list response.
///
/// Accepts a bare array or an object wrapping the array under `key`
/// (for example `{"services": [...]}`). Anything else is an empty list.
pub fn list_items<'v>(body: &'v Value, key: &str) -> &'v [Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    }
}
