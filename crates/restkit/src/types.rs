//! Request payloads for the management API.
//!
//! Field names follow the wire format. Optional fields are omitted from the
//! JSON body when unset.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body for `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub name: String,
    pub severity: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time_value: Option<i64>,
}

/// Body for `POST /politicas` and `PUT /politicas/{id}`.
///
/// `cron_config` and `event_config` are forwarded untouched; the server
/// decides which one matters for the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPayload {
    pub name: String,
    pub strategy: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_config: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_config: Option<Map<String, Value>>,
}

/// Body for `POST /service-groups` and `PUT /service-groups/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceGroupPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

/// Body for `POST /services`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePayload {
    /// Omitted to let the server generate one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_hash: Option<String>,
    pub service_name: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub politica_id: Option<String>,
}

/// Body for `POST /services/{hash}/keys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPayload {
    pub key_name: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
}

/// Body for `POST /services/{hash}/matriz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationPayload {
    pub related_service_hash: String,
    /// Validated remotely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
}

/// Body for `POST /certificates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    pub common_name: String,
    #[serde(rename = "type")]
    pub cert_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub san: Option<String>,
}

/// Body for `POST /integration-keys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationKeyPayload {
    pub name: String,
    /// 0 means the key never expires
    pub expires_in_days: u32,
}

/// Body for `POST /instances`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub region: String,
}

/// Options for revoking a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revocation {
    /// Also revoke certificates issued under this one
    pub cascade: bool,
    pub reason: String,
}

impl Default for Revocation {
    fn default() -> Self {
        Self {
            cascade: true,
            reason: "superseded".to_string(),
        }
    }
}

/// Filter for `GET /events`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventFilter {
    #[default]
    All,
    Enabled,
    Severity(String),
}

/// Filter for `GET /certificates`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CertificateFilter {
    #[default]
    All,
    Valid,
    Revoked,
    /// Expiring within this many days
    Expiring(u32),
}

/// Filter for `GET /services`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServiceFilter {
    #[default]
    All,
    Active,
    Group(String),
}
