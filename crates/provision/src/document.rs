//! The declarative document: what an apply run should create.
//!
//! ```yaml
//! events:
//!   - name: cert-expiring
//!     severity: high
//! policies:
//!   - name: nightly
//!     strategy: janela_manutencao
//!     cron_config: { minute: "0", hour: "3" }
//! service_groups:
//!   - name: payments
//! services:
//!   - hash: svc-billing
//!     name: billing
//!     group_name: payments
//!     policy_name: nightly
//!     keys:
//!       - name: ci
//!         expiration_days: 90
//!     relations:
//!       - target_hash: svc-ledger
//!         type: depends_on
//! ```
//!
//! Defaults are applied here, not by the orchestrator.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Parsed YAML document. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, alias = "eventos")]
    pub events: Vec<EventSpec>,
    #[serde(default, alias = "politicas")]
    pub policies: Vec<PolicySpec>,
    #[serde(default)]
    pub service_groups: Vec<ServiceGroupSpec>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: String,
    /// Forwarded as-is (`low`, `medium`, `high`, `critical`)
    pub severity: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySpec {
    pub name: String,
    /// Strategy identifier (`eventos`, `gradual`, `janela_manutencao`)
    pub strategy: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Schedule for time-driven strategies; scalars are kept as text
    #[serde(
        default,
        deserialize_with = "scalar_map",
        skip_serializing_if = "Option::is_none"
    )]
    pub cron_config: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_config: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceGroupSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Omit to let the remote generate one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Soft reference to a service group, resolved at apply time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Soft reference to a policy, resolved at apply time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub keys: Vec<KeySpec>,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
}

impl ServiceSpec {
    /// The declared hash, treating an empty string as absent.
    pub fn declared_hash(&self) -> Option<&str> {
        non_empty(self.hash.as_deref())
    }

    pub fn group_ref(&self) -> Option<&str> {
        non_empty(self.group_name.as_deref())
    }

    pub fn policy_ref(&self) -> Option<&str> {
        non_empty(self.policy_name.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySpec {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub target_hash: String,
    /// Passed through unvalidated
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
}

impl Document {
    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded document from {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Parse a document from YAML text. An empty text is an empty document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Number of top-level resources (keys and relations not included).
    pub fn resource_count(&self) -> usize {
        self.events.len() + self.policies.len() + self.service_groups.len() + self.services.len()
    }

    pub fn key_count(&self) -> usize {
        self.services.iter().map(|s| s.keys.len()).sum()
    }

    pub fn relation_count(&self) -> usize {
        self.services.iter().map(|s| s.relations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_count() == 0
    }
}

/// Deserialize a mapping whose scalar values (`0`, `true`, `"3"`) are all
/// kept as strings.
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let raw: Option<BTreeMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => {
                    return Err(D::Error::custom(format!(
                        "cron_config.{key} must be a scalar value"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
events:
  - name: cert-expiring
    severity: high
  - name: cert-revoked
    severity: critical
    enabled: false
policies:
  - name: nightly
    strategy: janela_manutencao
    cron_config:
      minute: 0
      hour: "3"
  - name: on-event
    strategy: eventos
    event_config:
      event_ids: [1, 2]
service_groups:
  - name: payments
    description: Payment services
services:
  - hash: svc-billing
    name: billing
    group_name: payments
    policy_name: nightly
    keys:
      - name: ci
        expiration_days: 90
    relations:
      - target_hash: svc-ledger
        type: depends_on
  - name: ledger
    active: false
"#;

    #[test]
    fn test_parse_full_document() {
        let doc = Document::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(doc.events.len(), 2);
        assert!(doc.events[0].enabled);
        assert!(!doc.events[1].enabled);

        let cron = doc.policies[0].cron_config.as_ref().unwrap();
        assert_eq!(cron.get("minute").map(String::as_str), Some("0"));
        assert_eq!(cron.get("hour").map(String::as_str), Some("3"));
        assert!(doc.policies[0].event_config.is_none());
        assert_eq!(
            doc.policies[1].event_config.as_ref().unwrap()["event_ids"],
            serde_json::json!([1, 2])
        );

        assert_eq!(
            doc.service_groups[0].description.as_deref(),
            Some("Payment services")
        );

        let billing = &doc.services[0];
        assert_eq!(billing.declared_hash(), Some("svc-billing"));
        assert_eq!(billing.group_ref(), Some("payments"));
        assert!(billing.keys[0].enabled);
        assert_eq!(billing.keys[0].expiration_days, Some(90));
        assert_eq!(billing.relations[0].relation_type.as_deref(), Some("depends_on"));

        let ledger = &doc.services[1];
        assert_eq!(ledger.declared_hash(), None);
        assert!(!ledger.active);
        assert!(ledger.keys.is_empty());

        assert_eq!(doc.resource_count(), 7);
        assert_eq!(doc.key_count(), 1);
        assert_eq!(doc.relation_count(), 1);
    }

    #[test]
    fn test_portuguese_aliases_and_unknown_keys() {
        let doc = Document::from_yaml_str(
            r"
version: 2
eventos:
  - name: e
    severity: low
politicas:
  - name: p
    strategy: gradual
",
        )
        .unwrap();

        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.policies.len(), 1);
        assert!(doc.services.is_empty());
    }

    #[test]
    fn test_empty_strings_are_absent_references() {
        let doc = Document::from_yaml_str(
            r#"
services:
  - hash: ""
    name: svc
    group_name: ""
"#,
        )
        .unwrap();

        assert_eq!(doc.services[0].declared_hash(), None);
        assert_eq!(doc.services[0].group_ref(), None);
    }

    #[test]
    fn test_empty_text_is_empty_document() {
        assert!(Document::from_yaml_str("").unwrap().is_empty());
        assert!(Document::from_yaml_str("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let err = Document::from_yaml_str("events: [name: ").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));

        let err = Document::from_yaml_str("events:\n  - severity: high\n").unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_nested_cron_value_rejected() {
        let err = Document::from_yaml_str(
            r"
policies:
  - name: p
    strategy: gradual
    cron_config:
      minute: [1, 2]
",
        )
        .unwrap_err();
        assert!(err.to_string().contains("cron_config.minute"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let doc = Document::load(file.path()).unwrap();
        assert_eq!(doc.services.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
