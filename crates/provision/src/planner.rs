//! Dry-run planner - describes what an apply would create
//!
//! Planning is a pure function of the document: no transport, no
//! credentials, no ledger.

use crate::document::{Document, ServiceSpec};
use crate::types::Phase;
use serde::Serialize;

/// One resource the apply would create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanItem {
    pub label: String,
    /// Extra `(field, value)` pairs worth showing
    pub details: Vec<(String, String)>,
}

impl PlanItem {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            details: Vec::new(),
        }
    }

    fn detail(mut self, field: &str, value: impl Into<String>) -> Self {
        self.details.push((field.to_string(), value.into()));
        self
    }

    fn detail_opt(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.detail(field, value),
            None => self,
        }
    }
}

/// Items of one phase, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPhase {
    pub phase: Phase,
    pub items: Vec<PlanItem>,
}

/// What an apply of a document would do
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Non-empty phases, in execution order
    pub phases: Vec<PlanPhase>,
    /// Events + policies + groups + services
    pub total: usize,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Build the dry-run plan for `doc`.
///
/// Keys and relations are listed under their service rather than as
/// phases of their own, and are not part of `total`.
pub fn plan(doc: &Document) -> Plan {
    let mut phases = Vec::new();

    let mut push = |phase: Phase, items: Vec<PlanItem>| {
        if !items.is_empty() {
            phases.push(PlanPhase { phase, items });
        }
    };

    push(
        Phase::Events,
        doc.events
            .iter()
            .map(|e| {
                PlanItem::new(&e.name)
                    .detail("severity", &e.severity)
                    .detail("enabled", e.enabled.to_string())
            })
            .collect(),
    );

    push(
        Phase::Policies,
        doc.policies
            .iter()
            .map(|p| {
                PlanItem::new(&p.name)
                    .detail("strategy", &p.strategy)
                    .detail("enabled", p.enabled.to_string())
            })
            .collect(),
    );

    push(
        Phase::ServiceGroups,
        doc.service_groups
            .iter()
            .map(|g| PlanItem::new(&g.name).detail_opt("description", g.description.as_deref()))
            .collect(),
    );

    push(Phase::Services, doc.services.iter().map(service_item).collect());

    Plan {
        phases,
        total: doc.resource_count(),
    }
}

fn service_item(service: &ServiceSpec) -> PlanItem {
    let mut item = PlanItem::new(&service.name)
        .detail_opt("hash", service.declared_hash())
        .detail("active", service.active.to_string())
        .detail_opt("group", service.group_ref())
        .detail_opt("policy", service.policy_ref())
        .detail_opt("webhook", service.webhook_url.as_deref());

    if !service.keys.is_empty() {
        let names: Vec<_> = service.keys.iter().map(|k| k.name.as_str()).collect();
        item = item.detail("keys", names.join(", "));
    }
    if !service.relations.is_empty() {
        let targets: Vec<_> = service
            .relations
            .iter()
            .map(|r| match &r.relation_type {
                Some(kind) => format!("{} ({})", r.target_hash, kind),
                None => r.target_hash.clone(),
            })
            .collect();
        item = item.detail("relations", targets.join(", "));
    }
    item
}
