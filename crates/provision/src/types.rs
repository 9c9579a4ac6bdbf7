//! Core types shared by the orchestrator, the planner and their callers.

use crate::ledger::{LedgerEntry, ResourceKind};
use serde::Serialize;
use std::fmt;

/// The six apply phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Events,
    Policies,
    ServiceGroups,
    Services,
    Keys,
    Relations,
}

impl Phase {
    pub const ALL: [Self; 6] = [
        Self::Events,
        Self::Policies,
        Self::ServiceGroups,
        Self::Services,
        Self::Keys,
        Self::Relations,
    ];

    /// Kind of resource the phase creates
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Events => ResourceKind::Event,
            Self::Policies => ResourceKind::Policy,
            Self::ServiceGroups => ResourceKind::ServiceGroup,
            Self::Services => ResourceKind::Service,
            Self::Keys => ResourceKind::Key,
            Self::Relations => ResourceKind::Relation,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Events => "Events",
            Self::Policies => "Policies",
            Self::ServiceGroups => "Service Groups",
            Self::Services => "Services",
            Self::Keys => "Service Keys",
            Self::Relations => "Service Relations",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Options for an apply run
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Skip services whose hash already exists instead of failing
    pub skip_existing: bool,
}

/// Summary of a successful apply run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub events: usize,
    pub policies: usize,
    pub service_groups: usize,
    pub services: usize,
    pub keys: usize,
    pub relations: usize,
    /// Hashes of pre-existing services that were left alone
    pub skipped: Vec<String>,
}

impl ApplySummary {
    /// Total number of resources created
    pub fn total_created(&self) -> usize {
        self.events + self.policies + self.service_groups + self.services + self.keys + self.relations
    }

    /// Count a created resource
    pub fn add_created(&mut self, entry: &LedgerEntry) {
        match entry.kind {
            ResourceKind::Event => self.events += 1,
            ResourceKind::Policy => self.policies += 1,
            ResourceKind::ServiceGroup => self.service_groups += 1,
            ResourceKind::Service => self.services += 1,
            ResourceKind::Key => self.keys += 1,
            ResourceKind::Relation => self.relations += 1,
        }
    }

    /// Created count for one kind
    pub fn created(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Event => self.events,
            ResourceKind::Policy => self.policies,
            ResourceKind::ServiceGroup => self.service_groups,
            ResourceKind::Service => self.services,
            ResourceKind::Key => self.keys,
            ResourceKind::Relation => self.relations,
        }
    }
}
