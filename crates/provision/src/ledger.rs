//! The created-resource ledger.
//!
//! Every resource an apply run creates is appended here in creation order.
//! Rollback consumes the ledger newest-first, so children (keys, relations)
//! are deleted before the services that own them.

use serde::Serialize;
use std::fmt;

/// Kinds of remote resource an apply run can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Event,
    Policy,
    ServiceGroup,
    Service,
    Key,
    Relation,
}

impl ResourceKind {
    /// All kinds, in creation order.
    pub const ALL: [Self; 6] = [
        Self::Event,
        Self::Policy,
        Self::ServiceGroup,
        Self::Service,
        Self::Key,
        Self::Relation,
    ];

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Policy => "policy",
            Self::ServiceGroup => "service group",
            Self::Service => "service",
            Self::Key => "key",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One created resource.
///
/// `primary` addresses the resource: the remote ID for events, policies and
/// groups, the service hash for services, keys and relations. `secondary`
/// names the child: the key ID, or the relation's target hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: ResourceKind,
    pub primary: String,
    pub secondary: Option<String>,
}

impl LedgerEntry {
    fn new(kind: ResourceKind, primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self {
            kind,
            primary: primary.into(),
            secondary,
        }
    }

    pub fn event(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Event, id, None)
    }

    pub fn policy(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Policy, id, None)
    }

    pub fn service_group(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::ServiceGroup, id, None)
    }

    pub fn service(hash: impl Into<String>) -> Self {
        Self::new(ResourceKind::Service, hash, None)
    }

    /// A key under `service_hash`. The ID is `None` when the remote did
    /// not return one, which leaves the key impossible to delete.
    pub fn key(service_hash: impl Into<String>, key_id: Option<String>) -> Self {
        Self::new(ResourceKind::Key, service_hash, key_id)
    }

    pub fn relation(source_hash: impl Into<String>, target_hash: impl Into<String>) -> Self {
        Self::new(ResourceKind::Relation, source_hash, Some(target_hash.into()))
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.secondary) {
            (ResourceKind::Key, Some(id)) => write!(f, "key {} on service {}", id, self.primary),
            (ResourceKind::Key, None) => write!(f, "key on service {}", self.primary),
            (ResourceKind::Relation, Some(target)) => {
                write!(f, "relation {} -> {}", self.primary, target)
            }
            (kind, _) => write!(f, "{} {}", kind, self.primary),
        }
    }
}

/// Append-only record of what one apply run created.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the most recently recorded entry.
    ///
    /// Entries stay in the ledger until popped, so a sweep that stops
    /// part way leaves the rest for the next one.
    pub fn pop_newest(&mut self) -> Option<LedgerEntry> {
        self.entries.pop()
    }
}
