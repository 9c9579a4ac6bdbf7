//! Apply context and provider traits
//!
//! The orchestrator receives everything it talks to through these seams:
//! a transport, a credential source and an observer for progress output.
//! Nothing is read from process-wide state.

use crate::ledger::{LedgerEntry, ResourceKind};
use crate::types::Phase;
use restkit::Transport;

/// Source of the bearer token for an apply run.
///
/// Called once, before any remote call. An error means "unauthenticated".
pub trait Credentials {
    fn token(&self) -> anyhow::Result<String>;
}

/// A fixed token, for tests and scripted use
pub struct StaticToken(pub String);

impl Credentials for StaticToken {
    fn token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Receives progress updates during an apply run.
///
/// Every method has an empty default; implement the ones you render.
pub trait ApplyObserver {
    /// Called when a phase with at least one item starts
    fn on_phase_start(&mut self, _phase: Phase, _count: usize) {}

    /// Called before each item is created (`position` is 1-based)
    fn on_item_start(&mut self, _phase: Phase, _position: usize, _total: usize, _label: &str) {}

    /// Called after a resource is created and recorded
    fn on_created(&mut self, _entry: &LedgerEntry) {}

    /// Called when an existing resource is left alone
    fn on_skipped(&mut self, _kind: ResourceKind, _id: &str, _reason: &str) {}

    /// Called before the rollback sweep with the number of entries to undo
    fn on_rollback_start(&mut self, _count: usize) {}

    /// Called after each rollback delete; `error` is set when it failed
    fn on_rolled_back(&mut self, _entry: &LedgerEntry, _error: Option<&str>) {}
}

/// Observer that ignores everything
pub struct Silent;

impl ApplyObserver for Silent {}

/// Collaborators for one apply run
pub struct ApplyContext<'a> {
    pub transport: &'a dyn Transport,
    pub credentials: &'a dyn Credentials,
    pub observer: &'a mut dyn ApplyObserver,
}

impl<'a> ApplyContext<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        credentials: &'a dyn Credentials,
        observer: &'a mut dyn ApplyObserver,
    ) -> Self {
        Self {
            transport,
            credentials,
            observer,
        }
    }
}
