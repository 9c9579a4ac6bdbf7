//! Best-effort rollback sweep.

use crate::context::ApplyObserver;
use crate::error::{RollbackFailure, RollbackReport};
use crate::ledger::{Ledger, LedgerEntry, ResourceKind};
use restkit::Gateway;

/// Delete everything in `ledger`, newest entry first.
///
/// A failed delete is logged and recorded, and the sweep moves on to the
/// next entry. The ledger is empty afterwards.
pub fn rollback(
    gateway: &Gateway<'_>,
    ledger: &mut Ledger,
    observer: &mut dyn ApplyObserver,
) -> RollbackReport {
    let mut report = RollbackReport::default();
    sweep(gateway, ledger, observer, &mut report);
    report
}

/// Rollback that accumulates into `report`.
///
/// Entries are popped one at a time and counted before the observer hears
/// about them, so if the observer panics the report stays accurate and the
/// undeleted entries stay in the ledger for another sweep.
pub(crate) fn sweep(
    gateway: &Gateway<'_>,
    ledger: &mut Ledger,
    observer: &mut dyn ApplyObserver,
    report: &mut RollbackReport,
) {
    if ledger.is_empty() {
        return;
    }

    log::info!("Rolling back {} created resources", ledger.len());
    observer.on_rollback_start(ledger.len());

    while let Some(entry) = ledger.pop_newest() {
        report.attempted += 1;
        match delete_entry(gateway, &entry) {
            Ok(()) => {
                report.succeeded += 1;
                observer.on_rolled_back(&entry, None);
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Failed to delete {}: {}", entry, message);
                report.failures.push(RollbackFailure {
                    entry: entry.clone(),
                    error: message.clone(),
                });
                observer.on_rolled_back(&entry, Some(&message));
            }
        }
    }
}

/// Issue the delete call matching the entry's kind.
fn delete_entry(gateway: &Gateway<'_>, entry: &LedgerEntry) -> restkit::Result<()> {
    let child = || {
        entry.secondary.as_deref().ok_or_else(|| {
            restkit::Error::InvalidResponse(format!("no {} identifier was returned", entry.kind))
        })
    };

    match entry.kind {
        ResourceKind::Relation => gateway.delete_relation_to(&entry.primary, child()?),
        ResourceKind::Key => gateway.delete_key(&entry.primary, child()?),
        ResourceKind::Service => gateway.delete_service(&entry.primary),
        ResourceKind::ServiceGroup => gateway.delete_service_group(&entry.primary),
        ResourceKind::Policy => gateway.delete_policy(&entry.primary),
        ResourceKind::Event => gateway.delete_event(&entry.primary),
    }
    .map(|_| ())
}
