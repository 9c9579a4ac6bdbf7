//! `certfix apply`: create the resources described in a YAML document.

use crate::Context;
use crate::auth::TokenStore;
use crate::cli::ApplyArgs;
use crate::ui;
use anyhow::{Context as _, Result};
use provision::{
    ApplyContext, ApplyFailure, ApplyObserver, ApplyOptions, ApplySummary, Document, LedgerEntry,
    Phase, Plan, ResourceKind,
};

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    ui::header("Applying Configuration");
    ui::fields(&[("file", args.file.display().to_string())]);

    let doc = Document::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    if ctx.verbose > 0 {
        ui::fields(&[
            ("events", doc.events.len().to_string()),
            ("policies", doc.policies.len().to_string()),
            ("service groups", doc.service_groups.len().to_string()),
            ("services", doc.services.len().to_string()),
            ("keys", doc.key_count().to_string()),
            ("relations", doc.relation_count().to_string()),
        ]);
    }

    if args.dry_run {
        println!();
        ui::warn("Dry run - no changes will be made");
        render_plan(&provision::plan(&doc));
        return Ok(());
    }

    let settings = super::settings(ctx)?;
    let transport = settings.transport();
    let credentials = TokenStore::default_location()?;
    let mut observer = TerminalObserver { quiet: ctx.quiet };

    let result = provision::apply(
        &doc,
        &ApplyOptions {
            skip_existing: args.skip_existing,
        },
        ApplyContext::new(&transport, &credentials, &mut observer),
    );

    match result {
        Ok(summary) => {
            report_success(&summary);
            Ok(())
        }
        Err(failure) => {
            report_failure(&failure);
            Err(failure.into())
        }
    }
}

fn render_plan(plan: &Plan) {
    if plan.is_empty() {
        ui::info("Nothing to create");
        return;
    }

    for phase in &plan.phases {
        ui::section(&format!("{} to create", phase.phase));
        for item in &phase.items {
            ui::planned(&item.label);
            ui::fields(&item.details);
        }
    }

    println!();
    ui::info(&format!("Total resources: {}", plan.total));
}

fn report_success(summary: &ApplySummary) {
    println!();
    let mut counts: Vec<(&str, String)> = ResourceKind::ALL
        .into_iter()
        .filter(|kind| summary.created(*kind) > 0)
        .map(|kind| (kind.label(), summary.created(kind).to_string()))
        .collect();
    if !summary.skipped.is_empty() {
        counts.push(("skipped", summary.skipped.join(", ")));
    }
    ui::fields(&counts);
    ui::success(&format!("Applied {} resources", summary.total_created()));
}

fn report_failure(failure: &ApplyFailure) {
    println!();
    let rollback = &failure.rollback;
    if failure.created == 0 {
        ui::error("Apply failed before any resource was created");
        return;
    }
    ui::error(&format!(
        "Apply failed after creating {} resources; rollback attempted for {}, {} succeeded",
        failure.created, rollback.attempted, rollback.succeeded
    ));
    for leftover in &rollback.failures {
        ui::warn(&format!(
            "Not rolled back: {} ({})",
            leftover.entry, leftover.error
        ));
    }
    if failure.unattempted() > 0 {
        ui::warn(&format!(
            "{} created resources were never rolled back",
            failure.unattempted()
        ));
    }
}

/// Progress lines for the terminal
struct TerminalObserver {
    quiet: bool,
}

impl ApplyObserver for TerminalObserver {
    fn on_phase_start(&mut self, phase: Phase, _count: usize) {
        if !self.quiet {
            ui::section(&format!("Creating {phase}"));
        }
    }

    fn on_item_start(&mut self, _phase: Phase, position: usize, total: usize, label: &str) {
        if !self.quiet {
            ui::step(position, total, label);
        }
    }

    fn on_created(&mut self, entry: &LedgerEntry) {
        if !self.quiet {
            ui::success(&format!("Created {entry}"));
        }
    }

    fn on_skipped(&mut self, kind: ResourceKind, id: &str, reason: &str) {
        ui::warn(&format!("Skipped {kind} {id}: {reason}"));
    }

    fn on_rollback_start(&mut self, count: usize) {
        ui::section(&format!("Rolling back {count} resources"));
    }

    fn on_rolled_back(&mut self, entry: &LedgerEntry, error: Option<&str>) {
        match error {
            None => ui::removed(&entry.to_string()),
            Some(e) => ui::warn(&format!("Failed to delete {entry}: {e}")),
        }
    }
}
