//! The apply orchestrator.
//!
//! Creates the resources of a [`Document`] in six fixed phases (events,
//! policies, service groups, services, keys, relations), recording each
//! creation in a [`Ledger`]. The first failure stops the forward pass and
//! the ledger is rolled back newest-first.
//!
//! The ledger lives inside a guard for the duration of the forward pass.
//! If the pass panics, the guard's `Drop` runs the rollback sweep while
//! the stack unwinds, and the panic is reported as [`Error::Aborted`].
//! That sweep reports through `log` only: the observer may be the thing
//! that panicked, and a second panic during unwinding aborts the process.

use crate::context::{ApplyContext, ApplyObserver, Silent};
use crate::document::{
    Document, EventSpec, KeySpec, PolicySpec, RelationSpec, ServiceGroupSpec, ServiceSpec,
};
use crate::error::{ApplyFailure, Error, Result, RollbackReport};
use crate::ledger::{Ledger, LedgerEntry, ResourceKind};
use crate::resolve::{resolve_group_id, resolve_policy_id};
use crate::rollback::{rollback, sweep};
use crate::types::{ApplyOptions, ApplySummary, Phase};
use restkit::types::{
    EventPayload, KeyPayload, PolicyPayload, RelationPayload, ServiceGroupPayload, ServicePayload,
};
use restkit::{Gateway, extract_id};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Create everything in `doc`.
///
/// Credentials are read once up front; without them nothing is sent. On
/// failure every resource created by this run is deleted again (best
/// effort) and the error that stopped the run is returned along with the
/// rollback report.
pub fn apply(
    doc: &Document,
    opts: &ApplyOptions,
    ctx: ApplyContext<'_>,
) -> std::result::Result<ApplySummary, ApplyFailure> {
    let token = ctx
        .credentials
        .token()
        .map_err(|e| ApplyFailure::before_start(Error::Unauthenticated(e.to_string())))?;

    let gateway = Gateway::new(ctx.transport, &token);
    let observer = ctx.observer;
    let mut aftermath = Aftermath::default();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut run = Run::new(gateway, &mut *observer, &mut aftermath);
        match run.forward(doc, opts) {
            Ok(()) => Ok(run.finish()),
            Err(error) => Err(run.fail(error)),
        }
    }));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            log::error!("Apply aborted: {}", reason);
            Err(ApplyFailure {
                error: Error::Aborted(reason),
                created: aftermath.created,
                rollback: aftermath.unwound.unwrap_or_default(),
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}

/// What survives a run that unwound: outlives the `catch_unwind` closure.
#[derive(Default)]
struct Aftermath {
    created: usize,
    /// Report of the rollback run by the guard while unwinding
    unwound: Option<RollbackReport>,
}

/// State of one forward pass.
///
/// Owns the ledger. Dropping an armed run rolls the ledger back.
struct Run<'a> {
    gateway: Gateway<'a>,
    observer: &'a mut dyn ApplyObserver,
    ledger: Ledger,
    summary: ApplySummary,
    aftermath: &'a mut Aftermath,
    armed: bool,
}

impl<'a> Run<'a> {
    fn new(
        gateway: Gateway<'a>,
        observer: &'a mut dyn ApplyObserver,
        aftermath: &'a mut Aftermath,
    ) -> Self {
        Self {
            gateway,
            observer,
            ledger: Ledger::new(),
            summary: ApplySummary::default(),
            aftermath,
            armed: true,
        }
    }

    /// Disarm and hand back the summary; the ledger is discarded.
    fn finish(mut self) -> ApplySummary {
        self.armed = false;
        log::info!(
            "Apply finished: {} resources created",
            self.summary.total_created()
        );
        std::mem::take(&mut self.summary)
    }

    /// Roll back, then disarm and wrap the error.
    ///
    /// If the observer panics during the sweep, the rest of the ledger is
    /// deleted silently and the original error is still the one returned.
    fn fail(mut self, error: Error) -> ApplyFailure {
        log::error!(
            "Apply failed after creating {} resources: {}",
            self.aftermath.created,
            error
        );
        let mut rollback = RollbackReport::default();
        let swept = panic::catch_unwind(AssertUnwindSafe(|| {
            sweep(
                &self.gateway,
                &mut self.ledger,
                &mut *self.observer,
                &mut rollback,
            );
        }));
        if swept.is_err() {
            log::warn!("Progress output failed during rollback; continuing without it");
            sweep(&self.gateway, &mut self.ledger, &mut Silent, &mut rollback);
        }
        self.armed = false;
        ApplyFailure {
            error,
            created: self.aftermath.created,
            rollback,
        }
    }

    fn record(&mut self, entry: LedgerEntry) {
        log::info!("Created {}", entry);
        self.aftermath.created += 1;
        self.summary.add_created(&entry);
        self.ledger.record(entry.clone());
        self.observer.on_created(&entry);
    }

    fn begin_phase(&mut self, phase: Phase, count: usize) {
        if count > 0 {
            log::info!("Phase: {} ({})", phase, count);
            self.observer.on_phase_start(phase, count);
        }
    }

    fn forward(&mut self, doc: &Document, opts: &ApplyOptions) -> Result<()> {
        self.begin_phase(Phase::Events, doc.events.len());
        for (i, event) in doc.events.iter().enumerate() {
            self.observer
                .on_item_start(Phase::Events, i + 1, doc.events.len(), &event.name);
            self.create_event(event)?;
        }

        self.begin_phase(Phase::Policies, doc.policies.len());
        for (i, policy) in doc.policies.iter().enumerate() {
            self.observer
                .on_item_start(Phase::Policies, i + 1, doc.policies.len(), &policy.name);
            self.create_policy(policy)?;
        }

        self.begin_phase(Phase::ServiceGroups, doc.service_groups.len());
        for (i, group) in doc.service_groups.iter().enumerate() {
            self.observer.on_item_start(
                Phase::ServiceGroups,
                i + 1,
                doc.service_groups.len(),
                &group.name,
            );
            self.create_service_group(group)?;
        }

        // Hash of each service, in document order, for the child phases.
        let mut hashes = Vec::with_capacity(doc.services.len());
        self.begin_phase(Phase::Services, doc.services.len());
        for (i, service) in doc.services.iter().enumerate() {
            self.observer
                .on_item_start(Phase::Services, i + 1, doc.services.len(), &service.name);
            hashes.push(self.create_service(service, opts)?);
        }

        let key_total = doc.key_count();
        self.begin_phase(Phase::Keys, key_total);
        let mut position = 0;
        for (service, hash) in doc.services.iter().zip(&hashes) {
            for key in &service.keys {
                position += 1;
                self.observer
                    .on_item_start(Phase::Keys, position, key_total, &key.name);
                self.create_key(hash, key)?;
            }
        }

        let relation_total = doc.relation_count();
        self.begin_phase(Phase::Relations, relation_total);
        let mut position = 0;
        for (service, hash) in doc.services.iter().zip(&hashes) {
            for relation in &service.relations {
                position += 1;
                let label = format!("{} -> {}", hash, relation.target_hash);
                self.observer
                    .on_item_start(Phase::Relations, position, relation_total, &label);
                self.create_relation(hash, relation)?;
            }
        }

        Ok(())
    }

    fn create_event(&mut self, spec: &EventSpec) -> Result<()> {
        let payload = EventPayload {
            name: spec.name.clone(),
            severity: spec.severity.clone(),
            enabled: spec.enabled,
            reset_time_unit: None,
            reset_time_value: None,
        };
        let body = self
            .gateway
            .create_event(&payload)
            .map_err(|e| Error::transport(format!("create event '{}'", spec.name), e))?;

        let id = extract_id(&body, "event_id").unwrap_or_else(|| spec.name.clone());
        self.record(LedgerEntry::event(id));
        Ok(())
    }

    fn create_policy(&mut self, spec: &PolicySpec) -> Result<()> {
        let payload = PolicyPayload {
            name: spec.name.clone(),
            strategy: spec.strategy.clone(),
            enabled: spec.enabled,
            cron_config: spec.cron_config.clone(),
            event_config: spec.event_config.clone(),
        };
        let body = self
            .gateway
            .create_policy(&payload)
            .map_err(|e| Error::transport(format!("create policy '{}'", spec.name), e))?;

        let id = extract_id(&body, "politica_id").unwrap_or_else(|| spec.name.clone());
        self.record(LedgerEntry::policy(id));
        Ok(())
    }

    fn create_service_group(&mut self, spec: &ServiceGroupSpec) -> Result<()> {
        let payload = ServiceGroupPayload {
            name: spec.name.clone(),
            description: spec.description.clone(),
            enabled: spec.enabled,
        };
        let body = self
            .gateway
            .create_service_group(&payload)
            .map_err(|e| Error::transport(format!("create service group '{}'", spec.name), e))?;

        let id = extract_id(&body, "service_group_id").unwrap_or_else(|| spec.name.clone());
        self.record(LedgerEntry::service_group(id));
        Ok(())
    }

    /// Create one service, returning the hash its keys and relations hang
    /// off. A pre-existing service is skipped or rejected per `opts`.
    fn create_service(&mut self, spec: &ServiceSpec, opts: &ApplyOptions) -> Result<String> {
        if let Some(hash) = spec.declared_hash() {
            if self.service_exists(hash)? {
                if !opts.skip_existing {
                    return Err(Error::Conflict {
                        hash: hash.to_string(),
                    });
                }
                log::info!("Skipping existing service {}", hash);
                self.summary.skipped.push(hash.to_string());
                self.observer
                    .on_skipped(ResourceKind::Service, hash, "already exists");
                return Ok(hash.to_string());
            }
        }

        let mut payload = ServicePayload {
            service_hash: spec.declared_hash().map(str::to_string),
            service_name: spec.name.clone(),
            active: spec.active,
            webhook_url: spec.webhook_url.clone(),
            ..Default::default()
        };
        if let Some(group) = spec.group_ref() {
            payload.service_group_id = Some(resolve_group_id(&self.gateway, group)?);
        }
        if let Some(policy) = spec.policy_ref() {
            payload.politica_id = Some(resolve_policy_id(&self.gateway, policy)?);
        }

        let body = self
            .gateway
            .create_service(&payload)
            .map_err(|e| Error::transport(format!("create service '{}'", spec.name), e))?;

        let hash = match spec.declared_hash() {
            Some(hash) => hash.to_string(),
            None => extract_id(&body, "service_hash").ok_or_else(|| {
                Error::transport(
                    format!("create service '{}'", spec.name),
                    restkit::Error::InvalidResponse("missing service_hash".to_string()),
                )
            })?,
        };
        self.record(LedgerEntry::service(hash.clone()));
        Ok(hash)
    }

    /// `GET /services/{hash}`: found means exists, 404 means absent.
    fn service_exists(&self, hash: &str) -> Result<bool> {
        match self.gateway.get_service(hash) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(Error::transport(format!("check service '{hash}'"), e)),
        }
    }

    fn create_key(&mut self, service_hash: &str, spec: &KeySpec) -> Result<()> {
        let payload = KeyPayload {
            key_name: spec.name.clone(),
            enabled: spec.enabled,
            expiration_days: spec.expiration_days,
        };
        let body = self.gateway.create_key(service_hash, &payload).map_err(|e| {
            Error::transport(
                format!("create key '{}' for service {}", spec.name, service_hash),
                e,
            )
        })?;

        let key_id = extract_id(&body, "key_id");
        if key_id.is_none() {
            log::warn!(
                "Key '{}' on service {} was created without a key_id",
                spec.name,
                service_hash
            );
        }
        self.record(LedgerEntry::key(service_hash, key_id));
        Ok(())
    }

    fn create_relation(&mut self, source_hash: &str, spec: &RelationSpec) -> Result<()> {
        let payload = RelationPayload {
            related_service_hash: spec.target_hash.clone(),
            relation_type: spec.relation_type.clone(),
        };
        self.gateway
            .create_relation(source_hash, &payload)
            .map_err(|e| {
                Error::transport(
                    format!("create relation {} -> {}", source_hash, spec.target_hash),
                    e,
                )
            })?;

        self.record(LedgerEntry::relation(source_hash, spec.target_hash.clone()));
        Ok(())
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        log::warn!("Apply interrupted; rolling back {} resources", self.ledger.len());
        let report = rollback(&self.gateway, &mut self.ledger, &mut Silent);
        self.aftermath.unwound = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Credentials, Silent, StaticToken};
    use restkit::{Method, MockResponse, MockTransport};
    use serde_json::json;

    struct NoToken;

    impl Credentials for NoToken {
        fn token(&self) -> anyhow::Result<String> {
            anyhow::bail!("not authenticated: run 'certfix login'")
        }
    }

    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
    }

    impl ApplyObserver for Recorder {
        fn on_phase_start(&mut self, phase: Phase, count: usize) {
            self.lines.push(format!("phase {phase} {count}"));
        }
        fn on_created(&mut self, entry: &LedgerEntry) {
            self.lines.push(format!("created {entry}"));
        }
        fn on_skipped(&mut self, kind: ResourceKind, id: &str, _reason: &str) {
            self.lines.push(format!("skipped {kind} {id}"));
        }
        fn on_rollback_start(&mut self, count: usize) {
            self.lines.push(format!("rollback {count}"));
        }
        fn on_rolled_back(&mut self, entry: &LedgerEntry, error: Option<&str>) {
            let status = if error.is_some() { "failed" } else { "ok" };
            self.lines.push(format!("undo {entry} {status}"));
        }
    }

    fn run(
        mock: &MockTransport,
        yaml: &str,
        skip_existing: bool,
    ) -> std::result::Result<ApplySummary, ApplyFailure> {
        let doc = Document::from_yaml_str(yaml).unwrap();
        let creds = StaticToken("tok".to_string());
        let mut observer = Silent;
        apply(
            &doc,
            &ApplyOptions { skip_existing },
            ApplyContext::new(mock, &creds, &mut observer),
        )
    }

    const FULL: &str = r"
events:
  - name: e1
    severity: low
  - name: e2
    severity: high
policies:
  - name: nightly
    strategy: gradual
service_groups:
  - name: G
services:
  - hash: svc-a
    name: a
    keys:
      - name: k1
      - name: k2
    relations:
      - target_hash: svc-b
  - hash: svc-b
    name: b
    keys:
      - name: k3
    relations:
      - target_hash: svc-a
        type: depends_on
";

    #[test]
    fn test_calls_follow_phase_and_document_order() {
        let mock = MockTransport::new();
        let summary = run(&mock, FULL, false).unwrap();

        assert_eq!(
            mock.call_lines(),
            vec![
                "POST /events",
                "POST /events",
                "POST /politicas",
                "POST /service-groups",
                "GET /services/svc-a",
                "POST /services",
                "GET /services/svc-b",
                "POST /services",
                "POST /services/svc-a/keys",
                "POST /services/svc-a/keys",
                "POST /services/svc-b/keys",
                "POST /services/svc-a/matriz",
                "POST /services/svc-b/matriz",
            ]
        );

        let names: Vec<_> = mock
            .calls()
            .iter()
            .filter(|c| c.path == "/events")
            .map(|c| c.payload.as_ref().unwrap()["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("e1"), json!("e2")]);

        assert_eq!(summary.events, 2);
        assert_eq!(summary.policies, 1);
        assert_eq!(summary.service_groups, 1);
        assert_eq!(summary.services, 2);
        assert_eq!(summary.keys, 3);
        assert_eq!(summary.relations, 2);
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn test_every_call_carries_the_token() {
        let mock = MockTransport::new();
        run(&mock, FULL, false).unwrap();
        assert!(mock.calls().iter().all(|c| c.token.as_deref() == Some("tok")));
    }

    #[test]
    fn test_relation_payload_passes_type_through() {
        let mock = MockTransport::new();
        run(&mock, FULL, false).unwrap();

        let relation = mock
            .calls()
            .into_iter()
            .find(|c| c.path == "/services/svc-b/matriz")
            .unwrap();
        assert_eq!(
            relation.payload,
            Some(json!({"related_service_hash": "svc-a", "relation_type": "depends_on"}))
        );
    }

    #[test]
    fn test_group_name_resolves_to_remote_id() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/service-groups",
            MockResponse::Json(json!({"service_group_id": "g-42", "name": "G"})),
        );
        mock.respond(
            Method::Get,
            "/service-groups/name/G",
            MockResponse::Json(json!({"service_group_id": "g-42", "name": "G"})),
        );

        run(
            &mock,
            r"
service_groups:
  - name: G
services:
  - hash: svc
    name: s
    group_name: G
",
            false,
        )
        .unwrap();

        let create = mock
            .calls()
            .into_iter()
            .find(|c| c.method == Method::Post && c.path == "/services")
            .unwrap();
        let payload = create.payload.unwrap();
        assert_eq!(payload["service_group_id"], "g-42");
        assert_ne!(payload["service_group_id"], "G");
    }

    #[test]
    fn test_policy_name_resolves_by_scanning_list() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "/politicas",
            MockResponse::Json(json!([
                {"politica_id": "p-1", "name": "weekly"},
                {"politica_id": "p-2", "name": "nightly"}
            ])),
        );

        run(
            &mock,
            "services:\n  - hash: s1\n    name: s\n    policy_name: nightly\n",
            false,
        )
        .unwrap_or_else(|f| panic!("apply failed: {f}"));

        let create = mock
            .calls()
            .into_iter()
            .find(|c| c.method == Method::Post && c.path == "/services")
            .unwrap();
        assert_eq!(create.payload.unwrap()["politica_id"], "p-2");
    }

    #[test]
    fn test_partial_failure_rolls_back_in_reverse() {
        let mock = MockTransport::new();
        mock.respond_once(Method::Post, "/events", MockResponse::Json(json!({"event_id": "ev-1"})));
        mock.respond_once(Method::Post, "/events", MockResponse::Json(json!({"event_id": "ev-2"})));
        mock.respond(Method::Post, "/politicas", MockResponse::Json(json!({"politica_id": "pol-1"})));
        mock.respond(
            Method::Post,
            "/service-groups",
            MockResponse::Json(json!({"service_group_id": "grp-1"})),
        );
        mock.respond(Method::Get, "/politicas", MockResponse::Json(json!([])));

        let failure = run(
            &mock,
            r"
eventos:
  - name: e1
    severity: low
  - name: e2
    severity: low
politicas:
  - name: real
    strategy: gradual
service_groups:
  - name: G
services:
  - hash: svc-a
    name: A
  - hash: svc-b
    name: B
    policy_name: missing
",
            false,
        )
        .unwrap_err();

        assert!(matches!(
            failure.error,
            Error::ReferenceNotFound { kind: ResourceKind::Policy, ref name } if name == "missing"
        ));
        assert_eq!(
            mock.paths_for(Method::Delete),
            vec![
                "/services/svc-a",
                "/service-groups/grp-1",
                "/politicas/pol-1",
                "/events/ev-2",
                "/events/ev-1",
            ]
        );
        assert_eq!(failure.created, 5);
        assert_eq!(failure.rollback.succeeded, 5);
        assert!(mock.paths_for(Method::Post).iter().all(|p| p != "/services/svc-b/keys"));
    }

    #[test]
    fn test_rollback_failure_does_not_replace_original_error() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Delete,
            "/events/e3",
            MockResponse::Status(500, "stuck".into()),
        );
        mock.respond(
            Method::Post,
            "/services",
            MockResponse::Status(422, "bad webhook".into()),
        );

        let failure = run(
            &mock,
            r"
events:
  - {name: e1, severity: low}
  - {name: e2, severity: low}
  - {name: e3, severity: low}
  - {name: e4, severity: low}
  - {name: e5, severity: low}
services:
  - name: s
",
            false,
        )
        .unwrap_err();

        assert_eq!(failure.error.status(), Some(422));
        assert!(failure.to_string().contains("bad webhook"));
        assert_eq!(
            mock.paths_for(Method::Delete),
            vec!["/events/e5", "/events/e4", "/events/e3", "/events/e2", "/events/e1"]
        );
        assert_eq!(failure.rollback.attempted, 5);
        assert_eq!(failure.rollback.succeeded, 4);
        assert_eq!(failure.rollback.failures[0].entry, LedgerEntry::event("e3"));
    }

    #[test]
    fn test_existing_service_skipped_when_requested() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "/services/svc-a",
            MockResponse::Json(json!({"service_hash": "svc-a"})),
        );
        let doc = "services:\n  - hash: svc-a\n    name: a\n    keys:\n      - name: k\n";

        let summary = run(&mock, doc, true).unwrap();

        assert_eq!(summary.skipped, vec!["svc-a"]);
        assert_eq!(summary.services, 0);
        assert_eq!(summary.keys, 1);
        assert_eq!(
            mock.call_lines(),
            vec!["GET /services/svc-a", "POST /services/svc-a/keys"]
        );
    }

    #[test]
    fn test_existing_service_conflicts_and_rolls_back() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "/services/svc-a",
            MockResponse::Json(json!({"service_hash": "svc-a"})),
        );
        mock.respond(Method::Post, "/events", MockResponse::Json(json!({"event_id": "ev-9"})));

        let failure = run(
            &mock,
            "events:\n  - {name: e, severity: low}\nservices:\n  - hash: svc-a\n    name: a\n",
            false,
        )
        .unwrap_err();

        assert!(matches!(failure.error, Error::Conflict { ref hash } if hash == "svc-a"));
        // Only this run's event is undone; the pre-existing service is untouched.
        assert_eq!(mock.paths_for(Method::Delete), vec!["/events/ev-9"]);
    }

    #[test]
    fn test_existence_check_error_is_transport() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "/services/svc-a",
            MockResponse::Status(503, "down".into()),
        );

        let failure = run(&mock, "services:\n  - hash: svc-a\n    name: a\n", true).unwrap_err();
        assert_eq!(failure.error.status(), Some(503));
        assert!(mock.paths_for(Method::Post).is_empty());
    }

    #[test]
    fn test_unauthenticated_makes_no_calls() {
        let mock = MockTransport::new();
        let doc = Document::from_yaml_str(FULL).unwrap();
        let mut observer = Silent;

        let failure = apply(
            &doc,
            &ApplyOptions::default(),
            ApplyContext::new(&mock, &NoToken, &mut observer),
        )
        .unwrap_err();

        assert!(matches!(failure.error, Error::Unauthenticated(_)));
        assert!(failure.to_string().contains("certfix login"));
        assert_eq!(failure.created, 0);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_generated_hash_used_for_children_and_rollback() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/services",
            MockResponse::Json(json!({"service_hash": "gen-1"})),
        );
        mock.respond(
            Method::Post,
            "/services/gen-1/keys",
            MockResponse::Json(json!({"key_id": "key-7"})),
        );
        mock.respond(
            Method::Post,
            "/services/gen-1/matriz",
            MockResponse::Status(400, "invalid type".into()),
        );

        let failure = run(
            &mock,
            r"
services:
  - name: generated
    keys:
      - name: k
    relations:
      - target_hash: other
        type: nonsense
",
            false,
        )
        .unwrap_err();

        assert_eq!(failure.error.status(), Some(400));
        assert_eq!(
            mock.paths_for(Method::Delete),
            vec!["/services/gen-1/keys/key-7", "/services/gen-1"]
        );
        // No declared hash, so no existence probe.
        assert!(mock.paths_for(Method::Get).is_empty());
    }

    #[test]
    fn test_missing_generated_hash_fails() {
        let mock = MockTransport::new();
        let failure = run(&mock, "services:\n  - name: s\n", false).unwrap_err();
        assert!(failure.to_string().contains("service_hash"));
        assert!(mock.paths_for(Method::Delete).is_empty());
    }

    #[test]
    fn test_observer_sees_progress_and_rollback() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/politicas",
            MockResponse::Network("connection reset".into()),
        );
        let doc = Document::from_yaml_str(
            "events:\n  - {name: e1, severity: low}\npolicies:\n  - {name: p, strategy: gradual}\n",
        )
        .unwrap();
        let creds = StaticToken("tok".to_string());
        let mut recorder = Recorder::default();

        let failure = apply(
            &doc,
            &ApplyOptions::default(),
            ApplyContext::new(&mock, &creds, &mut recorder),
        )
        .unwrap_err();

        assert!(failure.to_string().contains("connection reset"));
        assert_eq!(
            recorder.lines,
            vec![
                "phase Events 1",
                "created event e1",
                "phase Policies 1",
                "rollback 1",
                "undo event e1 ok",
            ]
        );
    }

    struct PanicAfter {
        created: usize,
        limit: usize,
    }

    impl ApplyObserver for PanicAfter {
        fn on_created(&mut self, _entry: &LedgerEntry) {
            self.created += 1;
            if self.created == self.limit {
                panic!("observer exploded");
            }
        }
    }

    #[test]
    fn test_panic_mid_apply_still_rolls_back() {
        let mock = MockTransport::new();
        let doc = Document::from_yaml_str(
            "events:\n  - {name: e1, severity: low}\n  - {name: e2, severity: low}\n  - {name: e3, severity: low}\n",
        )
        .unwrap();
        let creds = StaticToken("tok".to_string());
        let mut observer = PanicAfter {
            created: 0,
            limit: 2,
        };

        let failure = apply(
            &doc,
            &ApplyOptions::default(),
            ApplyContext::new(&mock, &creds, &mut observer),
        )
        .unwrap_err();

        assert!(matches!(failure.error, Error::Aborted(ref msg) if msg == "observer exploded"));
        assert_eq!(
            mock.paths_for(Method::Delete),
            vec!["/events/e2", "/events/e1"]
        );
        assert_eq!(failure.rollback.succeeded, 2);
        assert_eq!(mock.paths_for(Method::Post).len(), 2);
    }

    /// Fails on the n-th creation and on every rollback hook afterwards,
    /// like a terminal whose pipe was closed.
    struct BrokenSink {
        created: usize,
        break_at: usize,
    }

    impl ApplyObserver for BrokenSink {
        fn on_created(&mut self, _entry: &LedgerEntry) {
            self.created += 1;
            if self.created >= self.break_at {
                panic!("broken pipe");
            }
        }
        fn on_rollback_start(&mut self, _count: usize) {
            panic!("broken pipe");
        }
        fn on_rolled_back(&mut self, _entry: &LedgerEntry, _error: Option<&str>) {
            panic!("broken pipe");
        }
    }

    const TWO_EVENTS: &str =
        "events:\n  - {name: e1, severity: low}\n  - {name: e2, severity: low}\n";

    #[test]
    fn test_unwinding_rollback_does_not_touch_broken_observer() {
        let mock = MockTransport::new();
        let doc = Document::from_yaml_str(TWO_EVENTS).unwrap();
        let creds = StaticToken("tok".to_string());
        let mut observer = BrokenSink {
            created: 0,
            break_at: 2,
        };

        let failure = apply(
            &doc,
            &ApplyOptions::default(),
            ApplyContext::new(&mock, &creds, &mut observer),
        )
        .unwrap_err();

        assert!(matches!(failure.error, Error::Aborted(ref msg) if msg == "broken pipe"));
        assert_eq!(
            mock.paths_for(Method::Delete),
            vec!["/events/e2", "/events/e1"]
        );
        assert_eq!(failure.created, 2);
        assert_eq!(failure.rollback.succeeded, 2);
    }

    #[test]
    fn test_observer_panic_during_rollback_keeps_original_error() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/service-groups",
            MockResponse::Status(500, "down".into()),
        );
        let doc = Document::from_yaml_str(&format!(
            "{TWO_EVENTS}service_groups:\n  - name: core\n"
        ))
        .unwrap();
        let creds = StaticToken("tok".to_string());
        let mut observer = BrokenSink {
            created: 0,
            break_at: usize::MAX,
        };

        let failure = apply(
            &doc,
            &ApplyOptions::default(),
            ApplyContext::new(&mock, &creds, &mut observer),
        )
        .unwrap_err();

        assert_eq!(failure.error.status(), Some(500));
        assert_eq!(failure.created, 2);
        assert_eq!(
            mock.paths_for(Method::Delete),
            vec!["/events/e2", "/events/e1"]
        );
        assert_eq!(failure.rollback.succeeded, 2);
        assert_eq!(failure.unattempted(), 0);
    }

    #[test]
    fn test_empty_document_is_noop() {
        let mock = MockTransport::new();
        let summary = run(&mock, "", false).unwrap();
        assert_eq!(summary.total_created(), 0);
        assert!(mock.calls().is_empty());
    }
}
