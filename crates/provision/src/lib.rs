//! # Provision
//!
//! Declarative provisioning for the Certfix management API.
//!
//! A YAML [`Document`] lists events, policies, service groups and services
//! (with their keys and relations). [`apply`] creates them in dependency
//! order and records each creation in a [`Ledger`]. If anything fails, the
//! ledger is rolled back newest-first and the original error is returned.
//!
//! ## Core Concepts
//!
//! - **Document**: the desired resources, parsed from YAML
//! - **Phase**: one of six ordered creation steps
//! - **Ledger**: what this run created, used to drive rollback
//! - **Plan**: the dry-run view of a document, computed without any I/O
//!
//! ## Example
//!
//! ```
//! use provision::{apply, ApplyContext, ApplyOptions, Document, Silent, StaticToken};
//! use restkit::MockTransport;
//!
//! let doc = Document::from_yaml_str("events:\n  - name: deploy\n    severity: low\n")?;
//!
//! let transport = MockTransport::new();
//! let credentials = StaticToken("token".to_string());
//! let mut observer = Silent;
//!
//! let summary = apply(
//!     &doc,
//!     &ApplyOptions::default(),
//!     ApplyContext::new(&transport, &credentials, &mut observer),
//! )?;
//! assert_eq!(summary.events, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`Credentials`]: supplies the bearer token
//! - [`ApplyObserver`]: receives progress updates
//!
//! The transport comes from [`restkit`], so tests run against
//! [`restkit::MockTransport`].

pub mod context;
pub mod document;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod planner;
pub mod resolve;
pub mod rollback;
pub mod types;

pub use context::{ApplyContext, ApplyObserver, Credentials, Silent, StaticToken};
pub use document::{
    Document, EventSpec, KeySpec, PolicySpec, RelationSpec, ServiceGroupSpec, ServiceSpec,
};
pub use error::{ApplyFailure, Error, Result, RollbackFailure, RollbackReport};
pub use ledger::{Ledger, LedgerEntry, ResourceKind};
pub use orchestrator::apply;
pub use planner::{Plan, PlanItem, PlanPhase, plan};
pub use types::{ApplyOptions, ApplySummary, Phase};
