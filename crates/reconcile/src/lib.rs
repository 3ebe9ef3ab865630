//! # Reconcile
//!
//! Idempotent provisioning of a monitoring inventory.
//!
//! Given a [`DesiredState`] (a host group, templates, a list of hosts with
//! roles, a web check and dashboard names), a [`Reconciler`] makes the
//! Zabbix server match it without creating duplicates on repeated runs.
//!
//! ## Core Concepts
//!
//! - **Natural key**: the name an object is found by (host name, group name,
//!   trigger description). Every create is preceded by one lookup on it.
//! - **ExistenceResolver**: turns a kind + natural key into an id, or nothing
//! - **Reconciler**: runs the fixed, dependency-ordered steps
//! - **RunReport**: per-kind counts, recovered failures and warnings
//!
//! ## Failure policy
//!
//! Login failure, a missing base template and any error outside the trigger
//! phase abort the run with an [`Error`]. Trigger failures are recorded and
//! the run continues. Nothing is rolled back.
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: receives phases, per-object outcomes and warnings
//!
//! The engine itself never prints.

pub mod addresses;
pub mod context;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod layout;
pub mod report;
pub mod resolver;
pub mod triggers;
pub mod types;

// Re-export main types at crate root
pub use addresses::{AddressChange, AddressReport, sync_addresses};
pub use context::{NoProgress, Phase, ProgressCallback};
pub use engine::{Credentials, Reconciler};
pub use error::{Error, Result};
pub use layout::{Grid, Placement};
pub use report::{Counters, Failure, RunReport};
pub use resolver::ExistenceResolver;
pub use types::{
    Change, ConflictPolicy, DashboardSettings, DesiredState, HostSpec, Outcome, Role, WebCheck,
};
