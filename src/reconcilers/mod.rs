//! Reconcilers for the Kubescrub CRD
//!
//! This module contains the business logic for reconciling a Reaper.
//! The reconciler is responsible for:
//! - Validating the Reaper spec
//! - Creating missing child resources
//! - Updating resource status

pub mod reaper;

pub use reaper::{validate, ReconcileOutcome, Reconciler};
