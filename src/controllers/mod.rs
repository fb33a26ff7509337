//! Kubernetes controller for the Reaper CRD
//!
//! Watches Reapers and their children and triggers reconciliation.

mod reaper_controller;

pub use reaper_controller::run as run_reaper_controller;

use tokio_util::sync::CancellationToken;

use crate::reconcilers::Reconciler;
use crate::store::KubeStore;

/// Shared context for the controller
pub struct Context {
    /// Reconciler bound to the Kubernetes API
    pub reconciler: Reconciler<KubeStore>,
    /// Cancelled on shutdown; each reconcile runs under a child token
    pub shutdown: CancellationToken,
}

impl Context {
    /// Create a new context
    pub fn new(reconciler: Reconciler<KubeStore>, shutdown: CancellationToken) -> Self {
        Self {
            reconciler,
            shutdown,
        }
    }
}
