//! Reaper reconciler
//!
//! Handles the business logic for Reaper reconciliation:
//! - Spec validation
//! - Desired-state synthesis and ownership linking
//! - Sequential create-if-missing for every child, primary Deployment first
//! - Status updates

use std::future::Future;
use std::time::Duration;

use kube::runtime::controller::Action;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ReconcilerConfig;
use crate::crd::{Condition, Reaper, ReaperSpec, ReaperStatus};
use crate::error::{Error, Result};
use crate::metrics;
use crate::resources::{self, ChildKind};
use crate::store::{ParentKey, ResourceStore};

/// Requeue delay after a spec error has been reported on the status
pub const PERMANENT_ERROR_REQUEUE: Duration = Duration::from_secs(300);

/// Longest accepted poll interval, in seconds
const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

/// What the scheduler should do after a reconcile pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Wait for the next watch event
    NoRequeue,
    /// Reconcile the same key again right away
    RequeueImmediate,
    /// Reconcile the same key again after a delay
    RequeueAfter(Duration),
}

impl From<ReconcileOutcome> for Action {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::NoRequeue => Action::await_change(),
            ReconcileOutcome::RequeueImmediate => Action::requeue(Duration::ZERO),
            ReconcileOutcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Validate the Reaper spec.
///
/// Every field ends up as a separate argv entry of the scrub container, so
/// values are restricted to plain tokens that cannot be read as options.
pub fn validate(spec: &ReaperSpec) -> Result<()> {
    validate_token("theme", &spec.theme, false)?;
    validate_token("resources", &spec.resources, true)?;
    validate_token("namespaces", &spec.namespaces, true)?;

    match spec.poll.as_str() {
        "true" | "false" => {}
        other => {
            return Err(Error::validation(format!(
                "Invalid poll '{}': must be one of: true, false",
                other
            )));
        }
    }

    let interval: u64 = spec.poll_interval.parse().map_err(|_| {
        Error::validation(format!(
            "Invalid pollInterval '{}': must be a whole number of seconds",
            spec.poll_interval
        ))
    })?;
    if interval == 0 || interval > MAX_POLL_INTERVAL_SECS {
        return Err(Error::validation(format!(
            "Invalid pollInterval {}: must be between 1 and {}",
            interval, MAX_POLL_INTERVAL_SECS
        )));
    }

    Ok(())
}

fn validate_token(field: &str, value: &str, list: bool) -> Result<()> {
    let items: Vec<&str> = if list {
        value.split(',').collect()
    } else {
        vec![value]
    };

    for item in items {
        if item.is_empty() {
            return Err(Error::validation(format!(
                "Invalid {} '{}': empty value",
                field, value
            )));
        }
        if item.starts_with('-') {
            return Err(Error::validation(format!(
                "Invalid {} '{}': values must not start with '-'",
                field, value
            )));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (list && c == '.');
        if let Some(bad) = item.chars().find(|&c| !allowed(c)) {
            return Err(Error::validation(format!(
                "Invalid {} '{}': unsupported character '{}'",
                field, value, bad
            )));
        }
    }

    Ok(())
}

/// Converges the children of one Reaper per call
pub struct Reconciler<S> {
    store: S,
    config: ReconcilerConfig,
}

impl<S: ResourceStore> Reconciler<S> {
    pub fn new(store: S, config: ReconcilerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one reconcile pass for `key`.
    ///
    /// Store calls abort with [`Error::Cancelled`] once `cancel` fires and
    /// with [`Error::Timeout`] after the configured store timeout. Errors
    /// are never retried here; the scheduler redelivers the key.
    #[instrument(skip(self, cancel), fields(reaper = %key))]
    pub async fn reconcile(
        &self,
        key: &ParentKey,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome> {
        let Some(reaper) = self
            .guarded(cancel, "get reaper", self.store.get_reaper(key))
            .await?
        else {
            debug!("Reaper no longer exists, nothing to do");
            return Ok(ReconcileOutcome::NoRequeue);
        };

        if let Err(e) = validate(&reaper.spec) {
            return self.report_permanent(&reaper, key, &e, "InvalidSpec", cancel).await;
        }

        let children = match resources::desired_state(&reaper, &self.config.synth) {
            Ok(children) => children,
            Err(e) if e.is_permanent() => {
                return self
                    .report_permanent(&reaper, key, &e, "OwnershipConflict", cancel)
                    .await;
            }
            Err(e) => return Err(e),
        };

        let mut created = 0u32;
        let mut present = 0u32;
        for child in &children {
            let name = child.resource.name();
            let namespace = child.resource.namespace();

            let existing = self
                .guarded(
                    cancel,
                    "get child",
                    self.store.child_meta(child.kind, name, namespace),
                )
                .await?;
            if let Some(meta) = existing {
                if let Err(e) = resources::verify_owner(&reaper, child.kind, &meta) {
                    return self
                        .report_permanent(&reaper, key, &e, "OwnershipConflict", cancel)
                        .await;
                }
                present += 1;
                continue;
            }

            info!(kind = %child.kind, name = %name, "Creating child resource");
            self.guarded(cancel, "create child", self.store.create_child(&child.resource))
                .await?;
            metrics::CHILDREN_CREATED
                .with_label_values(&[child.kind.as_str()])
                .inc();
            created += 1;

            if child.kind.is_gating() {
                return Ok(ReconcileOutcome::RequeueImmediate);
            }
        }

        if created > 0 {
            let status = progressing_status(&reaper, present, created);
            self.set_status(&reaper, key, status, cancel).await?;
            return Ok(ReconcileOutcome::RequeueImmediate);
        }

        self.set_status(&reaper, key, ready_status(&reaper, present), cancel)
            .await?;
        Ok(ReconcileOutcome::RequeueAfter(self.config.resync))
    }

    async fn report_permanent(
        &self,
        reaper: &Reaper,
        key: &ParentKey,
        error: &Error,
        reason: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome> {
        warn!(error = %error, reason, "Reaper cannot be reconciled");
        metrics::VALIDATION_FAILURES
            .with_label_values(&[reason])
            .inc();
        let status = failed_status(reaper, reason, &error.to_string());
        self.set_status(reaper, key, status, cancel).await?;
        Ok(ReconcileOutcome::RequeueAfter(PERMANENT_ERROR_REQUEUE))
    }

    /// Patch the status only when it changes, so our own write does not
    /// retrigger the watch in a loop.
    async fn set_status(
        &self,
        reaper: &Reaper,
        key: &ParentKey,
        status: ReaperStatus,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if reaper
            .status
            .as_ref()
            .is_some_and(|current| current.same_state(&status))
        {
            return Ok(());
        }
        self.guarded(
            cancel,
            "patch reaper status",
            self.store.patch_reaper_status(key, &status),
        )
        .await
    }

    async fn guarded<T, F>(&self, cancel: &CancellationToken, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled(op.to_string())),
            res = tokio::time::timeout(self.config.store_timeout, fut) => {
                res.unwrap_or_else(|_| Err(Error::Timeout(op.to_string())))
            }
        }
    }
}

fn ready_status(reaper: &Reaper, present: u32) -> ReaperStatus {
    ReaperStatus {
        phase: Some("Ready".to_string()),
        message: Some("All child resources exist".to_string()),
        children_ready: Some(present),
        observed_generation: reaper.metadata.generation,
        conditions: vec![Condition::ready(
            true,
            "ChildrenReady",
            "All child resources exist",
        )],
    }
}

fn progressing_status(reaper: &Reaper, present: u32, created: u32) -> ReaperStatus {
    let message = format!(
        "Created {} child resources, {} of {} already present",
        created,
        present,
        ChildKind::ALL.len()
    );
    ReaperStatus {
        phase: Some("Progressing".to_string()),
        message: Some(message.clone()),
        children_ready: Some(present),
        observed_generation: reaper.metadata.generation,
        conditions: vec![Condition::ready(false, "CreatingChildren", message)],
    }
}

fn failed_status(reaper: &Reaper, reason: &str, message: &str) -> ReaperStatus {
    ReaperStatus {
        phase: Some("Failed".to_string()),
        message: Some(message.to_string()),
        children_ready: reaper.status.as_ref().and_then(|s| s.children_ready),
        observed_generation: reaper.metadata.generation,
        conditions: vec![Condition::ready(false, reason, message)],
    }
}
