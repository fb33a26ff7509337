//! Reaper controller
//!
//! Watches Reaper resources and the children they own, and triggers
//! reconciliation of the owning Reaper.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use kube::{
    api::ListParams,
    runtime::{
        controller::{Action, Controller},
        reflector::ObjectRef,
        watcher::Config as WatcherConfig,
    },
    Api, Client, ResourceExt,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::controllers::Context;
use crate::crd::Reaper;
use crate::error::{Error, Result};
use crate::metrics;
use crate::resources::{APP_NAME, PARENT_ANNOTATION};
use crate::store::ParentKey;

/// Run the Reaper controller
pub async fn run(client: Client, context: Arc<Context>) {
    let api: Api<Reaper> = Api::all(client.clone());

    // Verify CRD is installed
    if let Err(e) = api.list(&ListParams::default().limit(1)).await {
        error!("Reaper CRD not installed: {}", e);
        return;
    }

    info!("Starting Reaper controller");

    let owned = WatcherConfig::default();
    // Owner references on cluster-scoped children carry no namespace, so those
    // children are mapped back to their Reaper through an annotation instead.
    let cluster_scoped = WatcherConfig::default().labels(&format!("app={}", APP_NAME));

    Controller::new(api, WatcherConfig::default())
        .owns(Api::<Deployment>::all(client.clone()), owned.clone())
        .owns(Api::<Service>::all(client.clone()), owned.clone())
        .owns(Api::<ServiceAccount>::all(client.clone()), owned.clone())
        .owns(Api::<Ingress>::all(client.clone()), owned)
        .watches(
            Api::<ClusterRole>::all(client.clone()),
            cluster_scoped.clone(),
            |role| parent_ref(&role),
        )
        .watches(
            Api::<ClusterRoleBinding>::all(client),
            cluster_scoped,
            |binding| parent_ref(&binding),
        )
        .graceful_shutdown_on(shutdown_trigger(&context.shutdown))
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    info!(
                        name = %obj.name,
                        namespace = obj.namespace.as_deref().unwrap_or("default"),
                        "Reconciled Reaper"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation error");
                    metrics::RECONCILIATION_ERRORS.with_label_values(&["Reaper"]).inc();
                }
            }
        })
        .await;
}

/// Resolves once the operator-wide shutdown token is cancelled
fn shutdown_trigger(token: &CancellationToken) -> impl Future<Output = ()> + Send + Sync + 'static {
    token.clone().cancelled_owned()
}

/// Map a cluster-scoped child to the Reaper named in its annotation
fn parent_ref<K: ResourceExt>(obj: &K) -> Option<ObjectRef<Reaper>> {
    let (namespace, name) = obj.annotations().get(PARENT_ANNOTATION)?.split_once('/')?;
    Some(ObjectRef::new(name).within(namespace))
}

/// Main reconciliation function
#[instrument(skip(obj, ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<Reaper>, ctx: Arc<Context>) -> Result<Action> {
    let _timer = metrics::RECONCILE_DURATION
        .with_label_values(&["Reaper"])
        .start_timer();
    metrics::RECONCILIATIONS.with_label_values(&["Reaper"]).inc();

    let namespace = obj
        .namespace()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
    let key = ParentKey::new(namespace, obj.name_any());

    let cancel = ctx.shutdown.child_token();
    let outcome = ctx.reconciler.reconcile(&key, &cancel).await?;
    Ok(outcome.into())
}

/// Error policy for the controller
fn error_policy(obj: Arc<Reaper>, error: &Error, _ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    error!(
        name = %name,
        error = %error,
        transient = error.is_transient(),
        "Reconciliation failed, scheduling retry"
    );

    let requeue_duration = match error {
        Error::Kube(_) | Error::Timeout(_) => Duration::from_secs(30),
        Error::Cancelled(_) => Duration::from_secs(5),
        Error::Config(_) | Error::Validation(_) | Error::Ownership(_) => Duration::from_secs(300),
        _ => Duration::from_secs(30),
    };

    Action::requeue(requeue_duration)
}
