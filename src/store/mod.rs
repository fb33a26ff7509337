//! Access to cluster state
//!
//! The reconciler only talks to the API server through [`ResourceStore`],
//! which keeps the control loop testable against an in-memory store.

mod kube_store;

pub use kube_store::KubeStore;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::crd::{Reaper, ReaperStatus};
use crate::error::Result;
use crate::resources::{ChildKind, ChildResource};

/// Namespaced key identifying a Reaper
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParentKey {
    pub namespace: String,
    pub name: String,
}

impl ParentKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ParentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Typed get/create access to Reapers and their children
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a Reaper, `None` if it does not exist
    async fn get_reaper(&self, key: &ParentKey) -> Result<Option<Reaper>>;

    /// Metadata of an existing child, `None` if it does not exist
    async fn child_meta(
        &self,
        kind: ChildKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<ObjectMeta>>;

    /// Create a child. Creating an object that already exists succeeds.
    async fn create_child(&self, child: &ChildResource) -> Result<()>;

    /// Replace the status subresource of a Reaper
    async fn patch_reaper_status(&self, key: &ParentKey, status: &ReaperStatus) -> Result<()>;
}
