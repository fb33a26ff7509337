//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;
use kubescrub_operator::crd::{Reaper, ReaperSpec, ReaperStatus};
use kubescrub_operator::error::{Error, Result};
use kubescrub_operator::resources::{ChildKind, ChildResource};
use kubescrub_operator::store::{ParentKey, ResourceStore};

pub fn demo_spec() -> ReaperSpec {
    ReaperSpec {
        theme: "dark".to_string(),
        resources: "pods,deployments".to_string(),
        namespaces: "default".to_string(),
        poll: "true".to_string(),
        poll_interval: "30".to_string(),
    }
}

pub fn reaper(name: &str, namespace: &str, spec: ReaperSpec) -> Reaper {
    Reaper {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("uid-{}-{}", namespace, name)),
            generation: Some(1),
            ..Default::default()
        },
        spec,
        status: None,
    }
}

pub fn key_of(reaper: &Reaper) -> ParentKey {
    ParentKey::new(
        reaper.metadata.namespace.clone().unwrap_or_default(),
        reaper.metadata.name.clone().unwrap_or_default(),
    )
}

type ChildKey = (&'static str, Option<String>, String);

fn api_kind(resource: &ChildResource) -> &'static str {
    match resource {
        ChildResource::Deployment(_) => "Deployment",
        ChildResource::Service(_) => "Service",
        ChildResource::ServiceAccount(_) => "ServiceAccount",
        ChildResource::ClusterRole(_) => "ClusterRole",
        ChildResource::ClusterRoleBinding(_) => "ClusterRoleBinding",
        ChildResource::Ingress(_) => "Ingress",
    }
}

fn child_key(resource: &ChildResource) -> ChildKey {
    (
        api_kind(resource),
        resource.namespace().map(str::to_string),
        resource.name().to_string(),
    )
}

/// In-memory store recording every write
#[derive(Default)]
pub struct MemoryStore {
    reapers: Mutex<HashMap<ParentKey, Reaper>>,
    children: Mutex<BTreeMap<ChildKey, ChildResource>>,
    created: Mutex<Vec<ChildResource>>,
    status_patches: Mutex<Vec<ReaperStatus>>,
    fail_child_reads: AtomicBool,
    hang: AtomicBool,
}

impl MemoryStore {
    pub fn with_reaper(reaper: Reaper) -> Self {
        let store = Self::default();
        store.insert_reaper(reaper);
        store
    }

    pub fn insert_reaper(&self, reaper: Reaper) {
        self.reapers.lock().unwrap().insert(key_of(&reaper), reaper);
    }

    pub fn reaper(&self, key: &ParentKey) -> Option<Reaper> {
        self.reapers.lock().unwrap().get(key).cloned()
    }

    /// Seed an existing child without recording it as created
    pub fn insert_child(&self, resource: ChildResource) {
        self.children
            .lock()
            .unwrap()
            .insert(child_key(&resource), resource);
    }

    pub fn child(&self, resource: &ChildResource) -> Option<ChildResource> {
        self.children
            .lock()
            .unwrap()
            .get(&child_key(resource))
            .cloned()
    }

    pub fn child_count(&self) -> usize {
        self.children.lock().unwrap().len()
    }

    pub fn created(&self) -> Vec<ChildResource> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_patches(&self) -> Vec<ReaperStatus> {
        self.status_patches.lock().unwrap().clone()
    }

    pub fn fail_child_reads(&self, fail: bool) {
        self.fail_child_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every call block forever
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    async fn maybe_hang(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_reaper(&self, key: &ParentKey) -> Result<Option<Reaper>> {
        self.maybe_hang().await;
        Ok(self.reaper(key))
    }

    async fn child_meta(
        &self,
        kind: ChildKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<ObjectMeta>> {
        self.maybe_hang().await;
        if self.fail_child_reads.load(Ordering::SeqCst) {
            return Err(Error::Kube(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "etcdserver: request timed out".to_string(),
                reason: "InternalError".to_string(),
                code: 500,
            })));
        }
        let key = (kind.api_kind(), namespace.map(str::to_string), name.to_string());
        Ok(self
            .children
            .lock()
            .unwrap()
            .get(&key)
            .map(|child| child.meta().clone()))
    }

    async fn create_child(&self, child: &ChildResource) -> Result<()> {
        self.maybe_hang().await;
        self.created.lock().unwrap().push(child.clone());
        self.children
            .lock()
            .unwrap()
            .entry(child_key(child))
            .or_insert_with(|| child.clone());
        Ok(())
    }

    async fn patch_reaper_status(&self, key: &ParentKey, status: &ReaperStatus) -> Result<()> {
        self.maybe_hang().await;
        self.status_patches.lock().unwrap().push(status.clone());
        if let Some(reaper) = self.reapers.lock().unwrap().get_mut(key) {
            reaper.status = Some(status.clone());
        }
        Ok(())
    }
}
