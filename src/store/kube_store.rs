//! [`ResourceStore`] backed by the Kubernetes API

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::debug;

use super::{ParentKey, ResourceStore};
use crate::crd::{Reaper, ReaperStatus};
use crate::error::{Error, Result};
use crate::resources::{ChildKind, ChildResource};

/// Field manager recorded on every write
pub const FIELD_MANAGER: &str = "kubescrub-operator";

/// Kubernetes API store
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<K>(&self, namespace: Option<&str>) -> Result<Api<K>>
    where
        K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>,
    {
        let namespace = namespace.ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
        Ok(Api::namespaced(self.client.clone(), namespace))
    }

    fn cluster<K>(&self) -> Api<K>
    where
        K: Resource<DynamicType = (), Scope = k8s_openapi::ClusterResourceScope>,
    {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_reaper(&self, key: &ParentKey) -> Result<Option<Reaper>> {
        let api: Api<Reaper> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    async fn child_meta(
        &self,
        kind: ChildKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<ObjectMeta>> {
        match kind {
            ChildKind::PrimaryDeployment | ChildKind::WebDeployment => {
                meta(self.namespaced::<Deployment>(namespace)?, name).await
            }
            ChildKind::PrimaryService | ChildKind::WebService => {
                meta(self.namespaced::<Service>(namespace)?, name).await
            }
            ChildKind::ServiceAccount => {
                meta(self.namespaced::<ServiceAccount>(namespace)?, name).await
            }
            ChildKind::Ingress => meta(self.namespaced::<Ingress>(namespace)?, name).await,
            ChildKind::ClusterRole => meta(self.cluster::<ClusterRole>(), name).await,
            ChildKind::ClusterRoleBinding => {
                meta(self.cluster::<ClusterRoleBinding>(), name).await
            }
        }
    }

    async fn create_child(&self, child: &ChildResource) -> Result<()> {
        let namespace = child.namespace();
        match child {
            ChildResource::Deployment(obj) => create(self.namespaced(namespace)?, obj).await,
            ChildResource::Service(obj) => create(self.namespaced(namespace)?, obj).await,
            ChildResource::ServiceAccount(obj) => create(self.namespaced(namespace)?, obj).await,
            ChildResource::Ingress(obj) => create(self.namespaced(namespace)?, obj).await,
            ChildResource::ClusterRole(obj) => create(self.cluster(), obj).await,
            ChildResource::ClusterRoleBinding(obj) => create(self.cluster(), obj).await,
        }
    }

    async fn patch_reaper_status(&self, key: &ParentKey, status: &ReaperStatus) -> Result<()> {
        let api: Api<Reaper> = Api::namespaced(self.client.clone(), &key.namespace);
        let patch = json!({ "status": status });
        api.patch_status(&key.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await?;
        Ok(())
    }
}

async fn meta<K>(api: Api<K>, name: &str) -> Result<Option<ObjectMeta>>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    Ok(api.get_opt(name).await?.map(|obj| obj.meta().clone()))
}

async fn create<K>(api: Api<K>, obj: &K) -> Result<()>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    let params = PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    };

    match api.create(&params, obj).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(err)) if err.code == 409 => {
            debug!(reason = %err.reason, "Object already exists, treating create as done");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
