//! ServiceAccount and cluster-wide RBAC for the scrub workload
//!
//! The ClusterRole below is the workload's entire privilege boundary:
//! read and delete access to pods and nodes across the cluster.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use super::{labels, ChildNames};
use crate::crd::Reaper;

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Annotation on cluster-scoped children holding `<namespace>/<name>` of the owning Reaper
pub const PARENT_ANNOTATION: &str = "infra.caseywylie.io/reaper";

/// Resources the workload may act on
pub const SCRUBBED_RESOURCES: [&str; 2] = ["pods", "nodes"];

/// Verbs granted on [`SCRUBBED_RESOURCES`]
pub const SCRUB_VERBS: [&str; 4] = ["get", "list", "watch", "delete"];

/// ServiceAccount used by the primary Deployment's pods
pub fn service_account(reaper: &Reaper, names: &ChildNames) -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: Some(names.primary().to_string()),
            namespace: Some(names.namespace().to_string()),
            labels: Some(labels::primary_labels(&reaper.name_any())),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn cluster_role(reaper: &Reaper, names: &ChildNames) -> ClusterRole {
    ClusterRole {
        metadata: cluster_meta(reaper, names),
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec![String::new()]),
            resources: Some(SCRUBBED_RESOURCES.iter().map(|r| r.to_string()).collect()),
            verbs: SCRUB_VERBS.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

pub fn cluster_role_binding(reaper: &Reaper, names: &ChildNames) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: cluster_meta(reaper, names),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "ClusterRole".to_string(),
            name: names.cluster().to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: names.primary().to_string(),
            namespace: Some(names.namespace().to_string()),
            api_group: None,
        }]),
    }
}

fn cluster_meta(reaper: &Reaper, names: &ChildNames) -> ObjectMeta {
    let parent = format!(
        "{}/{}",
        reaper.namespace().unwrap_or_default(),
        reaper.name_any()
    );
    ObjectMeta {
        name: Some(names.cluster().to_string()),
        labels: Some(labels::primary_labels(&reaper.name_any())),
        annotations: Some(BTreeMap::from([(PARENT_ANNOTATION.to_string(), parent)])),
        ..Default::default()
    }
}
