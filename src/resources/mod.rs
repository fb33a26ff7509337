//! Desired-state synthesis for Reaper children
//!
//! Maps a Reaper to the full set of child objects it owns. Synthesis is
//! pure: the same Reaper and [`SynthConfig`] always produce identical
//! objects, and nothing here talks to the API server.
//!
//! [`ChildKind`] is the closed registry of children. The reconciler walks
//! [`ChildKind::ALL`] in order, so every kind is converged the same way.

mod labels;
mod naming;
mod network;
mod owner;
mod rbac;
mod workload;

pub use labels::{primary_labels, web_labels, APP_NAME, CR_LABEL};
pub use naming::{ChildNames, ChildNaming};
pub use owner::{link, verify_owner};
pub use rbac::{PARENT_ANNOTATION, SCRUBBED_RESOURCES, SCRUB_VERBS};
pub use workload::{scrub_command, HEALTH_PATH, HTTP_PORT};

use std::fmt;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::config::SynthConfig;
use crate::crd::Reaper;
use crate::error::Result;

/// Every child a Reaper owns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKind {
    PrimaryDeployment,
    WebDeployment,
    PrimaryService,
    WebService,
    ServiceAccount,
    ClusterRole,
    ClusterRoleBinding,
    Ingress,
}

impl ChildKind {
    /// Reconcile order. The primary Deployment gates everything after it.
    pub const ALL: [ChildKind; 8] = [
        ChildKind::PrimaryDeployment,
        ChildKind::WebDeployment,
        ChildKind::PrimaryService,
        ChildKind::WebService,
        ChildKind::ServiceAccount,
        ChildKind::ClusterRole,
        ChildKind::ClusterRoleBinding,
        ChildKind::Ingress,
    ];

    /// Whether no later child is attempted until this one exists
    pub fn is_gating(self) -> bool {
        matches!(self, ChildKind::PrimaryDeployment)
    }

    pub fn is_cluster_scoped(self) -> bool {
        matches!(self, ChildKind::ClusterRole | ChildKind::ClusterRoleBinding)
    }

    /// Kubernetes kind of the object
    pub fn api_kind(self) -> &'static str {
        match self {
            ChildKind::PrimaryDeployment | ChildKind::WebDeployment => "Deployment",
            ChildKind::PrimaryService | ChildKind::WebService => "Service",
            ChildKind::ServiceAccount => "ServiceAccount",
            ChildKind::ClusterRole => "ClusterRole",
            ChildKind::ClusterRoleBinding => "ClusterRoleBinding",
            ChildKind::Ingress => "Ingress",
        }
    }

    /// Stable identifier used in logs and metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            ChildKind::PrimaryDeployment => "primary-deployment",
            ChildKind::WebDeployment => "web-deployment",
            ChildKind::PrimaryService => "primary-service",
            ChildKind::WebService => "web-service",
            ChildKind::ServiceAccount => "service-account",
            ChildKind::ClusterRole => "cluster-role",
            ChildKind::ClusterRoleBinding => "cluster-role-binding",
            ChildKind::Ingress => "ingress",
        }
    }

    /// Desired object for this child, without an owner reference
    pub fn desired(self, reaper: &Reaper, names: &ChildNames, config: &SynthConfig) -> ChildResource {
        match self {
            ChildKind::PrimaryDeployment => {
                ChildResource::Deployment(workload::primary_deployment(reaper, names, config))
            }
            ChildKind::WebDeployment => {
                ChildResource::Deployment(workload::web_deployment(reaper, names, config))
            }
            ChildKind::PrimaryService => {
                ChildResource::Service(network::primary_service(reaper, names))
            }
            ChildKind::WebService => ChildResource::Service(network::web_service(reaper, names)),
            ChildKind::ServiceAccount => {
                ChildResource::ServiceAccount(rbac::service_account(reaper, names))
            }
            ChildKind::ClusterRole => ChildResource::ClusterRole(rbac::cluster_role(reaper, names)),
            ChildKind::ClusterRoleBinding => {
                ChildResource::ClusterRoleBinding(rbac::cluster_role_binding(reaper, names))
            }
            ChildKind::Ingress => ChildResource::Ingress(network::ingress(reaper, names, config)),
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed child object
#[derive(Clone, Debug, PartialEq)]
pub enum ChildResource {
    Deployment(Deployment),
    Service(Service),
    ServiceAccount(ServiceAccount),
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    Ingress(Ingress),
}

impl ChildResource {
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            ChildResource::Deployment(o) => &o.metadata,
            ChildResource::Service(o) => &o.metadata,
            ChildResource::ServiceAccount(o) => &o.metadata,
            ChildResource::ClusterRole(o) => &o.metadata,
            ChildResource::ClusterRoleBinding(o) => &o.metadata,
            ChildResource::Ingress(o) => &o.metadata,
        }
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ChildResource::Deployment(o) => &mut o.metadata,
            ChildResource::Service(o) => &mut o.metadata,
            ChildResource::ServiceAccount(o) => &mut o.metadata,
            ChildResource::ClusterRole(o) => &mut o.metadata,
            ChildResource::ClusterRoleBinding(o) => &mut o.metadata,
            ChildResource::Ingress(o) => &mut o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.meta().namespace.as_deref()
    }
}

/// A child object tagged with its role
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredChild {
    pub kind: ChildKind,
    pub resource: ChildResource,
}

/// Build every child for `reaper` in reconcile order, without owner references
pub fn synthesize(reaper: &Reaper, config: &SynthConfig) -> Result<Vec<DesiredChild>> {
    let names = ChildNames::resolve(&config.naming, reaper)?;
    Ok(ChildKind::ALL
        .iter()
        .map(|&kind| DesiredChild {
            kind,
            resource: kind.desired(reaper, &names, config),
        })
        .collect())
}

/// Build every child for `reaper` and link each one to it
pub fn desired_state(reaper: &Reaper, config: &SynthConfig) -> Result<Vec<DesiredChild>> {
    synthesize(reaper, config)?
        .into_iter()
        .map(|child| link(reaper, child))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ReaperSpec;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn reaper(name: &str, namespace: &str) -> Reaper {
        Reaper {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                uid: Some(format!("uid-{}", name)),
                ..Default::default()
            },
            spec: ReaperSpec {
                theme: "dark".to_string(),
                resources: "pods,deployments".to_string(),
                namespaces: "default".to_string(),
                poll: "true".to_string(),
                poll_interval: "30".to_string(),
            },
            status: None,
        }
    }

    fn deployment(children: &[DesiredChild], kind: ChildKind) -> &Deployment {
        match &children.iter().find(|c| c.kind == kind).unwrap().resource {
            ChildResource::Deployment(d) => d,
            other => panic!("expected Deployment, got {:?}", other),
        }
    }

    #[test]
    fn synthesizes_children_in_reconcile_order() {
        let children = synthesize(&reaper("demo", "kubescrub"), &SynthConfig::default()).unwrap();
        let kinds: Vec<_> = children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, ChildKind::ALL.to_vec());
    }

    #[test]
    fn primary_probes_target_container_port() {
        let children = synthesize(&reaper("demo", "kubescrub"), &SynthConfig::default()).unwrap();
        let pod = deployment(&children, ChildKind::PrimaryDeployment)
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap();
        assert_eq!(pod.service_account_name.as_deref(), Some("kubescrub"));
        let container = &pod.containers[0];

        let probe = container.readiness_probe.as_ref().unwrap();
        let http = probe.http_get.as_ref().unwrap();
        assert_eq!(http.path.as_deref(), Some("/scrub/healthz"));
        assert_eq!(http.port, IntOrString::Int(8080));
        assert_eq!(probe.initial_delay_seconds, Some(5));
        assert_eq!(probe.period_seconds, Some(5));
        assert_eq!(container.liveness_probe.as_ref(), Some(probe));

        let port = container.ports.as_ref().unwrap()[0].container_port;
        assert_eq!(port, 8080);
    }

    #[test]
    fn web_deployment_has_no_command_or_probes() {
        let children = synthesize(&reaper("demo", "kubescrub"), &SynthConfig::default()).unwrap();
        let web = deployment(&children, ChildKind::WebDeployment);
        let container = &web.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0];
        assert!(container.command.is_none());
        assert!(container.args.is_none());
        assert!(container.readiness_probe.is_none());
        assert!(container.liveness_probe.is_none());
        assert_eq!(web.metadata.name.as_deref(), Some("kubescrub-web"));
        assert_eq!(web.spec.as_ref().unwrap().replicas, Some(1));
    }

    #[test]
    fn cluster_role_grants_scrub_permissions_only() {
        let children = synthesize(&reaper("demo", "kubescrub"), &SynthConfig::default()).unwrap();
        let role = children
            .iter()
            .find_map(|c| match &c.resource {
                ChildResource::ClusterRole(r) => Some(r),
                _ => None,
            })
            .unwrap();
        let rules = role.rules.as_ref().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].api_groups, Some(vec![String::new()]));
        assert_eq!(
            rules[0].resources,
            Some(vec!["pods".to_string(), "nodes".to_string()])
        );
        assert_eq!(rules[0].verbs, vec!["get", "list", "watch", "delete"]);
    }

    #[test]
    fn per_parent_names_follow_parent() {
        let config = SynthConfig {
            naming: ChildNaming::PerParent,
            ..SynthConfig::default()
        };
        let children = synthesize(&reaper("demo", "team-a"), &config).unwrap();
        for child in &children {
            let expected = match child.kind {
                ChildKind::ClusterRole | ChildKind::ClusterRoleBinding => "kubescrub.team-a.demo",
                ChildKind::WebDeployment | ChildKind::WebService => "demo-web",
                _ => "demo-scrub",
            };
            assert_eq!(child.resource.name(), expected, "{} name", child.kind);
            if child.kind.is_cluster_scoped() {
                assert_eq!(child.resource.namespace(), None);
            } else {
                assert_eq!(child.resource.namespace(), Some("team-a"));
            }
        }
    }
}
