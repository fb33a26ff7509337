//! Deployments for the scrub workload and its web UI

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, HTTPGetAction, PodSpec, PodTemplateSpec, Probe,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use super::{labels, ChildNames};
use crate::config::SynthConfig;
use crate::crd::{Reaper, ReaperSpec};

/// Port both containers listen on
pub const HTTP_PORT: i32 = 8080;

/// Health endpoint of the scrub workload
pub const HEALTH_PATH: &str = "/scrub/healthz";

const PROBE_DELAY_SECONDS: i32 = 5;
const PROBE_PERIOD_SECONDS: i32 = 5;

/// Build the container command for the scrub workload.
///
/// Spec strings are passed as separate argv entries; the reconciler
/// validates them before this is called.
pub fn scrub_command(spec: &ReaperSpec) -> Vec<String> {
    [
        "./kubescrub",
        "serve",
        "-p",
        "8080",
        "--theme",
        spec.theme.as_str(),
        "--watch",
        spec.resources.as_str(),
        "--namespaces",
        spec.namespaces.as_str(),
        "--poll",
        spec.poll.as_str(),
        "--pollInterval",
        spec.poll_interval.as_str(),
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Primary scrub Deployment
pub fn primary_deployment(reaper: &Reaper, names: &ChildNames, config: &SynthConfig) -> Deployment {
    let labels = labels::primary_labels(&reaper.name_any());

    let container = Container {
        name: names.primary().to_string(),
        image: Some(config.scrub_image.clone()),
        command: Some(scrub_command(&reaper.spec)),
        ports: Some(vec![http_port()]),
        readiness_probe: Some(health_probe()),
        liveness_probe: Some(health_probe()),
        ..Default::default()
    };

    deployment(
        names.primary(),
        names.namespace(),
        labels,
        PodSpec {
            service_account_name: Some(names.primary().to_string()),
            containers: vec![container],
            ..Default::default()
        },
    )
}

/// Web UI Deployment
pub fn web_deployment(reaper: &Reaper, names: &ChildNames, config: &SynthConfig) -> Deployment {
    let labels = labels::web_labels(&reaper.name_any());

    let container = Container {
        name: names.web().to_string(),
        image: Some(config.web_image.clone()),
        ports: Some(vec![http_port()]),
        ..Default::default()
    };

    deployment(
        names.web(),
        names.namespace(),
        labels,
        PodSpec {
            containers: vec![container],
            ..Default::default()
        },
    )
}

fn deployment(
    name: &str,
    namespace: &str,
    labels: std::collections::BTreeMap<String, String>,
    pod_spec: PodSpec,
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn http_port() -> ContainerPort {
    ContainerPort {
        name: Some("http".to_string()),
        container_port: HTTP_PORT,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}

fn health_probe() -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(HEALTH_PATH.to_string()),
            port: IntOrString::Int(HTTP_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(PROBE_DELAY_SECONDS),
        period_seconds: Some(PROBE_PERIOD_SECONDS),
        ..Default::default()
    }
}
