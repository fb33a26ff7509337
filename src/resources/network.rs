//! Services and Ingress exposing the scrub workload and its web UI

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use super::workload::HTTP_PORT;
use super::{labels, ChildNames};
use crate::config::SynthConfig;
use crate::crd::Reaper;

/// Path routed to the scrub API
pub const SCRUB_PATH: &str = "/scrub";

/// Path routed to the web UI
pub const WEB_PATH: &str = "/";

/// Service in front of the primary Deployment
pub fn primary_service(reaper: &Reaper, names: &ChildNames) -> Service {
    service(
        names.primary(),
        names.namespace(),
        labels::primary_labels(&reaper.name_any()),
    )
}

/// Service in front of the web Deployment
pub fn web_service(reaper: &Reaper, names: &ChildNames) -> Service {
    service(
        names.web(),
        names.namespace(),
        labels::web_labels(&reaper.name_any()),
    )
}

fn service(name: &str, namespace: &str, selector: BTreeMap<String, String>) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(selector.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: HTTP_PORT,
                target_port: Some(IntOrString::Int(HTTP_PORT)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ingress routing `/scrub` to the primary Service and `/` to the web Service
pub fn ingress(reaper: &Reaper, names: &ChildNames, config: &SynthConfig) -> Ingress {
    let paths = vec![
        prefix_path(SCRUB_PATH, names.primary()),
        prefix_path(WEB_PATH, names.web()),
    ];

    Ingress {
        metadata: ObjectMeta {
            name: Some(names.primary().to_string()),
            namespace: Some(names.namespace().to_string()),
            labels: Some(labels::primary_labels(&reaper.name_any())),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some(config.ingress_class.clone()),
            rules: Some(vec![IngressRule {
                host: None,
                http: Some(HTTPIngressRuleValue { paths }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn prefix_path(path: &str, service: &str) -> HTTPIngressPath {
    HTTPIngressPath {
        path: Some(path.to_string()),
        path_type: "Prefix".to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: service.to_string(),
                port: Some(ServiceBackendPort {
                    number: Some(HTTP_PORT),
                    name: None,
                }),
            }),
            resource: None,
        },
    }
}
