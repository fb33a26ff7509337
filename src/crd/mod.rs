//! Custom Resource Definitions for the Kubescrub Operator

mod reaper;

pub use reaper::*;

use kube::CustomResourceExt;

/// Generate all CRD YAML manifests
pub fn generate_crds() -> Result<Vec<String>, serde_yaml::Error> {
    Ok(vec![serde_yaml::to_string(&Reaper::crd())?])
}
