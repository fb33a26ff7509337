//! Reaper Custom Resource Definition

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reaper resource specification
///
/// All fields are kept as strings to stay wire-compatible with existing
/// manifests; they are validated by the reconciler before use.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "infra.caseywylie.io",
    version = "v1alpha1",
    kind = "Reaper",
    plural = "reapers",
    singular = "reaper",
    shortname = "rp",
    namespaced,
    status = "ReaperStatus",
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Theme", "type": "string", "jsonPath": ".spec.theme"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ReaperSpec {
    /// UI theme passed to the scrub workload
    #[serde(default)]
    pub theme: String,

    /// Comma separated resource kinds to watch (e.g. "pods,deployments")
    #[serde(default)]
    pub resources: String,

    /// Comma separated namespaces to watch
    #[serde(default)]
    pub namespaces: String,

    /// Enable polling ("true" or "false")
    #[serde(default)]
    pub poll: String,

    /// Polling interval in seconds
    #[serde(default)]
    pub poll_interval: String,
}

/// Reaper status
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReaperStatus {
    /// Current phase (Pending, Progressing, Ready, Failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Number of child kinds that exist in the cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_ready: Option<u32>,

    /// Observed generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Status conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ReaperStatus {
    /// Whether two statuses describe the same state, ignoring transition timestamps
    pub fn same_state(&self, other: &ReaperStatus) -> bool {
        self.phase == other.phase
            && self.message == other.message
            && self.children_ready == other.children_ready
            && self.observed_generation == other.observed_generation
            && self.conditions.len() == other.conditions.len()
            && self
                .conditions
                .iter()
                .zip(&other.conditions)
                .all(|(a, b)| {
                    a.type_ == b.type_
                        && a.status == b.status
                        && a.reason == b.reason
                        && a.message == b.message
                })
    }
}

/// Status condition
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type
    #[serde(rename = "type")]
    pub type_: String,

    /// Status (True, False, Unknown)
    pub status: String,

    /// Last transition time
    pub last_transition_time: DateTime<Utc>,

    /// Reason for the condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    /// Build a `Ready` condition stamped with the current time
    pub fn ready(ready: bool, reason: &str, message: impl Into<String>) -> Self {
        Self {
            type_: "Ready".to_string(),
            status: if ready { "True" } else { "False" }.to_string(),
            last_transition_time: Utc::now(),
            reason: Some(reason.to_string()),
            message: Some(message.into()),
        }
    }
}
