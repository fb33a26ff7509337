//! Operator configuration
//!
//! Flags are parsed with clap; each one falls back to a `KUBESCRUB_*`
//! environment variable so the operator can be configured from its
//! Deployment manifest.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{Error, Result};
use crate::resources::ChildNaming;

/// Default container image for the scrub workload
pub const DEFAULT_SCRUB_IMAGE: &str = "docker.io/cmwylie19/kubescrub:latest";

/// Default container image for the web UI
pub const DEFAULT_WEB_IMAGE: &str = "docker.io/cmwylie19/kubescrub-web:latest";

/// Default ingress class for the generated Ingress
pub const DEFAULT_INGRESS_CLASS: &str = "nginx";

/// Name and namespace shared by every child under fixed naming
pub const DEFAULT_CHILD_NAME: &str = "kubescrub";
pub const DEFAULT_CHILD_NAMESPACE: &str = "kubescrub";

/// Naming strategy selectable on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NamingMode {
    /// Every Reaper maps to the same child names
    Fixed,
    /// Children are named after their owning Reaper
    PerParent,
}

/// Command line / environment configuration
#[derive(Clone, Debug, Parser)]
#[command(name = "kubescrub-operator", version, about = "Kubernetes Operator for Kubescrub")]
pub struct OperatorConfig {
    /// Port for the metrics and health server
    #[arg(long, env = "KUBESCRUB_METRICS_PORT", default_value_t = 8080)]
    pub metrics_port: u16,

    /// How child resources are named
    #[arg(long, env = "KUBESCRUB_CHILD_NAMING", value_enum, default_value_t = NamingMode::Fixed)]
    pub child_naming: NamingMode,

    /// Child name used by fixed naming
    #[arg(long, env = "KUBESCRUB_CHILD_NAME", default_value = DEFAULT_CHILD_NAME)]
    pub child_name: String,

    /// Child namespace used by fixed naming
    #[arg(long, env = "KUBESCRUB_CHILD_NAMESPACE", default_value = DEFAULT_CHILD_NAMESPACE)]
    pub child_namespace: String,

    /// Image for the scrub workload
    #[arg(long, env = "KUBESCRUB_SCRUB_IMAGE", default_value = DEFAULT_SCRUB_IMAGE)]
    pub scrub_image: String,

    /// Image for the web UI
    #[arg(long, env = "KUBESCRUB_WEB_IMAGE", default_value = DEFAULT_WEB_IMAGE)]
    pub web_image: String,

    /// Ingress class for the generated Ingress
    #[arg(long, env = "KUBESCRUB_INGRESS_CLASS", default_value = DEFAULT_INGRESS_CLASS)]
    pub ingress_class: String,

    /// Upper bound on a single Kubernetes API call, in seconds
    #[arg(long, env = "KUBESCRUB_STORE_TIMEOUT_SECS", default_value_t = 10)]
    pub store_timeout_secs: u64,

    /// Requeue interval once all children exist, in seconds
    #[arg(long, env = "KUBESCRUB_RESYNC_SECS", default_value_t = 300)]
    pub resync_secs: u64,
}

impl OperatorConfig {
    /// Build the synthesizer configuration
    pub fn synth_config(&self) -> SynthConfig {
        let naming = match self.child_naming {
            NamingMode::Fixed => ChildNaming::Fixed {
                name: self.child_name.clone(),
                namespace: self.child_namespace.clone(),
            },
            NamingMode::PerParent => ChildNaming::PerParent,
        };

        SynthConfig {
            naming,
            scrub_image: self.scrub_image.clone(),
            web_image: self.web_image.clone(),
            ingress_class: self.ingress_class.clone(),
        }
    }

    /// Build the reconciler configuration
    pub fn reconciler_config(&self) -> Result<ReconcilerConfig> {
        if self.store_timeout_secs == 0 {
            return Err(Error::config("--store-timeout-secs must be at least 1"));
        }
        if self.resync_secs == 0 {
            return Err(Error::config("--resync-secs must be at least 1"));
        }
        if self.child_naming == NamingMode::Fixed
            && (self.child_name.is_empty() || self.child_namespace.is_empty())
        {
            return Err(Error::config(
                "--child-name and --child-namespace must not be empty with fixed naming",
            ));
        }

        Ok(ReconcilerConfig {
            synth: self.synth_config(),
            store_timeout: Duration::from_secs(self.store_timeout_secs),
            resync: Duration::from_secs(self.resync_secs),
        })
    }
}

/// Inputs to the desired-state synthesizer that are not part of the Reaper spec
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthConfig {
    pub naming: ChildNaming,
    pub scrub_image: String,
    pub web_image: String,
    pub ingress_class: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            naming: ChildNaming::Fixed {
                name: DEFAULT_CHILD_NAME.to_string(),
                namespace: DEFAULT_CHILD_NAMESPACE.to_string(),
            },
            scrub_image: DEFAULT_SCRUB_IMAGE.to_string(),
            web_image: DEFAULT_WEB_IMAGE.to_string(),
            ingress_class: DEFAULT_INGRESS_CLASS.to_string(),
        }
    }
}

/// Reconciler configuration
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    pub synth: SynthConfig,
    pub store_timeout: Duration,
    pub resync: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            synth: SynthConfig::default(),
            store_timeout: Duration::from_secs(10),
            resync: Duration::from_secs(300),
        }
    }
}
